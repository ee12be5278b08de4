//! Session state machine
//!
//! One `Session` per client stream. It owns at most one environment and
//! turns inbound messages into engine calls and outbound messages, one
//! message at a time.

use crate::config::ResumePolicy;
use crate::transport::{MessageReader, MessageWriter};
use sponsor_core::message::{
    ControlType, EndStatus, InboundMessage, InitStatus, OutboundMessage, StateUpdate, deserialize,
    serialize,
};
use sponsor_core::{Environment, GameEngine, Result, SponsorError, Transition, encode};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Session identifier (server-internal)
pub type SessionId = u64;

/// Game lifecycle as seen by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Uninitialized,
    Active,
    Paused,
    Finished,
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Lifecycle::Uninitialized => "UNINITIALIZED",
            Lifecycle::Active => "ACTIVE",
            Lifecycle::Paused => "PAUSED",
            Lifecycle::Finished => "FINISHED",
        };
        f.write_str(name)
    }
}

/// An environment together with what the session knows about it
struct Game {
    game_type: String,
    env: Box<dyn Environment>,
    /// Most recent transition reported by the engine
    last: Transition,
}

/// Lifecycle and environment ownership in one place: every state except
/// `Uninitialized` owns the game.
enum Phase {
    Uninitialized,
    Active(Game),
    Paused(Game),
    Finished(Game),
}

impl Phase {
    fn lifecycle(&self) -> Lifecycle {
        match self {
            Phase::Uninitialized => Lifecycle::Uninitialized,
            Phase::Active(_) => Lifecycle::Active,
            Phase::Paused(_) => Lifecycle::Paused,
            Phase::Finished(_) => Lifecycle::Finished,
        }
    }

    fn game(&self) -> Option<&Game> {
        match self {
            Phase::Uninitialized => None,
            Phase::Active(game) | Phase::Paused(game) | Phase::Finished(game) => Some(game),
        }
    }

    fn game_mut(&mut self) -> Option<&mut Game> {
        match self {
            Phase::Uninitialized => None,
            Phase::Active(game) | Phase::Paused(game) | Phase::Finished(game) => Some(game),
        }
    }

    fn into_game(self) -> Option<Game> {
        match self {
            Phase::Uninitialized => None,
            Phase::Active(game) | Phase::Paused(game) | Phase::Finished(game) => Some(game),
        }
    }
}

/// Per-stream protocol state machine
pub struct Session {
    id: SessionId,
    engine: Arc<dyn GameEngine>,
    resume_policy: ResumePolicy,
    phase: Phase,
}

impl Session {
    /// Create an uninitialized session
    pub fn new(id: SessionId, engine: Arc<dyn GameEngine>, resume_policy: ResumePolicy) -> Self {
        Self {
            id,
            engine,
            resume_policy,
            phase: Phase::Uninitialized,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.phase.lifecycle()
    }

    /// Game type of the owned environment, if any
    pub fn game_type(&self) -> Option<&str> {
        self.phase.game().map(|game| game.game_type.as_str())
    }

    /// Sent once when the stream opens, before any client message.
    ///
    /// Signals that the transport is ready. No game exists yet.
    pub fn greeting(&self) -> OutboundMessage {
        OutboundMessage::init_result(InitStatus::Success)
    }

    /// Process one inbound message and return the messages to send, in order.
    ///
    /// Failures are contained here: the session keeps its previous lifecycle
    /// and the caller keeps reading.
    pub async fn handle(&mut self, msg: InboundMessage) -> Vec<OutboundMessage> {
        match msg {
            InboundMessage::Init(req) => self.init(&req.game_type).await,
            InboundMessage::Action(req) => self.act(req.action).await,
            InboundMessage::Control(req) => match req.control_type {
                ControlType::Pause => {
                    self.pause();
                    vec![]
                }
                ControlType::Resume => self.resume().await,
            },
        }
    }

    /// Shut down and release the owned environment
    pub async fn close(&mut self) {
        let phase = std::mem::replace(&mut self.phase, Phase::Uninitialized);
        if let Some(mut game) = phase.into_game() {
            debug!("Session {}: releasing {} environment", self.id, game.game_type);
            if let Err(e) = game.env.shutdown().await {
                warn!("Session {}: environment shutdown failed: {}", self.id, e);
            }
        }
    }

    async fn init(&mut self, game_type: &str) -> Vec<OutboundMessage> {
        self.close().await;

        match start(&self.engine, game_type).await {
            Ok(game) => {
                info!("Session {}: started {}", self.id, game_type);
                let update = state_update(&game.last, false);
                self.phase = Phase::Active(game);
                vec![OutboundMessage::init_result(InitStatus::Success), update]
            }
            Err(e) => {
                warn!("Session {}: failed to start {}: {}", self.id, game_type, e);
                vec![OutboundMessage::init_result(InitStatus::Failure)]
            }
        }
    }

    async fn act(&mut self, action: i64) -> Vec<OutboundMessage> {
        let lifecycle = self.phase.lifecycle();
        let Phase::Active(game) = &mut self.phase else {
            debug!(
                "Session {}: ignoring action {} while {}",
                self.id, action, lifecycle
            );
            return vec![];
        };

        match advance(game, action).await {
            Ok((outbound, true)) => {
                info!("Session {}: {} finished", self.id, game.game_type);
                self.phase = match std::mem::replace(&mut self.phase, Phase::Uninitialized) {
                    Phase::Active(game) => Phase::Finished(game),
                    other => other,
                };
                outbound
            }
            Ok((outbound, false)) => outbound,
            Err(e) => {
                error!("Session {}: action {} failed: {}", self.id, action, e);
                vec![]
            }
        }
    }

    fn pause(&mut self) {
        self.phase = match std::mem::replace(&mut self.phase, Phase::Uninitialized) {
            Phase::Active(game) => {
                debug!("Session {}: paused", self.id);
                Phase::Paused(game)
            }
            other => {
                debug!("Session {}: ignoring pause while {}", self.id, other.lifecycle());
                other
            }
        };
    }

    async fn resume(&mut self) -> Vec<OutboundMessage> {
        let restart =
            self.resume_policy == ResumePolicy::Reset || matches!(self.phase, Phase::Finished(_));
        let Some(game) = self.phase.game_mut() else {
            debug!("Session {}: ignoring resume without a game", self.id);
            return vec![];
        };

        if restart {
            match game.env.reset().await {
                Ok(transition) => game.last = transition,
                Err(e) => {
                    error!("Session {}: reset on resume failed: {}", self.id, e);
                    return vec![];
                }
            }
        }
        let update = state_update(&game.last, false);

        self.phase = match std::mem::replace(&mut self.phase, Phase::Uninitialized) {
            Phase::Active(game) | Phase::Paused(game) | Phase::Finished(game) => {
                Phase::Active(game)
            }
            Phase::Uninitialized => Phase::Uninitialized,
        };
        debug!("Session {}: resumed", self.id);
        vec![update]
    }
}

/// Create an environment and deal its first state
async fn start(engine: &Arc<dyn GameEngine>, game_type: &str) -> Result<Game> {
    let mut env = engine.create(game_type).await?;
    match env.reset().await {
        Ok(last) => Ok(Game {
            game_type: game_type.to_string(),
            env,
            last,
        }),
        Err(e) => {
            let _ = env.shutdown().await;
            Err(e)
        }
    }
}

/// Step the engine and collect the resulting messages.
///
/// `game.last` only moves once every engine call succeeded.
async fn advance(game: &mut Game, action: i64) -> Result<(Vec<OutboundMessage>, bool)> {
    let transition = game.env.step(action).await?;
    let is_over = game.env.is_over().await?;

    let mut outbound = vec![state_update(&transition, is_over)];
    if is_over {
        let payoffs = game.env.payoffs().await?;
        outbound.push(OutboundMessage::EndStatus(EndStatus { payoffs }));
    }
    game.last = transition;
    Ok((outbound, is_over))
}

fn state_update(transition: &Transition, is_over: bool) -> OutboundMessage {
    OutboundMessage::StateUpdate(StateUpdate {
        state: encode(&transition.state),
        is_over,
        active_player: transition.active_player,
    })
}

/// Drive a session over a stream until the client closes it.
///
/// Sends the greeting, then handles each inbound message in arrival order,
/// writing all of its replies before reading the next one. Malformed frames
/// are dropped. A transport failure ends this session only. The environment
/// is released on every exit path.
pub async fn run_session<R, W>(mut session: Session, mut reader: R, mut writer: W) -> Result<()>
where
    R: MessageReader,
    W: MessageWriter,
{
    let result = serve(&mut session, &mut reader, &mut writer).await;
    session.close().await;
    result
}

async fn serve<R, W>(session: &mut Session, reader: &mut R, writer: &mut W) -> Result<()>
where
    R: MessageReader,
    W: MessageWriter,
{
    send(session.id(), writer, &session.greeting()).await?;

    while let Some(frame) = reader.read_message().await? {
        let preview: String = String::from_utf8_lossy(&frame).chars().take(200).collect();
        debug!("Session {}: received len={} json={}", session.id(), frame.len(), preview);

        let msg: InboundMessage = match deserialize(&frame) {
            Ok(msg) => msg,
            Err(e) => {
                warn!("Session {}: dropping malformed message: {}", session.id(), e);
                continue;
            }
        };

        for outbound in session.handle(msg).await {
            send(session.id(), writer, &outbound).await?;
        }
    }

    info!("Session {}: client closed the stream", session.id());
    Ok(())
}

async fn send<W: MessageWriter>(id: SessionId, writer: &mut W, msg: &OutboundMessage) -> Result<()> {
    let data = serialize(msg).map_err(|e| SponsorError::Serialization(e.to_string()))?;
    let preview: String = String::from_utf8_lossy(&data).chars().take(200).collect();
    debug!("Session {}: sending len={} json={}", id, data.len(), preview);
    writer.write_message(&data).await
}
