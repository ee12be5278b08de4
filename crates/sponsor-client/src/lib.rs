//! Sponsor client for driving games over a session stream
//!
//! This crate provides a client for the sponsor session protocol over TCP.
//! Replies are matched to requests purely by stream order, so requests that
//! the server ignores (e.g. an action while paused) must not be awaited.
//! `play_match` drives whole multi-hand matches with decision-makers.

mod runner;

pub use runner::{HandLog, Seat, Turn};

use sponsor_core::message::{
    ControlType, EndStatus, InboundMessage, InitStatus, OutboundMessage, StateUpdate, deserialize,
    serialize,
};
use sponsor_core::{Result, SponsorError};
use sponsor_server::transport::tcp::{self, TcpReader, TcpWriter};
use sponsor_server::transport::{MAX_FRAME_LEN, MessageReader, MessageWriter};
use tokio::net::{TcpStream, ToSocketAddrs};
use tracing::debug;

/// Client for one sponsor session
pub struct SponsorClient {
    reader: TcpReader,
    writer: TcpWriter,
}

impl SponsorClient {
    /// Connect and wait for the server's readiness greeting
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| SponsorError::Transport(format!("Failed to connect: {}", e)))?;
        let (reader, writer) = tcp::split(stream, MAX_FRAME_LEN);
        let mut client = Self { reader, writer };

        match client.expect_message().await? {
            OutboundMessage::InitResult(result) if result.status == InitStatus::Success => {
                debug!("Sponsor session ready");
                Ok(client)
            }
            other => Err(unexpected("greeting", &other)),
        }
    }

    /// Send one raw protocol message
    pub async fn send(&mut self, msg: &InboundMessage) -> Result<()> {
        let data = serialize(msg)?;
        self.writer.write_message(&data).await
    }

    /// Receive the next message, `None` once the server closed the stream
    pub async fn recv(&mut self) -> Result<Option<OutboundMessage>> {
        match self.reader.read_message().await? {
            Some(frame) => Ok(Some(deserialize(&frame)?)),
            None => Ok(None),
        }
    }

    /// Start a game and return its initial state
    pub async fn init(&mut self, game_type: &str) -> Result<StateUpdate> {
        self.send(&InboundMessage::init(game_type)).await?;
        match self.expect_message().await? {
            OutboundMessage::InitResult(result) if result.status == InitStatus::Success => {
                self.expect_state().await
            }
            OutboundMessage::InitResult(_) => {
                Err(SponsorError::UnknownGameType(game_type.to_string()))
            }
            other => Err(unexpected("InitResult", &other)),
        }
    }

    /// Act in an active game. Payoffs are returned once the game is over.
    pub async fn act(&mut self, action: i64) -> Result<(StateUpdate, Option<EndStatus>)> {
        self.send(&InboundMessage::action(action)).await?;
        let update = self.expect_state().await?;
        if !update.is_over {
            return Ok((update, None));
        }
        match self.expect_message().await? {
            OutboundMessage::EndStatus(end) => Ok((update, Some(end))),
            other => Err(unexpected("EndStatus", &other)),
        }
    }

    /// Pause the game. The server sends no reply.
    pub async fn pause(&mut self) -> Result<()> {
        self.send(&InboundMessage::control(ControlType::Pause)).await
    }

    /// Resume the game and return the state it resumed from
    pub async fn resume(&mut self) -> Result<StateUpdate> {
        self.send(&InboundMessage::control(ControlType::Resume)).await?;
        self.expect_state().await
    }

    /// Close the stream, ending the server-side session
    pub async fn close(mut self) -> Result<()> {
        self.writer.shutdown().await
    }

    async fn expect_message(&mut self) -> Result<OutboundMessage> {
        self.recv()
            .await?
            .ok_or_else(|| SponsorError::Transport("Server closed the stream".into()))
    }

    async fn expect_state(&mut self) -> Result<StateUpdate> {
        match self.expect_message().await? {
            OutboundMessage::StateUpdate(update) => Ok(update),
            other => Err(unexpected("StateUpdate", &other)),
        }
    }
}

fn unexpected(expected: &str, got: &OutboundMessage) -> SponsorError {
    SponsorError::Protocol(format!("Expected {}, got {:?}", expected, got))
}
