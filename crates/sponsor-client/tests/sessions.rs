//! End-to-end sessions over TCP against an in-process engine

use async_trait::async_trait;
use serde_json::Value;
use sponsor_agent::{AgentState, DecisionMaker, RandomAgent};
use sponsor_client::{Seat, SponsorClient};
use sponsor_core::message::{InboundMessage, InitStatus, OutboundMessage, deserialize, serialize};
use sponsor_core::{Environment, GameEngine, Result, SponsorError, StateValue, Transition};
use sponsor_server::transport::{FramedReader, FramedWriter, MessageReader, MessageWriter};
use sponsor_server::{EngineRegistry, ResumePolicy, ServerConfig, SponsorServer};
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::net::TcpStream;

/// Two-seat table game: four actions end the hand
struct TableEngine {
    live: Arc<AtomicUsize>,
}

struct TableEnv {
    game_type: String,
    history: Vec<i64>,
    live: Arc<AtomicUsize>,
    released: bool,
}

impl TableEnv {
    fn transition(&self) -> Transition {
        let history = StateValue::Seq(self.history.iter().map(|a| StateValue::Int(*a)).collect());
        Transition {
            state: StateValue::map([
                ("game", StateValue::from(self.game_type.as_str())),
                ("history", history.clone()),
                ("observation", history),
                (
                    "legal_actions",
                    StateValue::Seq((0..4).map(StateValue::Int).collect()),
                ),
            ]),
            active_player: (self.history.len() % 2) as i64,
        }
    }
}

#[async_trait]
impl Environment for TableEnv {
    async fn reset(&mut self) -> Result<Transition> {
        self.history.clear();
        Ok(self.transition())
    }

    async fn step(&mut self, action: i64) -> Result<Transition> {
        if !(0..4).contains(&action) {
            return Err(SponsorError::Engine(format!("illegal action {}", action)));
        }
        self.history.push(action);
        Ok(self.transition())
    }

    async fn is_over(&mut self) -> Result<bool> {
        Ok(self.history.len() >= 4)
    }

    async fn payoffs(&mut self) -> Result<Vec<f64>> {
        Ok(vec![2.0, -2.0])
    }

    async fn shutdown(&mut self) -> Result<()> {
        if !self.released {
            self.released = true;
            self.live.fetch_sub(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

#[async_trait]
impl GameEngine for TableEngine {
    async fn create(&self, game_type: &str) -> Result<Box<dyn Environment>> {
        self.live.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(TableEnv {
            game_type: game_type.to_string(),
            history: vec![],
            live: self.live.clone(),
            released: false,
        }))
    }
}

async fn start_server(resume_policy: ResumePolicy) -> (SocketAddr, Arc<AtomicUsize>) {
    let live = Arc::new(AtomicUsize::new(0));
    let registry = EngineRegistry::new()
        .register("leduc-holdem", TableEngine { live: live.clone() })
        .register("limit-holdem", TableEngine { live: live.clone() });
    let config = ServerConfig {
        addr: "127.0.0.1:0".parse().unwrap(),
        resume_policy,
        ..Default::default()
    };

    let server = SponsorServer::new(registry, config);
    let listener = server.bind().await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(server.serve(listener, std::future::pending()));
    (addr, live)
}

async fn next<R: MessageReader>(reader: &mut R) -> OutboundMessage {
    let frame = reader.read_message().await.unwrap().expect("server closed the stream");
    deserialize(&frame).unwrap()
}

fn state(payload: &str) -> Value {
    serde_json::from_str(payload).unwrap()
}

async fn wait_for_release(live: &AtomicUsize) {
    for _ in 0..200 {
        if live.load(Ordering::SeqCst) == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("environment never released");
}

#[tokio::test]
async fn test_leduc_holdem_scenario() {
    let (addr, _) = start_server(ResumePolicy::Reset).await;
    let mut client = SponsorClient::connect(addr).await.unwrap();

    let initial = client.init("leduc-holdem").await.unwrap();
    assert!(!initial.is_over);
    assert!(initial.active_player == 0 || initial.active_player == 1);
    assert_eq!(state(&initial.state)["game"], "leduc-holdem");

    for action in [1, 2, 3] {
        let (update, end) = client.act(action).await.unwrap();
        assert!(!update.is_over);
        assert!(end.is_none());
    }
    let (update, end) = client.act(0).await.unwrap();
    assert!(update.is_over);
    assert_eq!(state(&update.state)["history"], serde_json::json!([1, 2, 3, 0]));
    assert_eq!(end.unwrap().payoffs, vec![2.0, -2.0]);

    client.close().await.unwrap();
}

#[tokio::test]
async fn test_unknown_game_type_keeps_stream_open() {
    let (addr, _) = start_server(ResumePolicy::Reset).await;
    let mut client = SponsorClient::connect(addr).await.unwrap();

    assert!(matches!(
        client.init("bridge").await,
        Err(SponsorError::UnknownGameType(_))
    ));

    let initial = client.init("limit-holdem").await.unwrap();
    assert_eq!(state(&initial.state)["game"], "limit-holdem");
}

#[tokio::test]
async fn test_concurrent_sessions_are_isolated() {
    let (addr, live) = start_server(ResumePolicy::Reset).await;
    let mut alice = SponsorClient::connect(addr).await.unwrap();
    let mut bob = SponsorClient::connect(addr).await.unwrap();

    let (a, b) = tokio::join!(alice.init("leduc-holdem"), bob.init("limit-holdem"));
    a.unwrap();
    b.unwrap();
    assert_eq!(live.load(Ordering::SeqCst), 2);

    let play_alice = async {
        let mut last = None;
        for action in [3, 3, 3] {
            last = Some(alice.act(action).await.unwrap().0);
        }
        last.unwrap()
    };
    let play_bob = async { bob.act(1).await.unwrap().0 };
    let (alice_state, bob_state) = tokio::join!(play_alice, play_bob);

    assert_eq!(alice_state.active_player, 1);
    assert_eq!(state(&alice_state.state)["history"], serde_json::json!([3, 3, 3]));
    assert_eq!(state(&alice_state.state)["game"], "leduc-holdem");
    assert_eq!(bob_state.active_player, 1);
    assert_eq!(state(&bob_state.state)["history"], serde_json::json!([1]));
    assert_eq!(state(&bob_state.state)["game"], "limit-holdem");

    let next_bob = bob.act(0).await.unwrap().0;
    assert_eq!(next_bob.active_player, 0);
    assert_eq!(state(&next_bob.state)["history"], serde_json::json!([1, 0]));
}

#[tokio::test]
async fn test_pause_resume_over_the_wire() {
    let (addr, _) = start_server(ResumePolicy::Reset).await;
    let mut client = SponsorClient::connect(addr).await.unwrap();
    client.init("leduc-holdem").await.unwrap();
    client.act(2).await.unwrap();

    client.pause().await.unwrap();
    // Ignored while paused; the server sends nothing back
    client.send(&InboundMessage::action(1)).await.unwrap();
    let resumed = client.resume().await.unwrap();

    assert!(!resumed.is_over);
    assert_eq!(state(&resumed.state)["history"], serde_json::json!([]));
    let (update, _) = client.act(0).await.unwrap();
    assert_eq!(state(&update.state)["history"], serde_json::json!([0]));
}

#[tokio::test]
async fn test_in_place_resume_over_the_wire() {
    let (addr, _) = start_server(ResumePolicy::InPlace).await;
    let mut client = SponsorClient::connect(addr).await.unwrap();
    client.init("leduc-holdem").await.unwrap();
    client.act(2).await.unwrap();

    client.pause().await.unwrap();
    let resumed = client.resume().await.unwrap();

    assert_eq!(state(&resumed.state)["history"], serde_json::json!([2]));
    assert_eq!(resumed.active_player, 1);
}

#[tokio::test]
async fn test_malformed_frame_dropped_then_action_processed() {
    let (addr, _) = start_server(ResumePolicy::Reset).await;
    let stream = TcpStream::connect(addr).await.unwrap();
    let (read_half, write_half) = stream.into_split();
    let mut reader = FramedReader::new(read_half);
    let mut writer = FramedWriter::new(write_half);

    assert_eq!(next(&mut reader).await, OutboundMessage::init_result(InitStatus::Success));

    writer
        .write_message(&serialize(&InboundMessage::init("leduc-holdem")).unwrap())
        .await
        .unwrap();
    assert_eq!(next(&mut reader).await, OutboundMessage::init_result(InitStatus::Success));
    assert!(matches!(next(&mut reader).await, OutboundMessage::StateUpdate(_)));

    writer.write_message(br#"{"raise":{"amount":5}}"#).await.unwrap();
    writer
        .write_message(&serialize(&InboundMessage::action(2)).unwrap())
        .await
        .unwrap();

    match next(&mut reader).await {
        OutboundMessage::StateUpdate(update) => {
            assert_eq!(state(&update.state)["history"], serde_json::json!([2]));
            assert_eq!(update.active_player, 1);
        }
        other => panic!("Expected StateUpdate, got {:?}", other),
    }
}

#[tokio::test]
async fn test_closing_the_stream_releases_the_environment() {
    let (addr, live) = start_server(ResumePolicy::Reset).await;
    let mut client = SponsorClient::connect(addr).await.unwrap();
    client.init("leduc-holdem").await.unwrap();
    assert_eq!(live.load(Ordering::SeqCst), 1);

    client.close().await.unwrap();

    wait_for_release(&live).await;
}

/// Always plays the same action, remembering every observation it saw
struct Fixed {
    action: i64,
    seen: Arc<std::sync::Mutex<Vec<Value>>>,
}

impl DecisionMaker for Fixed {
    fn decide(&mut self, state: &AgentState) -> Result<i64> {
        self.seen.lock().unwrap().push(state.observation.clone());
        Ok(self.action)
    }
}

#[tokio::test]
async fn test_match_plays_every_hand() {
    let (addr, live) = start_server(ResumePolicy::Reset).await;
    let mut client = SponsorClient::connect(addr).await.unwrap();
    let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
    let mut seats: Vec<Seat> = vec![
        Box::new(RandomAgent::new(Some(11))),
        Box::new(Fixed {
            action: 3,
            seen: seen.clone(),
        }),
    ];

    let logs = client.play_match("leduc-holdem", 3, &mut seats).await.unwrap();

    assert_eq!(logs.len(), 3);
    for log in &logs {
        assert_eq!(log.payoffs, vec![2.0, -2.0]);
        let players: Vec<i64> = log.turns.iter().map(|t| t.player).collect();
        assert_eq!(players, vec![0, 1, 0, 1]);
        // Every hand is dealt fresh
        assert_eq!(state(&log.turns[0].state)["history"], serde_json::json!([]));
        for turn in &log.turns {
            assert!((0..4).contains(&turn.action));
            if turn.player == 1 {
                assert_eq!(turn.action, 3);
            }
        }
    }
    // Seat 1 acts twice per hand and only sees its own turns
    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen.len(), 6);
    assert!(seen.iter().all(|obs| obs.as_array().is_some_and(|h| h.len() % 2 == 1)));

    client.close().await.unwrap();
    wait_for_release(&live).await;
}

#[tokio::test]
async fn test_match_without_a_seat_for_the_active_player_fails() {
    let (addr, _) = start_server(ResumePolicy::Reset).await;
    let mut client = SponsorClient::connect(addr).await.unwrap();
    let mut seats: Vec<Seat> = vec![Box::new(RandomAgent::new(Some(5)))];

    assert!(matches!(
        client.play_match("leduc-holdem", 2, &mut seats).await,
        Err(SponsorError::Protocol(_))
    ));
}

#[tokio::test]
async fn test_match_with_unknown_game_type_fails() {
    let (addr, _) = start_server(ResumePolicy::Reset).await;
    let mut client = SponsorClient::connect(addr).await.unwrap();
    let mut seats: Vec<Seat> = vec![Box::new(RandomAgent::new(None))];

    assert!(matches!(
        client.play_match("bridge", 1, &mut seats).await,
        Err(SponsorError::UnknownGameType(_))
    ));
}
