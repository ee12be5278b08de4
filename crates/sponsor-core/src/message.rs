//! Session protocol messages
//!
//! Messages are JSON objects with exactly one snake_case key naming the
//! variant, e.g. `{"action": {"action": 2}}`.

use serde::{Deserialize, Serialize};

/// Message sent by a client on its session stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InboundMessage {
    /// Create a fresh environment for a game type
    Init(InitRequest),
    /// Act in the current game
    Action(PlayerAction),
    /// Pause or resume the game
    Control(GameControl),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitRequest {
    pub game_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerAction {
    pub action: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameControl {
    #[serde(rename = "type")]
    pub control_type: ControlType,
}

/// Control verbs understood by a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ControlType {
    Pause,
    Resume,
}

/// Message sent by the sponsor on a session stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutboundMessage {
    #[serde(alias = "init_response")]
    InitResult(InitResult),
    StateUpdate(StateUpdate),
    EndStatus(EndStatus),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitResult {
    #[serde(alias = "type")]
    pub status: InitStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InitStatus {
    Success,
    Failure,
}

/// Fresh engine state after a transition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateUpdate {
    /// Encoded state payload (JSON text)
    pub state: String,
    pub is_over: bool,
    #[serde(alias = "i_player")]
    pub active_player: i64,
}

/// Final payoffs, one per participant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndStatus {
    pub payoffs: Vec<f64>,
}

impl InboundMessage {
    pub fn init(game_type: impl Into<String>) -> Self {
        InboundMessage::Init(InitRequest {
            game_type: game_type.into(),
        })
    }

    pub fn action(action: i64) -> Self {
        InboundMessage::Action(PlayerAction { action })
    }

    pub fn control(control_type: ControlType) -> Self {
        InboundMessage::Control(GameControl { control_type })
    }
}

impl OutboundMessage {
    pub fn init_result(status: InitStatus) -> Self {
        OutboundMessage::InitResult(InitResult { status })
    }
}

/// Serialize a message to JSON bytes
pub fn serialize<T: Serialize>(msg: &T) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(msg)
}

/// Deserialize a message from JSON bytes
pub fn deserialize<'a, T: Deserialize<'a>>(bytes: &'a [u8]) -> Result<T, serde_json::Error> {
    serde_json::from_slice(bytes)
}
