//! Wire protocol for sponsor <-> engine process communication
//!
//! One JSON object per line with internally-tagged enums.
//! Format: {"Type": "MessageType", ...fields}
//!
//! The sponsor writes one request and reads exactly one reply, except for
//! `Close`, which has no reply.

use serde::{Deserialize, Serialize};

/// Requests sent to the engine process
///
/// Note: `rename_all` on enums only affects variant names, not field names inside variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "Type", rename_all = "PascalCase")]
pub enum EngineRequest {
    /// Build the environment for a game type
    Make {
        #[serde(rename = "GameType")]
        game_type: String,
    },
    /// Start a new game
    Reset,
    /// Apply an action
    Step {
        #[serde(rename = "Action")]
        action: i64,
    },
    /// Ask whether the game is over
    IsOver,
    /// Ask for final payoffs
    GetPayoffs,
    /// Release the environment and exit
    Close,
}

/// Replies from the engine process
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "Type", rename_all = "PascalCase")]
pub enum EngineReply {
    /// Environment built
    Ready,

    /// State after reset or step
    Transition {
        #[serde(rename = "State")]
        state: serde_json::Value,
        #[serde(rename = "ActivePlayer")]
        active_player: i64,
    },

    /// Terminal check result
    Over {
        #[serde(rename = "IsOver")]
        is_over: bool,
    },

    /// Final payoffs
    Payoffs {
        #[serde(rename = "Payoffs")]
        payoffs: Vec<f64>,
    },

    /// The engine could not serve the request
    Error {
        #[serde(rename = "Message")]
        message: String,
    },
}

/// Serialize a request as one line of JSON (newline included)
pub fn encode_line<T: Serialize>(msg: &T) -> Result<String, serde_json::Error> {
    let mut line = serde_json::to_string(msg)?;
    line.push('\n');
    Ok(line)
}

/// Parse one line of JSON
pub fn decode_line<'a, T: Deserialize<'a>>(line: &'a str) -> Result<T, serde_json::Error> {
    serde_json::from_str(line.trim_end())
}
