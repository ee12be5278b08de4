//! Line-oriented agent bridge
//!
//! Reads one JSON game state per line, asks a decision-maker for an action
//! and writes the action id back as a line. Logs go to stderr so stdout
//! carries only actions.

pub mod bridge;
pub mod decision;

pub use bridge::{BridgeStats, parse_state, run};
pub use decision::{AgentState, DecisionMaker, LegalActions, RandomAgent};
