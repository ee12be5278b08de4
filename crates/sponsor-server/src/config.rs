//! Server configuration

use crate::transport::MAX_FRAME_LEN;
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

/// What `RESUME` does to a game that already has an environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResumePolicy {
    /// Restart the game with `reset()`, discarding progress
    #[default]
    Reset,
    /// Re-send the last state of a paused or active game without touching the engine.
    /// Finished games still restart.
    InPlace,
}

impl fmt::Display for ResumePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResumePolicy::Reset => f.write_str("reset"),
            ResumePolicy::InPlace => f.write_str("in-place"),
        }
    }
}

impl FromStr for ResumePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reset" => Ok(ResumePolicy::Reset),
            "in-place" | "in_place" => Ok(ResumePolicy::InPlace),
            other => Err(format!(
                "unknown resume policy '{}', expected 'reset' or 'in-place'",
                other
            )),
        }
    }
}

/// Configuration for the session server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (default: 127.0.0.1:50051)
    pub addr: SocketAddr,
    /// Resume behavior for every session
    pub resume_policy: ResumePolicy,
    /// Largest inbound frame accepted
    pub max_frame_len: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 50051)),
            resume_policy: ResumePolicy::default(),
            max_frame_len: MAX_FRAME_LEN,
        }
    }
}
