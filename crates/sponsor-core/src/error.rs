//! Error types for the sponsor protocol

use thiserror::Error;

/// Result type for sponsor operations
pub type Result<T> = std::result::Result<T, SponsorError>;

/// Sponsor error types
#[derive(Debug, Error)]
pub enum SponsorError {
    /// No engine can build the requested game
    #[error("Unknown game type: {0}")]
    UnknownGameType(String),

    /// The game engine failed while serving a call
    #[error("Engine error: {0}")]
    Engine(String),

    /// Peer sent something the protocol does not allow
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Stream broken or unwritable
    #[error("Transport error: {0}")]
    Transport(String),

    /// Decision-maker could not pick an action
    #[error("Decision error: {0}")]
    Decision(String),
}

impl From<serde_json::Error> for SponsorError {
    fn from(err: serde_json::Error) -> Self {
        SponsorError::Serialization(err.to_string())
    }
}
