//! Game engine capability
//!
//! The sponsor does not know any game rules. Engines implement these traits
//! and the session drives them.

use async_trait::async_trait;

use crate::error::Result;
use crate::state::StateValue;

/// Outcome of `reset` or `step`
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    /// Opaque engine state
    pub state: StateValue,
    /// Index of the participant who acts next
    pub active_player: i64,
}

/// One in-progress game.
///
/// Not reentrant: callers must finish one call before starting the next.
#[async_trait]
pub trait Environment: Send {
    /// Start a new game and return its initial state
    async fn reset(&mut self) -> Result<Transition>;

    /// Apply an action for the active player
    async fn step(&mut self, action: i64) -> Result<Transition>;

    /// Whether the game reached a terminal condition
    async fn is_over(&mut self) -> Result<bool>;

    /// Final per-participant outcome
    async fn payoffs(&mut self) -> Result<Vec<f64>>;

    /// Release engine resources. Called before the environment is dropped.
    async fn shutdown(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Factory for environments
#[async_trait]
pub trait GameEngine: Send + Sync + 'static {
    /// Create a fresh environment for `game_type`
    async fn create(&self, game_type: &str) -> Result<Box<dyn Environment>>;
}
