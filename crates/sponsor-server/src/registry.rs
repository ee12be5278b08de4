//! Engine registry
//!
//! Routes game types to the engine that builds them.

use async_trait::async_trait;
use sponsor_core::{Environment, GameEngine, Result, SponsorError};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Registry of game engines keyed by game type
#[derive(Default)]
pub struct EngineRegistry {
    engines: HashMap<String, Arc<dyn GameEngine>>,
    fallback: Option<Arc<dyn GameEngine>>,
    allowed: Option<HashSet<String>>,
}

impl EngineRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Route `game_type` to `engine`. Replaces any earlier registration.
    pub fn register(mut self, game_type: impl Into<String>, engine: impl GameEngine) -> Self {
        self.engines.insert(game_type.into(), Arc::new(engine));
        self
    }

    /// Engine used for game types without their own registration
    pub fn with_fallback(mut self, engine: impl GameEngine) -> Self {
        self.fallback = Some(Arc::new(engine));
        self
    }

    /// Refuse every game type not in `game_types`
    pub fn allow_only<I, S>(mut self, game_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed = Some(game_types.into_iter().map(Into::into).collect());
        self
    }

    /// Find the engine for a game type
    pub fn resolve(&self, game_type: &str) -> Result<Arc<dyn GameEngine>> {
        if let Some(allowed) = &self.allowed {
            if !allowed.contains(game_type) {
                return Err(SponsorError::UnknownGameType(game_type.to_string()));
            }
        }
        self.engines
            .get(game_type)
            .or(self.fallback.as_ref())
            .cloned()
            .ok_or_else(|| SponsorError::UnknownGameType(game_type.to_string()))
    }

    /// Explicitly registered game types, sorted
    pub fn game_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.engines.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }
}

#[async_trait]
impl GameEngine for EngineRegistry {
    async fn create(&self, game_type: &str) -> Result<Box<dyn Environment>> {
        self.resolve(game_type)?.create(game_type).await
    }
}
