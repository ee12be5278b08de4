//! Decision-makers for the line bridge

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use sponsor_core::{Result, SponsorError};

/// State handed to a decision-maker, one per input line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentState {
    /// Observation as produced by the engine (opaque here)
    #[serde(alias = "obs")]
    pub observation: serde_json::Value,
    /// Actions the active player may take
    pub legal_actions: LegalActions,
    /// Anything else the engine included
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Legal actions as engines report them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LegalActions {
    /// Plain list of action ids
    List(Vec<i64>),
    /// Map keyed by action id (values ignored)
    Map(serde_json::Map<String, serde_json::Value>),
}

impl LegalActions {
    /// Action ids in the order the engine listed them
    pub fn ids(&self) -> Result<Vec<i64>> {
        match self {
            LegalActions::List(ids) => Ok(ids.clone()),
            LegalActions::Map(map) => map
                .keys()
                .map(|key| {
                    key.parse::<i64>().map_err(|_| {
                        SponsorError::Decision(format!("Legal action key is not an id: {}", key))
                    })
                })
                .collect(),
        }
    }
}

/// Picks an action for a state
pub trait DecisionMaker {
    fn decide(&mut self, state: &AgentState) -> Result<i64>;
}

/// Uniformly random choice among the legal actions
pub struct RandomAgent {
    rng: StdRng,
}

impl RandomAgent {
    /// Seeded agents repeat their choices for the same inputs
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }
}

impl DecisionMaker for RandomAgent {
    fn decide(&mut self, state: &AgentState) -> Result<i64> {
        let ids = state.legal_actions.ids()?;
        ids.choose(&mut self.rng)
            .copied()
            .ok_or_else(|| SponsorError::Decision("No legal actions".into()))
    }
}
