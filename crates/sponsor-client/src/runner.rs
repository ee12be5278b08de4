//! Multi-hand match runner
//!
//! Plays a number of hands of one game in a single session. Each state is
//! routed to the seat of its active player, and that seat's decision is sent
//! back as the action. After a hand ends, RESUME deals the next one. The last
//! hand is followed by PAUSE.

use crate::SponsorClient;
use sponsor_agent::{DecisionMaker, parse_state};
use sponsor_core::message::StateUpdate;
use sponsor_core::{Result, SponsorError};
use tracing::{debug, info};

/// Seat occupant in a match. Seat `i` plays for active player `i`.
pub type Seat = Box<dyn DecisionMaker + Send>;

/// One decision taken during a hand
#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub player: i64,
    /// Encoded state the player decided on
    pub state: String,
    pub action: i64,
}

/// Record of one finished hand
#[derive(Debug, Clone, PartialEq)]
pub struct HandLog {
    pub turns: Vec<Turn>,
    pub payoffs: Vec<f64>,
}

impl SponsorClient {
    /// Play `hands` hands of `game_type`, one seat per player.
    ///
    /// States must carry `observation` and `legal_actions` so seats can
    /// decide. Fails on the first engine, decision or transport error.
    pub async fn play_match(
        &mut self,
        game_type: &str,
        hands: usize,
        seats: &mut [Seat],
    ) -> Result<Vec<HandLog>> {
        if hands == 0 {
            return Ok(vec![]);
        }

        let mut update = self.init(game_type).await?;
        let mut logs = Vec::with_capacity(hands);
        for hand in 1..=hands {
            let log = self.play_hand(update, seats).await?;
            info!(
                "Hand {}/{} of {} finished after {} turns: payoffs {:?}",
                hand,
                hands,
                game_type,
                log.turns.len(),
                log.payoffs
            );
            logs.push(log);

            if hand == hands {
                self.pause().await?;
                break;
            }
            update = self.resume().await?;
        }
        Ok(logs)
    }

    async fn play_hand(&mut self, mut update: StateUpdate, seats: &mut [Seat]) -> Result<HandLog> {
        if update.is_over {
            return Err(SponsorError::Protocol("Hand was dealt already over".into()));
        }

        let mut turns = Vec::new();
        loop {
            let player = update.active_player;
            let seat = usize::try_from(player)
                .ok()
                .and_then(|i| seats.get_mut(i))
                .ok_or_else(|| SponsorError::Protocol(format!("No seat for player {}", player)))?;
            let action = seat.decide(&parse_state(&update.state)?)?;
            debug!("Player {} plays {}", player, action);

            let (next, end) = self.act(action).await?;
            turns.push(Turn {
                player,
                state: std::mem::replace(&mut update, next).state,
                action,
            });
            if let Some(end) = end {
                return Ok(HandLog {
                    turns,
                    payoffs: end.payoffs,
                });
            }
        }
    }
}
