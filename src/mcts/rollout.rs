//! Leaf evaluation used by the simulation phase.

use crate::game::state::GameState;
use crate::{MathematicoError, Result};
use rand::prelude::*;
use serde::{Deserialize, Serialize};

/// Estimates the return reachable from a state.
///
/// Implementations receive the search RNG instead of owning one, so a single
/// policy value can be shared by every search (and every rayon worker).
pub trait RolloutPolicy: Send + Sync {
    fn estimate(&self, state: &GameState, rng: &mut StdRng) -> Result<f64>;

    fn name(&self) -> &'static str;
}

/// Plays uniformly random placements and physically uniform reveals until the board is full.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomRollout;

impl RolloutPolicy for RandomRollout {
    fn estimate(&self, state: &GameState, rng: &mut StdRng) -> Result<f64> {
        let mut current = *state;
        while !current.is_terminal() {
            current = match current {
                GameState::Decision(s) => {
                    let moves = s.board.possible_moves();
                    let position = moves[rng.random_range(0..moves.len())];
                    GameState::Chance(s.place(position)?)
                }
                GameState::Chance(s) => {
                    let card = s.deck.sample(rng).ok_or_else(|| {
                        MathematicoError::InvalidState(
                            "deck ran out before the board was full".to_string(),
                        )
                    })?;
                    GameState::Decision(s.reveal(card)?)
                }
            };
        }
        current.reward()
    }

    fn name(&self) -> &'static str {
        "random"
    }
}

/// Scores the board as it stands, counting incomplete lines on the cards they hold.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticEvaluation;

impl RolloutPolicy for StaticEvaluation {
    fn estimate(&self, state: &GameState, _rng: &mut StdRng) -> Result<f64> {
        Ok(state.board().score())
    }

    fn name(&self) -> &'static str {
        "static"
    }
}

/// Rollout selection as it appears in configuration files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RolloutKind {
    #[default]
    Random,
    Static,
}

impl RolloutKind {
    pub fn build(self) -> Box<dyn RolloutPolicy> {
        match self {
            RolloutKind::Random => Box::new(RandomRollout),
            RolloutKind::Static => Box::new(StaticEvaluation),
        }
    }
}
