//! Players that own a board and place each revealed card on it.

use crate::game::board::{Board, Position};
use crate::game::card::Card;
use crate::game::state::GameState;
use crate::mcts::algorithm::Mcts;
use crate::mcts::config::MctsConfig;
use crate::mcts::rollout::RolloutPolicy;
use crate::mcts::tree::SearchTree;
use crate::recording::PlayerType;
use crate::{MathematicoError, Result};
use log::debug;
use rand::prelude::*;

pub trait Player {
    fn player_type(&self) -> PlayerType;

    fn board(&self) -> &Board;

    /// Places `card` on the player's board and returns the chosen cell.
    fn play(&mut self, card: Card) -> Result<Position>;

    /// Clears the board for a new game.
    fn reset(&mut self);

    /// Value estimate behind the last move, if the player computes one.
    fn last_evaluation(&self) -> Option<f64> {
        None
    }
}

/// Places every card where an MCTS search says to, carrying the search tree
/// from one move to the next.
pub struct MctsPlayer<'p> {
    mcts: Mcts<'p>,
    board: Board,
    tree: Option<SearchTree>,
    last_value: Option<f64>,
}

impl<'p> MctsPlayer<'p> {
    pub fn new(config: MctsConfig, policy: &'p dyn RolloutPolicy) -> Result<Self> {
        Ok(Self {
            mcts: Mcts::new(config, policy)?,
            board: Board::empty(),
            tree: None,
            last_value: None,
        })
    }

    /// Tree kept for the next move, rooted at the state after the last placement.
    pub fn tree(&self) -> Option<&SearchTree> {
        self.tree.as_ref()
    }
}

impl Player for MctsPlayer<'_> {
    fn player_type(&self) -> PlayerType {
        PlayerType::Mcts
    }

    fn board(&self) -> &Board {
        &self.board
    }

    fn play(&mut self, card: Card) -> Result<Position> {
        let state = GameState::decision(self.board, card)?;
        let previous = self.tree.take();
        let (result, next) = self.mcts.search_from(previous, &state)?;

        let position = result.action.position().ok_or_else(|| {
            MathematicoError::InvalidState(format!(
                "search at a decision state returned {}",
                result.action
            ))
        })?;
        self.board.make_move(position, card)?;
        debug!(
            "placed {} at {} (expected {:.1}, {} iterations)",
            card, position, result.value, result.iterations
        );

        self.last_value = Some(result.value);
        self.tree = if next.root_node().is_terminal() {
            None
        } else {
            Some(next)
        };
        Ok(position)
    }

    fn reset(&mut self) {
        self.board = Board::empty();
        self.tree = None;
        self.last_value = None;
    }

    fn last_evaluation(&self) -> Option<f64> {
        self.last_value
    }
}

/// Baseline: uniform random empty cell.
pub struct RandomPlayer {
    board: Board,
    rng: StdRng,
}

impl RandomPlayer {
    pub fn new(seed: u64) -> Self {
        Self {
            board: Board::empty(),
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Player for RandomPlayer {
    fn player_type(&self) -> PlayerType {
        PlayerType::Random
    }

    fn board(&self) -> &Board {
        &self.board
    }

    fn play(&mut self, card: Card) -> Result<Position> {
        let moves = self.board.possible_moves();
        let position = *moves.choose(&mut self.rng).ok_or_else(|| {
            MathematicoError::InvalidState("board is already full".to_string())
        })?;
        self.board.make_move(position, card)?;
        Ok(position)
    }

    fn reset(&mut self) {
        self.board = Board::empty();
    }
}
