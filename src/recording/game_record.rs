//! Game recording data structures.
//!
//! A record keeps every card, the board before it was placed and the chosen
//! cell, so finished games can be replayed or analysed later.

use crate::game::board::{Board, Grid, Position};
use crate::game::card::Card;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Kind of player that produced a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerType {
    Mcts,
    Random,
}

impl std::fmt::Display for PlayerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PlayerType::Mcts => write!(f, "MCTS"),
            PlayerType::Random => write!(f, "Random"),
        }
    }
}

/// Record of a single move in the game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveRecord {
    /// Turn number (0-24)
    pub turn: usize,
    /// Board before the move
    pub board_before: Grid,
    pub card: Card,
    pub position: Position,
    /// Search estimate of the final score, if the player computed one
    pub evaluation: Option<f64>,
    /// Timestamp of the move (milliseconds since the epoch)
    pub timestamp: i64,
}

/// Complete record of a game
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    pub game_id: String,
    /// Game start timestamp (seconds since the epoch)
    pub timestamp: i64,
    pub player_type: PlayerType,
    pub moves: Vec<MoveRecord>,
    pub final_board: Option<Grid>,
    pub final_score: Option<i32>,
}

impl GameRecord {
    /// Create a new empty game record
    pub fn new(game_id: String, player_type: PlayerType) -> Self {
        Self {
            game_id,
            timestamp: chrono::Utc::now().timestamp(),
            player_type,
            moves: Vec::new(),
            final_board: None,
            final_score: None,
        }
    }

    /// Record a move
    pub fn record_move(
        &mut self,
        board_before: &Board,
        card: Card,
        position: Position,
        evaluation: Option<f64>,
    ) {
        self.moves.push(MoveRecord {
            turn: self.moves.len(),
            board_before: *board_before.grid(),
            card,
            position,
            evaluation,
            timestamp: chrono::Utc::now().timestamp_millis(),
        });
    }

    /// Finalize the game with the full board
    pub fn finalize(&mut self, board: &Board) {
        self.final_board = Some(*board.grid());
        self.final_score = Some(board.score() as i32);
    }

    pub fn is_complete(&self) -> bool {
        self.final_score.is_some()
    }

    /// Replays the recorded moves onto an empty board.
    pub fn replay(&self) -> Result<Board> {
        let mut board = Board::empty();
        for record in &self.moves {
            board.make_move(record.position, record.card)?;
        }
        Ok(board)
    }
}

/// Writes `records` as a pretty-printed JSON array.
pub fn save_records<P: AsRef<Path>>(path: P, records: &[GameRecord]) -> Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, records)?;
    Ok(())
}

pub fn load_records<P: AsRef<Path>>(path: P) -> Result<Vec<GameRecord>> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}
