use crate::game::card::Card;
use crate::scoring::scoring::evaluate;
use crate::{MathematicoError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const BOARD_SIZE: usize = 5;
pub const CELL_COUNT: usize = BOARD_SIZE * BOARD_SIZE;

/// Raw grid: `0` marks an empty cell, otherwise the card rank.
pub type Grid = [[u8; BOARD_SIZE]; BOARD_SIZE];

/// A cell of the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPosition", into = "RawPosition")]
pub struct Position {
    row: u8,
    col: u8,
}

/// Serialized form of [`Position`], checked on the way in.
#[derive(Serialize, Deserialize)]
struct RawPosition {
    row: u8,
    col: u8,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Result<Self> {
        if row < BOARD_SIZE && col < BOARD_SIZE {
            Ok(Position {
                row: row as u8,
                col: col as u8,
            })
        } else {
            Err(MathematicoError::IllegalAction(format!(
                "position ({}, {}) is outside the board",
                row, col
            )))
        }
    }

    pub fn row(self) -> usize {
        self.row as usize
    }

    pub fn col(self) -> usize {
        self.col as usize
    }
}

impl TryFrom<RawPosition> for Position {
    type Error = MathematicoError;

    fn try_from(raw: RawPosition) -> Result<Self> {
        Position::new(raw.row as usize, raw.col as usize)
    }
}

impl From<Position> for RawPosition {
    fn from(position: Position) -> Self {
        RawPosition {
            row: position.row,
            col: position.col,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Grid", into = "Grid")]
pub struct Board {
    grid: Grid,
}

impl Board {
    pub fn empty() -> Self {
        Board::default()
    }

    /// Builds a board from a raw grid, rejecting ranks outside `0..=13`.
    pub fn from_grid(grid: Grid) -> Result<Self> {
        for row in &grid {
            for &cell in row {
                if cell != 0 {
                    Card::new(cell)?;
                }
            }
        }
        Ok(Board { grid })
    }

    pub fn get(&self, position: Position) -> Option<Card> {
        match self.grid[position.row()][position.col()] {
            0 => None,
            rank => Card::new(rank).ok(),
        }
    }

    pub fn is_empty_at(&self, position: Position) -> bool {
        self.grid[position.row()][position.col()] == 0
    }

    pub fn make_move(&mut self, position: Position, card: Card) -> Result<()> {
        if !self.is_empty_at(position) {
            return Err(MathematicoError::IllegalAction(format!(
                "cell {} is already occupied",
                position
            )));
        }
        self.grid[position.row()][position.col()] = card.rank();
        Ok(())
    }

    /// Empty cells in row-major order.
    pub fn possible_moves(&self) -> Vec<Position> {
        let mut moves = Vec::with_capacity(CELL_COUNT - self.occupied_cell_count());
        for (r, row) in self.grid.iter().enumerate() {
            for (c, &cell) in row.iter().enumerate() {
                if cell == 0 {
                    moves.push(Position {
                        row: r as u8,
                        col: c as u8,
                    });
                }
            }
        }
        moves
    }

    pub fn occupied_cell_count(&self) -> usize {
        self.grid.iter().flatten().filter(|&&cell| cell != 0).count()
    }

    pub fn is_full(&self) -> bool {
        self.grid.iter().flatten().all(|&cell| cell != 0)
    }

    /// Number of copies of `card` already placed.
    pub fn count_of(&self, card: Card) -> usize {
        self.grid
            .iter()
            .flatten()
            .filter(|&&cell| cell == card.rank())
            .count()
    }

    pub fn score(&self) -> f64 {
        evaluate(self) as f64
    }

    pub fn grid_snapshot(&self) -> [[Option<Card>; BOARD_SIZE]; BOARD_SIZE] {
        let mut snapshot = [[None; BOARD_SIZE]; BOARD_SIZE];
        for (r, row) in self.grid.iter().enumerate() {
            for (c, &cell) in row.iter().enumerate() {
                if cell != 0 {
                    snapshot[r][c] = Card::new(cell).ok();
                }
            }
        }
        snapshot
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Applies a raw cell mapping: cell `(r, c)` of the result is cell `source(r, c)` of `self`.
    pub(crate) fn remap(&self, source: impl Fn(usize, usize) -> (usize, usize)) -> Board {
        let mut grid = [[0u8; BOARD_SIZE]; BOARD_SIZE];
        for (r, row) in grid.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                let (sr, sc) = source(r, c);
                *cell = self.grid[sr][sc];
            }
        }
        Board { grid }
    }
}

impl TryFrom<Grid> for Board {
    type Error = MathematicoError;

    fn try_from(grid: Grid) -> Result<Self> {
        Board::from_grid(grid)
    }
}

impl From<Board> for Grid {
    fn from(board: Board) -> Grid {
        board.grid
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.grid {
            for &cell in row {
                if cell == 0 {
                    write!(f, "  .")?;
                } else {
                    write!(f, " {:>2}", cell)?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
