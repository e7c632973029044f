//! Score-preserving symmetries of the Mathematico board
//!
//! Two families of maps keep every row, column and diagonal intact as a set of
//! cells (so the score cannot change):
//! - Line swaps: the same permutation of rows and columns, exchanging the two
//!   outer lines with the two inner ones while the centre line stays put
//! - The 8 rotations and reflections of the square
//!
//! Their 24 compositions collapse to 16 distinct cell maps.

use crate::game::board::{Board, Position, BOARD_SIZE};
use crate::game::card::Card;
use crate::Result;
use std::collections::{BTreeSet, HashSet};
use std::sync::OnceLock;

/// Permutation applied to both row and column indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineSwap {
    Identity,
    /// (0 1)(3 4)
    AdjacentPairs,
    /// (0 3)(1 4)
    CrossedPairs,
}

impl LineSwap {
    pub fn all() -> [Self; 3] {
        [Self::Identity, Self::AdjacentPairs, Self::CrossedPairs]
    }

    fn permutation(self) -> [usize; BOARD_SIZE] {
        match self {
            LineSwap::Identity => [0, 1, 2, 3, 4],
            LineSwap::AdjacentPairs => [1, 0, 2, 4, 3],
            LineSwap::CrossedPairs => [3, 4, 2, 0, 1],
        }
    }
}

/// Rotations and reflections of the square.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dihedral {
    Identity,
    Rotate90,
    Rotate180,
    Rotate270,
    FlipHorizontal,
    FlipVertical,
    Transpose,
    AntiTranspose,
}

impl Dihedral {
    pub fn all() -> [Self; 8] {
        [
            Self::Identity,
            Self::Rotate90,
            Self::Rotate180,
            Self::Rotate270,
            Self::FlipHorizontal,
            Self::FlipVertical,
            Self::Transpose,
            Self::AntiTranspose,
        ]
    }

    /// Cell of the source board that lands on `(r, c)`.
    fn source(self, r: usize, c: usize) -> (usize, usize) {
        let last = BOARD_SIZE - 1;
        match self {
            Dihedral::Identity => (r, c),
            Dihedral::Rotate90 => (last - c, r),
            Dihedral::Rotate180 => (last - r, last - c),
            Dihedral::Rotate270 => (c, last - r),
            Dihedral::FlipHorizontal => (r, last - c),
            Dihedral::FlipVertical => (last - r, c),
            Dihedral::Transpose => (c, r),
            Dihedral::AntiTranspose => (last - c, last - r),
        }
    }
}

type CellMap = [[(u8, u8); BOARD_SIZE]; BOARD_SIZE];

/// A score-preserving board map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardTransform {
    pub swap: LineSwap,
    pub dihedral: Dihedral,
    cells: CellMap,
}

impl BoardTransform {
    pub fn new(swap: LineSwap, dihedral: Dihedral) -> Self {
        let p = swap.permutation();
        let mut cells = [[(0u8, 0u8); BOARD_SIZE]; BOARD_SIZE];
        for (r, row) in cells.iter_mut().enumerate() {
            for (c, cell) in row.iter_mut().enumerate() {
                let (dr, dc) = dihedral.source(r, c);
                *cell = (p[dr] as u8, p[dc] as u8);
            }
        }
        BoardTransform {
            swap,
            dihedral,
            cells,
        }
    }

    pub fn apply(&self, board: &Board) -> Board {
        board.remap(|r, c| {
            let (sr, sc) = self.cells[r][c];
            (sr as usize, sc as usize)
        })
    }
}

/// The distinct score-preserving maps, identity first.
pub fn transforms() -> &'static [BoardTransform] {
    static TRANSFORMS: OnceLock<Vec<BoardTransform>> = OnceLock::new();
    TRANSFORMS.get_or_init(|| {
        let mut seen = HashSet::new();
        let mut result = Vec::new();
        for swap in LineSwap::all() {
            for dihedral in Dihedral::all() {
                let transform = BoardTransform::new(swap, dihedral);
                if seen.insert(transform.cells) {
                    result.push(transform);
                }
            }
        }
        result
    })
}

/// Every distinct board equivalent to `board`, including `board` itself.
pub fn canonical_forms(board: &Board) -> BTreeSet<Board> {
    transforms().iter().map(|t| t.apply(board)).collect()
}

/// Smallest member of the equivalence class; equal for equivalent boards.
pub fn canonical(board: &Board) -> Board {
    transforms()
        .iter()
        .map(|t| t.apply(board))
        .min()
        .unwrap_or(*board)
}

/// Keeps the first move of each class of equivalent resulting boards, preserving order.
pub fn deduplicate_moves(board: &Board, moves: &[Position], card: Card) -> Result<Vec<Position>> {
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(moves.len());
    for &position in moves {
        let mut next = *board;
        next.make_move(position, card)?;
        if seen.insert(canonical(&next)) {
            kept.push(position);
        }
    }
    Ok(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;

    fn random_board(rng: &mut StdRng, cells: usize) -> Board {
        let mut deck: Vec<u8> = (1..=13).flat_map(|r| std::iter::repeat(r).take(4)).collect();
        deck.shuffle(rng);
        let mut positions = Board::empty().possible_moves();
        positions.shuffle(rng);
        let mut board = Board::empty();
        for (position, rank) in positions.into_iter().zip(deck).take(cells) {
            board.make_move(position, Card::new(rank).unwrap()).unwrap();
        }
        board
    }

    #[test]
    fn test_sixteen_distinct_transforms() {
        assert_eq!(transforms().len(), 16);
        assert_eq!(transforms()[0].swap, LineSwap::Identity);
        assert_eq!(transforms()[0].dihedral, Dihedral::Identity);
    }

    #[test]
    fn test_transforms_preserve_score() {
        let mut rng = StdRng::seed_from_u64(2024);
        for _ in 0..20 {
            let board = random_board(&mut rng, 25);
            for transform in transforms() {
                assert_eq!(transform.apply(&board).score(), board.score());
            }
        }
    }

    #[test]
    fn test_reflected_boards_share_forms() {
        let mut rng = StdRng::seed_from_u64(5);
        let board = random_board(&mut rng, 14);
        let reflected = BoardTransform::new(LineSwap::Identity, Dihedral::FlipHorizontal)
            .apply(&board);

        assert_eq!(reflected.score(), board.score());
        assert_eq!(canonical_forms(&board), canonical_forms(&reflected));
        assert_eq!(canonical(&board), canonical(&reflected));
        assert!(canonical_forms(&board).contains(&board));
    }

    #[test]
    fn test_empty_board_has_one_form() {
        assert_eq!(canonical_forms(&Board::empty()).len(), 1);
    }

    #[test]
    fn test_deduplicate_moves_on_empty_board() {
        let board = Board::empty();
        let moves = board.possible_moves();
        let kept = deduplicate_moves(&board, &moves, Card::new(7).unwrap()).unwrap();

        // (4, 4) is (0, 0) rotated by half a turn.
        assert!(kept.len() < moves.len());
        assert_eq!(kept[0], Position::new(0, 0).unwrap());
        assert!(kept.contains(&Position::new(2, 2).unwrap()));
        assert!(!kept.contains(&Position::new(4, 4).unwrap()));
    }

    #[test]
    fn test_deduplicate_keeps_distinct_cells() {
        let mut board = Board::empty();
        board
            .make_move(Position::new(0, 1).unwrap(), Card::new(3).unwrap())
            .unwrap();
        let moves = board.possible_moves();
        let kept = deduplicate_moves(&board, &moves, Card::new(3).unwrap()).unwrap();

        assert!(kept.contains(&Position::new(0, 0).unwrap()));
        let mut scoring = 0;
        for position in &kept {
            let mut next = board;
            next.make_move(*position, Card::new(3).unwrap()).unwrap();
            if next.score() > 0.0 {
                scoring += 1;
            }
        }
        assert!(scoring >= 1);
        assert!(kept.len() > scoring);
    }
}
