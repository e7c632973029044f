//! Board fixtures shared by unit tests.

use crate::game::board::{Board, Position};
use crate::game::card::Card;

pub(crate) fn card(rank: u8) -> Card {
    Card::new(rank).unwrap()
}

/// 24 cells holding ranks 1..=6 four times each; only (4, 4) is left empty.
pub(crate) fn nearly_full_board() -> Board {
    let mut board = Board::empty();
    let mut placed = 0;
    for row in 0..5 {
        for col in 0..5 {
            if placed == 24 {
                break;
            }
            let rank = (placed / 4 + 1) as u8;
            board
                .make_move(Position::new(row, col).unwrap(), card(rank))
                .unwrap();
            placed += 1;
        }
    }
    board
}
