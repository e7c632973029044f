use crate::game::board::{Board, BOARD_SIZE};
use crate::game::card::RANK_COUNT;

pub const PAIR: i32 = 10;
pub const TWO_PAIRS: i32 = 20;
pub const THREE_OF_A_KIND: i32 = 40;
pub const FULL_HOUSE: i32 = 80;
pub const FULL_HOUSE_ONES_AND_THIRTEENS: i32 = 100;
pub const FOUR_OF_A_KIND: i32 = 160;
pub const FOUR_ONES: i32 = 200;
pub const STRAIGHT: i32 = 50;
pub const STRAIGHT_ONE_TO_THIRTEEN: i32 = 150;
/// Added to a diagonal whose cards form any scoring combination.
pub const DIAGONAL_BONUS: i32 = 10;

/// Scores one line of five cells. Empty cells (`0`) are ignored, so partially
/// filled lines are scored on the cards they already hold; straights need all five.
pub fn eval_line(line: &[u8; BOARD_SIZE]) -> i32 {
    let mut counts = [0u8; RANK_COUNT + 1];
    let mut filled = 0;
    for &cell in line {
        if cell != 0 {
            counts[cell as usize] += 1;
            filled += 1;
        }
    }

    let mut groups: Vec<u8> = counts[1..].iter().copied().filter(|&c| c > 1).collect();
    groups.sort_unstable_by(|a, b| b.cmp(a));

    match groups.as_slice() {
        [4, ..] => {
            if counts[1] == 4 {
                FOUR_ONES
            } else {
                FOUR_OF_A_KIND
            }
        }
        [3, 2] => {
            if counts[1] == 3 && counts[13] == 2 {
                FULL_HOUSE_ONES_AND_THIRTEENS
            } else {
                FULL_HOUSE
            }
        }
        [3, ..] => THREE_OF_A_KIND,
        [2, 2, ..] => TWO_PAIRS,
        [2, ..] => PAIR,
        _ if filled == BOARD_SIZE => eval_straight(&counts),
        _ => 0,
    }
}

fn eval_straight(counts: &[u8; RANK_COUNT + 1]) -> i32 {
    if [1, 10, 11, 12, 13].iter().all(|&rank| counts[rank] == 1) {
        return STRAIGHT_ONE_TO_THIRTEEN;
    }
    let ranks: Vec<usize> = (1..=RANK_COUNT).filter(|&rank| counts[rank] == 1).collect();
    match (ranks.first(), ranks.last()) {
        (Some(&low), Some(&high)) if high - low == BOARD_SIZE - 1 => STRAIGHT,
        _ => 0,
    }
}

/// Sum over rows, columns and both diagonals.
pub fn evaluate(board: &Board) -> i32 {
    let grid = board.grid();
    let mut total = 0;

    for row in grid {
        total += eval_line(row);
    }

    for col in 0..BOARD_SIZE {
        let mut line = [0u8; BOARD_SIZE];
        for (row, cell) in line.iter_mut().enumerate() {
            *cell = grid[row][col];
        }
        total += eval_line(&line);
    }

    let mut main = [0u8; BOARD_SIZE];
    let mut anti = [0u8; BOARD_SIZE];
    for i in 0..BOARD_SIZE {
        main[i] = grid[i][i];
        anti[i] = grid[i][BOARD_SIZE - 1 - i];
    }
    for diagonal in [main, anti] {
        let points = eval_line(&diagonal);
        if points > 0 {
            total += points + DIAGONAL_BONUS;
        }
    }

    total
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_combinations() {
        assert_eq!(eval_line(&[3, 3, 5, 7, 9]), PAIR);
        assert_eq!(eval_line(&[3, 3, 5, 5, 9]), TWO_PAIRS);
        assert_eq!(eval_line(&[3, 3, 3, 5, 9]), THREE_OF_A_KIND);
        assert_eq!(eval_line(&[3, 3, 3, 5, 5]), FULL_HOUSE);
        assert_eq!(eval_line(&[1, 1, 1, 13, 13]), FULL_HOUSE_ONES_AND_THIRTEENS);
        assert_eq!(eval_line(&[13, 13, 13, 1, 1]), FULL_HOUSE);
        assert_eq!(eval_line(&[8, 8, 8, 8, 2]), FOUR_OF_A_KIND);
        assert_eq!(eval_line(&[1, 1, 1, 1, 2]), FOUR_ONES);
        assert_eq!(eval_line(&[4, 6, 5, 8, 7]), STRAIGHT);
        assert_eq!(eval_line(&[13, 1, 11, 10, 12]), STRAIGHT_ONE_TO_THIRTEEN);
        assert_eq!(eval_line(&[1, 2, 3, 4, 6]), 0);
    }

    #[test]
    fn test_partial_lines() {
        assert_eq!(eval_line(&[0, 0, 0, 0, 0]), 0);
        assert_eq!(eval_line(&[4, 4, 0, 0, 0]), PAIR);
        assert_eq!(eval_line(&[2, 3, 4, 5, 0]), 0);
    }

    #[test]
    fn test_diagonal_bonus() {
        let mut grid = [[0u8; BOARD_SIZE]; BOARD_SIZE];
        grid[0][0] = 6;
        grid[1][1] = 6;
        let board = Board::from_grid(grid).unwrap();
        assert_eq!(evaluate(&board), PAIR + DIAGONAL_BONUS);
    }

    #[test]
    fn test_rows_and_columns_add_up() {
        let mut grid = [[0u8; BOARD_SIZE]; BOARD_SIZE];
        grid[0] = [1, 1, 1, 13, 13];
        grid[4] = [7, 8, 9, 10, 11];
        let board = Board::from_grid(grid).unwrap();
        assert_eq!(evaluate(&board), FULL_HOUSE_ONES_AND_THIRTEENS + STRAIGHT);

        grid[2][0] = 7;
        let board = Board::from_grid(grid).unwrap();
        // Column 0 now holds 1, 7, 7.
        assert_eq!(
            evaluate(&board),
            FULL_HOUSE_ONES_AND_THIRTEENS + STRAIGHT + PAIR
        );
    }
}
