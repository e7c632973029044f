use crate::game::board::Board;
use crate::game::card::{Card, COPIES_PER_RANK, MAX_RANK, RANK_COUNT};
use crate::{MathematicoError, Result};
use rand::prelude::*;
use serde::{Deserialize, Serialize};

/// Remaining cards, stored as a count per rank.
///
/// Index `0` is unused so that `counts[rank]` reads naturally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Deck {
    counts: [u8; RANK_COUNT + 1],
}

impl Deck {
    /// All 52 cards.
    pub fn full() -> Self {
        let mut counts = [COPIES_PER_RANK; RANK_COUNT + 1];
        counts[0] = 0;
        Deck { counts }
    }

    pub fn empty() -> Self {
        Deck {
            counts: [0; RANK_COUNT + 1],
        }
    }

    /// Cards not yet placed on `board`: four copies of each rank minus the placed ones.
    pub fn from_board(board: &Board) -> Result<Self> {
        let mut deck = Deck::full();
        for row in board.grid() {
            for &cell in row {
                if cell == 0 {
                    continue;
                }
                let card = Card::new(cell)?;
                deck.remove(card).map_err(|_| {
                    MathematicoError::InvalidState(format!(
                        "board holds more than {} copies of {}",
                        COPIES_PER_RANK, card
                    ))
                })?;
            }
        }
        Ok(deck)
    }

    pub fn count(&self, card: Card) -> u8 {
        self.counts[card.rank() as usize]
    }

    pub fn total(&self) -> usize {
        self.counts.iter().map(|&c| c as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// Ranks with at least one copy left, ascending.
    pub fn ranks(&self) -> impl Iterator<Item = Card> + '_ {
        Card::all().filter(move |&card| self.count(card) > 0)
    }

    pub fn remove(&mut self, card: Card) -> Result<()> {
        let slot = &mut self.counts[card.rank() as usize];
        if *slot == 0 {
            return Err(MathematicoError::IllegalAction(format!(
                "no copy of {} left in the deck",
                card
            )));
        }
        *slot -= 1;
        Ok(())
    }

    /// Probability of revealing `card` next.
    pub fn probability(&self, card: Card) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            self.count(card) as f64 / total as f64
        }
    }

    /// Draws a rank uniformly over the remaining physical cards (not over ranks).
    pub fn sample(&self, rng: &mut StdRng) -> Option<Card> {
        let total = self.total();
        if total == 0 {
            return None;
        }
        let mut pick = rng.random_range(0..total);
        for rank in 1..=MAX_RANK {
            let count = self.counts[rank as usize] as usize;
            if pick < count {
                return Card::new(rank).ok();
            }
            pick -= count;
        }
        None
    }
}
