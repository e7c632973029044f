use crate::{MathematicoError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest card rank.
pub const MIN_RANK: u8 = 1;
/// Highest card rank.
pub const MAX_RANK: u8 = 13;
/// Physical copies of every rank in a full deck.
pub const COPIES_PER_RANK: u8 = 4;
/// Number of distinct ranks.
pub const RANK_COUNT: usize = MAX_RANK as usize;

/// A card rank in `1..=13`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Card(u8);

impl Card {
    pub fn new(rank: u8) -> Result<Self> {
        if (MIN_RANK..=MAX_RANK).contains(&rank) {
            Ok(Card(rank))
        } else {
            Err(MathematicoError::InvalidCard(rank))
        }
    }

    pub fn rank(self) -> u8 {
        self.0
    }

    /// Every rank, in ascending order.
    pub fn all() -> impl Iterator<Item = Card> {
        (MIN_RANK..=MAX_RANK).map(Card)
    }
}

impl TryFrom<u8> for Card {
    type Error = MathematicoError;

    fn try_from(rank: u8) -> Result<Self> {
        Card::new(rank)
    }
}

impl From<Card> for u8 {
    fn from(card: Card) -> u8 {
        card.0
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_valid_ranks() {
        assert_eq!(Card::new(1).unwrap().rank(), 1);
        assert_eq!(Card::new(13).unwrap().rank(), 13);
        assert_eq!(Card::all().count(), RANK_COUNT);
    }

    #[test]
    fn test_invalid_ranks() {
        assert_matches!(Card::new(0), Err(MathematicoError::InvalidCard(0)));
        assert_matches!(Card::new(14), Err(MathematicoError::InvalidCard(14)));
    }

    #[test]
    fn test_serde_rejects_out_of_range() {
        let card: Card = serde_json::from_str("7").unwrap();
        assert_eq!(card.rank(), 7);
        assert!(serde_json::from_str::<Card>("42").is_err());
    }
}
