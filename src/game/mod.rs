pub mod board;
pub mod card;
pub mod deck;
pub mod player;
pub mod simulate_game;
pub mod state;

#[cfg(test)]
pub(crate) mod test_support;

pub use board::{Board, Position};
pub use card::Card;
pub use deck::Deck;
pub use player::{MctsPlayer, Player, RandomPlayer};
pub use simulate_game::play_game;
pub use state::{Action, ChanceOutcome, GameState, Transition};
