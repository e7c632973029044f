//! Stochastic game-state abstraction searched by the MCTS engine.
//!
//! A game alternates two kinds of states:
//! - Decision states: a card has been revealed and must be placed on an empty cell
//! - Chance states: the next card is about to be revealed from the remaining deck
//!
//! The last placement fills the board and produces a terminal chance state, the
//! only kind of state carrying a reward.

use crate::game::board::{Board, Position};
use crate::game::card::{Card, COPIES_PER_RANK};
use crate::game::deck::Deck;
use crate::{MathematicoError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Tolerance used when checking that chance probabilities sum to one.
pub const PROBABILITY_EPSILON: f64 = 1e-9;

/// An engine action: where to place the pending card, or which card gets revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Action {
    Place(Position),
    Reveal(Card),
}

impl Action {
    pub fn position(self) -> Option<Position> {
        match self {
            Action::Place(position) => Some(position),
            Action::Reveal(_) => None,
        }
    }

    pub fn card(self) -> Option<Card> {
        match self {
            Action::Place(_) => None,
            Action::Reveal(card) => Some(card),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Place(position) => write!(f, "place {}", position),
            Action::Reveal(card) => write!(f, "reveal {}", card),
        }
    }
}

/// A revealed card waiting to be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DecisionState {
    pub board: Board,
    pub card: Card,
    pub deck: Deck,
}

/// The next card is not known yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChanceState {
    pub board: Board,
    pub deck: Deck,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameState {
    Decision(DecisionState),
    Chance(ChanceState),
}

/// One possible card reveal from a chance state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChanceOutcome {
    pub card: Card,
    pub state: GameState,
    pub probability: f64,
}

/// Result of applying an action.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Placing a card has exactly one successor.
    Deterministic(GameState),
    /// A reveal fans out to every card that may come next.
    Stochastic(Vec<ChanceOutcome>),
}

impl DecisionState {
    /// Places the pending card, yielding the following chance state.
    pub fn place(&self, position: Position) -> Result<ChanceState> {
        let mut board = self.board;
        board.make_move(position, self.card)?;
        Ok(ChanceState {
            board,
            deck: self.deck,
        })
    }
}

impl ChanceState {
    /// The decision state reached when `card` is revealed.
    pub fn reveal(&self, card: Card) -> Result<DecisionState> {
        let mut deck = self.deck;
        deck.remove(card)?;
        Ok(DecisionState {
            board: self.board,
            card,
            deck,
        })
    }

    /// Every card that may be revealed, with its probability.
    pub fn outcomes(&self) -> Result<Vec<ChanceOutcome>> {
        let total = self.deck.total();
        if total == 0 {
            return Err(MathematicoError::InvalidState(
                "chance state with an empty deck".to_string(),
            ));
        }
        self.deck
            .ranks()
            .map(|card| {
                Ok(ChanceOutcome {
                    card,
                    state: GameState::Decision(self.reveal(card)?),
                    probability: self.deck.count(card) as f64 / total as f64,
                })
            })
            .collect()
    }
}

impl GameState {
    /// Start of a game: empty board, `card` revealed.
    pub fn initial(card: Card) -> Result<Self> {
        GameState::decision(Board::empty(), card)
    }

    /// A decision state whose deck is derived from the cards already on `board`.
    pub fn decision(board: Board, card: Card) -> Result<Self> {
        if board.is_full() {
            return Err(MathematicoError::InvalidState(
                "cannot reveal a card onto a full board".to_string(),
            ));
        }
        let mut deck = Deck::from_board(&board)?;
        deck.remove(card).map_err(|_| {
            MathematicoError::InvalidState(format!(
                "all {} copies of {} are already on the board",
                COPIES_PER_RANK, card
            ))
        })?;
        Ok(GameState::Decision(DecisionState { board, card, deck }))
    }

    /// A chance state whose deck is derived from the cards already on `board`.
    pub fn chance(board: Board) -> Result<Self> {
        let deck = Deck::from_board(&board)?;
        Ok(GameState::Chance(ChanceState { board, deck }))
    }

    pub fn board(&self) -> &Board {
        match self {
            GameState::Decision(s) => &s.board,
            GameState::Chance(s) => &s.board,
        }
    }

    pub fn deck(&self) -> &Deck {
        match self {
            GameState::Decision(s) => &s.deck,
            GameState::Chance(s) => &s.deck,
        }
    }

    pub fn pending_card(&self) -> Option<Card> {
        match self {
            GameState::Decision(s) => Some(s.card),
            GameState::Chance(_) => None,
        }
    }

    pub fn is_chance(&self) -> bool {
        matches!(self, GameState::Chance(_))
    }

    pub fn is_terminal(&self) -> bool {
        self.board().is_full()
    }

    pub fn legal_actions(&self) -> Result<Vec<Action>> {
        if self.is_terminal() {
            return Err(MathematicoError::InvalidState(
                "no actions at a terminal state".to_string(),
            ));
        }
        Ok(match self {
            GameState::Decision(s) => s
                .board
                .possible_moves()
                .into_iter()
                .map(Action::Place)
                .collect(),
            GameState::Chance(s) => s.deck.ranks().map(Action::Reveal).collect(),
        })
    }

    /// Applies `action`.
    ///
    /// At a chance state the caller does not pick the card: any legal `Reveal`
    /// returns the whole distribution of reveals. Use [`GameState::reveal`] to
    /// follow one known card.
    pub fn apply(&self, action: Action) -> Result<Transition> {
        if self.is_terminal() {
            return Err(MathematicoError::InvalidState(
                "cannot act on a terminal state".to_string(),
            ));
        }
        match (self, action) {
            (GameState::Decision(s), Action::Place(position)) => {
                Ok(Transition::Deterministic(GameState::Chance(s.place(position)?)))
            }
            (GameState::Chance(s), Action::Reveal(card)) => {
                if s.deck.count(card) == 0 {
                    return Err(MathematicoError::IllegalAction(format!(
                        "{} cannot be revealed, no copy left",
                        card
                    )));
                }
                Ok(Transition::Stochastic(s.outcomes()?))
            }
            (state, action) => Err(MathematicoError::IllegalAction(format!(
                "{} is not playable at a {} state",
                action,
                if state.is_chance() { "chance" } else { "decision" }
            ))),
        }
    }

    /// Follows one concrete reveal from a chance state.
    pub fn reveal(&self, card: Card) -> Result<GameState> {
        match self {
            GameState::Chance(s) if !self.is_terminal() => Ok(GameState::Decision(s.reveal(card)?)),
            GameState::Chance(_) => Err(MathematicoError::InvalidState(
                "cannot reveal a card on a full board".to_string(),
            )),
            GameState::Decision(_) => Err(MathematicoError::IllegalAction(
                "a card is already pending".to_string(),
            )),
        }
    }

    pub fn reward(&self) -> Result<f64> {
        if !self.is_terminal() {
            return Err(MathematicoError::NotTerminal(format!(
                "{} of 25 cells filled",
                self.board().occupied_cell_count()
            )));
        }
        Ok(self.board().score())
    }

    /// Checks the card-count invariant: board + deck + pending = 4 for every rank.
    pub fn check_invariants(&self) -> Result<()> {
        for card in Card::all() {
            let pending = usize::from(self.pending_card() == Some(card));
            let seen = self.board().count_of(card) + self.deck().count(card) as usize + pending;
            if seen != COPIES_PER_RANK as usize {
                return Err(MathematicoError::InvalidState(format!(
                    "rank {} accounts for {} cards instead of {}",
                    card, seen, COPIES_PER_RANK
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.board())?;
        if let Some(card) = self.pending_card() {
            writeln!(f, "card: {}", card)?;
        }
        write!(f, "deck:")?;
        for card in self.deck().ranks() {
            write!(f, " {}x{}", card, self.deck().count(card))?;
        }
        writeln!(f)
    }
}
