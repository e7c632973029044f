//! # Mathematico
//!
//! Monte Carlo Tree Search engine for Mathematico, the 5×5 card placement game.
//!
//! ## Features
//!
//! - **Game Engine**: cards, board, deck and the chance/decision game states
//! - **AI Engine**: MCTS with UCT selection, chance nodes and subtree reuse
//! - **Scoring**: row, column and diagonal combinations
//! - **Symmetry**: score-preserving board maps for move deduplication
//!
//! ## Usage
//!
//! ```rust,no_run
//! use mathematico::{
//!     game::{Card, GameState},
//!     mcts::{Mcts, MctsConfig, RandomRollout},
//! };
//!
//! let policy = RandomRollout;
//! let config = MctsConfig::default().with_max_iterations(Some(2000));
//! let mut mcts = Mcts::new(config, &policy)?;
//! let state = GameState::initial(Card::new(7)?)?;
//! let result = mcts.choose_action(&state)?;
//! println!("{} (expected {:.1})", result.action, result.value);
//! # Ok::<(), mathematico::MathematicoError>(())
//! ```

// ============================================================================
// PUBLIC API MODULES
// ============================================================================

/// Core game logic and rules
pub mod game;

/// Monte Carlo Tree Search AI engine
pub mod mcts;

/// Scoring rules
pub mod scoring;

/// Score-preserving board symmetries
pub mod symmetry;

/// Game records
pub mod recording;

/// Logger setup for binaries
pub mod logging;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Main error type for the Mathematico library
#[derive(Debug, thiserror::Error)]
pub enum MathematicoError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("State is not terminal: {0}")]
    NotTerminal(String),

    #[error("Already expanded: {0}")]
    AlreadyExpanded(String),

    #[error("Search exhausted: {0}")]
    SearchExhausted(String),

    #[error("Invalid card rank {0}, expected 1-13")]
    InvalidCard(u8),

    #[error("Illegal action: {0}")]
    IllegalAction(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, MathematicoError>;

// ============================================================================
// LIBRARY VERSION INFO
// ============================================================================

/// Library version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Library description
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
