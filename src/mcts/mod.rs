pub mod algorithm;
pub mod clock;
pub mod config;
pub mod mcts_result;
pub mod node;
pub mod parallel;
pub mod rollout;
pub mod selection;
pub mod tree;

pub use algorithm::{best_action, DriverPhase, Mcts};
pub use config::MctsConfig;
pub use mcts_result::{ActionStats, SearchResult};
pub use rollout::{RandomRollout, RolloutKind, RolloutPolicy, StaticEvaluation};
pub use tree::{MoveFilter, SearchTree};
