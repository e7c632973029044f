//! MCTS search configuration
//!
//! Every field has a serde default, so a config file only needs the values it
//! overrides:
//!
//! ```json
//! { "max_iterations": 5000, "seed": 7, "rollout": "random" }
//! ```

use crate::mcts::rollout::RolloutKind;
use crate::mcts::selection::DEFAULT_EXPLORATION;
use crate::mcts::tree::MoveFilter;
use crate::{MathematicoError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// MCTS search configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MctsConfig {
    /// Wall-clock budget per move in milliseconds; `None` means unlimited.
    /// Checked between iterations only.
    #[serde(default)]
    pub max_time_ms: Option<u64>,

    /// Iteration budget per move; `None` means unlimited.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: Option<u64>,

    /// UCT exploration constant `c`.
    /// Default: 1/sqrt(2)
    #[serde(default = "default_exploration_constant")]
    pub exploration_constant: f64,

    /// RNG seed; `None` seeds from OS entropy.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Keep the subtree of the played move for the next search.
    #[serde(default = "default_reuse_tree")]
    pub reuse_tree: bool,

    /// Only search one placement per class of symmetric boards.
    #[serde(default)]
    pub deduplicate_symmetric_moves: bool,

    #[serde(default)]
    pub rollout: RolloutKind,
}

fn default_max_iterations() -> Option<u64> {
    Some(1000)
}

fn default_exploration_constant() -> f64 {
    DEFAULT_EXPLORATION
}

fn default_reuse_tree() -> bool {
    true
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            max_time_ms: None,
            max_iterations: default_max_iterations(),
            exploration_constant: default_exploration_constant(),
            seed: None,
            reuse_tree: default_reuse_tree(),
            deduplicate_symmetric_moves: false,
            rollout: RolloutKind::default(),
        }
    }
}

impl MctsConfig {
    /// Load configuration from a JSON file and validate it.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let config: MctsConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn with_max_iterations(mut self, iterations: Option<u64>) -> Self {
        self.max_iterations = iterations;
        self
    }

    pub fn with_max_time_ms(mut self, millis: Option<u64>) -> Self {
        self.max_time_ms = millis;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_exploration_constant(mut self, c: f64) -> Self {
        self.exploration_constant = c;
        self
    }

    pub fn with_rollout(mut self, rollout: RolloutKind) -> Self {
        self.rollout = rollout;
        self
    }

    pub fn with_symmetry_deduplication(mut self, enabled: bool) -> Self {
        self.deduplicate_symmetric_moves = enabled;
        self
    }

    pub fn with_tree_reuse(mut self, enabled: bool) -> Self {
        self.reuse_tree = enabled;
        self
    }

    pub fn max_time(&self) -> Option<Duration> {
        self.max_time_ms.map(Duration::from_millis)
    }

    pub fn move_filter(&self) -> MoveFilter {
        if self.deduplicate_symmetric_moves {
            MoveFilter::SymmetryReduced
        } else {
            MoveFilter::All
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_time_ms.is_none() && self.max_iterations.is_none() {
            return Err(MathematicoError::Config(
                "either a time or an iteration budget is required".to_string(),
            ));
        }
        if self.max_iterations == Some(0) {
            return Err(MathematicoError::Config(
                "max_iterations must allow at least one iteration".to_string(),
            ));
        }
        if self.max_time_ms == Some(0) {
            return Err(MathematicoError::Config(
                "max_time_ms must be positive".to_string(),
            ));
        }
        if !self.exploration_constant.is_finite() || self.exploration_constant < 0.0 {
            return Err(MathematicoError::Config(format!(
                "exploration_constant must be a finite non-negative number, got {}",
                self.exploration_constant
            )));
        }
        Ok(())
    }

    /// One-line summary for logs.
    pub fn to_config_string(&self) -> String {
        let budget = |v: Option<u64>| v.map_or_else(|| "unlimited".to_string(), |v| v.to_string());
        format!(
            "iterations={} time_ms={} c={:.3} seed={} reuse={} symmetry={} rollout={:?}",
            budget(self.max_iterations),
            budget(self.max_time_ms),
            self.exploration_constant,
            self.seed.map_or_else(|| "entropy".to_string(), |s| s.to_string()),
            self.reuse_tree,
            self.deduplicate_symmetric_moves,
            self.rollout
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_default_is_valid() {
        let config = MctsConfig::default();
        config.validate().unwrap();
        assert_eq!(config.max_iterations, Some(1000));
        assert!((config.exploration_constant - 0.5f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_zero_iterations_rejected() {
        let config = MctsConfig::default().with_max_iterations(Some(0));
        assert_matches!(config.validate(), Err(MathematicoError::Config(_)));
    }

    #[test]
    fn test_missing_budget_rejected() {
        let config = MctsConfig::default().with_max_iterations(None);
        assert_matches!(config.validate(), Err(MathematicoError::Config(_)));

        let timed = config.with_max_time_ms(Some(50));
        timed.validate().unwrap();
        assert_eq!(timed.max_time(), Some(Duration::from_millis(50)));
    }

    #[test]
    fn test_negative_exploration_rejected() {
        let config = MctsConfig::default().with_exploration_constant(-1.0);
        assert_matches!(config.validate(), Err(MathematicoError::Config(_)));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config =
            MctsConfig::from_json(r#"{"max_iterations": 250, "rollout": "static"}"#).unwrap();
        assert_eq!(config.max_iterations, Some(250));
        assert_eq!(config.rollout, RolloutKind::Static);
        assert!(config.reuse_tree);
        assert_eq!(config.move_filter(), MoveFilter::All);
    }

    #[test]
    fn test_invalid_json() {
        assert_matches!(
            MctsConfig::from_json("{ not json"),
            Err(MathematicoError::Json(_))
        );
        assert_matches!(
            MctsConfig::from_json(r#"{"max_iterations": 0}"#),
            Err(MathematicoError::Config(_))
        );
    }

    #[test]
    fn test_config_string_mentions_budget() {
        let summary = MctsConfig::default().with_seed(Some(3)).to_config_string();
        assert!(summary.contains("iterations=1000"));
        assert!(summary.contains("seed=3"));
        assert!(summary.contains("time_ms=unlimited"));
    }
}
