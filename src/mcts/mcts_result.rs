use crate::game::state::Action;
use serde::Serialize;
use std::time::Duration;

/// Root statistics for one action.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ActionStats {
    pub action: Action,
    pub visits: u64,
    /// Mean reward of the child reached by `action`.
    pub value: f64,
}

/// Outcome of one search.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub action: Action,
    /// Expected final score of `action`; at a chance root, the expectation over reveals.
    pub value: f64,
    pub iterations: u64,
    #[serde(serialize_with = "serialize_millis")]
    pub elapsed: Duration,
    pub root_visits: u64,
    /// Root actions in expansion order.
    pub action_stats: Vec<ActionStats>,
}

impl SearchResult {
    pub fn stats_for(&self, action: Action) -> Option<&ActionStats> {
        self.action_stats.iter().find(|s| s.action == action)
    }

    pub fn iterations_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.iterations as f64 / secs
        } else {
            0.0
        }
    }
}

fn serialize_millis<S: serde::Serializer>(
    duration: &Duration,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.serialize_u64(duration.as_millis() as u64)
}
