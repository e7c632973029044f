//! Root-parallel and batch searches on the rayon pool.
//!
//! Workers never share a tree: each one owns an independent [`Mcts`] with its
//! own seed, and only the finished root statistics are combined.

use crate::game::state::{Action, GameState};
use crate::mcts::algorithm::Mcts;
use crate::mcts::config::MctsConfig;
use crate::mcts::mcts_result::{ActionStats, SearchResult};
use crate::mcts::rollout::RolloutPolicy;
use crate::{MathematicoError, Result};
use log::debug;
use rand::prelude::*;
use rayon::prelude::*;
use std::time::Instant;

fn base_seed(config: &MctsConfig) -> u64 {
    config.seed.unwrap_or_else(|| rand::rng().random())
}

/// Runs `workers` independent searches of `state` and merges their root statistics
///
/// Worker `i` is seeded with `seed + i`. Per-action values are combined as a
/// visit-weighted mean; the merged action with the highest value wins, ties
/// going to the action seen first. A chance root reports the mean of the
/// workers' expectations.
pub fn search_root_parallel(
    state: &GameState,
    config: &MctsConfig,
    policy: &dyn RolloutPolicy,
    workers: usize,
) -> Result<SearchResult> {
    if workers == 0 {
        return Err(MathematicoError::Config(
            "root-parallel search needs at least one worker".to_string(),
        ));
    }
    config.validate()?;
    let seed = base_seed(config);
    let start = Instant::now();

    let results: Vec<SearchResult> = (0..workers as u64)
        .into_par_iter()
        .map(|worker| {
            let worker_config = config.clone().with_seed(Some(seed.wrapping_add(worker)));
            Mcts::new(worker_config, policy)?.choose_action(state)
        })
        .collect::<Result<Vec<_>>>()?;

    let merged = merge_action_stats(&results);
    let mut visited = merged.iter().filter(|s| s.visits > 0);
    // Reveals all share the root expectation, so a chance root keeps the first one.
    let best = if state.is_chance() {
        visited.next().copied()
    } else {
        visited.fold(None::<ActionStats>, |best, s| match best {
            Some(b) if b.value >= s.value => Some(b),
            _ => Some(*s),
        })
    }
    .ok_or_else(|| {
        MathematicoError::SearchExhausted("no worker visited a root action".to_string())
    })?;

    let value = if state.is_chance() {
        results.iter().map(|r| r.value).sum::<f64>() / results.len() as f64
    } else {
        best.value
    };

    debug!(
        "root-parallel search with {} workers chose {} (value {:.2})",
        workers, best.action, value
    );

    Ok(SearchResult {
        action: best.action,
        value,
        iterations: results.iter().map(|r| r.iterations).sum(),
        elapsed: start.elapsed(),
        root_visits: results.iter().map(|r| r.root_visits).sum(),
        action_stats: merged,
    })
}

fn merge_action_stats(results: &[SearchResult]) -> Vec<ActionStats> {
    let mut order: Vec<Action> = Vec::new();
    let mut totals: Vec<(u64, f64)> = Vec::new();

    for stats in results.iter().flat_map(|r| r.action_stats.iter()) {
        let index = match order.iter().position(|&a| a == stats.action) {
            Some(index) => index,
            None => {
                order.push(stats.action);
                totals.push((0, 0.0));
                order.len() - 1
            }
        };
        let (visits, weighted) = &mut totals[index];
        *visits += stats.visits;
        *weighted += stats.value * stats.visits as f64;
    }

    order
        .into_iter()
        .zip(totals)
        .map(|(action, (visits, weighted))| ActionStats {
            action,
            visits,
            value: if visits > 0 {
                weighted / visits as f64
            } else {
                0.0
            },
        })
        .collect()
}

/// Searches every state independently; state `i` is searched with seed `seed + i`.
pub fn choose_actions_batch(
    states: &[GameState],
    config: &MctsConfig,
    policy: &dyn RolloutPolicy,
) -> Result<Vec<SearchResult>> {
    config.validate()?;
    let seed = base_seed(config);

    states
        .par_iter()
        .enumerate()
        .map(|(index, state)| {
            let state_config = config
                .clone()
                .with_seed(Some(seed.wrapping_add(index as u64)));
            Mcts::new(state_config, policy)?.choose_action(state)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::board::{Board, Position};
    use crate::game::test_support::{card, nearly_full_board};
    use crate::mcts::rollout::RandomRollout;
    use assert_matches::assert_matches;

    fn config(iterations: u64) -> MctsConfig {
        MctsConfig::default()
            .with_max_iterations(Some(iterations))
            .with_seed(Some(21))
    }

    #[test]
    fn test_parallel_visits_add_up() {
        let state = GameState::initial(card(10)).unwrap();
        let result = search_root_parallel(&state, &config(200), &RandomRollout, 4).unwrap();

        assert_eq!(result.iterations, 800);
        assert_eq!(result.root_visits, 800);
        let visits: u64 = result.action_stats.iter().map(|s| s.visits).sum();
        assert_eq!(visits, 800);
        assert!(result.action.position().is_some());
    }

    #[test]
    fn test_parallel_is_deterministic_with_seed() {
        let state = GameState::initial(card(10)).unwrap();
        let a = search_root_parallel(&state, &config(150), &RandomRollout, 3).unwrap();
        let b = search_root_parallel(&state, &config(150), &RandomRollout, 3).unwrap();
        assert_eq!(a.action, b.action);
        assert_eq!(a.action_stats, b.action_stats);
    }

    #[test]
    fn test_parallel_chance_root_keeps_first_reveal() {
        let mut board = Board::empty();
        board.make_move(Position::new(2, 2).unwrap(), card(10)).unwrap();
        let state = GameState::chance(board).unwrap();
        let result = search_root_parallel(&state, &config(300), &RandomRollout, 3).unwrap();

        let first = result.action_stats.iter().find(|s| s.visits > 0).unwrap();
        assert_eq!(result.action, first.action);
        assert!(result.value.is_finite());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let state = GameState::initial(card(10)).unwrap();
        assert_matches!(
            search_root_parallel(&state, &config(10), &RandomRollout, 0),
            Err(MathematicoError::Config(_))
        );
    }

    #[test]
    fn test_batch_keeps_state_order() {
        let states = vec![
            GameState::decision(nearly_full_board(), card(7)).unwrap(),
            GameState::initial(card(1)).unwrap(),
        ];
        let results = choose_actions_batch(&states, &config(100), &RandomRollout).unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(
            results[0].action,
            Action::Place(Position::new(4, 4).unwrap())
        );
        assert_eq!(results[1].root_visits, 100);
    }
}
