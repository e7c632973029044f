//! MCTS driver for the chance/decision game tree
//!
//! Each iteration runs the four classic phases:
//! 1. Selection: UCT at decision nodes, probability sampling at chance nodes
//! 2. Expansion: one random untried placement, or every reveal of a chance node at once
//! 3. Simulation: the injected [`RolloutPolicy`] estimates the new node
//! 4. Backpropagation: the estimate is added to every node up to the root
//!
//! The search stops when the iteration or time budget runs out. The budget is
//! checked after each iteration, so at least one iteration always runs.

use crate::game::card::Card;
use crate::game::state::{Action, GameState};
use crate::mcts::clock::{Clock, MonotonicClock};
use crate::mcts::config::MctsConfig;
use crate::mcts::mcts_result::{ActionStats, SearchResult};
use crate::mcts::node::{NodeId, NodeKind};
use crate::mcts::rollout::RolloutPolicy;
use crate::mcts::selection::{sample_chance_child, select_uct_child};
use crate::mcts::tree::SearchTree;
use crate::{MathematicoError, Result};
use log::{debug, trace};
use rand::prelude::*;
use std::fmt;

/// Where the driver currently is within an iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverPhase {
    Idle,
    Selecting,
    Expanding,
    Simulating,
    Backpropagating,
}

/// MCTS search engine
pub struct Mcts<'p> {
    config: MctsConfig,
    policy: &'p dyn RolloutPolicy,
    clock: Box<dyn Clock>,
    rng: StdRng,
    phase: DriverPhase,
}

impl fmt::Debug for Mcts<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mcts")
            .field("config", &self.config)
            .field("policy", &self.policy.name())
            .field("phase", &self.phase)
            .finish()
    }
}

impl<'p> Mcts<'p> {
    /// Creates a new engine
    ///
    /// # Arguments
    /// * `config` - Search budget and options, validated here
    /// * `policy` - Leaf evaluation shared by every iteration
    pub fn new(config: MctsConfig, policy: &'p dyn RolloutPolicy) -> Result<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::seed_from_u64(rand::rng().random()),
        };
        Ok(Self {
            config,
            policy,
            clock: Box::new(MonotonicClock::new()),
            rng,
            phase: DriverPhase::Idle,
        })
    }

    /// Replaces the time source.
    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    pub fn phase(&self) -> DriverPhase {
        self.phase
    }

    /// Searches `state` from a fresh tree.
    pub fn choose_action(&mut self, state: &GameState) -> Result<SearchResult> {
        let mut tree = SearchTree::new(*state, self.config.move_filter())?;
        self.search_tree(&mut tree)
    }

    /// Searches the decision state reached when `revealed` is drawn below the
    /// root of `tree`, reusing the matching subtree.
    ///
    /// # Returns
    /// The search result and the tree re-rooted past the chosen action,
    /// ready for the next reveal
    pub fn choose_action_continuing(
        &mut self,
        tree: SearchTree,
        revealed: Card,
    ) -> Result<(SearchResult, SearchTree)> {
        let state = tree.root_node().state().reveal(revealed)?;
        self.search_from(Some(tree), &state)
    }

    /// Searches `state`, reusing `previous` when it contains the state and
    /// tree reuse is enabled.
    pub fn search_from(
        &mut self,
        previous: Option<SearchTree>,
        state: &GameState,
    ) -> Result<(SearchResult, SearchTree)> {
        let previous = if self.config.reuse_tree { previous } else { None };
        let mut tree = SearchTree::root_for(previous, state, self.config.move_filter())?;
        let result = self.search_tree(&mut tree)?;

        let next = tree.advance(result.action).ok_or_else(|| {
            MathematicoError::InvalidState(format!(
                "chosen action {} is not a root edge",
                result.action
            ))
        })?;
        Ok((result, next))
    }

    /// Runs iterations on `tree` until the budget is spent, then extracts the best root action.
    pub fn search_tree(&mut self, tree: &mut SearchTree) -> Result<SearchResult> {
        if tree.root_node().is_terminal() {
            return Err(MathematicoError::InvalidState(
                "cannot search from a terminal state".to_string(),
            ));
        }

        self.clock.restart();
        let outcome = self.run_budget(tree);
        self.set_phase(DriverPhase::Idle);
        let iterations = outcome?;
        let elapsed = self.clock.elapsed();

        let (best, action_stats) = best_action(tree)?;
        debug!(
            "search finished: {} after {} iterations in {:?} (value {:.2}, tree size {})",
            best.action,
            iterations,
            elapsed,
            best.value,
            tree.len()
        );

        Ok(SearchResult {
            action: best.action,
            value: best.value,
            iterations,
            elapsed,
            root_visits: tree.root_node().visit_count(),
            action_stats,
        })
    }

    /// Iterates until the budget is spent; returns the number of iterations run.
    fn run_budget(&mut self, tree: &mut SearchTree) -> Result<u64> {
        let mut iterations = 0u64;
        loop {
            self.run_iteration(tree)?;
            iterations += 1;
            if !self.within_budget(iterations) {
                return Ok(iterations);
            }
        }
    }

    fn within_budget(&self, iterations: u64) -> bool {
        if let Some(limit) = self.config.max_iterations {
            if iterations >= limit {
                return false;
            }
        }
        if let Some(limit) = self.config.max_time() {
            if self.clock.elapsed() >= limit {
                return false;
            }
        }
        true
    }

    /// One select, expand, simulate, backpropagate pass.
    pub fn run_iteration(&mut self, tree: &mut SearchTree) -> Result<()> {
        let leaf = self.select(tree)?;

        self.set_phase(DriverPhase::Simulating);
        let reward = self.policy.estimate(tree.node(leaf).state(), &mut self.rng)?;

        self.set_phase(DriverPhase::Backpropagating);
        tree.backpropagate(leaf, reward);
        Ok(())
    }

    /// Walks down from the root; expands the first node that is not fully expanded.
    fn select(&mut self, tree: &mut SearchTree) -> Result<NodeId> {
        self.set_phase(DriverPhase::Selecting);
        let exploration = self.config.exploration_constant;
        let mut id = tree.root();
        loop {
            let node = tree.node(id);
            if node.is_terminal() {
                return Ok(id);
            }
            if !node.is_fully_expanded() {
                return self.expand(tree, id);
            }
            let next = match node.kind() {
                NodeKind::Decision => select_uct_child(tree, id, exploration, &mut self.rng),
                NodeKind::Chance => sample_chance_child(tree, id, &mut self.rng),
            };
            id = next.ok_or_else(|| {
                MathematicoError::InvalidState(format!(
                    "fully expanded node {} has no children",
                    id
                ))
            })?;
        }
    }

    fn expand(&mut self, tree: &mut SearchTree, id: NodeId) -> Result<NodeId> {
        self.set_phase(DriverPhase::Expanding);
        match tree.node(id).kind() {
            NodeKind::Decision => {
                let untried = tree.node(id).untried_actions();
                if untried.is_empty() {
                    return Err(MathematicoError::InvalidState(format!(
                        "decision node {} has nothing left to expand",
                        id
                    )));
                }
                let action = untried[self.rng.random_range(0..untried.len())];
                tree.expand_decision(id, action)
            }
            NodeKind::Chance => {
                tree.expand_chance(id)?;
                sample_chance_child(tree, id, &mut self.rng).ok_or_else(|| {
                    MathematicoError::InvalidState(format!(
                        "chance node {} expanded without outcomes",
                        id
                    ))
                })
            }
        }
    }

    fn set_phase(&mut self, phase: DriverPhase) {
        if self.phase != phase {
            trace!("{:?} -> {:?}", self.phase, phase);
            self.phase = phase;
        }
    }
}

/// Statistics of every materialized root action, in expansion order.
///
/// The value of each action is the mean reward of its child.
pub fn root_action_stats(tree: &SearchTree) -> Vec<ActionStats> {
    tree.root_node()
        .children()
        .iter()
        .map(|edge| {
            let child = tree.node(edge.child);
            ActionStats {
                action: edge.action,
                visits: child.visit_count(),
                value: child.average_value(),
            }
        })
        .collect()
}

/// Picks the visited root action with the highest value without touching the tree.
///
/// Ties go to the earliest expanded action, so calling this twice on the same
/// tree returns the same answer. At a chance root every reveal leads to the
/// same distribution, so they all share its expectation over the visited
/// reveals and the earliest visited one is returned.
pub fn best_action(tree: &SearchTree) -> Result<(ActionStats, Vec<ActionStats>)> {
    let stats = root_action_stats(tree);
    let mut visited = stats.iter().filter(|s| s.visits > 0);

    let best = match tree.root_node().kind() {
        NodeKind::Decision => visited.fold(None::<ActionStats>, |best, candidate| match best {
            Some(b) if b.value >= candidate.value => Some(b),
            _ => Some(*candidate),
        }),
        NodeKind::Chance => visited.next().map(|first| ActionStats {
            value: chance_expectation(tree),
            ..*first
        }),
    };
    let best = best.ok_or_else(|| {
        MathematicoError::SearchExhausted("no root action has been visited".to_string())
    })?;
    Ok((best, stats))
}

/// Probability-weighted mean of the visited reveals below a chance root.
fn chance_expectation(tree: &SearchTree) -> f64 {
    let (weighted, mass) = tree
        .root_node()
        .children()
        .iter()
        .filter(|edge| tree.node(edge.child).visit_count() > 0)
        .fold((0.0, 0.0), |(sum, mass), edge| {
            (
                sum + edge.probability * tree.node(edge.child).average_value(),
                mass + edge.probability,
            )
        });
    weighted / mass
}

/// Convenience for callers that only need the action.
pub fn best_root_action(tree: &SearchTree) -> Result<Action> {
    best_action(tree).map(|(best, _)| best.action)
}
