//! Selection policies for the chance/decision tree
//!
//! - Decision nodes: UCT over visited children, ties broken at random
//! - Chance nodes: a child is sampled according to the reveal probabilities
//!
//! Chance nodes are never scored with UCT; their value is an expectation, not a choice.

use crate::mcts::node::{Node, NodeId};
use crate::mcts::tree::SearchTree;
use rand::prelude::*;

/// Default exploration constant, `1/sqrt(2)`.
pub const DEFAULT_EXPLORATION: f64 = std::f64::consts::FRAC_1_SQRT_2;

/// UCT score of `child` seen from a parent with `parent_visits` visits.
///
/// Formula: W/N + c × sqrt(2 ln N_parent / (N / child_count_weight))
///
/// Unvisited children score `+inf` so they are tried before anything else.
pub fn uct_value(child: &Node, parent_visits: u64, exploration: f64) -> f64 {
    if child.visit_count() == 0 {
        return f64::INFINITY;
    }
    let visits = child.visit_count() as f64;
    let exploitation = child.total_reward() / visits;
    let weighted_visits = visits / child.child_count_weight();
    let exploration_term = (2.0 * (parent_visits.max(1) as f64).ln() / weighted_visits).sqrt();
    exploitation + exploration * exploration_term
}

/// Selects the child of decision node `id` with the highest UCT score
///
/// # Arguments
/// * `tree` - The search tree
/// * `id` - A decision node with at least one child
/// * `exploration` - Exploration constant `c`
/// * `rng` - Used to break exact ties
///
/// # Returns
/// The selected child, or None if `id` has no children
pub fn select_uct_child(
    tree: &SearchTree,
    id: NodeId,
    exploration: f64,
    rng: &mut StdRng,
) -> Option<NodeId> {
    let node = tree.node(id);
    let parent_visits = node.visit_count();

    let mut best_score = f64::NEG_INFINITY;
    let mut best: Vec<NodeId> = Vec::new();
    for edge in node.children() {
        let score = uct_value(tree.node(edge.child), parent_visits, exploration);
        if score > best_score {
            best_score = score;
            best.clear();
            best.push(edge.child);
        } else if score == best_score {
            best.push(edge.child);
        }
    }

    match best.len() {
        0 => None,
        1 => Some(best[0]),
        n => Some(best[rng.random_range(0..n)]),
    }
}

/// Samples a child of chance node `id` proportionally to its reveal probability
pub fn sample_chance_child(tree: &SearchTree, id: NodeId, rng: &mut StdRng) -> Option<NodeId> {
    let children = tree.node(id).children();
    let last = children.last()?;

    let mut remaining = rng.random_range(0.0..1.0);
    for edge in children {
        if remaining < edge.probability {
            return Some(edge.child);
        }
        remaining -= edge.probability;
    }
    // Rounding left a sliver past the last edge.
    Some(last.child)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::board::Position;
    use crate::game::state::{Action, GameState};
    use crate::game::test_support::card;
    use crate::mcts::tree::MoveFilter;

    fn place(row: usize, col: usize) -> Action {
        Action::Place(Position::new(row, col).unwrap())
    }

    #[test]
    fn test_unvisited_child_is_infinite() {
        let state = GameState::initial(card(2)).unwrap();
        let mut tree = SearchTree::new(state, MoveFilter::All).unwrap();
        let child = tree.expand_decision(tree.root(), place(0, 0)).unwrap();
        assert_eq!(uct_value(tree.node(child), 10, DEFAULT_EXPLORATION), f64::INFINITY);
    }

    #[test]
    fn test_uct_formula() {
        let state = GameState::initial(card(2)).unwrap();
        let mut tree = SearchTree::new(state, MoveFilter::All).unwrap();
        let child = tree.expand_decision(tree.root(), place(0, 0)).unwrap();
        tree.backpropagate(child, 30.0);
        tree.backpropagate(child, 50.0);

        let expected = 40.0 + 0.5 * (2.0 * (8.0f64).ln() / 2.0).sqrt();
        let got = uct_value(tree.node(child), 8, 0.5);
        assert!((got - expected).abs() < 1e-12);
    }

    #[test]
    fn test_select_prefers_higher_score() {
        let state = GameState::initial(card(2)).unwrap();
        let mut tree = SearchTree::new(state, MoveFilter::All).unwrap();
        let low = tree.expand_decision(tree.root(), place(0, 0)).unwrap();
        let high = tree.expand_decision(tree.root(), place(0, 1)).unwrap();
        tree.backpropagate(low, 10.0);
        tree.backpropagate(high, 90.0);

        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(
            select_uct_child(&tree, tree.root(), DEFAULT_EXPLORATION, &mut rng),
            Some(high)
        );
    }

    #[test]
    fn test_ties_are_broken_randomly() {
        let state = GameState::initial(card(2)).unwrap();
        let mut tree = SearchTree::new(state, MoveFilter::All).unwrap();
        let a = tree.expand_decision(tree.root(), place(0, 0)).unwrap();
        let b = tree.expand_decision(tree.root(), place(0, 1)).unwrap();
        tree.backpropagate(a, 20.0);
        tree.backpropagate(b, 20.0);

        let mut rng = StdRng::seed_from_u64(3);
        let picks: Vec<NodeId> = (0..64)
            .filter_map(|_| select_uct_child(&tree, tree.root(), DEFAULT_EXPLORATION, &mut rng))
            .collect();
        assert!(picks.contains(&a));
        assert!(picks.contains(&b));
    }

    #[test]
    fn test_chance_sampling_follows_probabilities() {
        let state = GameState::initial(card(2)).unwrap();
        let mut tree = SearchTree::new(state, MoveFilter::All).unwrap();
        let chance = tree.expand_decision(tree.root(), place(0, 0)).unwrap();
        tree.expand_chance(chance).unwrap();
        let twos = tree.child(chance, Action::Reveal(card(2))).unwrap();

        let mut rng = StdRng::seed_from_u64(5);
        let draws = 5000;
        let hits = (0..draws)
            .filter(|_| sample_chance_child(&tree, chance, &mut rng) == Some(twos))
            .count();
        // Three twos left among 51 cards.
        let ratio = hits as f64 / draws as f64;
        assert!((ratio - 3.0 / 51.0).abs() < 0.02, "ratio was {}", ratio);
    }

    #[test]
    fn test_no_children() {
        let state = GameState::initial(card(2)).unwrap();
        let tree = SearchTree::new(state, MoveFilter::All).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(select_uct_child(&tree, tree.root(), 1.0, &mut rng), None);
        assert_eq!(sample_chance_child(&tree, tree.root(), &mut rng), None);
    }
}
