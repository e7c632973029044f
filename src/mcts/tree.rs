//! Arena-backed search tree.
//!
//! Children are owned through the arena and addressed by [`NodeId`]; parent
//! links are plain indices used for backpropagation. Re-rooting rebuilds the
//! arena from the kept subtree so discarded siblings are released.

use crate::game::state::{Action, GameState, Transition};
use crate::mcts::node::{Edge, Node, NodeId, NodeKind};
use crate::symmetry::deduplicate_moves;
use crate::{MathematicoError, Result};
use serde::{Deserialize, Serialize};
use std::fmt::Write;

/// Which placements a decision node considers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveFilter {
    /// Every empty cell.
    #[default]
    All,
    /// One representative per class of symmetry-equivalent resulting boards.
    SymmetryReduced,
}

#[derive(Debug, Clone)]
pub struct SearchTree {
    nodes: Vec<Node>,
    root: NodeId,
    move_filter: MoveFilter,
}

impl SearchTree {
    pub fn new(state: GameState, move_filter: MoveFilter) -> Result<Self> {
        let root = make_node(state, None, 1.0, move_filter)?;
        Ok(SearchTree {
            nodes: vec![root],
            root: 0,
            move_filter,
        })
    }

    /// Reuses `previous` when `state` is its root, a root child, or a root
    /// grandchild; otherwise starts from a fresh root.
    pub fn root_for(
        previous: Option<SearchTree>,
        state: &GameState,
        move_filter: MoveFilter,
    ) -> Result<Self> {
        if let Some(tree) = previous {
            if tree.move_filter == move_filter {
                if let Some(id) = tree.find_near_root(state) {
                    log::debug!(
                        "reusing subtree with {} visits",
                        tree.node(id).visit_count()
                    );
                    return Ok(tree.into_subtree(id));
                }
            }
            log::debug!("previous tree does not contain the new state, starting fresh");
        }
        SearchTree::new(*state, move_filter)
    }

    fn find_near_root(&self, state: &GameState) -> Option<NodeId> {
        let root = self.root_node();
        if root.state() == state {
            return Some(self.root);
        }
        for edge in root.children() {
            let child = self.node(edge.child);
            if child.state() == state {
                return Some(edge.child);
            }
            for grand in child.children() {
                if self.node(grand.child).state() == state {
                    return Some(grand.child);
                }
            }
        }
        None
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn root_node(&self) -> &Node {
        &self.nodes[self.root]
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn move_filter(&self) -> MoveFilter {
        self.move_filter
    }

    /// Child reached from `id` by `action`.
    pub fn child(&self, id: NodeId, action: Action) -> Option<NodeId> {
        self.node(id).edge(action).map(|edge| edge.child)
    }

    pub fn depth_of(&self, mut id: NodeId) -> usize {
        let mut depth = 0;
        while let Some(parent) = self.node(id).parent() {
            id = parent;
            depth += 1;
        }
        depth
    }

    /// Memoizes the child reached by `action`. Each action may be added once.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        action: Action,
        state: GameState,
        probability: f64,
        child_count_weight: f64,
    ) -> Result<NodeId> {
        if self.nodes[parent].edge(action).is_some() {
            return Err(MathematicoError::AlreadyExpanded(format!(
                "{} already has a child at node {}",
                action, parent
            )));
        }
        if !self.nodes[parent].take_untried(action) {
            return Err(MathematicoError::IllegalAction(format!(
                "{} is not an untried action of node {}",
                action, parent
            )));
        }

        let node = make_node(state, Some(parent), child_count_weight, self.move_filter)?;
        let child = self.nodes.len();
        self.nodes.push(node);

        let parent_node = &mut self.nodes[parent];
        parent_node.children.push(Edge {
            action,
            child,
            probability,
        });
        if parent_node.untried.is_empty() {
            parent_node.mark_fully_expanded();
        }
        Ok(child)
    }

    /// Materializes the placement `action` below decision node `parent`.
    pub fn expand_decision(&mut self, parent: NodeId, action: Action) -> Result<NodeId> {
        let node = self.node(parent);
        if node.kind() != NodeKind::Decision {
            return Err(MathematicoError::InvalidState(format!(
                "node {} is not a decision node",
                parent
            )));
        }
        let transition = node.state().apply(action)?;
        match transition {
            Transition::Deterministic(next) => self.add_child(parent, action, next, 1.0, 1.0),
            Transition::Stochastic(_) => Err(MathematicoError::InvalidState(
                "placement produced a chance distribution".to_string(),
            )),
        }
    }

    /// Materializes every reveal below chance node `parent` in one step.
    pub fn expand_chance(&mut self, parent: NodeId) -> Result<Vec<NodeId>> {
        let node = self.node(parent);
        if node.kind() != NodeKind::Chance {
            return Err(MathematicoError::InvalidState(format!(
                "node {} is not a chance node",
                parent
            )));
        }
        if !node.is_leaf() || node.is_fully_expanded() {
            return Err(MathematicoError::AlreadyExpanded(format!(
                "chance node {} is already expanded",
                parent
            )));
        }
        let deck = *node.state().deck();
        let first = node.untried_actions()[0];
        let outcomes = match node.state().apply(first)? {
            Transition::Stochastic(outcomes) => outcomes,
            Transition::Deterministic(_) => {
                return Err(MathematicoError::InvalidState(
                    "reveal produced a single successor".to_string(),
                ))
            }
        };

        let mut children = Vec::with_capacity(outcomes.len());
        for outcome in outcomes {
            let weight = deck.count(outcome.card) as f64;
            children.push(self.add_child(
                parent,
                Action::Reveal(outcome.card),
                outcome.state,
                outcome.probability,
                weight,
            )?);
        }
        Ok(children)
    }

    /// Adds one visit and `reward` to every node from `leaf` up to the root.
    pub fn backpropagate(&mut self, leaf: NodeId, reward: f64) {
        let mut current = Some(leaf);
        while let Some(id) = current {
            let node = &mut self.nodes[id];
            node.record(reward);
            current = node.parent;
        }
    }

    /// Re-roots the tree at the root child reached by `action`.
    pub fn advance(self, action: Action) -> Option<SearchTree> {
        let child = self.child(self.root, action)?;
        Some(self.into_subtree(child))
    }

    /// Keeps only the subtree below `new_root`, compacting the arena.
    pub fn into_subtree(self, new_root: NodeId) -> SearchTree {
        if new_root == self.root && self.root == 0 && self.nodes[0].parent.is_none() {
            return self;
        }

        let mut order = vec![new_root];
        let mut cursor = 0;
        while cursor < order.len() {
            order.extend(self.nodes[order[cursor]].children.iter().map(|e| e.child));
            cursor += 1;
        }

        let mut remap = vec![usize::MAX; self.nodes.len()];
        for (new_id, &old_id) in order.iter().enumerate() {
            remap[old_id] = new_id;
        }

        let mut slots: Vec<Option<Node>> = self.nodes.into_iter().map(Some).collect();
        let mut nodes = Vec::with_capacity(order.len());
        for &old_id in &order {
            let Some(mut node) = slots[old_id].take() else {
                continue;
            };
            node.parent = if old_id == new_root {
                None
            } else {
                node.parent.map(|p| remap[p])
            };
            for edge in &mut node.children {
                edge.child = remap[edge.child];
            }
            nodes.push(node);
        }

        SearchTree {
            nodes,
            root: 0,
            move_filter: self.move_filter,
        }
    }

    /// Indented dump of the tree down to `max_depth` below the root.
    pub fn describe(&self, max_depth: usize) -> String {
        let mut out = String::new();
        self.describe_node(self.root, None, 0, max_depth, &mut out);
        out
    }

    fn describe_node(
        &self,
        id: NodeId,
        action: Option<Action>,
        depth: usize,
        max_depth: usize,
        out: &mut String,
    ) {
        let node = self.node(id);
        let label = action.map_or_else(|| "root".to_string(), |a| a.to_string());
        let _ = writeln!(
            out,
            "{}({}) {:?}: visits={} mean={:.2} terminal={} untried={}",
            "  ".repeat(depth),
            label,
            node.kind(),
            node.visit_count(),
            node.average_value(),
            node.is_terminal(),
            node.untried_actions().len()
        );
        if depth < max_depth {
            for edge in node.children() {
                self.describe_node(edge.child, Some(edge.action), depth + 1, max_depth, out);
            }
        }
    }
}

fn make_node(
    state: GameState,
    parent: Option<NodeId>,
    child_count_weight: f64,
    move_filter: MoveFilter,
) -> Result<Node> {
    match (state, move_filter) {
        (GameState::Decision(s), MoveFilter::SymmetryReduced) if !state.is_terminal() => {
            let moves = deduplicate_moves(&s.board, &s.board.possible_moves(), s.card)?;
            let actions = moves.into_iter().map(Action::Place).collect();
            Ok(Node::new(state, actions, parent, child_count_weight))
        }
        _ => Node::with_legal_actions(state, parent, child_count_weight),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::board::Position;
    use crate::game::test_support::card;
    use assert_matches::assert_matches;

    fn place(row: usize, col: usize) -> Action {
        Action::Place(Position::new(row, col).unwrap())
    }

    #[test]
    fn test_add_child_twice_fails() {
        let state = GameState::initial(card(3)).unwrap();
        let mut tree = SearchTree::new(state, MoveFilter::All).unwrap();
        let root = tree.root();

        tree.expand_decision(root, place(0, 0)).unwrap();
        assert_matches!(
            tree.expand_decision(root, place(0, 0)),
            Err(MathematicoError::AlreadyExpanded(_))
        );
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_decision_node_fully_expanded_after_last_action() {
        let state = GameState::initial(card(3)).unwrap();
        let mut tree = SearchTree::new(state, MoveFilter::All).unwrap();
        let root = tree.root();

        for action in state.legal_actions().unwrap() {
            assert!(!tree.node(root).is_fully_expanded());
            tree.expand_decision(root, action).unwrap();
        }
        assert!(tree.node(root).is_fully_expanded());
        assert_eq!(tree.node(root).children().len(), 25);
    }

    #[test]
    fn test_expand_chance_creates_weighted_children() {
        let state = GameState::initial(card(3)).unwrap();
        let mut tree = SearchTree::new(state, MoveFilter::All).unwrap();
        let chance = tree.expand_decision(tree.root(), place(2, 2)).unwrap();

        let children = tree.expand_chance(chance).unwrap();
        assert_eq!(children.len(), 13);
        assert!(tree.node(chance).is_fully_expanded());

        let total: f64 = tree.node(chance).children().iter().map(|e| e.probability).sum();
        assert!((total - 1.0).abs() < 1e-9);

        let three = tree.child(chance, Action::Reveal(card(3))).unwrap();
        assert_eq!(tree.node(three).child_count_weight(), 3.0);
        let four = tree.child(chance, Action::Reveal(card(4))).unwrap();
        assert_eq!(tree.node(four).child_count_weight(), 4.0);

        assert_matches!(
            tree.expand_chance(chance),
            Err(MathematicoError::AlreadyExpanded(_))
        );
    }

    #[test]
    fn test_backpropagate_reaches_root() {
        let state = GameState::initial(card(3)).unwrap();
        let mut tree = SearchTree::new(state, MoveFilter::All).unwrap();
        let chance = tree.expand_decision(tree.root(), place(1, 1)).unwrap();
        let children = tree.expand_chance(chance).unwrap();

        tree.backpropagate(children[0], 120.0);
        tree.backpropagate(chance, 80.0);

        assert_eq!(tree.root_node().visit_count(), 2);
        assert!((tree.root_node().average_value() - 100.0).abs() < 1e-9);
        assert_eq!(tree.node(children[0]).visit_count(), 1);
        assert_eq!(tree.depth_of(children[0]), 2);
    }

    #[test]
    fn test_advance_keeps_only_subtree() {
        let state = GameState::initial(card(3)).unwrap();
        let mut tree = SearchTree::new(state, MoveFilter::All).unwrap();
        let kept = tree.expand_decision(tree.root(), place(0, 0)).unwrap();
        tree.expand_decision(tree.root(), place(0, 1)).unwrap();
        tree.expand_chance(kept).unwrap();
        tree.backpropagate(kept, 50.0);

        let tree = tree.advance(place(0, 0)).unwrap();
        assert_eq!(tree.len(), 14);
        assert_eq!(tree.root(), 0);
        assert!(tree.root_node().parent().is_none());
        assert_eq!(tree.root_node().visit_count(), 1);
        for edge in tree.root_node().children() {
            assert_eq!(tree.node(edge.child).parent(), Some(0));
        }
    }

    #[test]
    fn test_root_for_reuses_grandchild() {
        let state = GameState::initial(card(3)).unwrap();
        let mut tree = SearchTree::new(state, MoveFilter::All).unwrap();
        let chance = tree.expand_decision(tree.root(), place(4, 4)).unwrap();
        tree.expand_chance(chance).unwrap();
        let target_id = tree.child(chance, Action::Reveal(card(9))).unwrap();
        tree.backpropagate(target_id, 10.0);
        let target = *tree.node(target_id).state();

        let reused = SearchTree::root_for(Some(tree), &target, MoveFilter::All).unwrap();
        assert_eq!(reused.root_node().state(), &target);
        assert_eq!(reused.root_node().visit_count(), 1);
        assert_eq!(reused.len(), 1);
    }

    #[test]
    fn test_root_for_unknown_state_starts_fresh() {
        let state = GameState::initial(card(3)).unwrap();
        let tree = SearchTree::new(state, MoveFilter::All).unwrap();
        let other = GameState::initial(card(8)).unwrap();

        let fresh = SearchTree::root_for(Some(tree), &other, MoveFilter::All).unwrap();
        assert_eq!(fresh.root_node().state(), &other);
        assert_eq!(fresh.root_node().visit_count(), 0);
    }

    #[test]
    fn test_symmetry_filter_reduces_root_actions() {
        let state = GameState::initial(card(3)).unwrap();
        let tree = SearchTree::new(state, MoveFilter::SymmetryReduced).unwrap();
        let reduced = tree.root_node().untried_actions().len();
        assert!(reduced < 25);
        assert!(reduced > 0);
    }

    #[test]
    fn test_describe_lists_children() {
        let state = GameState::initial(card(3)).unwrap();
        let mut tree = SearchTree::new(state, MoveFilter::All).unwrap();
        tree.expand_decision(tree.root(), place(0, 0)).unwrap();
        let dump = tree.describe(1);
        assert!(dump.contains("(root)"));
        assert!(dump.contains("place (0, 0)"));
    }
}
