//! MCTS node structures for the chance/decision search tree
//!
//! This module implements the two-level alternation of the game:
//! - Chance nodes: the next card is drawn, children are weighted by probability
//! - Decision nodes: the drawn card is placed, children are picked with UCT
//!
//! Nodes live in the arena of a [`crate::mcts::tree::SearchTree`] and refer to
//! each other through [`NodeId`] indices; the parent link never owns anything.

use crate::game::state::{Action, GameState};
use crate::Result;
use serde::Serialize;

/// Index of a node inside its tree's arena.
pub type NodeId = usize;

/// Which side moves at a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum NodeKind {
    Decision,
    Chance,
}

/// Outgoing edge of a node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Edge {
    pub action: Action,
    pub child: NodeId,
    /// Transition probability; always 1 below a decision node.
    pub probability: f64,
}

/// A node in the search tree
#[derive(Debug, Clone)]
pub struct Node {
    state: GameState,

    /// Number of times this node has been visited
    pub(crate) visit_count: u64,

    /// Sum of all rewards backpropagated through this node
    pub(crate) total_reward: f64,

    pub(crate) children: Vec<Edge>,

    /// Legal actions that do not have a child yet
    pub(crate) untried: Vec<Action>,

    pub(crate) parent: Option<NodeId>,

    /// Physical cards behind the edge leading here (reveal of a rank with
    /// `n` copies left gets weight `n`), 1 for placements.
    pub(crate) child_count_weight: f64,

    fully_expanded: bool,
    terminal: bool,
}

impl Node {
    /// Creates a node whose untried actions are `actions`, or none if `state` is terminal.
    pub(crate) fn new(
        state: GameState,
        actions: Vec<Action>,
        parent: Option<NodeId>,
        child_count_weight: f64,
    ) -> Self {
        let terminal = state.is_terminal();
        Node {
            state,
            visit_count: 0,
            total_reward: 0.0,
            children: Vec::new(),
            untried: if terminal { Vec::new() } else { actions },
            parent,
            child_count_weight,
            fully_expanded: terminal,
            terminal,
        }
    }

    /// Creates a node with every legal action untried.
    pub(crate) fn with_legal_actions(
        state: GameState,
        parent: Option<NodeId>,
        child_count_weight: f64,
    ) -> Result<Self> {
        let actions = if state.is_terminal() {
            Vec::new()
        } else {
            state.legal_actions()?
        };
        Ok(Node::new(state, actions, parent, child_count_weight))
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn kind(&self) -> NodeKind {
        match self.state {
            GameState::Decision(_) => NodeKind::Decision,
            GameState::Chance(_) => NodeKind::Chance,
        }
    }

    pub fn visit_count(&self) -> u64 {
        self.visit_count
    }

    pub fn total_reward(&self) -> f64 {
        self.total_reward
    }

    /// Returns the average reward of this node
    pub fn average_value(&self) -> f64 {
        if self.visit_count == 0 {
            0.0
        } else {
            self.total_reward / self.visit_count as f64
        }
    }

    pub fn children(&self) -> &[Edge] {
        &self.children
    }

    pub fn untried_actions(&self) -> &[Action] {
        &self.untried
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn child_count_weight(&self) -> f64 {
        self.child_count_weight
    }

    pub fn is_fully_expanded(&self) -> bool {
        self.fully_expanded
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Edge for `action`, if it has been materialized.
    pub fn edge(&self, action: Action) -> Option<&Edge> {
        self.children.iter().find(|edge| edge.action == action)
    }

    pub(crate) fn mark_fully_expanded(&mut self) {
        self.untried.clear();
        self.fully_expanded = true;
    }

    /// Removes `action` from the untried set; returns whether it was there.
    pub(crate) fn take_untried(&mut self, action: Action) -> bool {
        match self.untried.iter().position(|&a| a == action) {
            Some(index) => {
                self.untried.swap_remove(index);
                true
            }
            None => false,
        }
    }

    pub(crate) fn record(&mut self, reward: f64) {
        self.visit_count += 1;
        self.total_reward += reward;
    }
}
