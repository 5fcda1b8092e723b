//! MCTS node and edge structures.
//!
//! Uses arena-based allocation with index references (NodeId) for efficiency
//! and serializability.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::{Action, PlayerId};

/// Index into the MCTSTree node arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Sentinel value representing no node.
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Create a new node ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Check if this is the NONE sentinel.
    #[inline]
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }

    /// Get the raw index value.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_none() {
            write!(f, "NodeId(NONE)")
        } else {
            write!(f, "NodeId({})", self.0)
        }
    }
}

/// Mapping entry from an action to the child it leads to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// The action this edge represents.
    pub action: Action,

    /// Child node reached by the action.
    pub child: NodeId,
}

/// A node in the MCTS tree.
///
/// `total_value` is accumulated from the perspective of the player who took
/// the incoming action (the player to move at the parent), so a parent picks
/// among its children by their `mean_value` directly.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MCTSNode {
    /// Parent node (NONE for root).
    pub parent: NodeId,

    /// Action that led here from the parent (None for root).
    pub action: Option<Action>,

    /// Player to move at this node.
    pub to_move: PlayerId,

    /// Depth in tree (root = 0).
    pub depth: u16,

    /// Visit count N.
    pub visits: u32,

    /// Accumulated value W.
    pub total_value: f64,

    /// Prior probability P, set when the parent is expanded.
    pub prior: f32,

    /// Whether children have been created.
    pub is_expanded: bool,

    /// Is this a terminal game state?
    pub is_terminal: bool,

    /// Outcome value for `to_move` (if terminal).
    pub terminal_value: Option<f32>,

    /// Children in ascending action order.
    /// SmallVec optimizes for typical branching factor <= 8.
    pub children: SmallVec<[Edge; 8]>,
}

impl MCTSNode {
    /// Create a new node.
    pub fn new(parent: NodeId, action: Option<Action>, to_move: PlayerId, depth: u16, prior: f32) -> Self {
        Self {
            parent,
            action,
            to_move,
            depth,
            visits: 0,
            total_value: 0.0,
            prior,
            is_expanded: false,
            is_terminal: false,
            terminal_value: None,
            children: SmallVec::new(),
        }
    }

    /// Create a root node.
    pub fn root(to_move: PlayerId) -> Self {
        Self::new(NodeId::NONE, None, to_move, 0, 1.0)
    }

    /// Mean value Q = W / N (0 for unvisited nodes).
    #[inline]
    #[must_use]
    pub fn mean_value(&self) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.total_value / self.visits as f64
        }
    }

    /// Whether selection stops here.
    #[inline]
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        !self.is_expanded || self.is_terminal
    }

    /// Child reached by `action`, if any.
    #[must_use]
    pub fn child(&self, action: Action) -> Option<NodeId> {
        self.children
            .iter()
            .find(|e| e.action == action)
            .map(|e| e.child)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id() {
        let id = NodeId::new(5);
        assert_eq!(id.raw(), 5);
        assert!(!id.is_none());
        assert_eq!(format!("{}", id), "NodeId(5)");

        assert!(NodeId::NONE.is_none());
        assert_eq!(format!("{}", NodeId::NONE), "NodeId(NONE)");
    }

    #[test]
    fn test_node_root() {
        let node = MCTSNode::root(PlayerId::FIRST);

        assert!(node.parent.is_none());
        assert!(node.action.is_none());
        assert_eq!(node.depth, 0);
        assert_eq!(node.to_move, PlayerId::FIRST);
        assert_eq!(node.visits, 0);
        assert!(!node.is_terminal);
        assert!(!node.is_expanded);
        assert!(node.is_leaf());
        assert!(node.children.is_empty());
    }

    #[test]
    fn test_mean_value() {
        let mut node = MCTSNode::new(NodeId::new(0), Some(Action::new(1)), PlayerId::SECOND, 1, 0.5);
        assert_eq!(node.mean_value(), 0.0);

        node.visits = 4;
        node.total_value = 3.0;
        assert_eq!(node.mean_value(), 0.75);
    }

    #[test]
    fn test_child_lookup() {
        let mut node = MCTSNode::root(PlayerId::FIRST);
        node.children.push(Edge { action: Action::new(2), child: NodeId::new(1) });
        node.children.push(Edge { action: Action::new(5), child: NodeId::new(2) });
        node.is_expanded = true;

        assert!(!node.is_leaf());
        assert_eq!(node.child(Action::new(5)), Some(NodeId::new(2)));
        assert_eq!(node.child(Action::new(3)), None);
    }

    #[test]
    fn test_terminal_is_leaf() {
        let mut node = MCTSNode::root(PlayerId::FIRST);
        node.is_expanded = true;
        node.is_terminal = true;
        assert!(node.is_leaf());
    }

    #[test]
    fn test_serialization() {
        let mut node = MCTSNode::root(PlayerId::SECOND);
        node.children.push(Edge { action: Action::new(5), child: NodeId::new(1) });
        node.visits = 100;

        let json = serde_json::to_string(&node).unwrap();
        let deserialized: MCTSNode = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized.to_move, PlayerId::SECOND);
        assert_eq!(deserialized.visits, 100);
        assert_eq!(deserialized.children.len(), 1);
    }
}
