//! Arena-based MCTS tree.
//!
//! Uses a flat `Vec<MCTSNode>` with index-based references for efficiency,
//! cache-friendliness, and serializability.

use serde::{Deserialize, Serialize};

use super::node::{Edge, MCTSNode, NodeId};
use crate::core::{Action, PlayerId};

/// Arena-based MCTS tree.
///
/// Nodes are stored in a flat vector and referenced by `NodeId` indices.
/// The whole tree is discarded with `reset` before each search.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MCTSTree {
    /// All nodes in the tree.
    nodes: Vec<MCTSNode>,

    /// The root node ID (always 0 after initialization).
    root: NodeId,
}

impl MCTSTree {
    /// Create a new tree with a root node.
    pub fn new(root_player: PlayerId) -> Self {
        Self::with_capacity(root_player, 1024)
    }

    /// Create a tree with custom initial capacity.
    pub fn with_capacity(root_player: PlayerId, capacity: usize) -> Self {
        let mut nodes = Vec::with_capacity(capacity.max(1));
        nodes.push(MCTSNode::root(root_player));
        Self {
            nodes,
            root: NodeId::new(0),
        }
    }

    /// Get the root node ID.
    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Get a node by ID.
    #[inline]
    #[must_use]
    pub fn get(&self, id: NodeId) -> &MCTSNode {
        &self.nodes[id.0 as usize]
    }

    /// Get a mutable node by ID.
    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut MCTSNode {
        &mut self.nodes[id.0 as usize]
    }

    /// Allocate a new node, returning its ID.
    pub fn alloc(&mut self, node: MCTSNode) -> NodeId {
        let id = NodeId::new(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Create one child per `(action, prior)` pair under `parent` and mark
    /// it expanded.
    ///
    /// Children are recorded in the order given; callers pass ascending
    /// action order.
    pub fn expand(&mut self, parent: NodeId, child_to_move: PlayerId, priors: &[(Action, f32)]) {
        let depth = self.get(parent).depth.saturating_add(1);
        for &(action, prior) in priors {
            let child = self.alloc(MCTSNode::new(parent, Some(action), child_to_move, depth, prior));
            self.get_mut(parent).children.push(Edge { action, child });
        }
        self.get_mut(parent).is_expanded = true;
    }

    /// Number of nodes in the tree.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the tree is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get statistics about the tree.
    #[must_use]
    pub fn stats(&self) -> TreeStats {
        let max_depth = self.nodes.iter().map(|n| n.depth).max().unwrap_or(0);
        let terminal_count = self.nodes.iter().filter(|n| n.is_terminal).count();
        let expanded_count = self.nodes.iter().filter(|n| n.is_expanded).count();
        let total_children: usize = self.nodes.iter().map(|n| n.children.len()).sum();

        TreeStats {
            node_count: self.nodes.len(),
            max_depth,
            terminal_count,
            expanded_count,
            total_children,
        }
    }

    /// Clear the tree and reset with a new root.
    pub fn reset(&mut self, root_player: PlayerId) {
        self.nodes.clear();
        self.nodes.push(MCTSNode::root(root_player));
        self.root = NodeId::new(0);
    }

    /// Get the root node.
    #[must_use]
    pub fn root_node(&self) -> &MCTSNode {
        self.get(self.root)
    }

    /// Iterate over the root's children as `(action, node)` pairs.
    pub fn root_children(&self) -> impl Iterator<Item = (Action, &MCTSNode)> {
        self.root_node()
            .children
            .iter()
            .map(move |e| (e.action, self.get(e.child)))
    }

    /// Iterate over all nodes.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &MCTSNode)> {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (NodeId::new(i as u32), n))
    }
}

/// Statistics about the MCTS tree.
#[derive(Clone, Debug, Default)]
pub struct TreeStats {
    /// Total number of nodes.
    pub node_count: usize,

    /// Maximum depth reached.
    pub max_depth: u16,

    /// Number of terminal nodes.
    pub terminal_count: usize,

    /// Number of nodes whose children exist.
    pub expanded_count: usize,

    /// Total number of parent-child edges.
    pub total_children: usize,
}

impl TreeStats {
    /// Average children per expanded node.
    #[must_use]
    pub fn branching_factor(&self) -> f64 {
        if self.expanded_count == 0 {
            0.0
        } else {
            self.total_children as f64 / self.expanded_count as f64
        }
    }
}
