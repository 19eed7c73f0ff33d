//! Node persistence boundary
//!
//! [`NodeStore`] is the collaborator interface the graph manager issues its
//! reads and writes through. The cascade itself only ever uses the edge
//! lists embedded in each [`Node`]; `find_by_parent` / `find_by_child` exist
//! for callers (a UI layer) that want secondary lookups.

use crate::node::{Node, NodeId};
use ahash::AHashMap;

/// Persistence interface for nodes
///
/// Implementations are expected to be simple key-value stores; all graph
/// semantics (edge pairing, cycle rejection, recalculation) live above this
/// boundary.
pub trait NodeStore {
    /// Fetch a node by id
    fn get(&self, id: &NodeId) -> Option<Node>;

    /// Create or overwrite a node
    fn put(&mut self, node: Node);

    /// Remove a node; returns whether it existed
    fn delete(&mut self, id: &NodeId) -> bool;

    /// Nodes whose formula references `id`, sorted by id
    fn find_by_parent(&self, id: &NodeId) -> Vec<Node>;

    /// Nodes referenced by `id`'s formula, sorted by id
    fn find_by_child(&self, id: &NodeId) -> Vec<Node>;

    /// Every stored node, sorted by id
    fn all(&self) -> Vec<Node>;

    /// Number of stored nodes
    fn len(&self) -> usize;

    /// Whether the store holds no nodes
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// In-memory node store
///
/// Sufficient for tests and the CLI; a persistent engine would implement
/// [`NodeStore`] over its own medium.
#[derive(Debug, Default)]
pub struct MemoryStore {
    nodes: AHashMap<NodeId, Node>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    fn sorted(mut nodes: Vec<Node>) -> Vec<Node> {
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        nodes
    }
}

impl NodeStore for MemoryStore {
    fn get(&self, id: &NodeId) -> Option<Node> {
        self.nodes.get(id).cloned()
    }

    fn put(&mut self, node: Node) {
        self.nodes.insert(node.id.clone(), node);
    }

    fn delete(&mut self, id: &NodeId) -> bool {
        self.nodes.remove(id).is_some()
    }

    fn find_by_parent(&self, id: &NodeId) -> Vec<Node> {
        Self::sorted(
            self.nodes
                .values()
                .filter(|n| n.parent_ids.contains(id))
                .cloned()
                .collect(),
        )
    }

    fn find_by_child(&self, id: &NodeId) -> Vec<Node> {
        Self::sorted(
            self.nodes
                .values()
                .filter(|n| n.child_ids.contains(id))
                .cloned()
                .collect(),
        )
    }

    fn all(&self) -> Vec<Node> {
        Self::sorted(self.nodes.values().cloned().collect())
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }
}
