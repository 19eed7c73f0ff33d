//! Node types
//!
//! A [`Node`] is a single computed value: its source formula, the exact
//! decimal result of the last successful evaluation, and the graph edges to
//! the nodes it references (`parent_ids`) and the nodes that reference it
//! (`child_ids`).

use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::fmt;

/// Opaque identifier of a node, immutable once created
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(String);

impl NodeId {
    /// View the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl AsRef<str> for NodeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A computed node: formula, exact value, and graph edges
///
/// The two edge lists are kept consistent by the graph manager: an edge
/// exists in a node's `parent_ids` if and only if the mirror edge exists in
/// that parent's `child_ids`. `child_ids` is sorted so traversal order is
/// reproducible across runs.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    /// Unique identifier, immutable once created
    pub id: NodeId,
    /// Formula source text, may embed `{{id}}` references
    pub formula: String,
    /// Result of the last successful evaluation, exact decimal
    pub value: BigDecimal,
    /// Nodes this formula references, in first-appearance order, deduplicated
    pub parent_ids: Vec<NodeId>,
    /// Nodes whose formula references this node (inverse of `parent_ids`)
    pub child_ids: BTreeSet<NodeId>,
    /// Creation time; audit only, never consulted during evaluation
    pub created_at: DateTime<Utc>,
    /// Last mutation time; audit only
    pub updated_at: DateTime<Utc>,
}

impl Node {
    /// Create a node with no children and fresh timestamps
    pub fn new(
        id: NodeId,
        formula: impl Into<String>,
        value: BigDecimal,
        parent_ids: Vec<NodeId>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id,
            formula: formula.into(),
            value,
            parent_ids,
            child_ids: BTreeSet::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether any node still references this one
    pub fn has_children(&self) -> bool {
        !self.child_ids.is_empty()
    }

    /// Register a child edge (the caller maintains the mirror direction)
    pub fn add_child(&mut self, id: NodeId) {
        self.child_ids.insert(id);
    }

    /// Remove a child edge (the caller maintains the mirror direction)
    pub fn remove_child(&mut self, id: &NodeId) {
        self.child_ids.remove(id);
    }

    /// The value rendered as an exact decimal string, trailing zeros stripped
    pub fn value_text(&self) -> String {
        self.value.normalized().to_string()
    }

    /// Bump `updated_at` after a mutation
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}
