//! Graph manager
//!
//! Owns the node set and the dependency edges between nodes, and keeps both
//! consistent across creates, formula edits, and deletes. An upstream edit
//! triggers an ordered cascade that recomputes every descendant exactly
//! once, parents before children.
//!
//! Each manager instance is explicitly constructed over its [`NodeStore`]
//! handle, so independent graphs (one per test, one per user session) need
//! no shared state. Mutating operations take `&mut self`; the caller
//! serializes operations, and a cascade always runs to completion before
//! the call that triggered it returns.
//!
//! # Example
//!
//! ```rust
//! use chaincalc::{GraphManager, MemoryStore};
//!
//! let mut graph = GraphManager::new(MemoryStore::new());
//!
//! let a = graph.create_node("5").unwrap();
//! let b = graph.create_node(&format!("{{{{{}}}}}*2", a.id)).unwrap();
//! assert_eq!(b.value_text(), "10");
//!
//! let outcome = graph.update_formula(&a.id, "7").unwrap();
//! assert_eq!(outcome.affected, vec![b.id.clone()]);
//! assert_eq!(graph.node(&b.id).unwrap().value_text(), "14");
//! ```

use crate::error::{CascadeError, Error, Result};
use bigdecimal::BigDecimal;
use chaincalc_core::{Node, NodeId, NodeStore};
use chaincalc_formula::{
    calculate_formula, extract_references, validate, DependencyGraph, FormulaError,
};
use log::{debug, warn};
use std::collections::HashMap;

/// Result of a formula edit and the cascade it triggered
#[derive(Debug)]
pub struct CascadeOutcome {
    /// The edited node's new value
    pub value: BigDecimal,
    /// Descendants recalculated successfully, in recalculation order
    pub affected: Vec<NodeId>,
    /// Descendants that failed to recompute; each kept its last-known value
    pub failures: Vec<CascadeError>,
}

impl CascadeOutcome {
    /// Whether every descendant recomputed successfully
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Convert a partial cascade into [`Error::CascadeFailure`]
    pub fn into_result(self) -> Result<CascadeOutcome> {
        if self.failures.is_empty() {
            Ok(self)
        } else {
            Err(Error::CascadeFailure {
                failures: self.failures,
            })
        }
    }
}

/// The dependency-graph manager
///
/// Every edge lives in two places that are updated together: the manager's
/// [`DependencyGraph`] index, and the `parent_ids`/`child_ids` lists
/// persisted inside each [`Node`]. The index drives traversal; the embedded
/// lists are what the store (and any UI reading it) sees.
pub struct GraphManager<S: NodeStore> {
    store: S,
    graph: DependencyGraph,
    next_id: u64,
}

impl<S: NodeStore> GraphManager<S> {
    /// Create a manager over a store, rebuilding the edge index from the
    /// nodes already persisted there
    pub fn new(store: S) -> Self {
        let mut graph = DependencyGraph::new();
        let mut next_id = 0;

        for node in store.all() {
            for parent_id in &node.parent_ids {
                graph.add_edge(parent_id, &node.id);
            }
            if let Some(n) = node
                .id
                .as_str()
                .strip_prefix('n')
                .and_then(|s| s.parse::<u64>().ok())
            {
                next_id = next_id.max(n);
            }
        }

        Self {
            store,
            graph,
            next_id,
        }
    }

    /// Shared access to the underlying store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mutable access to the underlying store
    ///
    /// Writes made here bypass the manager; they model out-of-band store
    /// mutation (an external process, a partially-synced replica).
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Fetch a node
    pub fn node(&self, id: &NodeId) -> Result<Node> {
        self.store
            .get(id)
            .ok_or_else(|| Error::NodeNotFound(id.clone()))
    }

    /// Every node, sorted by id
    pub fn nodes(&self) -> Vec<Node> {
        self.store.all()
    }

    /// Number of nodes in the graph
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Whether the graph holds no nodes
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Ids referenced by `id`'s formula
    pub fn parents_of(&self, id: &NodeId) -> Result<Vec<NodeId>> {
        Ok(self.node(id)?.parent_ids)
    }

    /// Ids whose formulas reference `id`
    pub fn children_of(&self, id: &NodeId) -> Result<Vec<NodeId>> {
        Ok(self.node(id)?.child_ids.into_iter().collect())
    }

    /// Evaluate a formula and persist it as a new node
    ///
    /// Creation is atomic: the node and the edges to every referenced
    /// parent are established together. On any failure nothing is
    /// committed.
    pub fn create_node(&mut self, formula: &str) -> Result<Node> {
        validate(formula)?;
        let parent_ids = extract_references(formula)?;
        let parent_values = self.resolve_parents(&parent_ids)?;
        let value = calculate_formula(formula, &parent_values)?;

        // Nothing above mutated state; commit node and edges together
        let id = self.allocate_id();
        let node = Node::new(id.clone(), formula, value, parent_ids.clone());
        for parent_id in &parent_ids {
            self.graph.add_edge(parent_id, &id);
            if let Some(mut parent) = self.store.get(parent_id) {
                parent.add_child(id.clone());
                self.store.put(parent);
            }
        }
        self.store.put(node.clone());

        debug!("created {id} with {} parent(s)", parent_ids.len());
        Ok(node)
    }

    /// Replace a node's formula, rewire its edges, and cascade
    ///
    /// A formula that would close a reference cycle is rejected with
    /// [`Error::CircularDependency`] before any edge is mutated, as is a
    /// formula that fails to validate or evaluate; the node keeps its
    /// previous formula, value, and edges exactly.
    ///
    /// On success, every descendant is recomputed in topological order;
    /// see [`CascadeOutcome`] for how per-node failures are reported.
    pub fn update_formula(&mut self, id: &NodeId, formula: &str) -> Result<CascadeOutcome> {
        let mut node = self.node(id)?;

        validate(formula)?;
        let new_parents = extract_references(formula)?;

        // Would any newly-referenced parent close a cycle? Checked before
        // anything is mutated, so rejection needs no rollback.
        for parent_id in &new_parents {
            if !node.parent_ids.contains(parent_id)
                && self.graph.would_create_cycle(id, parent_id)
            {
                return Err(Error::CircularDependency {
                    id: id.clone(),
                    via: parent_id.clone(),
                });
            }
        }

        let parent_values = self.resolve_parents(&new_parents)?;
        let value = calculate_formula(formula, &parent_values)?;

        // Commit: drop edges to parents no longer referenced, add the new ones
        let old_parents = std::mem::take(&mut node.parent_ids);
        for parent_id in old_parents.iter().filter(|p| !new_parents.contains(*p)) {
            self.graph.remove_edge(parent_id, id);
            if let Some(mut parent) = self.store.get(parent_id) {
                parent.remove_child(id);
                self.store.put(parent);
            }
        }
        for parent_id in new_parents.iter().filter(|p| !old_parents.contains(*p)) {
            self.graph.add_edge(parent_id, id);
            if let Some(mut parent) = self.store.get(parent_id) {
                parent.add_child(id.clone());
                self.store.put(parent);
            }
        }

        node.formula = formula.to_string();
        node.parent_ids = new_parents;
        node.value = value.clone();
        node.touch();
        self.store.put(node);
        debug!("updated formula of {id}");

        let (affected, failures) = self.cascade(id)?;
        Ok(CascadeOutcome {
            value,
            affected,
            failures,
        })
    }

    /// Remove a childless node
    ///
    /// Refused with [`Error::DependentsExist`] while any formula still
    /// references the node; there are no cascading deletes.
    pub fn delete_node(&mut self, id: &NodeId) -> Result<()> {
        let node = self.node(id)?;
        if node.has_children() {
            return Err(Error::DependentsExist {
                id: id.clone(),
                dependents: node.child_ids.into_iter().collect(),
            });
        }

        for parent_id in &node.parent_ids {
            if let Some(mut parent) = self.store.get(parent_id) {
                parent.remove_child(id);
                self.store.put(parent);
            }
        }
        self.graph.remove_node(id);
        self.store.delete(id);

        debug!("deleted {id}");
        Ok(())
    }

    /// Recompute every descendant of `origin`, parents before children
    ///
    /// Kahn's algorithm over the subgraph induced by the descendant set.
    /// A node that fails to recompute keeps its stale value and is
    /// recorded, but the cascade continues: its descendants are still
    /// attempted against whatever value remains.
    fn cascade(&mut self, origin: &NodeId) -> Result<(Vec<NodeId>, Vec<CascadeError>)> {
        let descendants = self.graph.descendants_of(origin);
        if descendants.is_empty() {
            return Ok((Vec::new(), Vec::new()));
        }

        // A cycle here means edges were committed that the pre-commit check
        // should have rejected; that is a bug, not a user outcome.
        let order = self.graph.induced_topo_order(&descendants).ok_or_else(|| {
            Error::Internal(format!(
                "descendants of {origin} contain a cycle; the edge index is corrupt"
            ))
        })?;

        let mut affected = Vec::with_capacity(order.len());
        let mut failures = Vec::new();

        for node_id in order {
            match self.recalculate(&node_id) {
                Ok(()) => affected.push(node_id),
                Err(error) => {
                    warn!("recalculation of {node_id} failed: {error}");
                    failures.push(CascadeError { id: node_id, error });
                }
            }
        }

        Ok((affected, failures))
    }

    /// Recompute one node in place from its parents' current values
    fn recalculate(&mut self, id: &NodeId) -> Result<()> {
        let mut node = self.node(id)?;
        let parent_values = self.resolve_parents(&node.parent_ids)?;
        let value = calculate_formula(&node.formula, &parent_values)?;

        node.value = value;
        node.touch();
        self.store.put(node);
        Ok(())
    }

    /// Fetch the current value of every referenced node
    fn resolve_parents(&self, ids: &[NodeId]) -> Result<HashMap<NodeId, BigDecimal>> {
        let mut values = HashMap::with_capacity(ids.len());
        for id in ids {
            let node = self
                .store
                .get(id)
                .ok_or_else(|| FormulaError::UnknownReference(id.to_string()))?;
            values.insert(id.clone(), node.value);
        }
        Ok(values)
    }

    fn allocate_id(&mut self) -> NodeId {
        loop {
            self.next_id += 1;
            let id = NodeId::from(format!("n{}", self.next_id));
            if self.store.get(&id).is_none() {
                return id;
            }
        }
    }
}
