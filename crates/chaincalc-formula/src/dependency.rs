//! Dependency tracking between computed nodes
//!
//! Two index maps, parents and children, mirror every edge in both
//! directions. All mutation goes through the paired [`DependencyGraph::add_edge`] /
//! [`DependencyGraph::remove_edge`] operations, so the directions can never
//! desynchronize. Neighbor sets are sorted so traversal order, and with it
//! cascade order, is reproducible across runs.

use chaincalc_core::NodeId;
use std::collections::{BTreeSet, HashMap, VecDeque};

/// Dependency graph over node ids
///
/// An edge parent → child means the child's formula references the parent.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    /// Node → nodes whose formulas reference it
    children: HashMap<NodeId, BTreeSet<NodeId>>,
    /// Node → nodes its formula references
    parents: HashMap<NodeId, BTreeSet<NodeId>>,
}

impl DependencyGraph {
    /// Create a new empty dependency graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an edge: `child`'s formula references `parent`
    pub fn add_edge(&mut self, parent: &NodeId, child: &NodeId) {
        self.children
            .entry(parent.clone())
            .or_default()
            .insert(child.clone());
        self.parents
            .entry(child.clone())
            .or_default()
            .insert(parent.clone());
    }

    /// Remove an edge; both directions are dropped together
    pub fn remove_edge(&mut self, parent: &NodeId, child: &NodeId) {
        if let Some(set) = self.children.get_mut(parent) {
            set.remove(child);
            if set.is_empty() {
                self.children.remove(parent);
            }
        }
        if let Some(set) = self.parents.get_mut(child) {
            set.remove(parent);
            if set.is_empty() {
                self.parents.remove(child);
            }
        }
    }

    /// Remove every edge touching `id`
    pub fn remove_node(&mut self, id: &NodeId) {
        if let Some(parents) = self.parents.remove(id) {
            for parent in parents {
                if let Some(set) = self.children.get_mut(&parent) {
                    set.remove(id);
                    if set.is_empty() {
                        self.children.remove(&parent);
                    }
                }
            }
        }
        if let Some(children) = self.children.remove(id) {
            for child in children {
                if let Some(set) = self.parents.get_mut(&child) {
                    set.remove(id);
                    if set.is_empty() {
                        self.parents.remove(&child);
                    }
                }
            }
        }
    }

    /// Nodes referenced by `id`'s formula, in id order
    pub fn parents_of(&self, id: &NodeId) -> impl Iterator<Item = &NodeId> + '_ {
        self.parents.get(id).into_iter().flatten()
    }

    /// Nodes whose formulas reference `id`, in id order
    pub fn children_of(&self, id: &NodeId) -> impl Iterator<Item = &NodeId> + '_ {
        self.children.get(id).into_iter().flatten()
    }

    /// Would adding the edge `candidate_parent → child` close a cycle?
    ///
    /// Breadth-first walk upward from the candidate parent along existing
    /// parent edges; if `child` is reachable, the new edge would complete a
    /// path back to it. Run before any edge is committed.
    pub fn would_create_cycle(&self, child: &NodeId, candidate_parent: &NodeId) -> bool {
        if candidate_parent == child {
            return true;
        }

        let mut visited = BTreeSet::new();
        let mut queue = VecDeque::from([candidate_parent.clone()]);

        while let Some(current) = queue.pop_front() {
            for parent in self.parents_of(&current) {
                if parent == child {
                    return true;
                }
                if visited.insert(parent.clone()) {
                    queue.push_back(parent.clone());
                }
            }
        }

        false
    }

    /// All strict descendants of `id`, in breadth-first discovery order
    ///
    /// A node reachable along several paths appears once.
    pub fn descendants_of(&self, id: &NodeId) -> Vec<NodeId> {
        let mut visited = BTreeSet::new();
        let mut order = Vec::new();
        let mut queue = VecDeque::from([id.clone()]);

        while let Some(current) = queue.pop_front() {
            for child in self.children_of(&current) {
                if child != id && visited.insert(child.clone()) {
                    order.push(child.clone());
                    queue.push_back(child.clone());
                }
            }
        }

        order
    }

    /// Topological order of the subgraph induced by `set` (Kahn's algorithm)
    ///
    /// In-degrees count only edges whose source is itself in the set.
    /// Returns `None` if the queue drains before every member is dequeued,
    /// i.e. the induced subgraph contains a cycle.
    pub fn induced_topo_order(&self, set: &[NodeId]) -> Option<Vec<NodeId>> {
        let members: BTreeSet<&NodeId> = set.iter().collect();

        let mut in_degree: HashMap<&NodeId, usize> = HashMap::with_capacity(set.len());
        for id in set {
            let degree = self
                .parents_of(id)
                .filter(|parent| members.contains(parent))
                .count();
            in_degree.insert(id, degree);
        }

        let mut queue: VecDeque<&NodeId> =
            set.iter().filter(|id| in_degree[*id] == 0).collect();
        let mut order = Vec::with_capacity(set.len());

        while let Some(id) = queue.pop_front() {
            order.push(id.clone());
            for child in self.children_of(id) {
                if let Some(degree) = in_degree.get_mut(child) {
                    *degree -= 1;
                    if *degree == 0 {
                        queue.push_back(child);
                    }
                }
            }
        }

        (order.len() == set.len()).then_some(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> NodeId {
        NodeId::from(s)
    }

    #[test]
    fn test_add_edge_both_directions() {
        let mut graph = DependencyGraph::new();
        graph.add_edge(&id("a"), &id("b"));

        assert!(graph.children_of(&id("a")).any(|c| *c == id("b")));
        assert!(graph.parents_of(&id("b")).any(|p| *p == id("a")));
    }

    #[test]
    fn test_remove_edge_both_directions() {
        let mut graph = DependencyGraph::new();
        graph.add_edge(&id("a"), &id("b"));
        graph.remove_edge(&id("a"), &id("b"));

        assert_eq!(graph.children_of(&id("a")).count(), 0);
        assert_eq!(graph.parents_of(&id("b")).count(), 0);
    }

    #[test]
    fn test_remove_node_clears_all_edges() {
        let mut graph = DependencyGraph::new();
        graph.add_edge(&id("a"), &id("b"));
        graph.add_edge(&id("b"), &id("c"));
        graph.remove_node(&id("b"));

        assert_eq!(graph.children_of(&id("a")).count(), 0);
        assert_eq!(graph.parents_of(&id("c")).count(), 0);
    }

    #[test]
    fn test_would_create_cycle() {
        let mut graph = DependencyGraph::new();
        // a → b → c
        graph.add_edge(&id("a"), &id("b"));
        graph.add_edge(&id("b"), &id("c"));

        // a referencing c would close the loop
        assert!(graph.would_create_cycle(&id("a"), &id("c")));
        // Self-reference is the degenerate cycle
        assert!(graph.would_create_cycle(&id("a"), &id("a")));
        // c referencing a is just a longer chain
        assert!(!graph.would_create_cycle(&id("c"), &id("a")));
        // Unrelated nodes never cycle
        assert!(!graph.would_create_cycle(&id("d"), &id("a")));
    }

    #[test]
    fn test_descendants_breadth_first() {
        let mut graph = DependencyGraph::new();
        // a → b → d, a → c, b → c (c reachable twice)
        graph.add_edge(&id("a"), &id("b"));
        graph.add_edge(&id("a"), &id("c"));
        graph.add_edge(&id("b"), &id("d"));
        graph.add_edge(&id("b"), &id("c"));

        let descendants = graph.descendants_of(&id("a"));
        assert_eq!(descendants, vec![id("b"), id("c"), id("d")]);
    }

    #[test]
    fn test_induced_topo_order_diamond() {
        let mut graph = DependencyGraph::new();
        // a → b → d, a → c → d
        graph.add_edge(&id("a"), &id("b"));
        graph.add_edge(&id("a"), &id("c"));
        graph.add_edge(&id("b"), &id("d"));
        graph.add_edge(&id("c"), &id("d"));

        let set = graph.descendants_of(&id("a"));
        let order = graph.induced_topo_order(&set).unwrap();

        // b and c in either order, d strictly last
        assert_eq!(order.len(), 3);
        assert_eq!(order[2], id("d"));
    }

    #[test]
    fn test_induced_topo_order_ignores_outside_edges() {
        let mut graph = DependencyGraph::new();
        // x → a → b; x outside the set must not count toward a's in-degree
        graph.add_edge(&id("x"), &id("a"));
        graph.add_edge(&id("a"), &id("b"));

        let order = graph.induced_topo_order(&[id("a"), id("b")]).unwrap();
        assert_eq!(order, vec![id("a"), id("b")]);
    }

    #[test]
    fn test_induced_topo_order_detects_cycle() {
        let mut graph = DependencyGraph::new();
        graph.add_edge(&id("a"), &id("b"));
        graph.add_edge(&id("b"), &id("a"));

        assert!(graph.induced_topo_order(&[id("a"), id("b")]).is_none());
    }
}
