//! Error types for graph operations

use chaincalc_core::NodeId;
use chaincalc_formula::FormulaError;
use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in graph operations
///
/// Everything here is returned as a typed result from the operation that
/// detects it; nothing escapes as a panic. All variants except
/// [`Error::Internal`] are caller-correctable.
#[derive(Debug, Error)]
pub enum Error {
    /// Formula validation or evaluation failure
    #[error(transparent)]
    Formula(#[from] FormulaError),

    /// Operation targeted a missing node
    #[error("Node not found: {0}")]
    NodeNotFound(NodeId),

    /// The edit would close a reference cycle; nothing was mutated
    #[error("Circular dependency: {id} cannot reference {via}")]
    CircularDependency {
        /// The node being edited
        id: NodeId,
        /// The referenced node a path leads back from
        via: NodeId,
    },

    /// Delete blocked because other nodes still reference this one
    #[error("Cannot delete {id}: referenced by {}", join_ids(.dependents))]
    DependentsExist {
        /// The node that was to be deleted
        id: NodeId,
        /// The nodes whose formulas still reference it
        dependents: Vec<NodeId>,
    },

    /// One or more descendants failed to recompute during a cascade
    ///
    /// The cascade ran to completion; nodes listed here kept their
    /// last-known value and can be retried individually.
    #[error("Cascade completed with {} failed node(s)", .failures.len())]
    CascadeFailure {
        /// Per-node failures, in attempted recalculation order
        failures: Vec<CascadeError>,
    },

    /// Invariant violation inside the graph manager, not user-triggerable
    #[error("Internal consistency error: {0}")]
    Internal(String),
}

/// A single node's recalculation failure inside a cascade
#[derive(Debug, Error)]
#[error("{id}: {error}")]
pub struct CascadeError {
    /// Node that failed to recompute
    pub id: NodeId,
    /// Why it failed
    pub error: Error,
}

fn join_ids(ids: &[NodeId]) -> String {
    ids.iter()
        .map(|id| id.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dependents_message_lists_ids() {
        let err = Error::DependentsExist {
            id: NodeId::from("n1"),
            dependents: vec![NodeId::from("n2"), NodeId::from("n3")],
        };
        assert_eq!(err.to_string(), "Cannot delete n1: referenced by n2, n3");
    }

    #[test]
    fn test_formula_error_passes_through() {
        let err = Error::from(FormulaError::DivisionByZero);
        assert_eq!(err.to_string(), "Division by zero");
    }
}
