//! # chaincalc
//!
//! A chained-calculation kernel: exact-decimal formulas over a dependency
//! graph, a minimal spreadsheet engine without the spreadsheet.
//!
//! Chaincalc lets any computed result be referenced by a later formula via
//! `{{id}}` tokens, forming a directed acyclic graph of values. Editing an
//! upstream formula recomputes every downstream node exactly once, parents
//! before children.
//!
//! ## Features
//!
//! - Arbitrary-precision decimal arithmetic (`0.1+0.2` is exactly `0.3`)
//! - Standard operator precedence with `+ - * / % ^` and parentheses
//! - Cycle rejection before any edge is committed
//! - Ordered cascading recalculation with per-node failure reporting
//! - Pluggable node persistence behind the [`NodeStore`] trait
//!
//! ## Example
//!
//! ```rust
//! use chaincalc::prelude::*;
//!
//! let mut graph = GraphManager::new(MemoryStore::new());
//!
//! let price = graph.create_node("19.99").unwrap();
//! let total = graph
//!     .create_node(&format!("{{{{{}}}}}*3", price.id))
//!     .unwrap();
//! assert_eq!(total.value_text(), "59.97");
//!
//! let outcome = graph.update_formula(&price.id, "24.99").unwrap();
//! assert!(outcome.is_complete());
//! assert_eq!(graph.node(&total.id).unwrap().value_text(), "74.97");
//! ```

pub mod error;
pub mod graph;
pub mod prelude;

// Re-export graph types
pub use error::{CascadeError, Error, Result};
pub use graph::{CascadeOutcome, GraphManager};

// Re-export core types
pub use chaincalc_core::{MemoryStore, Node, NodeId, NodeStore};

// Re-export formula types
pub use chaincalc_formula::{
    calculate_formula, evaluate, extract_references, parse, substitute, tokenize, validate,
    BinaryOperator, DependencyGraph, Expr, FormulaError, FormulaResult, UnaryOperator,
};
