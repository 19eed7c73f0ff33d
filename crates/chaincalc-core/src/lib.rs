//! # chaincalc-core
//!
//! Core data structures for the chaincalc calculation-graph library.
//!
//! This crate provides the fundamental types used throughout chaincalc:
//! - [`Node`] and [`NodeId`] - A computed value, its formula, and its graph edges
//! - [`NodeStore`] - The persistence boundary the graph manager talks to
//! - [`MemoryStore`] - An in-memory store, sufficient for tests and the CLI
//!
//! ## Example
//!
//! ```rust
//! use chaincalc_core::{MemoryStore, Node, NodeId, NodeStore};
//! use bigdecimal::BigDecimal;
//! use std::str::FromStr;
//!
//! let mut store = MemoryStore::new();
//! let id = NodeId::from("n1");
//! let node = Node::new(id.clone(), "1+2", BigDecimal::from_str("3").unwrap(), vec![]);
//! store.put(node);
//!
//! assert_eq!(store.get(&id).unwrap().formula, "1+2");
//! ```

pub mod node;
pub mod store;

// Re-exports for convenience
pub use node::{Node, NodeId};
pub use store::{MemoryStore, NodeStore};
