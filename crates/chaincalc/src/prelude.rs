//! Prelude module - common imports for chaincalc users
//!
//! ```rust
//! use chaincalc::prelude::*;
//! ```

pub use crate::{
    // Graph types
    CascadeError,
    CascadeOutcome,
    // Error types
    Error,
    // Formula types
    FormulaError,
    FormulaResult,
    GraphManager,
    // Store types
    MemoryStore,
    // Node types
    Node,
    NodeId,
    NodeStore,
    Result,
};

pub use crate::{calculate_formula, evaluate, extract_references, substitute, validate};
