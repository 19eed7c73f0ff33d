//! # chaincalc-formula
//!
//! Formula parser and exact-decimal evaluator for chaincalc.
//!
//! This crate provides:
//! - Tokenizing, validation, and reference extraction for formula text
//! - `{{id}}` reference substitution
//! - Formula parsing (text → expression tree)
//! - Arbitrary-precision decimal evaluation
//! - The dependency-edge index used for recalculation ordering
//!
//! ## Example
//!
//! ```rust
//! use chaincalc_formula::evaluate;
//!
//! let value = evaluate("0.1+0.2").unwrap();
//! assert_eq!(value.to_string(), "0.3");
//! ```

pub mod ast;
pub mod dependency;
pub mod error;
pub mod evaluator;
pub mod parser;

pub use ast::{BinaryOperator, Expr, UnaryOperator};
pub use dependency::DependencyGraph;
pub use error::{FormulaError, FormulaResult};
pub use evaluator::{calculate_formula, evaluate};
pub use parser::{extract_references, parse, substitute, tokenize, validate, Spanned, Token};
