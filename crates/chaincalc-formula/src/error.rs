//! Formula error types

use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Errors that can occur during formula validation or evaluation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormulaError {
    /// Malformed formula text
    #[error("Syntax error at offset {position}: {message}")]
    Syntax {
        /// Byte offset of the offending character or token
        position: usize,
        /// What went wrong there
        message: String,
    },

    /// A `{{id}}` reference that was not substituted with a value
    #[error("Unknown reference: {0}")]
    UnknownReference(String),

    /// Division or modulo by exactly zero
    #[error("Division by zero")]
    DivisionByZero,

    /// `^` with a fractional or out-of-range exponent
    #[error("Unsupported exponent: {0}")]
    UnsupportedExponent(String),
}

impl FormulaError {
    /// Create a syntax error at a byte offset
    pub fn syntax(position: usize, message: impl Into<String>) -> Self {
        FormulaError::Syntax {
            position,
            message: message.into(),
        }
    }
}
