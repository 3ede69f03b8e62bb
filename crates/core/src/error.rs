//! Error model for the domain primitives.

use thiserror::Error;

/// Result type used by the foundation types.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised by the foundation types themselves.
///
/// Keep this focused on parsing and arithmetic over the primitives.
/// Component-specific failures (chart validation, posting, reporting)
/// belong to the ledger crate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A monetary amount could not be parsed.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// Fixed-point arithmetic overflowed.
    #[error("amount overflow")]
    AmountOverflow,
}

impl CoreError {
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn invalid_amount(msg: impl Into<String>) -> Self {
        Self::InvalidAmount(msg.into())
    }
}
