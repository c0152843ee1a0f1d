use thiserror::Error;

use crate::transaction::TxKind;

/// Errors produced by type operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("integer argument is {0} bytes wide; at most 8 are allowed")]
    IntegerTooWide(usize),

    #[error("group has {actual} transactions, expected {expected}")]
    GroupSize { expected: usize, actual: usize },

    #[error("transaction {index} is {found}, expected {expected}")]
    UnexpectedKind {
        index: usize,
        expected: TxKind,
        found: TxKind,
    },

    #[error("group has no transaction at index {0}")]
    MissingTransaction(usize),

    #[error("serialization error: {0}")]
    Serialization(String),
}
