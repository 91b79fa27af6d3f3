//! Error type for parsing fundamental types.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("invalid length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    #[error("unknown network id: {0}")]
    UnknownNetwork(String),

    #[error("unknown provider: {0}")]
    UnknownProvider(String),
}
