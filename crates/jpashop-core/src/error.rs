//! Core error types.

use thiserror::Error;

/// Core errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Storage layer error.
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Deserialization error.
    #[error("deserialization error: {0}")]
    Deserialization(String),

    /// Key decoding error.
    #[error("invalid key format")]
    InvalidKey,

    /// Record not found.
    #[error("record not found")]
    NotFound,

    /// Invalid data format.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Offset/limit requested against a strategy whose join multiplies root
    /// rows, where the window would be applied to child rows.
    #[error(
        "pagination (offset {offset}, limit {limit}) is not supported by the {strategy} strategy"
    )]
    InvalidPagination {
        strategy: &'static str,
        offset: u32,
        limit: u32,
    },
}
