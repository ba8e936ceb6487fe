//! Server error types.

use thiserror::Error;

/// Server errors.
#[derive(Debug, Error)]
pub enum Error {
    /// Database error.
    #[error("database error: {0}")]
    Database(String),

    /// Query engine error.
    #[error("query error: {0}")]
    Core(#[from] jpashop_core::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Response encoding error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
