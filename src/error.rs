//! Crate-wide error type.
//!
//! Every fallible operation in the core (`vector_store`, `binary_store`,
//! `hnsw`, `index_manager`, `query_engine`, `collection`,
//! `collection_manager`) returns `Result<T, VecStreamError>`. Loads that can
//! tolerate corruption (a damaged `metadata.json`, a truncated vectors blob)
//! do not raise this error — they log a warning and fall back to an empty
//! store, per the persistence contract in [`crate::binary_store`].

use thiserror::Error;

/// Errors raised by the vecstream core.
#[derive(Error, Debug)]
pub enum VecStreamError {
    /// An ID, collection name, or file was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A collection name collided with an existing one on creation.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// A vector's length disagreed with the store's fixed dimension.
    #[error("invalid dimension: expected {expected}, got {actual}")]
    InvalidDimension {
        /// Dimension established by the store's first insertion.
        expected: usize,
        /// Dimension of the vector that was rejected.
        actual: usize,
    },

    /// A filter was not a map of scalar-valued, dot-path-addressable leaves.
    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    /// A disk read or write failed.
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    /// A persisted blob could not be decoded (but the caller asked for a
    /// hard failure rather than the "warn and start empty" tolerance that
    /// store construction uses).
    #[error("serialization failure: {0}")]
    Serialization(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, VecStreamError>;

impl From<serde_json::Error> for VecStreamError {
    fn from(e: serde_json::Error) -> Self {
        VecStreamError::Serialization(e.to_string())
    }
}

impl From<serde_yaml::Error> for VecStreamError {
    fn from(e: serde_yaml::Error) -> Self {
        VecStreamError::Serialization(e.to_string())
    }
}
