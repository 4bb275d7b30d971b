//! Error handling for Sales Digest
//!
//! Defines the error taxonomy surfaced to callers of the aggregation engine.
//! Schema mismatches and cell coercion failures are not errors: they are
//! absorbed where they happen and only show up in the logs.

use std::path::PathBuf;
use thiserror::Error;

/// Core error types for ingestion and aggregation
#[derive(Error, Debug)]
pub enum DigestError {
    /// Malformed request parameter (category, dimension, year, month, file name)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The file store could not be read or written
    #[error("file store access failed at {path:?}")]
    StoreAccess {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("configuration error: {0}")]
    Config(String),

    /// Sums across both categories left the representable range
    #[error("quantity totals across categories are out of range")]
    Overflow(#[from] crate::reports::QuantityOverflow),
}

impl DigestError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        DigestError::InvalidArgument(msg.into())
    }

    pub fn store(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DigestError::StoreAccess {
            path: path.into(),
            source,
        }
    }

    /// True for errors caused by the caller's input rather than the environment
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, DigestError::InvalidArgument(_))
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, DigestError>;
