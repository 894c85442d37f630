//! Error types for the Relata library.
//!
//! All fallible operations return [`Result`], whose error type is the
//! [`RelataError`] enum.
//!
//! Expected absences (an unknown source document, a document without a
//! vector, a signal that produced no candidates) are not errors in Relata;
//! they surface as empty results. Errors are reserved for malformed requests
//! and for failures of the index that answers the similarity queries.
//!
//! # Examples
//!
//! ```
//! use relata::error::{RelataError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(RelataError::invalid_argument("smlt.count must be a number"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for Relata operations.
#[derive(Error, Debug)]
pub enum RelataError {
    /// I/O errors (reading document files, configuration files, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Index-related errors (duplicate ids, inconsistent vectors, ...)
    #[error("Index error: {0}")]
    Index(String),

    /// Query-related errors (filter parsing, invalid query vectors, ...)
    #[error("Query error: {0}")]
    Query(String),

    /// Storage-related errors (stored field access)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Malformed request parameters or configuration values
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for operations that may fail with RelataError.
pub type Result<T> = std::result::Result<T, RelataError>;

impl RelataError {
    /// Create a new index error.
    pub fn index<S: Into<String>>(msg: S) -> Self {
        RelataError::Index(msg.into())
    }

    /// Create a new query error.
    pub fn query<S: Into<String>>(msg: S) -> Self {
        RelataError::Query(msg.into())
    }

    /// Create a new parse error.
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        RelataError::Query(msg.into()) // Parse errors are treated as query errors
    }

    /// Create a new storage error.
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        RelataError::Storage(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        RelataError::InvalidArgument(msg.into())
    }

    /// Create a new invalid config error.
    pub fn invalid_config<S: Into<String>>(msg: S) -> Self {
        RelataError::InvalidArgument(format!("Invalid configuration: {}", msg.into()))
    }
}
