//! # Relata
//!
//! Hybrid "more like this" retrieval for Rust.
//!
//! ## Features
//!
//! - Related documents from a source document already in the index
//! - Dense vector and lexical similarity fused into one ranking
//! - Per-signal max normalization and configurable weights
//! - Caller filters applied to both signals
//! - Index access through a trait, with an in-memory reference index
//!
//! ## Modules
//!
//! - [`similar`]: the retrieval-fusion pipeline
//! - [`index`]: the index abstraction and the in-memory implementation
//! - [`document`]: stored documents and field values
//! - [`cli`]: the `relata` command line tool

pub mod cli;
pub mod document;
pub mod error;
pub mod index;
pub mod similar;

pub mod prelude {
    pub use crate::document::{DocId, DocumentRef, FieldValue, StoredDocument, StoredValue};
    pub use crate::error::{RelataError, Result};
    pub use crate::index::memory::{MemoryIndex, MemorySnapshot};
    pub use crate::index::SimilarityIndex;
    pub use crate::similar::config::{RequestConfig, RequestParams, SimilarConfig};
    pub use crate::similar::engine::SimilarEngine;
    pub use crate::similar::mode::FusionMode;
    pub use crate::similar::projector::{SimilarDoc, SimilarResponse};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
