//! Hybrid "more like this" retrieval.
//!
//! Given a document that is already in an index, this module finds other
//! documents similar to it by combining two signals:
//! - Dense vector nearest-neighbor similarity
//! - Lexical term-overlap ("more like this") similarity
//!
//! # Architecture
//!
//! The pipeline is a fixed sequence of small components:
//!
//! - **Configuration**: `config` - component defaults and request resolution
//! - **Mode**: `mode` - which signals run and their effective weights
//! - **Filtering**: `filter` - caller filter expressions combined into one restriction
//! - **Retrieval**: `retriever` - one retriever per signal, producing sparse score maps
//! - **Scoring**: `scorer` - max normalization of score maps
//! - **Fusion**: `merger` - weighted combination into scored candidates
//! - **Ranking**: `ranker` - source exclusion, ordering and truncation
//! - **Projection**: `projector` - stored fields plus score breakdown
//! - **Engine**: `engine` - orchestration of the above
//! - **Observer**: `observer` - injected diagnostics
//!
//! # Example
//!
//! ```
//! use relata::document::StoredDocument;
//! use relata::index::memory::MemoryIndex;
//! use relata::similar::config::{RequestParams, SimilarConfig};
//! use relata::similar::engine::SimilarEngine;
//!
//! # fn main() -> relata::error::Result<()> {
//! let index = MemoryIndex::default();
//! index.add_document(
//!     StoredDocument::builder("a")
//!         .add_text("title", "rust search engine")
//!         .add_vector("content_vector", vec![1.0, 0.0])
//!         .build(),
//! )?;
//! index.add_document(
//!     StoredDocument::builder("b")
//!         .add_text("title", "rust web framework")
//!         .add_vector("content_vector", vec![0.8, 0.2])
//!         .build(),
//! )?;
//! index.commit()?;
//!
//! let engine = SimilarEngine::new(SimilarConfig::default());
//! let params = RequestParams::from_pairs([("smlt", "true"), ("smlt.id", "a")]);
//!
//! let response = engine.process(&index.snapshot(), &params)?.unwrap();
//! assert_eq!(response.num_found, 1);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod engine;
pub mod filter;
pub mod merger;
pub mod mode;
pub mod observer;
pub mod projector;
pub mod ranker;
pub mod retriever;
pub mod scorer;
