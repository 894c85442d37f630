//! Index abstraction consumed by the similarity pipeline.
//!
//! The pipeline never touches postings, vectors or stored fields directly.
//! Everything it needs from the search engine and the document store goes
//! through [`SimilarityIndex`], one implementation per engine. The crate
//! ships [`memory::MemoryIndex`], an in-memory reference implementation.
//!
//! An implementation is expected to answer every call of one request from
//! the same point-in-time view of the index; the pipeline borrows a single
//! `&impl SimilarityIndex` for the whole request.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::document::{DocId, FieldValue};
use crate::error::Result;
use crate::similar::filter::CombinedFilter;

pub mod analyzer;
pub mod bm25;
pub mod distance;
pub mod filter_parser;
pub mod loader;
pub mod memory;

/// A parsed filter: a predicate over internal document ids.
pub trait DocPredicate: Send + Sync + fmt::Debug {
    /// Whether the document passes this filter.
    fn matches(&self, doc_id: DocId) -> bool;
}

/// A document returned by a similarity query, with its raw score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoredDoc {
    pub doc_id: DocId,
    pub score: f32,
}

impl ScoredDoc {
    pub fn new(doc_id: DocId, score: f32) -> Self {
        Self { doc_id, score }
    }
}

/// Stored values of the requested fields, in request order.
///
/// Fields the document does not store are left out.
pub type StoredFields = Vec<(String, Vec<FieldValue>)>;

/// Nearest-neighbor query over one vector field.
#[derive(Debug, Clone, Copy)]
pub struct VectorQuery<'a> {
    /// Vector field to search.
    pub field: &'a str,
    /// Query vector.
    pub vector: &'a [f32],
    /// Number of neighbors to return.
    pub k: usize,
    /// Restriction on candidate documents.
    pub filter: Option<&'a CombinedFilter>,
}

/// Term-pruning thresholds for "more like this" queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoreLikeThisParams {
    /// Minimum frequency of a term within the source document.
    pub min_term_freq: u32,
    /// Minimum number of documents a term must occur in.
    pub min_doc_freq: u32,
    /// Maximum number of source terms used in the query.
    pub max_query_terms: usize,
}

impl Default for MoreLikeThisParams {
    fn default() -> Self {
        Self {
            min_term_freq: 1,
            min_doc_freq: 1,
            max_query_terms: 25,
        }
    }
}

/// "More like this" query built from the terms of a source document.
#[derive(Debug, Clone, Copy)]
pub struct LexicalQuery<'a> {
    /// Document whose terms make up the query.
    pub source: DocId,
    /// Fields to take terms from and to match against, in order.
    pub fields: &'a [String],
    /// Identifier field used to exclude the source document.
    pub exclude_field: &'a str,
    /// External identifier of the document to exclude.
    pub exclude_value: &'a str,
    /// Restriction on candidate documents.
    pub filter: Option<&'a CombinedFilter>,
    /// Number of documents to return.
    pub k: usize,
    /// Term-pruning thresholds.
    pub params: MoreLikeThisParams,
}

/// Everything the similarity pipeline needs from an index.
///
/// Implementations report only genuine failures (I/O, corrupt data,
/// malformed filter syntax) as errors. Absence is expressed with `None` or
/// an empty list.
pub trait SimilarityIndex: Send + Sync {
    /// Find the internal id of the document with this external identifier.
    fn resolve_document(&self, external_id: &str) -> Result<Option<DocId>>;

    /// The stored vector of a document for a vector field, if it has one.
    fn read_vector(&self, doc_id: DocId, field: &str) -> Result<Option<Vec<f32>>>;

    /// Approximate nearest neighbors, best first.
    fn vector_query(&self, query: &VectorQuery<'_>) -> Result<Vec<ScoredDoc>>;

    /// Lexically similar documents, best first.
    fn lexical_query(&self, query: &LexicalQuery<'_>) -> Result<Vec<ScoredDoc>>;

    /// Parse a filter expression in the engine's filter syntax.
    fn parse_filter(&self, expression: &str) -> Result<Arc<dyn DocPredicate>>;

    /// Stored values for exactly the requested fields.
    fn fetch_stored_fields(&self, doc_id: DocId, fields: &[String]) -> Result<StoredFields>;
}

impl<T: SimilarityIndex + ?Sized> SimilarityIndex for Arc<T> {
    fn resolve_document(&self, external_id: &str) -> Result<Option<DocId>> {
        (**self).resolve_document(external_id)
    }

    fn read_vector(&self, doc_id: DocId, field: &str) -> Result<Option<Vec<f32>>> {
        (**self).read_vector(doc_id, field)
    }

    fn vector_query(&self, query: &VectorQuery<'_>) -> Result<Vec<ScoredDoc>> {
        (**self).vector_query(query)
    }

    fn lexical_query(&self, query: &LexicalQuery<'_>) -> Result<Vec<ScoredDoc>> {
        (**self).lexical_query(query)
    }

    fn parse_filter(&self, expression: &str) -> Result<Arc<dyn DocPredicate>> {
        (**self).parse_filter(expression)
    }

    fn fetch_stored_fields(&self, doc_id: DocId, fields: &[String]) -> Result<StoredFields> {
        (**self).fetch_stored_fields(doc_id, fields)
    }
}
