//! Per-signal candidate retrieval.
//!
//! Each retriever wraps exactly one similarity query against the index and
//! turns its hits into a raw [`ScoreMap`]. Both ask for `count + 1` hits so
//! that dropping the source document still leaves `count` candidates.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::document::DocumentRef;
use crate::error::Result;
use crate::index::{LexicalQuery, MoreLikeThisParams, SimilarityIndex, VectorQuery};
use crate::similar::config::RequestConfig;
use crate::similar::filter::CombinedFilter;
use crate::similar::observer::PipelineObserver;
use crate::similar::scorer::ScoreMap;

/// A similarity signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    /// Dense vector nearest-neighbor similarity.
    Vector,
    /// Lexical term-overlap similarity.
    Lexical,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Vector => "vector",
            Signal::Lexical => "lexical",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a retriever needs to know about the current request.
#[derive(Debug, Clone, Copy)]
pub struct RetrievalContext<'a> {
    /// The resolved source document.
    pub source: &'a DocumentRef,
    /// The resolved request.
    pub request: &'a RequestConfig,
    /// Field holding the external identifier.
    pub key_field: &'a str,
    /// Combined caller filter, `None` for no restriction.
    pub filter: Option<&'a CombinedFilter>,
    /// Term-pruning thresholds for the lexical query.
    pub mlt: MoreLikeThisParams,
    /// Diagnostics sink.
    pub observer: &'a dyn PipelineObserver,
}

impl RetrievalContext<'_> {
    /// Number of hits requested from the index.
    pub fn k(&self) -> usize {
        self.request.count.saturating_add(1)
    }
}

/// Produces raw scores for one signal.
pub trait CandidateRetriever: Send + Sync {
    /// The signal this retriever produces.
    fn signal(&self) -> Signal;

    /// Query the index and return raw scores, without the source document.
    fn retrieve(&self, index: &dyn SimilarityIndex, ctx: &RetrievalContext<'_>)
    -> Result<ScoreMap>;
}

/// Nearest neighbors of the source document's vector.
#[derive(Debug, Default, Clone, Copy)]
pub struct VectorRetriever;

impl CandidateRetriever for VectorRetriever {
    fn signal(&self) -> Signal {
        Signal::Vector
    }

    fn retrieve(
        &self,
        index: &dyn SimilarityIndex,
        ctx: &RetrievalContext<'_>,
    ) -> Result<ScoreMap> {
        let field = ctx.request.vector_field.as_str();
        let Some(vector) = index.read_vector(ctx.source.doc_id, field)? else {
            ctx.observer.missing_vector(&ctx.source.external_id, field);
            return Ok(ScoreMap::new());
        };

        let hits = index.vector_query(&VectorQuery {
            field,
            vector: &vector,
            k: ctx.k(),
            filter: ctx.filter,
        })?;

        let mut scores: ScoreMap = hits.into_iter().collect();
        scores.remove(ctx.source.doc_id);
        Ok(scores)
    }
}

/// "More like this" query over the source document's terms.
#[derive(Debug, Default, Clone, Copy)]
pub struct LexicalRetriever;

impl CandidateRetriever for LexicalRetriever {
    fn signal(&self) -> Signal {
        Signal::Lexical
    }

    fn retrieve(
        &self,
        index: &dyn SimilarityIndex,
        ctx: &RetrievalContext<'_>,
    ) -> Result<ScoreMap> {
        let hits = index.lexical_query(&LexicalQuery {
            source: ctx.source.doc_id,
            fields: &ctx.request.lexical_fields,
            exclude_field: ctx.key_field,
            exclude_value: &ctx.source.external_id,
            filter: ctx.filter,
            k: ctx.k(),
            params: ctx.mlt,
        })?;

        // Drop the source even if the engine ignored the exclusion.
        let mut scores: ScoreMap = hits.into_iter().collect();
        scores.remove(ctx.source.doc_id);
        Ok(scores)
    }
}
