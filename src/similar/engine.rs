//! Similarity engine orchestrating the retrieval-fusion pipeline.
//!
//! # Pipeline
//!
//! 1. Resolve the source document from its external identifier
//! 2. Build the combined filter from the caller's expressions
//! 3. Retrieve raw scores for every signal the mode runs
//! 4. Normalize each score map by its maximum
//! 5. Fuse with the mode's effective weights
//! 6. Rank, excluding the source, and truncate
//! 7. Project stored fields and the score breakdown

use std::sync::Arc;

use crate::document::DocumentRef;
use crate::error::Result;
use crate::index::{MoreLikeThisParams, SimilarityIndex};
use crate::similar::config::{RequestConfig, RequestParams, SimilarConfig};
use crate::similar::filter::FilterBuilder;
use crate::similar::merger::fuse;
use crate::similar::mode::FusionMode;
use crate::similar::observer::{PipelineObserver, TracingObserver};
use crate::similar::projector::{SimilarResponse, project};
use crate::similar::ranker::rank;
use crate::similar::retriever::{
    CandidateRetriever, LexicalRetriever, RetrievalContext, VectorRetriever,
};
use crate::similar::scorer::ScoreMap;

/// Engine answering "more like this" requests against an index.
///
/// The engine holds no per-request state and can be shared across threads.
/// Every call borrows one index view for the whole request.
#[derive(Debug)]
pub struct SimilarEngine {
    config: SimilarConfig,
    observer: Arc<dyn PipelineObserver>,
    vector_retriever: VectorRetriever,
    lexical_retriever: LexicalRetriever,
}

impl SimilarEngine {
    /// Create an engine reporting through [`TracingObserver`].
    pub fn new(config: SimilarConfig) -> Self {
        Self {
            config,
            observer: Arc::new(TracingObserver),
            vector_retriever: VectorRetriever,
            lexical_retriever: LexicalRetriever,
        }
    }

    /// Replace the observer.
    pub fn with_observer(mut self, observer: Arc<dyn PipelineObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// The component defaults.
    pub fn config(&self) -> &SimilarConfig {
        &self.config
    }

    /// Handle raw request parameters.
    ///
    /// Returns `Ok(None)` when the request does not ask for similar
    /// documents (feature disabled or no source identifier).
    ///
    /// # Arguments
    ///
    /// * `index` - Index view answering every query of the request
    /// * `params` - Raw request parameters
    ///
    /// # Returns
    ///
    /// The response, `None` when there is nothing to do, or an error for a
    /// malformed request or a failing index.
    pub fn process<I: SimilarityIndex>(
        &self,
        index: &I,
        params: &RequestParams,
    ) -> Result<Option<SimilarResponse>> {
        match RequestConfig::resolve(params, &self.config)? {
            Some(request) => self.find_similar(index, &request).map(Some),
            None => Ok(None),
        }
    }

    /// Find documents similar to the request's source document.
    ///
    /// An unknown source identifier yields an empty response, not an error.
    pub fn find_similar<I: SimilarityIndex>(
        &self,
        index: &I,
        request: &RequestConfig,
    ) -> Result<SimilarResponse> {
        let index: &dyn SimilarityIndex = index;
        let observer = self.observer.as_ref();

        let Some(doc_id) = index.resolve_document(&request.source_id)? else {
            observer.source_not_found(&request.source_id);
            return Ok(SimilarResponse::empty(&request.source_id, request.mode));
        };
        let source = DocumentRef::new(&request.source_id, doc_id);

        let filter = FilterBuilder::build(index, &request.filters, observer);

        let ctx = RetrievalContext {
            source: &source,
            request,
            key_field: &self.config.unique_key_field,
            filter: filter.as_ref(),
            mlt: MoreLikeThisParams {
                max_query_terms: self.config.max_query_terms,
                ..Default::default()
            },
            observer,
        };

        let (vector, lexical) = self.retrieve(index, &ctx, request.mode)?;
        let vector = vector.normalize();
        let lexical = lexical.normalize();

        let (vector_weight, lexical_weight) = request
            .mode
            .effective_weights(request.vector_weight, request.lexical_weight);
        let candidates = fuse(&vector, &lexical, vector_weight, lexical_weight);
        let ranked = rank(candidates, source.doc_id, request.count);

        let docs = project(index, &ranked, &request.return_fields)?;
        let response = SimilarResponse::new(&request.source_id, request.mode, docs);

        observer.completed(&request.source_id, request.mode, response.num_found);
        Ok(response)
    }

    fn retrieve(
        &self,
        index: &dyn SimilarityIndex,
        ctx: &RetrievalContext<'_>,
        mode: FusionMode,
    ) -> Result<(ScoreMap, ScoreMap)> {
        if self.config.parallel_retrieval && mode.runs_vector() && mode.runs_lexical() {
            let (vector, lexical) = rayon::join(
                || self.run_retriever(&self.vector_retriever, true, index, ctx),
                || self.run_retriever(&self.lexical_retriever, true, index, ctx),
            );
            return Ok((vector?, lexical?));
        }

        let vector = self.run_retriever(&self.vector_retriever, mode.runs_vector(), index, ctx)?;
        let lexical =
            self.run_retriever(&self.lexical_retriever, mode.runs_lexical(), index, ctx)?;
        Ok((vector, lexical))
    }

    fn run_retriever(
        &self,
        retriever: &dyn CandidateRetriever,
        enabled: bool,
        index: &dyn SimilarityIndex,
        ctx: &RetrievalContext<'_>,
    ) -> Result<ScoreMap> {
        if !enabled {
            return Ok(ScoreMap::new());
        }

        let scores = retriever.retrieve(index, ctx)?;
        self.observer.signal_retrieved(retriever.signal(), scores.len());
        Ok(scores)
    }
}

impl Default for SimilarEngine {
    fn default() -> Self {
        Self::new(SimilarConfig::default())
    }
}
