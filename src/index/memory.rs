//! In-memory reference implementation of [`SimilarityIndex`].
//!
//! [`MemoryIndex`] accepts documents and publishes immutable
//! [`MemorySnapshot`]s on [`MemoryIndex::commit`]. A snapshot is what answers
//! queries; holding one keeps a consistent view of the index no matter how
//! many commits happen afterwards.
//!
//! Nearest-neighbor search is a flat scan and lexical similarity is BM25 over
//! in-memory postings. Both are meant for tests, demos and small corpora.
//!
//! # Examples
//!
//! ```
//! use relata::document::StoredDocument;
//! use relata::index::SimilarityIndex;
//! use relata::index::memory::MemoryIndex;
//!
//! let index = MemoryIndex::default();
//! index.add_document(
//!     StoredDocument::builder("a")
//!         .add_text("title", "rust search engine")
//!         .add_vector("content_vector", vec![1.0, 0.0])
//!         .build(),
//! ).unwrap();
//! index.commit().unwrap();
//!
//! let snapshot = index.snapshot();
//! assert_eq!(snapshot.resolve_document("a").unwrap(), Some(0));
//! assert_eq!(snapshot.resolve_document("missing").unwrap(), None);
//! ```

use std::sync::Arc;

use ahash::{AHashMap, AHashSet};
use bit_vec::BitVec;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::document::{DocId, FieldValue, StoredDocument};
use crate::error::{RelataError, Result};
use crate::index::analyzer::{Analyzer, StandardAnalyzer};
use crate::index::bm25::{Bm25Config, FieldStats, term_weight};
use crate::index::distance::VectorSimilarity;
use crate::index::filter_parser::FilterParser;
use crate::index::{
    DocPredicate, LexicalQuery, ScoredDoc, SimilarityIndex, StoredFields, VectorQuery,
};
use crate::similar::filter::CombinedFilter;

/// Configuration for the in-memory index.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryIndexConfig {
    /// Field holding the external identifier.
    pub unique_key_field: String,
    /// Similarity used for nearest-neighbor queries.
    pub similarity: VectorSimilarity,
    /// BM25 parameters for lexical queries.
    pub bm25: Bm25Config,
}

impl Default for MemoryIndexConfig {
    fn default() -> Self {
        Self {
            unique_key_field: "id".to_string(),
            similarity: VectorSimilarity::default(),
            bm25: Bm25Config::default(),
        }
    }
}

/// Documents added since the index was created, committed or not.
#[derive(Debug, Default)]
struct PendingState {
    documents: Vec<StoredDocument>,
    ids: AHashMap<String, DocId>,
    vector_dims: AHashMap<String, usize>,
}

/// A writable in-memory index.
#[derive(Debug)]
pub struct MemoryIndex {
    config: MemoryIndexConfig,
    analyzer: Arc<dyn Analyzer>,
    pending: RwLock<PendingState>,
    current: RwLock<Arc<MemorySnapshot>>,
}

impl Default for MemoryIndex {
    fn default() -> Self {
        Self::new(MemoryIndexConfig::default())
    }
}

impl MemoryIndex {
    /// Create an empty index with the standard analyzer.
    pub fn new(config: MemoryIndexConfig) -> Self {
        Self::with_analyzer(config, Arc::new(StandardAnalyzer::new()))
    }

    /// Create an empty index with a custom analyzer.
    pub fn with_analyzer(config: MemoryIndexConfig, analyzer: Arc<dyn Analyzer>) -> Self {
        let empty = MemorySnapshot::build(config.clone(), analyzer.clone(), Vec::new());
        Self {
            config,
            analyzer,
            pending: RwLock::new(PendingState::default()),
            current: RwLock::new(Arc::new(empty)),
        }
    }

    /// The index configuration.
    pub fn config(&self) -> &MemoryIndexConfig {
        &self.config
    }

    /// Add a document and return the internal id it will have once committed.
    ///
    /// Fails if the external id is empty or already present, if a vector has
    /// a NaN or infinite component, or if its dimension differs from earlier
    /// vectors of the same field.
    pub fn add_document(&self, mut doc: StoredDocument) -> Result<DocId> {
        if doc.id().is_empty() {
            return Err(RelataError::index("Document id must not be empty"));
        }

        let mut pending = self.pending.write();

        if pending.ids.contains_key(doc.id()) {
            return Err(RelataError::index(format!(
                "Duplicate document id: {}",
                doc.id()
            )));
        }

        for (field, vector) in doc.vectors() {
            if vector.is_empty() {
                return Err(RelataError::index(format!(
                    "Empty vector for field '{field}' in document {}",
                    doc.id()
                )));
            }
            if vector.iter().any(|x| !x.is_finite()) {
                return Err(RelataError::index(format!(
                    "Vector field '{field}' in document {} has a non-finite component",
                    doc.id()
                )));
            }
            if let Some(&dim) = pending.vector_dims.get(field)
                && dim != vector.len()
            {
                return Err(RelataError::index(format!(
                    "Vector field '{field}' expects dimension {dim}, document {} has {}",
                    doc.id(),
                    vector.len()
                )));
            }
        }

        let dims: Vec<(String, usize)> = doc
            .vectors()
            .iter()
            .map(|(field, vector)| (field.clone(), vector.len()))
            .collect();
        for (field, dim) in dims {
            pending.vector_dims.entry(field).or_insert(dim);
        }

        // The identifier is stored like any other field so that it can be
        // projected and filtered on.
        if !doc.has_field(&self.config.unique_key_field) {
            let id = doc.id().to_string();
            doc.add_field(self.config.unique_key_field.clone(), FieldValue::Text(id));
        }

        let doc_id = pending.documents.len() as DocId;
        pending.ids.insert(doc.id().to_string(), doc_id);
        pending.documents.push(doc);

        Ok(doc_id)
    }

    /// Publish every added document in a new snapshot.
    pub fn commit(&self) -> Result<()> {
        let documents = self.pending.read().documents.clone();
        let snapshot = MemorySnapshot::build(self.config.clone(), self.analyzer.clone(), documents);
        *self.current.write() = Arc::new(snapshot);
        Ok(())
    }

    /// The most recently committed snapshot.
    pub fn snapshot(&self) -> Arc<MemorySnapshot> {
        self.current.read().clone()
    }

    /// Number of added documents, committed or not.
    pub fn pending_count(&self) -> usize {
        self.pending.read().documents.len()
    }
}

/// Postings and length statistics of one text field.
#[derive(Debug, Default)]
struct FieldPostings {
    /// term -> (doc, term frequency), in doc order.
    terms: AHashMap<String, Vec<(DocId, u32)>>,
    /// Number of terms of the field per document (0 when absent).
    lengths: Vec<u32>,
    stats: FieldStats,
}

impl FieldPostings {
    fn doc_freq(&self, term: &str) -> u64 {
        self.terms.get(term).map_or(0, |postings| postings.len() as u64)
    }
}

/// An immutable point-in-time view of a [`MemoryIndex`].
#[derive(Debug)]
pub struct MemorySnapshot {
    config: MemoryIndexConfig,
    analyzer: Arc<dyn Analyzer>,
    documents: Vec<StoredDocument>,
    ids: AHashMap<String, DocId>,
    postings: AHashMap<String, FieldPostings>,
}

impl MemorySnapshot {
    fn build(
        config: MemoryIndexConfig,
        analyzer: Arc<dyn Analyzer>,
        documents: Vec<StoredDocument>,
    ) -> Self {
        let total_docs = documents.len();
        let mut ids = AHashMap::with_capacity(total_docs);
        let mut postings: AHashMap<String, FieldPostings> = AHashMap::new();

        for (doc_id, doc) in documents.iter().enumerate() {
            let doc_id = doc_id as DocId;
            ids.insert(doc.id().to_string(), doc_id);

            for (field, values) in doc.fields() {
                let term_freqs = analyze_values(analyzer.as_ref(), values);
                if term_freqs.is_empty() {
                    continue;
                }

                let field_postings = postings.entry(field.clone()).or_insert_with(|| {
                    FieldPostings {
                        lengths: vec![0; total_docs],
                        ..Default::default()
                    }
                });

                let mut terms: Vec<(String, u32)> = term_freqs.into_iter().collect();
                terms.sort_by(|a, b| a.0.cmp(&b.0));

                let mut length = 0;
                for (term, tf) in terms {
                    length += tf;
                    field_postings
                        .terms
                        .entry(term)
                        .or_default()
                        .push((doc_id, tf));
                }
                field_postings.lengths[doc_id as usize] = length;
            }
        }

        for field_postings in postings.values_mut() {
            let (sum, count) = field_postings
                .lengths
                .iter()
                .filter(|&&len| len > 0)
                .fold((0u64, 0u64), |(sum, count), &len| {
                    (sum + len as u64, count + 1)
                });
            field_postings.stats = FieldStats {
                total_docs: total_docs as u64,
                avg_field_len: if count > 0 {
                    sum as f32 / count as f32
                } else {
                    0.0
                },
            };
        }

        Self {
            config,
            analyzer,
            documents,
            ids,
            postings,
        }
    }

    /// Number of documents in this snapshot.
    pub fn doc_count(&self) -> usize {
        self.documents.len()
    }

    /// The stored document with this internal id.
    pub fn document(&self, doc_id: DocId) -> Option<&StoredDocument> {
        self.documents.get(doc_id as usize)
    }

    fn require_document(&self, doc_id: DocId) -> Result<&StoredDocument> {
        self.document(doc_id)
            .ok_or_else(|| RelataError::storage(format!("Unknown internal document id {doc_id}")))
    }

    /// Internal ids of documents whose `field` holds `value`.
    fn docs_with_value(&self, field: &str, value: &str) -> AHashSet<DocId> {
        if field == self.config.unique_key_field {
            return self.ids.get(value).copied().into_iter().collect();
        }

        self.documents
            .iter()
            .enumerate()
            .filter(|(_, doc)| {
                doc.get_field(field)
                    .is_some_and(|values| values.iter().any(|v| v.to_string() == value))
            })
            .map(|(doc_id, _)| doc_id as DocId)
            .collect()
    }
}

fn analyze_values(analyzer: &dyn Analyzer, values: &[FieldValue]) -> AHashMap<String, u32> {
    let mut term_freqs = AHashMap::new();
    for value in values {
        if let Some(text) = value.as_text() {
            for term in analyzer.analyze(text) {
                *term_freqs.entry(term).or_insert(0) += 1;
            }
        }
    }
    term_freqs
}

fn passes(filter: Option<&CombinedFilter>, doc_id: DocId) -> bool {
    filter.is_none_or(|f| f.matches(doc_id))
}

fn top_k(mut hits: Vec<ScoredDoc>, k: usize) -> Vec<ScoredDoc> {
    hits.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.doc_id.cmp(&b.doc_id))
    });
    hits.truncate(k);
    hits
}

/// A filter evaluated against one snapshot: the set of matching doc ids.
#[derive(Debug)]
pub struct DocSet {
    bits: BitVec,
}

impl DocSet {
    /// Number of matching documents.
    pub fn len(&self) -> usize {
        self.bits.iter().filter(|bit| *bit).count()
    }

    /// Whether no document matches.
    pub fn is_empty(&self) -> bool {
        self.bits.none()
    }
}

impl DocPredicate for DocSet {
    fn matches(&self, doc_id: DocId) -> bool {
        self.bits.get(doc_id as usize).unwrap_or(false)
    }
}

impl SimilarityIndex for MemorySnapshot {
    fn resolve_document(&self, external_id: &str) -> Result<Option<DocId>> {
        Ok(self.ids.get(external_id).copied())
    }

    fn read_vector(&self, doc_id: DocId, field: &str) -> Result<Option<Vec<f32>>> {
        let doc = self.require_document(doc_id)?;
        Ok(doc.get_vector(field).map(<[f32]>::to_vec))
    }

    fn vector_query(&self, query: &VectorQuery<'_>) -> Result<Vec<ScoredDoc>> {
        if query.k == 0 {
            return Ok(Vec::new());
        }

        let mut hits = Vec::new();
        for (doc_id, doc) in self.documents.iter().enumerate() {
            let doc_id = doc_id as DocId;
            let Some(vector) = doc.get_vector(query.field) else {
                continue;
            };
            if !passes(query.filter, doc_id) {
                continue;
            }
            let score = self.config.similarity.score(query.vector, vector)?;
            hits.push(ScoredDoc::new(doc_id, score));
        }

        Ok(top_k(hits, query.k))
    }

    fn lexical_query(&self, query: &LexicalQuery<'_>) -> Result<Vec<ScoredDoc>> {
        let source = self.require_document(query.source)?;
        if query.k == 0 {
            return Ok(Vec::new());
        }

        let total_docs = self.documents.len() as u64;
        let params = query.params;

        // Pick the most characteristic (field, term) pairs of the source.
        let mut query_terms: Vec<(&str, String, f32)> = Vec::new();
        for field in query.fields {
            let Some(field_postings) = self.postings.get(field) else {
                continue;
            };
            let Some(values) = source.get_field(field) else {
                continue;
            };

            for (term, tf) in analyze_values(self.analyzer.as_ref(), values) {
                if tf < params.min_term_freq {
                    continue;
                }
                let df = field_postings.doc_freq(&term);
                if df < params.min_doc_freq as u64 {
                    continue;
                }
                query_terms.push((field.as_str(), term, term_weight(tf, df, total_docs)));
            }
        }

        query_terms.sort_by(|a, b| {
            b.2.total_cmp(&a.2)
                .then_with(|| a.0.cmp(b.0))
                .then_with(|| a.1.cmp(&b.1))
        });
        query_terms.truncate(params.max_query_terms);

        let excluded = self.docs_with_value(query.exclude_field, query.exclude_value);

        let mut scores: AHashMap<DocId, f32> = AHashMap::new();
        for (field, term, _) in &query_terms {
            let Some(field_postings) = self.postings.get(*field) else {
                continue;
            };
            let Some(postings) = field_postings.terms.get(term) else {
                continue;
            };
            let df = postings.len() as u64;

            for &(doc_id, tf) in postings {
                if excluded.contains(&doc_id) || !passes(query.filter, doc_id) {
                    continue;
                }
                let field_len = field_postings.lengths[doc_id as usize];
                let score = self
                    .config
                    .bm25
                    .score(tf, field_len, df, &field_postings.stats);
                *scores.entry(doc_id).or_insert(0.0) += score;
            }
        }

        let hits = scores
            .into_iter()
            .map(|(doc_id, score)| ScoredDoc::new(doc_id, score))
            .collect();

        Ok(top_k(hits, query.k))
    }

    fn parse_filter(&self, expression: &str) -> Result<Arc<dyn DocPredicate>> {
        let expr = FilterParser::new().parse(expression)?;

        let mut bits = BitVec::from_elem(self.documents.len(), false);
        for (doc_id, doc) in self.documents.iter().enumerate() {
            if expr.matches(doc) {
                bits.set(doc_id, true);
            }
        }

        Ok(Arc::new(DocSet { bits }))
    }

    fn fetch_stored_fields(&self, doc_id: DocId, fields: &[String]) -> Result<StoredFields> {
        let doc = self.require_document(doc_id)?;

        Ok(fields
            .iter()
            .filter_map(|field| {
                doc.get_field(field)
                    .filter(|values| !values.is_empty())
                    .map(|values| (field.clone(), values.to_vec()))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::MoreLikeThisParams;

    fn create_test_index() -> MemoryIndex {
        let index = MemoryIndex::default();
        let docs = vec![
            StoredDocument::builder("a")
                .add_text("title", "rust search engine")
                .add_text("category", "tech")
                .add_vector("content_vector", vec![1.0, 0.0])
                .build(),
            StoredDocument::builder("b")
                .add_text("title", "rust web framework")
                .add_text("category", "tech")
                .add_vector("content_vector", vec![0.9, 0.1])
                .build(),
            StoredDocument::builder("c")
                .add_text("title", "gardening tips")
                .add_text("category", "home")
                .add_vector("content_vector", vec![0.0, 1.0])
                .build(),
            StoredDocument::builder("d")
                .add_text("title", "search engine optimization")
                .add_text("category", "marketing")
                .build(),
        ];
        for doc in docs {
            index.add_document(doc).unwrap();
        }
        index.commit().unwrap();
        index
    }

    fn lexical<'a>(source: DocId, fields: &'a [String], exclude: &'a str) -> LexicalQuery<'a> {
        LexicalQuery {
            source,
            fields,
            exclude_field: "id",
            exclude_value: exclude,
            filter: None,
            k: 10,
            params: MoreLikeThisParams::default(),
        }
    }

    #[test]
    fn test_add_and_resolve() {
        let index = create_test_index();
        let snapshot = index.snapshot();

        assert_eq!(snapshot.doc_count(), 4);
        assert_eq!(snapshot.resolve_document("c").unwrap(), Some(2));
        assert_eq!(snapshot.resolve_document("z").unwrap(), None);
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let index = create_test_index();
        let result = index.add_document(StoredDocument::new("a"));
        assert!(result.is_err());
        assert!(index.add_document(StoredDocument::new("")).is_err());
    }

    #[test]
    fn test_vector_dimension_checked() {
        let index = create_test_index();
        let doc = StoredDocument::builder("e")
            .add_vector("content_vector", vec![1.0, 2.0, 3.0])
            .build();
        assert!(index.add_document(doc).is_err());
        assert_eq!(index.pending_count(), 4);
    }

    #[test]
    fn test_non_finite_vector_rejected() {
        let index = create_test_index();
        for vector in [vec![f32::NAN, 0.0], vec![1.0, f32::INFINITY]] {
            let doc = StoredDocument::builder("e")
                .add_vector("content_vector", vector)
                .build();
            assert!(index.add_document(doc).is_err());
        }
        assert_eq!(index.pending_count(), 4);
    }

    #[test]
    fn test_vector_query_large_components() {
        let index = MemoryIndex::default();
        for (id, vector) in [
            ("a", vec![1e20, 0.0]),
            ("b", vec![1e20, 1e19]),
            ("c", vec![0.0, 1.0]),
        ] {
            let doc = StoredDocument::builder(id)
                .add_vector("content_vector", vector)
                .build();
            index.add_document(doc).unwrap();
        }
        index.commit().unwrap();

        let hits = index
            .snapshot()
            .vector_query(&VectorQuery {
                field: "content_vector",
                vector: &[1e20, 0.0],
                k: 3,
                filter: None,
            })
            .unwrap();

        let ids: Vec<DocId> = hits.iter().map(|h| h.doc_id).collect();
        assert_eq!(ids, vec![0, 1, 2]);
        assert!(hits.iter().all(|h| h.score.is_finite() && h.score >= 0.0));
    }

    #[test]
    fn test_snapshot_isolation() {
        let index = create_test_index();
        let before = index.snapshot();

        index.add_document(StoredDocument::new("e")).unwrap();
        assert_eq!(index.snapshot().doc_count(), 4);

        index.commit().unwrap();
        assert_eq!(before.doc_count(), 4);
        assert_eq!(index.snapshot().doc_count(), 5);
    }

    #[test]
    fn test_read_vector() {
        let snapshot = create_test_index().snapshot();
        assert_eq!(
            snapshot.read_vector(0, "content_vector").unwrap(),
            Some(vec![1.0, 0.0])
        );
        assert_eq!(snapshot.read_vector(3, "content_vector").unwrap(), None);
        assert!(snapshot.read_vector(99, "content_vector").is_err());
    }

    #[test]
    fn test_vector_query() {
        let snapshot = create_test_index().snapshot();
        let query = VectorQuery {
            field: "content_vector",
            vector: &[1.0, 0.0],
            k: 2,
            filter: None,
        };

        let hits = snapshot.vector_query(&query).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].doc_id, 0);
        assert_eq!(hits[1].doc_id, 1);
        assert!(hits[0].score >= hits[1].score);

        let bad = VectorQuery {
            vector: &[1.0, 0.0, 0.0],
            ..query
        };
        assert!(snapshot.vector_query(&bad).is_err());
    }

    #[test]
    fn test_lexical_query_excludes_source() {
        let snapshot = create_test_index().snapshot();
        let fields = vec!["title".to_string()];

        let hits = snapshot.lexical_query(&lexical(0, &fields, "a")).unwrap();
        let ids: Vec<DocId> = hits.iter().map(|h| h.doc_id).collect();

        assert!(!ids.contains(&0));
        assert!(ids.contains(&1)); // "rust"
        assert!(ids.contains(&3)); // "search engine"
        assert!(!ids.contains(&2));
        assert!(hits.iter().all(|h| h.score > 0.0));
    }

    #[test]
    fn test_lexical_query_respects_max_query_terms() {
        let snapshot = create_test_index().snapshot();
        let fields = vec!["title".to_string()];
        let mut query = lexical(0, &fields, "a");
        query.params.max_query_terms = 0;

        assert!(snapshot.lexical_query(&query).unwrap().is_empty());
    }

    #[test]
    fn test_parse_filter_and_filtered_queries() {
        let snapshot = create_test_index().snapshot();
        let predicate = snapshot.parse_filter("category:tech").unwrap();

        assert!(predicate.matches(0));
        assert!(predicate.matches(1));
        assert!(!predicate.matches(2));
        assert!(!predicate.matches(99));

        let filter = CombinedFilter::new(vec![snapshot.parse_filter("-category:tech").unwrap()]);
        let fields = vec!["title".to_string()];
        let mut query = lexical(0, &fields, "a");
        query.filter = Some(&filter);

        let hits = snapshot.lexical_query(&query).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].doc_id, 3);

        assert!(snapshot.parse_filter("category:").is_err());
    }

    #[test]
    fn test_fetch_stored_fields() {
        let snapshot = create_test_index().snapshot();
        let fields = vec![
            "id".to_string(),
            "missing".to_string(),
            "title".to_string(),
        ];

        let stored = snapshot.fetch_stored_fields(1, &fields).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].0, "id");
        assert_eq!(stored[0].1, vec![FieldValue::from("b")]);
        assert_eq!(stored[1].0, "title");
    }
}
