//! Score maps and their normalization.
//!
//! Vector and lexical scores live on unrelated scales. Each signal's map is
//! rescaled independently by its maximum before fusion, so the best
//! candidate of a signal scores exactly 1.0.

use ahash::AHashMap;

use crate::document::DocId;
use crate::index::ScoredDoc;

/// Sparse map from document to score for one signal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreMap {
    scores: AHashMap<DocId, f32>,
}

impl ScoreMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the score of a document, replacing any previous score.
    ///
    /// A NaN or infinite score is stored as 0.0.
    pub fn insert(&mut self, doc_id: DocId, score: f32) {
        self.scores.insert(doc_id, finite_or_zero(score));
    }

    /// Remove a document from the map.
    pub fn remove(&mut self, doc_id: DocId) -> Option<f32> {
        self.scores.remove(&doc_id)
    }

    /// Score of a document, if present.
    pub fn get(&self, doc_id: DocId) -> Option<f32> {
        self.scores.get(&doc_id).copied()
    }

    pub fn contains(&self, doc_id: DocId) -> bool {
        self.scores.contains_key(&doc_id)
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    /// Iterate over `(doc, score)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (DocId, f32)> + '_ {
        self.scores.iter().map(|(&doc_id, &score)| (doc_id, score))
    }

    /// Iterate over the documents in no particular order.
    pub fn doc_ids(&self) -> impl Iterator<Item = DocId> + '_ {
        self.scores.keys().copied()
    }

    /// Highest score, `None` for an empty map.
    pub fn max_score(&self) -> Option<f32> {
        self.scores.values().copied().reduce(f32::max)
    }

    /// Rescale every score by the maximum.
    ///
    /// An empty map, or one whose maximum is not positive, is left unchanged.
    pub fn normalize(mut self) -> Self {
        normalize(&mut self);
        self
    }
}

impl FromIterator<(DocId, f32)> for ScoreMap {
    fn from_iter<T: IntoIterator<Item = (DocId, f32)>>(iter: T) -> Self {
        Self {
            scores: iter
                .into_iter()
                .map(|(doc_id, score)| (doc_id, finite_or_zero(score)))
                .collect(),
        }
    }
}

impl FromIterator<ScoredDoc> for ScoreMap {
    fn from_iter<T: IntoIterator<Item = ScoredDoc>>(iter: T) -> Self {
        iter.into_iter().map(|hit| (hit.doc_id, hit.score)).collect()
    }
}

/// Map a NaN or infinite score to 0.0.
pub fn finite_or_zero(score: f32) -> f32 {
    if score.is_finite() { score } else { 0.0 }
}

/// Max-normalize a score map in place.
pub fn normalize(map: &mut ScoreMap) {
    let Some(max) = map.max_score() else {
        return;
    };
    if max <= 0.0 || !max.is_finite() {
        return;
    }

    for score in map.scores.values_mut() {
        *score /= max;
    }
}
