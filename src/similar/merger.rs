//! Weighted fusion of the per-signal score maps.

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::document::DocId;
use crate::similar::scorer::{ScoreMap, finite_or_zero};

/// A candidate with its fused score and both components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub doc_id: DocId,
    /// `vector_weight * vector_score + lexical_weight * lexical_score`.
    pub score: f32,
    /// Normalized vector score, 0.0 when the vector signal missed the doc.
    pub vector_score: f32,
    /// Normalized lexical score, 0.0 when the lexical signal missed the doc.
    pub lexical_score: f32,
}

/// Combine two normalized score maps into candidates.
///
/// Every document of either map becomes one candidate. A document missing
/// from a map gets 0.0 for that component. The candidates are returned in
/// no particular order; ordering is the ranker's job.
///
/// # Examples
///
/// ```
/// use relata::similar::merger::fuse;
/// use relata::similar::scorer::ScoreMap;
///
/// let vector: ScoreMap = [(1, 1.0), (3, 0.5)].into_iter().collect();
/// let lexical: ScoreMap = [(1, 1.0), (2, 0.5)].into_iter().collect();
///
/// let candidates = fuse(&vector, &lexical, 0.3, 0.7);
/// assert_eq!(candidates.len(), 3);
/// ```
pub fn fuse(
    vector: &ScoreMap,
    lexical: &ScoreMap,
    vector_weight: f32,
    lexical_weight: f32,
) -> Vec<ScoredCandidate> {
    let mut seen = AHashSet::with_capacity(vector.len() + lexical.len());

    vector
        .doc_ids()
        .chain(lexical.doc_ids())
        .filter(|doc_id| seen.insert(*doc_id))
        .map(|doc_id| {
            let vector_score = vector.get(doc_id).map_or(0.0, finite_or_zero);
            let lexical_score = lexical.get(doc_id).map_or(0.0, finite_or_zero);
            let score = vector_weight * vector_score + lexical_weight * lexical_score;
            ScoredCandidate {
                doc_id,
                score: finite_or_zero(score),
                vector_score,
                lexical_score,
            }
        })
        .collect()
}
