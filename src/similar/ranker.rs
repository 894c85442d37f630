//! Ordering and truncation of fused candidates.

use crate::document::DocId;
use crate::similar::merger::ScoredCandidate;
use crate::similar::scorer::finite_or_zero;

/// Rank candidates for a source document.
///
/// The source itself is removed. The rest are sorted by fused score,
/// descending, with ties going to the smaller internal id, and the first
/// `n` are kept. A NaN or infinite score ranks as 0.0.
pub fn rank(mut candidates: Vec<ScoredCandidate>, source: DocId, n: usize) -> Vec<ScoredCandidate> {
    candidates.retain(|c| c.doc_id != source);
    for candidate in &mut candidates {
        candidate.score = finite_or_zero(candidate.score);
    }
    candidates.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.doc_id.cmp(&b.doc_id))
    });
    candidates.truncate(n);
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(doc_id: DocId, score: f32) -> ScoredCandidate {
        ScoredCandidate {
            doc_id,
            score,
            vector_score: 0.0,
            lexical_score: 0.0,
        }
    }

    fn ids(candidates: &[ScoredCandidate]) -> Vec<DocId> {
        candidates.iter().map(|c| c.doc_id).collect()
    }

    #[test]
    fn test_rank_orders_by_score() {
        let ranked = rank(
            vec![candidate(3, 0.15), candidate(1, 1.0), candidate(2, 0.35)],
            99,
            10,
        );
        assert_eq!(ids(&ranked), vec![1, 2, 3]);
    }

    #[test]
    fn test_rank_excludes_source() {
        let ranked = rank(vec![candidate(7, 0.9), candidate(8, 0.4)], 7, 10);
        assert_eq!(ids(&ranked), vec![8]);
    }

    #[test]
    fn test_rank_tie_break_by_doc_id() {
        let ranked = rank(
            vec![candidate(9, 0.5), candidate(4, 0.5), candidate(6, 0.5)],
            0,
            10,
        );
        assert_eq!(ids(&ranked), vec![4, 6, 9]);
    }

    #[test]
    fn test_rank_non_finite_scores_as_zero() {
        let ranked = rank(
            vec![
                candidate(1, f32::NAN),
                candidate(2, 0.5),
                candidate(3, f32::INFINITY),
                candidate(4, 0.0),
            ],
            0,
            10,
        );

        assert_eq!(ids(&ranked), vec![2, 1, 3, 4]);
        assert!(ranked.iter().all(|c| c.score.is_finite() && c.score >= 0.0));
    }

    #[test]
    fn test_rank_truncates() {
        let candidates: Vec<_> = (0..20).map(|i| candidate(i, i as f32 / 20.0)).collect();

        let ranked = rank(candidates.clone(), 100, 5);
        assert_eq!(ranked.len(), 5);
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));

        assert_eq!(rank(candidates.clone(), 100, 50).len(), 20);
        assert!(rank(candidates, 100, 0).is_empty());
    }
}
