//! BM25 scoring used by the in-memory index.

use serde::{Deserialize, Serialize};

/// Configuration for BM25 scoring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bm25Config {
    /// K1 parameter (term frequency saturation).
    pub k1: f32,
    /// B parameter (field length normalization).
    pub b: f32,
}

impl Default for Bm25Config {
    fn default() -> Self {
        Bm25Config { k1: 1.2, b: 0.75 }
    }
}

/// Per-field collection statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FieldStats {
    /// Number of documents in the collection.
    pub total_docs: u64,
    /// Average number of terms of the field across documents that have it.
    pub avg_field_len: f32,
}

impl Bm25Config {
    /// Inverse document frequency, always positive.
    ///
    /// Uses the `ln(1 + (N - df + 0.5) / (df + 0.5))` form so that terms
    /// occurring in most documents still contribute a small positive weight.
    pub fn idf(&self, doc_freq: u64, total_docs: u64) -> f32 {
        let n = total_docs as f32;
        let df = doc_freq as f32;
        (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
    }

    /// BM25 contribution of one query term to one document field.
    pub fn score(&self, term_freq: u32, field_len: u32, doc_freq: u64, stats: &FieldStats) -> f32 {
        if term_freq == 0 {
            return 0.0;
        }

        let tf = term_freq as f32;
        let len = field_len as f32;
        let avg_len = if stats.avg_field_len > 0.0 {
            stats.avg_field_len
        } else {
            1.0
        };

        let tf_component =
            (tf * (self.k1 + 1.0)) / (tf + self.k1 * (1.0 - self.b + self.b * (len / avg_len)));

        self.idf(doc_freq, stats.total_docs) * tf_component
    }
}

/// Weight of a source term when choosing "more like this" query terms.
///
/// Classic tf·idf: frequent in the source, rare in the collection.
pub fn term_weight(term_freq: u32, doc_freq: u64, total_docs: u64) -> f32 {
    let idf = ((total_docs as f32) / (doc_freq as f32 + 1.0)).ln() + 1.0;
    term_freq as f32 * idf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idf_is_positive() {
        let config = Bm25Config::default();
        assert!(config.idf(1, 10) > config.idf(5, 10));
        assert!(config.idf(10, 10) > 0.0);
    }

    #[test]
    fn test_score_saturates() {
        let config = Bm25Config::default();
        let stats = FieldStats {
            total_docs: 10,
            avg_field_len: 5.0,
        };

        let one = config.score(1, 5, 2, &stats);
        let two = config.score(2, 5, 2, &stats);
        let ten = config.score(10, 5, 2, &stats);

        assert!(one > 0.0);
        assert!(two > one);
        assert!(ten > two);
        assert!(ten < one * (config.k1 + 1.0));
        assert_eq!(config.score(0, 5, 2, &stats), 0.0);
    }

    #[test]
    fn test_shorter_fields_score_higher() {
        let config = Bm25Config::default();
        let stats = FieldStats {
            total_docs: 10,
            avg_field_len: 5.0,
        };

        assert!(config.score(1, 2, 2, &stats) > config.score(1, 20, 2, &stats));
    }

    #[test]
    fn test_term_weight() {
        assert!(term_weight(3, 1, 100) > term_weight(1, 1, 100));
        assert!(term_weight(1, 1, 100) > term_weight(1, 50, 100));
    }
}
