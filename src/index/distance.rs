//! Vector similarity for nearest-neighbor queries.

use serde::{Deserialize, Serialize};

use crate::error::{RelataError, Result};

/// Similarity functions for dense vectors.
///
/// Every variant maps to a non-negative score where larger means more
/// similar, which is what score normalization expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum VectorSimilarity {
    /// Cosine similarity mapped into [0, 1] as `(1 + cos) / 2`.
    #[default]
    Cosine,
    /// Dot product mapped as `(1 + dot) / 2`, for unit-length vectors.
    DotProduct,
    /// `1 / (1 + squared L2 distance)`.
    Euclidean,
}

impl VectorSimilarity {
    /// Score two vectors of equal dimension.
    pub fn score(&self, a: &[f32], b: &[f32]) -> Result<f32> {
        if a.len() != b.len() {
            return Err(RelataError::query(format!(
                "Vector dimensions must match: {} != {}",
                a.len(),
                b.len()
            )));
        }

        // Accumulate in f64: large f32 components overflow f32 products.
        let score = match self {
            VectorSimilarity::Cosine => {
                let dot_product = dot(a, b);
                let norm_a = dot(a, a).sqrt();
                let norm_b = dot(b, b).sqrt();

                if norm_a == 0.0 || norm_b == 0.0 {
                    0.0 // Zero vectors are similar to nothing
                } else {
                    let cosine = (dot_product / (norm_a * norm_b)).clamp(-1.0, 1.0);
                    (1.0 + cosine) / 2.0
                }
            }
            VectorSimilarity::DotProduct => ((1.0 + dot(a, b)) / 2.0).max(0.0),
            VectorSimilarity::Euclidean => {
                let squared: f64 = a
                    .iter()
                    .zip(b.iter())
                    .map(|(&x, &y)| (f64::from(x) - f64::from(y)).powi(2))
                    .sum();
                1.0 / (1.0 + squared)
            }
        };

        if score.is_nan() {
            return Ok(0.0);
        }
        Ok(score.min(f64::from(f32::MAX)) as f32)
    }

    /// Get the name of this similarity.
    pub fn name(&self) -> &'static str {
        match self {
            VectorSimilarity::Cosine => "cosine",
            VectorSimilarity::DotProduct => "dot_product",
            VectorSimilarity::Euclidean => "euclidean",
        }
    }

    /// Parse a similarity from a string.
    pub fn parse_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "cosine" => Ok(VectorSimilarity::Cosine),
            "dot_product" | "dot" => Ok(VectorSimilarity::DotProduct),
            "euclidean" | "l2" => Ok(VectorSimilarity::Euclidean),
            _ => Err(RelataError::invalid_argument(format!(
                "Unknown vector similarity: {s}"
            ))),
        }
    }
}

fn dot(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| f64::from(x) * f64::from(y))
        .sum()
}
