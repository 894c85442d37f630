//! Fusion modes.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{RelataError, Result};

/// Which similarity signals contribute to the ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FusionMode {
    /// Both signals, weighted by the configured pair.
    #[default]
    Hybrid,
    /// Vector similarity only.
    VectorOnly,
    /// Lexical similarity only.
    #[serde(alias = "mlt_only")]
    LexicalOnly,
}

impl FusionMode {
    /// Parse a mode name. `mlt_only` is accepted for `lexical_only`.
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hybrid" => Ok(FusionMode::Hybrid),
            "vector_only" => Ok(FusionMode::VectorOnly),
            "lexical_only" | "mlt_only" => Ok(FusionMode::LexicalOnly),
            _ => Err(RelataError::invalid_argument(format!(
                "Unknown fusion mode: {s}"
            ))),
        }
    }

    /// The canonical name of this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            FusionMode::Hybrid => "hybrid",
            FusionMode::VectorOnly => "vector_only",
            FusionMode::LexicalOnly => "lexical_only",
        }
    }

    /// Whether the vector retriever runs in this mode.
    pub fn runs_vector(&self) -> bool {
        matches!(self, FusionMode::Hybrid | FusionMode::VectorOnly)
    }

    /// Whether the lexical retriever runs in this mode.
    pub fn runs_lexical(&self) -> bool {
        matches!(self, FusionMode::Hybrid | FusionMode::LexicalOnly)
    }

    /// The `(vector, lexical)` weights actually applied during fusion.
    pub fn effective_weights(&self, vector_weight: f32, lexical_weight: f32) -> (f32, f32) {
        match self {
            FusionMode::Hybrid => (vector_weight, lexical_weight),
            FusionMode::VectorOnly => (1.0, 0.0),
            FusionMode::LexicalOnly => (0.0, 1.0),
        }
    }
}

impl fmt::Display for FusionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FusionMode {
    type Err = RelataError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
