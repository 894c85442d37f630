//! Projection of ranked candidates into response records.

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

use crate::document::StoredValue;
use crate::error::Result;
use crate::index::SimilarityIndex;
use crate::similar::merger::ScoredCandidate;
use crate::similar::mode::FusionMode;

/// Keys of the score breakdown attached to every record.
pub const SCORE_KEY: &str = "score";
pub const VECTOR_SCORE_KEY: &str = "vectorScore";
pub const LEXICAL_SCORE_KEY: &str = "lexicalScore";

/// One similar document: requested stored fields plus the score breakdown.
///
/// Serializes as a flat object, fields first in request order, then
/// `score`, `vectorScore` and `lexicalScore`. A stored field sharing a name
/// with a breakdown key is not emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarDoc {
    /// Stored values in request order. Absent fields are left out.
    pub fields: Vec<(String, StoredValue)>,
    /// Fused score.
    pub score: f32,
    /// Normalized vector component.
    pub vector_score: f32,
    /// Normalized lexical component.
    pub lexical_score: f32,
}

impl SimilarDoc {
    /// Value of a projected field.
    pub fn get(&self, field: &str) -> Option<&StoredValue> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }
}

fn is_score_key(name: &str) -> bool {
    matches!(name, SCORE_KEY | VECTOR_SCORE_KEY | LEXICAL_SCORE_KEY)
}

impl Serialize for SimilarDoc {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let fields: Vec<_> = self
            .fields
            .iter()
            .filter(|(name, _)| !is_score_key(name))
            .collect();

        let mut map = serializer.serialize_map(Some(fields.len() + 3))?;
        for (name, value) in fields {
            map.serialize_entry(name, value)?;
        }
        map.serialize_entry(SCORE_KEY, &self.score)?;
        map.serialize_entry(VECTOR_SCORE_KEY, &self.vector_score)?;
        map.serialize_entry(LEXICAL_SCORE_KEY, &self.lexical_score)?;
        map.end()
    }
}

/// Response to one similarity request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimilarResponse {
    /// The requested source identifier.
    pub source_id: String,
    /// The fusion mode used.
    pub mode: FusionMode,
    /// Number of documents returned.
    pub num_found: usize,
    /// Similar documents, best first.
    pub docs: Vec<SimilarDoc>,
}

impl SimilarResponse {
    /// Create a response from ranked documents.
    pub fn new<S: Into<String>>(source_id: S, mode: FusionMode, docs: Vec<SimilarDoc>) -> Self {
        Self {
            source_id: source_id.into(),
            mode,
            num_found: docs.len(),
            docs,
        }
    }

    /// Create a response with no documents.
    pub fn empty<S: Into<String>>(source_id: S, mode: FusionMode) -> Self {
        Self::new(source_id, mode, Vec::new())
    }
}

/// Fetch the requested stored fields of each ranked candidate.
///
/// Single values become scalars, multiple values become lists and fields the
/// document does not store are omitted.
pub fn project(
    index: &dyn SimilarityIndex,
    ranked: &[ScoredCandidate],
    fields: &[String],
) -> Result<Vec<SimilarDoc>> {
    ranked
        .iter()
        .map(|candidate| {
            let stored = index.fetch_stored_fields(candidate.doc_id, fields)?;
            let fields = stored
                .into_iter()
                .filter_map(|(name, values)| {
                    StoredValue::from_values(values).map(|value| (name, value))
                })
                .collect();

            Ok(SimilarDoc {
                fields,
                score: candidate.score,
                vector_score: candidate.vector_score,
                lexical_score: candidate.lexical_score,
            })
        })
        .collect()
}
