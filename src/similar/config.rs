//! Configuration for similarity requests.
//!
//! [`SimilarConfig`] holds the component defaults. [`RequestParams`] carries
//! the raw string parameters of one request, and [`RequestConfig::resolve`]
//! turns them into an immutable, validated [`RequestConfig`].
//!
//! # Examples
//!
//! ```
//! use relata::similar::config::{RequestConfig, RequestParams, SimilarConfig};
//! use relata::similar::mode::FusionMode;
//!
//! let config = SimilarConfig::default();
//! let params = RequestParams::from_pairs([
//!     ("smlt", "true"),
//!     ("smlt.id", "doc-1"),
//!     ("smlt.mode", "vector_only"),
//!     ("smlt.fl", "title"),
//! ]);
//!
//! let request = RequestConfig::resolve(&params, &config).unwrap().unwrap();
//! assert_eq!(request.source_id, "doc-1");
//! assert_eq!(request.mode, FusionMode::VectorOnly);
//! assert_eq!(request.return_fields, vec!["id", "title"]);
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RelataError, Result};
use crate::similar::mode::FusionMode;

/// Request parameter names.
pub mod keys {
    pub const ENABLED: &str = "smlt";
    pub const ID: &str = "smlt.id";
    pub const COUNT: &str = "smlt.count";
    pub const MODE: &str = "smlt.mode";
    pub const VECTOR_WEIGHT: &str = "smlt.vectorWeight";
    pub const LEXICAL_WEIGHT: &str = "smlt.lexicalWeight";
    pub const LEXICAL_WEIGHT_ALIAS: &str = "smlt.mltWeight";
    pub const VECTOR_FIELD: &str = "smlt.vectorField";
    pub const LEXICAL_FIELDS: &str = "smlt.lexicalFields";
    pub const LEXICAL_FIELDS_ALIAS: &str = "smlt.mltFields";
    pub const RETURN_FIELDS: &str = "smlt.fl";
    pub const FILTER: &str = "smlt.fq";
}

/// Component defaults for similarity requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimilarConfig {
    /// Field holding the external document identifier.
    pub unique_key_field: String,
    /// Vector field used when the request names none.
    pub default_vector_field: String,
    /// Comma-separated lexical fields used when the request names none.
    pub default_lexical_fields: String,
    /// Comma-separated return fields used when the request names none.
    pub default_return_fields: String,
    /// Number of results when the request names none.
    pub default_count: usize,
    /// Vector weight in hybrid mode.
    pub default_vector_weight: f32,
    /// Lexical weight in hybrid mode.
    pub default_lexical_weight: f32,
    /// Maximum number of source terms in a lexical query.
    pub max_query_terms: usize,
    /// Run the two retrievals concurrently in hybrid mode.
    pub parallel_retrieval: bool,
}

impl Default for SimilarConfig {
    fn default() -> Self {
        Self {
            unique_key_field: "id".to_string(),
            default_vector_field: "content_vector".to_string(),
            default_lexical_fields: "title,content".to_string(),
            default_return_fields: "id,title,content,category".to_string(),
            default_count: 10,
            default_vector_weight: 0.7,
            default_lexical_weight: 0.3,
            max_query_terms: 25,
            parallel_retrieval: false,
        }
    }
}

impl SimilarConfig {
    /// Load a configuration from a JSON file. Missing keys take defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: SimilarConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the defaults for values no request could fix.
    pub fn validate(&self) -> Result<()> {
        if self.unique_key_field.trim().is_empty() {
            return Err(RelataError::invalid_config("unique_key_field is empty"));
        }
        if split_fields(&self.default_lexical_fields).is_empty() {
            return Err(RelataError::invalid_config(
                "default_lexical_fields is empty",
            ));
        }
        for (name, weight) in [
            ("default_vector_weight", self.default_vector_weight),
            ("default_lexical_weight", self.default_lexical_weight),
        ] {
            if check_weight(name, weight).is_err() {
                return Err(RelataError::invalid_config(weight_message(name, weight)));
            }
        }
        Ok(())
    }
}

/// Raw request parameters: an ordered multimap of strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestParams {
    entries: Vec<(String, String)>,
}

impl RequestParams {
    /// Create an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build parameters from `(name, value)` pairs, keeping their order.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Append a parameter value.
    pub fn add<K: Into<String>, V: Into<String>>(&mut self, name: K, value: V) -> &mut Self {
        self.entries.push((name.into(), value.into()));
        self
    }

    /// The first value of a parameter.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Every value of a parameter, in order.
    pub fn get_all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// The first value found under any of the given names.
    pub fn get_any(&self, names: &[&str]) -> Option<&str> {
        names.iter().find_map(|name| self.get(name))
    }

    /// A boolean parameter.
    pub fn get_bool(&self, name: &str) -> Result<Option<bool>> {
        self.get(name)
            .map(|value| match value.trim().to_ascii_lowercase().as_str() {
                "true" | "on" | "yes" | "1" => Ok(true),
                "false" | "off" | "no" | "0" => Ok(false),
                _ => Err(RelataError::invalid_argument(format!(
                    "{name} must be a boolean, got '{value}'"
                ))),
            })
            .transpose()
    }

    /// A non-negative integer parameter.
    pub fn get_usize(&self, name: &str) -> Result<Option<usize>> {
        self.get(name)
            .map(|value| {
                value.trim().parse::<usize>().map_err(|_| {
                    RelataError::invalid_argument(format!(
                        "{name} must be a non-negative integer, got '{value}'"
                    ))
                })
            })
            .transpose()
    }

    /// A floating point parameter under any of the given names.
    pub fn get_f32(&self, names: &[&str]) -> Result<Option<f32>> {
        let Some((name, value)) = names
            .iter()
            .find_map(|name| self.get(name).map(|value| (name, value)))
        else {
            return Ok(None);
        };
        value
            .trim()
            .parse::<f32>()
            .map(Some)
            .map_err(|_| {
                RelataError::invalid_argument(format!("{name} must be a number, got '{value}'"))
            })
    }

    /// Whether no parameter is set.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Fully resolved parameters of one similarity request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestConfig {
    /// External identifier of the source document.
    pub source_id: String,
    /// Maximum number of documents to return.
    pub count: usize,
    /// Signals to combine.
    pub mode: FusionMode,
    /// Vector weight in hybrid mode.
    pub vector_weight: f32,
    /// Lexical weight in hybrid mode.
    pub lexical_weight: f32,
    /// Vector field to compare.
    pub vector_field: String,
    /// Fields used for lexical similarity, in order.
    pub lexical_fields: Vec<String>,
    /// Fields returned for each document, identifier field included.
    pub return_fields: Vec<String>,
    /// Filter expressions restricting the candidates.
    pub filters: Vec<String>,
}

impl RequestConfig {
    /// Create a request for a source document using the configured defaults.
    pub fn new<S: Into<String>>(source_id: S, config: &SimilarConfig) -> Self {
        Self {
            source_id: source_id.into(),
            count: config.default_count,
            mode: FusionMode::default(),
            vector_weight: config.default_vector_weight,
            lexical_weight: config.default_lexical_weight,
            vector_field: config.default_vector_field.clone(),
            lexical_fields: split_fields(&config.default_lexical_fields),
            return_fields: with_key_field(
                split_fields(&config.default_return_fields),
                &config.unique_key_field,
            ),
            filters: Vec::new(),
        }
    }

    /// Resolve raw parameters into a request.
    ///
    /// Returns `Ok(None)` when the feature is not enabled for this request or
    /// no source identifier is given. Malformed values are errors.
    pub fn resolve(params: &RequestParams, config: &SimilarConfig) -> Result<Option<Self>> {
        if !params.get_bool(keys::ENABLED)?.unwrap_or(false) {
            return Ok(None);
        }

        // Blank ids disable the request; others are looked up verbatim.
        let source_id = match params.get(keys::ID) {
            Some(id) if !id.trim().is_empty() => id,
            _ => return Ok(None),
        };

        let mut request = Self::new(source_id, config);

        if let Some(count) = params.get_usize(keys::COUNT)? {
            request.count = count;
        }
        if let Some(mode) = params.get(keys::MODE) {
            request.mode = FusionMode::parse(mode)?;
        }
        if let Some(weight) = params.get_f32(&[keys::VECTOR_WEIGHT])? {
            request.vector_weight = check_weight(keys::VECTOR_WEIGHT, weight)?;
        }
        if let Some(weight) =
            params.get_f32(&[keys::LEXICAL_WEIGHT, keys::LEXICAL_WEIGHT_ALIAS])?
        {
            request.lexical_weight = check_weight(keys::LEXICAL_WEIGHT, weight)?;
        }
        if let Some(field) = params.get(keys::VECTOR_FIELD).map(str::trim)
            && !field.is_empty()
        {
            request.vector_field = field.to_string();
        }
        if let Some(fields) = params.get_any(&[keys::LEXICAL_FIELDS, keys::LEXICAL_FIELDS_ALIAS])
        {
            request.lexical_fields = split_fields(fields);
        }
        if let Some(fields) = params.get(keys::RETURN_FIELDS) {
            request.return_fields = with_key_field(split_fields(fields), &config.unique_key_field);
        }
        request.filters = params
            .get_all(keys::FILTER)
            .map(str::trim)
            .filter(|fq| !fq.is_empty())
            .map(str::to_string)
            .collect();

        if request.lexical_fields.is_empty() {
            return Err(RelataError::invalid_argument(format!(
                "{} must name at least one field",
                keys::LEXICAL_FIELDS
            )));
        }

        Ok(Some(request))
    }

    /// Set the result count.
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    /// Set the fusion mode.
    pub fn with_mode(mut self, mode: FusionMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the hybrid weights.
    pub fn with_weights(mut self, vector_weight: f32, lexical_weight: f32) -> Self {
        self.vector_weight = vector_weight;
        self.lexical_weight = lexical_weight;
        self
    }

    /// Add a filter expression.
    pub fn with_filter<S: Into<String>>(mut self, filter: S) -> Self {
        self.filters.push(filter.into());
        self
    }
}

/// Split a comma-separated field list, dropping blanks and duplicates.
pub fn split_fields(fields: &str) -> Vec<String> {
    let mut result: Vec<String> = Vec::new();
    for field in fields.split(',').map(str::trim).filter(|f| !f.is_empty()) {
        if !result.iter().any(|existing| existing == field) {
            result.push(field.to_string());
        }
    }
    result
}

fn with_key_field(mut fields: Vec<String>, key_field: &str) -> Vec<String> {
    if !fields.iter().any(|field| field == key_field) {
        fields.insert(0, key_field.to_string());
    }
    fields
}

fn check_weight(name: &str, weight: f32) -> Result<f32> {
    if weight.is_finite() && weight >= 0.0 {
        Ok(weight)
    } else {
        Err(RelataError::invalid_argument(weight_message(name, weight)))
    }
}

fn weight_message(name: &str, weight: f32) -> String {
    format!("{name} must be a finite non-negative number, got {weight}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Vec<(&'static str, &'static str)> {
        vec![("smlt", "true"), ("smlt.id", "doc-1")]
    }

    fn resolve(extra: &[(&'static str, &'static str)]) -> Result<Option<RequestConfig>> {
        let mut pairs = base();
        pairs.extend_from_slice(extra);
        RequestConfig::resolve(&RequestParams::from_pairs(pairs), &SimilarConfig::default())
    }

    #[test]
    fn test_similar_config_default() {
        let config = SimilarConfig::default();
        assert_eq!(config.unique_key_field, "id");
        assert_eq!(config.default_vector_field, "content_vector");
        assert_eq!(config.default_lexical_fields, "title,content");
        assert_eq!(config.default_return_fields, "id,title,content,category");
        assert_eq!(config.default_count, 10);
        assert_eq!(config.default_vector_weight, 0.7);
        assert_eq!(config.default_lexical_weight, 0.3);
        assert_eq!(config.max_query_terms, 25);
        assert!(!config.parallel_retrieval);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_similar_config_partial_json() {
        let config: SimilarConfig =
            serde_json::from_str(r#"{"default_count": 3, "parallel_retrieval": true}"#).unwrap();
        assert_eq!(config.default_count, 3);
        assert!(config.parallel_retrieval);
        assert_eq!(config.default_vector_field, "content_vector");
    }

    #[test]
    fn test_similar_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("similar.json");
        fs::write(&path, r#"{"default_vector_weight": 0.5}"#).unwrap();
        assert_eq!(SimilarConfig::from_file(&path).unwrap().default_vector_weight, 0.5);

        fs::write(&path, r#"{"default_lexical_fields": " , "}"#).unwrap();
        assert!(SimilarConfig::from_file(&path).is_err());
    }

    #[test]
    fn test_request_params_multimap() {
        let params = RequestParams::from_pairs([
            ("smlt.fq", "a:1"),
            ("smlt.id", "x"),
            ("smlt.fq", "b:2"),
        ]);
        assert_eq!(params.get("smlt.fq"), Some("a:1"));
        assert_eq!(params.get_all("smlt.fq").collect::<Vec<_>>(), vec!["a:1", "b:2"]);
        assert_eq!(params.get("smlt.count"), None);
        assert!(RequestParams::new().is_empty());
    }

    #[test]
    fn test_resolve_defaults() {
        let request = resolve(&[]).unwrap().unwrap();
        assert_eq!(request.source_id, "doc-1");
        assert_eq!(request.count, 10);
        assert_eq!(request.mode, FusionMode::Hybrid);
        assert_eq!(request.vector_weight, 0.7);
        assert_eq!(request.lexical_weight, 0.3);
        assert_eq!(request.vector_field, "content_vector");
        assert_eq!(request.lexical_fields, vec!["title", "content"]);
        assert_eq!(
            request.return_fields,
            vec!["id", "title", "content", "category"]
        );
        assert!(request.filters.is_empty());
    }

    #[test]
    fn test_resolve_disabled_or_missing_id() {
        let config = SimilarConfig::default();
        let none = |pairs: Vec<(&str, &str)>| {
            RequestConfig::resolve(&RequestParams::from_pairs(pairs), &config)
                .unwrap()
                .is_none()
        };

        assert!(none(vec![("smlt.id", "doc-1")]));
        assert!(none(vec![("smlt", "false"), ("smlt.id", "doc-1")]));
        assert!(none(vec![("smlt", "true")]));
        assert!(none(vec![("smlt", "true"), ("smlt.id", "  ")]));
    }

    #[test]
    fn test_resolve_keeps_source_id_verbatim() {
        let params = RequestParams::from_pairs([("smlt", "true"), ("smlt.id", " doc-1 ")]);
        let request = RequestConfig::resolve(&params, &SimilarConfig::default())
            .unwrap()
            .unwrap();
        assert_eq!(request.source_id, " doc-1 ");
    }

    #[test]
    fn test_resolve_overrides() {
        let request = resolve(&[
            ("smlt.count", "5"),
            ("smlt.mode", "mlt_only"),
            ("smlt.vectorWeight", "0.2"),
            ("smlt.mltWeight", "0.8"),
            ("smlt.vectorField", "embedding"),
            ("smlt.mltFields", "body, title ,body"),
            ("smlt.fl", "title,score_hint"),
            ("smlt.fq", "category:tech"),
            ("smlt.fq", " "),
            ("smlt.fq", "year:[2020 TO *]"),
        ])
        .unwrap()
        .unwrap();

        assert_eq!(request.count, 5);
        assert_eq!(request.mode, FusionMode::LexicalOnly);
        assert_eq!(request.vector_weight, 0.2);
        assert_eq!(request.lexical_weight, 0.8);
        assert_eq!(request.vector_field, "embedding");
        assert_eq!(request.lexical_fields, vec!["body", "title"]);
        assert_eq!(request.return_fields, vec!["id", "title", "score_hint"]);
        assert_eq!(request.filters, vec!["category:tech", "year:[2020 TO *]"]);
    }

    #[test]
    fn test_resolve_prefers_canonical_lexical_names() {
        let request = resolve(&[
            ("smlt.mltWeight", "0.1"),
            ("smlt.lexicalWeight", "0.9"),
            ("smlt.lexicalFields", "summary"),
            ("smlt.mltFields", "body"),
        ])
        .unwrap()
        .unwrap();

        assert_eq!(request.lexical_weight, 0.9);
        assert_eq!(request.lexical_fields, vec!["summary"]);
    }

    #[test]
    fn test_resolve_keeps_key_field_position() {
        let request = resolve(&[("smlt.fl", "title,id")]).unwrap().unwrap();
        assert_eq!(request.return_fields, vec!["title", "id"]);
    }

    #[test]
    fn test_resolve_malformed() {
        assert!(resolve(&[("smlt.count", "-1")]).is_err());
        assert!(resolve(&[("smlt.count", "ten")]).is_err());
        assert!(resolve(&[("smlt.mode", "semantic")]).is_err());
        assert!(resolve(&[("smlt.vectorWeight", "-0.5")]).is_err());
        assert!(resolve(&[("smlt.lexicalWeight", "NaN")]).is_err());
        assert!(resolve(&[("smlt.lexicalFields", " , ")]).is_err());

        let params = RequestParams::from_pairs([("smlt", "maybe"), ("smlt.id", "doc-1")]);
        let err = RequestConfig::resolve(&params, &SimilarConfig::default()).unwrap_err();
        assert!(matches!(err, RelataError::InvalidArgument(_)));
    }

    #[test]
    fn test_request_builders() {
        let request = RequestConfig::new("a", &SimilarConfig::default())
            .with_count(3)
            .with_mode(FusionMode::VectorOnly)
            .with_weights(0.5, 0.5)
            .with_filter("category:tech");

        assert_eq!(request.count, 3);
        assert_eq!(request.mode, FusionMode::VectorOnly);
        assert_eq!(request.vector_weight, 0.5);
        assert_eq!(request.filters, vec!["category:tech"]);
    }

    #[test]
    fn test_split_fields() {
        assert_eq!(split_fields("a, b,,a , c"), vec!["a", "b", "c"]);
        assert!(split_fields("").is_empty());
    }
}
