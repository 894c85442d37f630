//! Stored document structure.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::document::field_value::FieldValue;

/// A document as handed to an index.
///
/// A document carries its external stable identifier, any number of
/// multi-valued stored fields and any number of named dense vectors.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq)]
pub struct StoredDocument {
    /// External stable identifier.
    id: String,
    /// Stored field values, in insertion order per field.
    fields: AHashMap<String, Vec<FieldValue>>,
    /// Dense vectors keyed by vector field name.
    vectors: AHashMap<String, Vec<f32>>,
}

impl StoredDocument {
    /// Create a new empty document with the given external identifier.
    pub fn new<S: Into<String>>(id: S) -> Self {
        StoredDocument {
            id: id.into(),
            fields: AHashMap::new(),
            vectors: AHashMap::new(),
        }
    }

    /// The external identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Append a value to a stored field.
    pub fn add_field<S: Into<String>>(&mut self, name: S, value: FieldValue) {
        self.fields.entry(name.into()).or_default().push(value);
    }

    /// Set the vector of a vector field, replacing any previous one.
    pub fn set_vector<S: Into<String>>(&mut self, name: S, vector: Vec<f32>) {
        self.vectors.insert(name.into(), vector);
    }

    /// Stored values of a field.
    pub fn get_field(&self, name: &str) -> Option<&[FieldValue]> {
        self.fields.get(name).map(Vec::as_slice)
    }

    /// Vector of a vector field.
    pub fn get_vector(&self, name: &str) -> Option<&[f32]> {
        self.vectors.get(name).map(Vec::as_slice)
    }

    /// Check if the document has a stored field.
    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    /// All stored fields.
    pub fn fields(&self) -> &AHashMap<String, Vec<FieldValue>> {
        &self.fields
    }

    /// All vectors.
    pub fn vectors(&self) -> &AHashMap<String, Vec<f32>> {
        &self.vectors
    }

    /// Create a builder for constructing documents.
    pub fn builder<S: Into<String>>(id: S) -> StoredDocumentBuilder {
        StoredDocumentBuilder::new(id)
    }
}

/// A builder for constructing documents in a fluent manner.
///
/// ```
/// use relata::document::StoredDocument;
///
/// let doc = StoredDocument::builder("doc-1")
///     .add_text("title", "Rust Programming Guide")
///     .add_text("category", "books")
///     .add_text("category", "programming")
///     .add_integer("year", 2024)
///     .add_vector("content_vector", vec![0.1, 0.2, 0.3])
///     .build();
///
/// assert_eq!(doc.id(), "doc-1");
/// assert_eq!(doc.get_field("category").unwrap().len(), 2);
/// assert!(doc.get_vector("content_vector").is_some());
/// ```
#[derive(Debug)]
pub struct StoredDocumentBuilder {
    document: StoredDocument,
}

impl StoredDocumentBuilder {
    /// Create a new document builder.
    pub fn new<S: Into<String>>(id: S) -> Self {
        StoredDocumentBuilder {
            document: StoredDocument::new(id),
        }
    }

    /// Add a text value to a field.
    pub fn add_text<S: Into<String>, T: Into<String>>(mut self, name: S, value: T) -> Self {
        self.document
            .add_field(name, FieldValue::Text(value.into()));
        self
    }

    /// Add an integer value to a field.
    pub fn add_integer<S: Into<String>>(mut self, name: S, value: i64) -> Self {
        self.document.add_field(name, FieldValue::Integer(value));
        self
    }

    /// Add a float value to a field.
    pub fn add_float<S: Into<String>>(mut self, name: S, value: f64) -> Self {
        self.document.add_field(name, FieldValue::Float(value));
        self
    }

    /// Add a boolean value to a field.
    pub fn add_boolean<S: Into<String>>(mut self, name: S, value: bool) -> Self {
        self.document.add_field(name, FieldValue::Boolean(value));
        self
    }

    /// Add a field with a generic value.
    pub fn add_field<S: Into<String>>(mut self, name: S, value: FieldValue) -> Self {
        self.document.add_field(name, value);
        self
    }

    /// Set the vector of a vector field.
    pub fn add_vector<S: Into<String>>(mut self, name: S, vector: Vec<f32>) -> Self {
        self.document.set_vector(name, vector);
        self
    }

    /// Build the final document.
    pub fn build(self) -> StoredDocument {
        self.document
    }
}
