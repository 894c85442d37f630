//! JSON Lines document loading.
//!
//! Each non-blank line holds one JSON object:
//! ```jsonl
//! {"id": "1", "title": "Rust Programming", "tags": ["lang", "systems"], "content_vector": [0.1, 0.9]}
//! {"id": "2", "title": "Python Basics", "year": 2023}
//! ```
//!
//! The identifier field is required. Arrays of numbers under a configured
//! vector field become vectors, other arrays become multi-valued fields,
//! `null` values are skipped and nested objects are rejected.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde_json::{Map, Value};

use crate::document::{FieldValue, StoredDocument};
use crate::error::{RelataError, Result};
use crate::index::memory::MemoryIndex;

/// Converts JSON Lines into [`StoredDocument`]s.
#[derive(Debug, Clone)]
pub struct JsonlLoader {
    key_field: String,
    vector_fields: Vec<String>,
}

impl Default for JsonlLoader {
    fn default() -> Self {
        Self::new("id")
    }
}

impl JsonlLoader {
    /// Create a loader reading identifiers from `key_field`.
    pub fn new<S: Into<String>>(key_field: S) -> Self {
        Self {
            key_field: key_field.into(),
            vector_fields: Vec::new(),
        }
    }

    /// Treat `field` as a vector field.
    pub fn with_vector_field<S: Into<String>>(mut self, field: S) -> Self {
        let field = field.into();
        if !self.vector_fields.contains(&field) {
            self.vector_fields.push(field);
        }
        self
    }

    /// Parse one JSON object into a document.
    pub fn parse_line(&self, line: &str) -> Result<StoredDocument> {
        let value: Value = serde_json::from_str(line)
            .map_err(|e| RelataError::parse(format!("Failed to parse JSON: {e}")))?;

        let Value::Object(map) = value else {
            return Err(RelataError::parse("Expected a JSON object"));
        };

        self.convert(map)
    }

    fn convert(&self, map: Map<String, Value>) -> Result<StoredDocument> {
        let id = match map.get(&self.key_field) {
            Some(Value::String(s)) if !s.is_empty() => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => {
                return Err(RelataError::parse(format!(
                    "Missing or invalid identifier field '{}'",
                    self.key_field
                )));
            }
        };

        let mut doc = StoredDocument::new(id);

        for (key, value) in map {
            // The index stores the identifier itself.
            if key == self.key_field {
                continue;
            }

            if self.vector_fields.contains(&key) {
                if !value.is_null() {
                    doc.set_vector(key.clone(), parse_vector(&key, &value)?);
                }
                continue;
            }

            match value {
                Value::Null => {}
                Value::Array(values) => {
                    for element in values.iter().filter(|v| !v.is_null()) {
                        let field_value = FieldValue::from_json(element).map_err(|_| {
                            RelataError::parse(format!(
                                "Field '{key}' must hold scalars, got {element}"
                            ))
                        })?;
                        doc.add_field(key.clone(), field_value);
                    }
                }
                Value::Object(_) => {
                    return Err(RelataError::parse(format!(
                        "Nested objects are not supported (field '{key}')"
                    )));
                }
                scalar => doc.add_field(key, FieldValue::from_json(&scalar)?),
            }
        }

        Ok(doc)
    }

    /// Iterate over the documents of a reader.
    pub fn read<R: BufRead>(&self, reader: R) -> JsonlDocumentIterator<'_, R> {
        JsonlDocumentIterator {
            reader,
            loader: self,
            line_number: 0,
        }
    }

    /// Add every document of a JSONL file to `index` and commit.
    ///
    /// Returns the number of documents added.
    pub fn load_file<P: AsRef<Path>>(&self, index: &MemoryIndex, path: P) -> Result<usize> {
        let file = File::open(path.as_ref()).map_err(|e| {
            RelataError::storage(format!(
                "Failed to open {}: {e}",
                path.as_ref().display()
            ))
        })?;

        let count = self.load(index, BufReader::new(file))?;
        index.commit()?;
        Ok(count)
    }

    /// Add every document of a reader to `index` without committing.
    pub fn load<R: BufRead>(&self, index: &MemoryIndex, reader: R) -> Result<usize> {
        let mut iter = self.read(reader);
        let mut count = 0;
        while let Some(doc) = iter.next() {
            let line_number = iter.line_number();
            index
                .add_document(doc?)
                .map_err(|e| RelataError::index(format!("line {line_number}: {e}")))?;
            count += 1;
        }
        Ok(count)
    }
}

fn parse_vector(field: &str, value: &Value) -> Result<Vec<f32>> {
    let invalid = || RelataError::parse(format!("Vector field '{field}' must be an array of numbers"));

    let Value::Array(elements) = value else {
        return Err(invalid());
    };

    elements
        .iter()
        .map(|e| e.as_f64().map(|f| f as f32).ok_or_else(invalid))
        .collect()
}

/// Iterator over the documents of a JSONL reader.
///
/// Errors carry the 1-based line number they occurred on.
pub struct JsonlDocumentIterator<'a, R> {
    reader: R,
    loader: &'a JsonlLoader,
    line_number: usize,
}

impl<R> JsonlDocumentIterator<'_, R> {
    /// Line number of the last line read.
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}

impl<R: BufRead> Iterator for JsonlDocumentIterator<'_, R> {
    type Item = Result<StoredDocument>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut line = String::new();
        loop {
            line.clear();
            match self.reader.read_line(&mut line) {
                Ok(0) => return None,
                Ok(_) => {
                    self.line_number += 1;
                    let line = line.trim();
                    if line.is_empty() {
                        continue;
                    }
                    let line_number = self.line_number;
                    return Some(self.loader.parse_line(line).map_err(|e| {
                        RelataError::parse(format!("line {line_number}: {e}"))
                    }));
                }
                Err(e) => return Some(Err(e.into())),
            }
        }
    }
}
