//! Document module.
//!
//! Documents are what the reference index stores and what similarity
//! responses project back out:
//!
//! - [`document::StoredDocument`] - external id, multi-valued stored fields and named vectors
//! - [`field_value::FieldValue`] - a single stored scalar
//! - [`field_value::StoredValue`] - a projected field, scalar or list

#[allow(clippy::module_inception)]
pub mod document;
pub mod field_value;

pub use document::{StoredDocument, StoredDocumentBuilder};
pub use field_value::{FieldValue, StoredValue};

/// Internal sequential document identifier.
///
/// Only meaningful within the index snapshot that produced it.
pub type DocId = u64;

/// A resolved source document: its external identifier and its internal id
/// in the snapshot being queried.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentRef {
    /// External stable identifier supplied by the caller.
    pub external_id: String,
    /// Internal id within the current snapshot.
    pub doc_id: DocId,
}

impl DocumentRef {
    /// Create a new document reference.
    pub fn new<S: Into<String>>(external_id: S, doc_id: DocId) -> Self {
        Self {
            external_id: external_id.into(),
            doc_id,
        }
    }
}
