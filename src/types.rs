//! Core type definitions for searchcore
//!
//! - Records: rows read from the source database
//! - Documents: records as stored in a search index
//! - Statistics about indexing runs and the document store

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

/// A source row keyed by column name
pub type Record = Map<String, Value>;

/// A document stored in an index
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub body: Record,
}

impl Document {
    /// Build a document from a record, using `id_field` as document id
    ///
    /// Returns `None` when the record has no usable id.
    pub fn from_record(record: Record, id_field: &str) -> Option<Self> {
        let id = match record.get(id_field)? {
            Value::String(s) if !s.is_empty() => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };
        Some(Self { id, body: record })
    }

    /// Stable hash of the document body
    pub fn content_hash(&self) -> String {
        let mut hasher = Sha256::new();
        // Map keys are sorted, so the serialized form is stable
        hasher.update(Value::Object(self.body.clone()).to_string().as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Outcome of writing documents into an index
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WriteStats {
    /// Documents inserted or changed
    pub written: u64,
    /// Documents already present with identical content
    pub unchanged: u64,
}

/// Document store statistics
#[derive(Debug, Clone, Default)]
pub struct StoreStats {
    /// Indices with their document counts, ordered by identifier
    pub indices: Vec<(String, u64)>,
    pub total_documents: u64,
    pub db_size_bytes: u64,
}
