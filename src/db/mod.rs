//! Database module for searchcore
//!
//! Two SQLite databases are involved:
//! - [`Database`]: the document store holding search indices
//! - [`SourceDatabase`]: read-only access to the records being indexed

mod schema;
mod source;

pub use source::{json_to_sql, SourceDatabase};

use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::time::SystemTime;

use crate::types::{Document, StoreStats, WriteStats};

/// Database handle for the document store
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create a database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize the database schema
    fn initialize(&self) -> Result<()> {
        self.conn.execute_batch(schema::SCHEMA)?;
        Ok(())
    }

    // =========================================================================
    // Index Operations
    // =========================================================================

    /// Create an index unless it already exists
    ///
    /// Returns whether a new index was created.
    pub fn create_index(&self, identifier: &str) -> Result<bool> {
        let changed = self.conn.execute(
            "INSERT OR IGNORE INTO indices (identifier, created_at) VALUES (?1, ?2)",
            params![identifier, unix_now()],
        )?;
        Ok(changed > 0)
    }

    /// Check whether an index exists
    pub fn index_exists(&self, identifier: &str) -> Result<bool> {
        let exists = self
            .conn
            .query_row(
                "SELECT 1 FROM indices WHERE identifier = ?1",
                params![identifier],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        Ok(exists)
    }

    /// Drop an index and all of its documents
    ///
    /// Returns whether the index existed.
    pub fn delete_index(&self, identifier: &str) -> Result<bool> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "DELETE FROM documents WHERE index_identifier = ?1",
            params![identifier],
        )?;
        let removed = tx.execute(
            "DELETE FROM indices WHERE identifier = ?1",
            params![identifier],
        )?;
        tx.commit()?;
        Ok(removed > 0)
    }

    // =========================================================================
    // Document Operations
    // =========================================================================

    /// Insert or update documents of an index in one transaction
    ///
    /// Documents whose content hash matches the stored one are left untouched.
    pub fn upsert_documents(&self, identifier: &str, documents: &[Document]) -> Result<WriteStats> {
        let mut stats = WriteStats::default();
        let indexed_at = unix_now();

        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO documents (index_identifier, document_id, body, content_hash, indexed_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(index_identifier, document_id) DO UPDATE SET
                    body = excluded.body,
                    content_hash = excluded.content_hash,
                    indexed_at = excluded.indexed_at
                WHERE documents.content_hash != excluded.content_hash
                "#,
            )?;

            for document in documents {
                let body = serde_json::to_string(&document.body)?;
                let changed = stmt.execute(params![
                    identifier,
                    document.id,
                    body,
                    document.content_hash(),
                    indexed_at,
                ])?;
                if changed > 0 {
                    stats.written += 1;
                } else {
                    stats.unchanged += 1;
                }
            }
        }
        tx.commit()?;

        Ok(stats)
    }

    /// Remove every document of an index, returning how many were removed
    pub fn delete_all_documents(&self, identifier: &str) -> Result<u64> {
        let removed = self.conn.execute(
            "DELETE FROM documents WHERE index_identifier = ?1",
            params![identifier],
        )?;
        Ok(removed as u64)
    }

    /// Get a single document
    pub fn get_document(&self, identifier: &str, document_id: &str) -> Result<Option<Document>> {
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body FROM documents WHERE index_identifier = ?1 AND document_id = ?2",
                params![identifier, document_id],
                |row| row.get(0),
            )
            .optional()?;

        match body {
            Some(body) => Ok(Some(Document {
                id: document_id.to_string(),
                body: serde_json::from_str(&body)?,
            })),
            None => Ok(None),
        }
    }

    /// Count the documents of an index
    pub fn count_documents(&self, identifier: &str) -> Result<u64> {
        let count: u64 = self.conn.query_row(
            "SELECT COUNT(*) FROM documents WHERE index_identifier = ?1",
            params![identifier],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // =========================================================================
    // Statistics
    // =========================================================================

    /// Get document store statistics
    pub fn get_stats(&self) -> Result<StoreStats> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT i.identifier, COUNT(d.document_id)
            FROM indices i
            LEFT JOIN documents d ON d.index_identifier = i.identifier
            GROUP BY i.identifier
            ORDER BY i.identifier
            "#,
        )?;
        let rows = stmt.query_map([], |row| {
            let identifier: String = row.get(0)?;
            let count: u64 = row.get(1)?;
            Ok((identifier, count))
        })?;
        let mut indices = Vec::new();
        for row in rows {
            indices.push(row?);
        }

        let total_documents: u64 = indices.iter().map(|(_, count)| count).sum();

        let db_size_bytes: u64 = self
            .conn
            .query_row(
                "SELECT page_count * page_size FROM pragma_page_count(), pragma_page_size()",
                [],
                |row| row.get(0),
            )
            .unwrap_or(0);

        Ok(StoreStats {
            indices,
            total_documents,
            db_size_bytes,
        })
    }
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(value: serde_json::Value) -> Document {
        match value {
            serde_json::Value::Object(body) => Document::from_record(body, "uid").unwrap(),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_create_index_is_idempotent() {
        let db = Database::in_memory().unwrap();
        assert!(!db.index_exists("pages").unwrap());
        assert!(db.create_index("pages").unwrap());
        assert!(!db.create_index("pages").unwrap());
        assert!(db.index_exists("pages").unwrap());
    }

    #[test]
    fn test_upsert_skips_unchanged_documents() {
        let db = Database::in_memory().unwrap();
        db.create_index("pages").unwrap();

        let docs = vec![
            document(json!({"uid": 1, "title": "Home"})),
            document(json!({"uid": 2, "title": "About"})),
        ];
        let stats = db.upsert_documents("pages", &docs).unwrap();
        assert_eq!(stats, WriteStats { written: 2, unchanged: 0 });

        let docs = vec![
            document(json!({"uid": 1, "title": "Home"})),
            document(json!({"uid": 2, "title": "About us"})),
        ];
        let stats = db.upsert_documents("pages", &docs).unwrap();
        assert_eq!(stats, WriteStats { written: 1, unchanged: 1 });

        let stored = db.get_document("pages", "2").unwrap().unwrap();
        assert_eq!(stored.body["title"], "About us");
        assert_eq!(db.count_documents("pages").unwrap(), 2);
    }

    #[test]
    fn test_delete_all_documents_keeps_index() {
        let db = Database::in_memory().unwrap();
        db.create_index("pages").unwrap();
        db.create_index("news").unwrap();
        db.upsert_documents("pages", &[document(json!({"uid": 1}))]).unwrap();
        db.upsert_documents("news", &[document(json!({"uid": 1}))]).unwrap();

        assert_eq!(db.delete_all_documents("pages").unwrap(), 1);
        assert!(db.index_exists("pages").unwrap());
        assert_eq!(db.count_documents("pages").unwrap(), 0);
        assert_eq!(db.count_documents("news").unwrap(), 1);
    }

    #[test]
    fn test_delete_index() {
        let db = Database::in_memory().unwrap();
        db.create_index("pages").unwrap();
        db.upsert_documents("pages", &[document(json!({"uid": 1}))]).unwrap();

        assert!(db.delete_index("pages").unwrap());
        assert!(!db.index_exists("pages").unwrap());
        assert_eq!(db.count_documents("pages").unwrap(), 0);
        assert!(!db.delete_index("pages").unwrap());
    }

    #[test]
    fn test_get_stats() {
        let db = Database::in_memory().unwrap();
        db.create_index("pages").unwrap();
        db.create_index("news").unwrap();
        db.upsert_documents(
            "pages",
            &[document(json!({"uid": 1})), document(json!({"uid": 2}))],
        )
        .unwrap();

        let stats = db.get_stats().unwrap();
        assert_eq!(
            stats.indices,
            vec![("news".to_string(), 0), ("pages".to_string(), 2)]
        );
        assert_eq!(stats.total_documents, 2);
    }
}
