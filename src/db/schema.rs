//! Document store schema definition

pub const SCHEMA: &str = r#"
-- Indices table: one row per existing search index
CREATE TABLE IF NOT EXISTS indices (
    identifier TEXT PRIMARY KEY,
    created_at INTEGER NOT NULL
);

-- Documents table: indexed documents, JSON encoded
CREATE TABLE IF NOT EXISTS documents (
    index_identifier TEXT NOT NULL,
    document_id TEXT NOT NULL,
    body TEXT NOT NULL,
    content_hash TEXT NOT NULL,
    indexed_at INTEGER NOT NULL,
    PRIMARY KEY (index_identifier, document_id),
    FOREIGN KEY (index_identifier) REFERENCES indices(identifier)
);

CREATE INDEX IF NOT EXISTS idx_documents_index ON documents(index_identifier);
"#;
