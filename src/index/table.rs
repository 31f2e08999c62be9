//! Indexer for a single source table

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::config::IndexingConfig;
use crate::db::{Database, SourceDatabase};
use crate::types::Document;

use super::Indexer;

/// Indexes every eligible row of one source table
pub struct TableIndexer<'a> {
    pub(super) identifier: String,
    pub(super) config: &'a IndexingConfig,
    pub(super) source: &'a SourceDatabase,
    pub(super) store: &'a Database,
}

impl<'a> TableIndexer<'a> {
    pub fn new(
        identifier: impl Into<String>,
        config: &'a IndexingConfig,
        source: &'a SourceDatabase,
        store: &'a Database,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            config,
            source,
            store,
        }
    }

    /// Source table read by this indexer
    pub fn table(&self) -> &str {
        self.config.table_name(&self.identifier)
    }

    /// Read all eligible records and turn them into documents
    pub(super) fn fetch_documents(&self) -> Result<Vec<Document>> {
        let table = self.table();
        let columns = self.source.table_columns(table)?;
        let conditions = eligibility_conditions(
            &columns,
            &self.config.exclude_flags,
            self.config.additional_where_clause.as_deref(),
        );
        debug!("Selecting from {} with {} condition(s)", table, conditions.len());

        let records = self.source.fetch_records(table, &conditions, &[])?;
        let total = records.len();

        let documents: Vec<Document> = records
            .into_iter()
            .filter_map(|record| Document::from_record(record, &self.config.id_field))
            .collect();

        if documents.len() < total {
            warn!(
                "Skipped {} record(s) of {} without a usable '{}' value",
                total - documents.len(),
                table,
                self.config.id_field
            );
        }

        Ok(documents)
    }

    /// Create the index if needed and store the documents
    pub(super) fn write_documents(&self, documents: &[Document]) -> Result<()> {
        if self.store.create_index(&self.identifier)? {
            info!("Created index {}", self.identifier);
        }

        let stats = self.store.upsert_documents(&self.identifier, documents)?;
        info!(
            "Indexed {} documents into {} ({} unchanged)",
            stats.written, self.identifier, stats.unchanged
        );
        Ok(())
    }
}

impl Indexer for TableIndexer<'_> {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    fn index(&self) -> Result<()> {
        info!("Indexing table {} into {}", self.table(), self.identifier);
        let documents = self.fetch_documents()?;
        self.write_documents(&documents)
    }

    fn delete_all_documents(&self) -> Result<()> {
        let removed = self.store.delete_all_documents(&self.identifier)?;
        info!("Removed {} documents from {}", removed, self.identifier);
        Ok(())
    }

    fn delete(&self) -> Result<()> {
        if self.store.delete_index(&self.identifier)? {
            info!("Dropped index {}", self.identifier);
        } else {
            debug!("Index {} did not exist", self.identifier);
        }
        Ok(())
    }
}

/// SQL conditions selecting the records eligible for indexing
///
/// Flag columns missing from the table are ignored.
pub(super) fn eligibility_conditions(
    columns: &[String],
    exclude_flags: &[String],
    additional_where_clause: Option<&str>,
) -> Vec<String> {
    let mut conditions: Vec<String> = exclude_flags
        .iter()
        .filter(|flag| columns.contains(flag))
        .map(|flag| format!("COALESCE({}, 0) = 0", flag))
        .collect();

    if let Some(clause) = additional_where_clause.map(str::trim).filter(|c| !c.is_empty()) {
        conditions.push(format!("({})", clause));
    }

    conditions
}
