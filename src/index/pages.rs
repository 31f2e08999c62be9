//! Indexer for pages, enriched with the text of their content elements

use anyhow::{bail, Result};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::IndexingConfig;
use crate::db::{json_to_sql, Database, SourceDatabase};
use crate::types::Document;

use super::table::eligibility_conditions;
use super::{Indexer, TableIndexer};

/// Field receiving the merged content element text
pub const CONTENT_FIELD: &str = "content";

/// Page indexer
///
/// Each page document gets a `content` field holding the configured content
/// columns of every eligible content element placed on that page.
pub struct PagesIndexer<'a> {
    table: TableIndexer<'a>,
}

impl<'a> PagesIndexer<'a> {
    pub fn new(
        identifier: impl Into<String>,
        config: &'a IndexingConfig,
        source: &'a SourceDatabase,
        store: &'a Database,
    ) -> Self {
        Self {
            table: TableIndexer::new(identifier, config, source, store),
        }
    }

    fn attach_content(&self, documents: &mut [Document]) -> Result<()> {
        let config = self.table.config;
        let source = self.table.source;

        let columns = source.table_columns(&config.content_table)?;
        let fields: Vec<&String> = config
            .content_fields
            .iter()
            .filter(|field| columns.contains(field))
            .collect();
        if fields.is_empty() {
            bail!(
                "content table '{}' has none of the columns {:?}",
                config.content_table,
                config.content_fields
            );
        }
        if !columns.contains(&config.content_parent_field) {
            bail!(
                "content table '{}' has no column '{}'",
                config.content_table,
                config.content_parent_field
            );
        }

        let mut conditions = eligibility_conditions(&columns, &config.exclude_flags, None);
        conditions.push(format!("{} = ?1", config.content_parent_field));

        for document in documents.iter_mut() {
            let page_id = document
                .body
                .get(&config.id_field)
                .map(json_to_sql)
                .unwrap_or(rusqlite::types::Value::Null);
            let elements =
                source.fetch_records(&config.content_table, &conditions, &[page_id])?;
            debug!(
                "Page {} has {} content element(s)",
                document.id,
                elements.len()
            );

            let text = elements
                .iter()
                .flat_map(|element| fields.iter().filter_map(move |f| element.get(f.as_str())))
                .filter_map(|value| match value {
                    Value::String(s) => Some(strip_tags(s)),
                    Value::Number(n) => Some(n.to_string()),
                    _ => None,
                })
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
                .join(" ");

            let previous = document
                .body
                .insert(CONTENT_FIELD.to_string(), Value::String(text));
            if previous.is_some() {
                warn!(
                    "Page {} column '{}' replaced by content element text",
                    document.id, CONTENT_FIELD
                );
            }
        }

        Ok(())
    }
}

impl Indexer for PagesIndexer<'_> {
    fn identifier(&self) -> &str {
        self.table.identifier()
    }

    fn index(&self) -> Result<()> {
        info!(
            "Indexing pages from {} with content of {}",
            self.table.table(),
            self.table.config.content_table
        );
        let mut documents = self.table.fetch_documents()?;
        self.attach_content(&mut documents)?;
        self.table.write_documents(&documents)
    }

    fn delete_all_documents(&self) -> Result<()> {
        self.table.delete_all_documents()
    }

    fn delete(&self) -> Result<()> {
        self.table.delete()
    }
}

/// Remove markup and collapse whitespace
pub fn strip_tags(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;

    for c in html.chars() {
        match c {
            '<' => {
                in_tag = true;
                text.push(' ');
            }
            '>' if in_tag => in_tag = false,
            _ if in_tag => {}
            _ => text.push(c),
        }
    }

    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
