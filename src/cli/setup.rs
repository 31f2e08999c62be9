//! Database and factory initialization for CLI commands

use anyhow::{Context, Result};
use std::path::Path;

use crate::config::Settings;
use crate::db::{Database, SourceDatabase};
use crate::index::ConfiguredIndexerFactory;

/// Ensure the directory holding a database file exists
pub fn ensure_database_directory(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create directory {}", dir.display()))?;
    }
    Ok(())
}

/// Open or initialize the document store
pub fn open_index_database(settings: &Settings) -> Result<Database> {
    ensure_database_directory(&settings.index_database)?;
    Database::open(&settings.index_database).with_context(|| {
        format!(
            "failed to open index database {}",
            settings.index_database.display()
        )
    })
}

/// Open the source database read-only
pub fn open_source_database(settings: &Settings) -> Result<SourceDatabase> {
    SourceDatabase::open(&settings.source_database).with_context(|| {
        format!(
            "failed to open source database {}",
            settings.source_database.display()
        )
    })
}

/// Run `f` with a factory backed by the configured databases
pub fn with_indexer_factory<T, F>(settings: &Settings, f: F) -> Result<T>
where
    F: FnOnce(&ConfiguredIndexerFactory<'_>) -> Result<T>,
{
    let source = open_source_database(settings)?;
    let store = open_index_database(settings)?;
    let factory = ConfiguredIndexerFactory::new(settings, &source, &store);
    f(&factory)
}
