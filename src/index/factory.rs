//! Factory resolving identifiers to the configured indexers

use tracing::debug;

use crate::config::{IndexerKind, Settings};
use crate::db::{Database, SourceDatabase};

use super::{Indexer, IndexerError, IndexerFactory, PagesIndexer, TableIndexer};

/// Builds indexers from the `indexing` section of the settings
pub struct ConfiguredIndexerFactory<'a> {
    settings: &'a Settings,
    source: &'a SourceDatabase,
    store: &'a Database,
}

impl<'a> ConfiguredIndexerFactory<'a> {
    pub fn new(settings: &'a Settings, source: &'a SourceDatabase, store: &'a Database) -> Self {
        Self {
            settings,
            source,
            store,
        }
    }
}

impl IndexerFactory for ConfiguredIndexerFactory<'_> {
    fn get_indexer(&self, identifier: &str) -> Result<Box<dyn Indexer + '_>, IndexerError> {
        let (canonical, config) = self
            .settings
            .resolve(identifier)
            .ok_or_else(|| IndexerError::NoMatchingIndexer {
                identifier: identifier.to_string(),
            })?;

        debug!(
            "Resolved {} to {} indexer {}",
            identifier,
            config.indexer.as_str(),
            canonical
        );

        let indexer: Box<dyn Indexer + '_> = match config.indexer {
            IndexerKind::Table => Box::new(TableIndexer::new(
                canonical,
                config,
                self.source,
                self.store,
            )),
            IndexerKind::Pages => Box::new(PagesIndexer::new(
                canonical,
                config,
                self.source,
                self.store,
            )),
        };
        Ok(indexer)
    }
}
