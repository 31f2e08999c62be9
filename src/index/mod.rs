//! Indexers and the factory resolving identifiers to them
//!
//! An indexer owns exactly one named index. The factory maps the identifiers
//! given on the command line (configuration keys or their aliases) to the
//! indexer responsible for them.

mod factory;
mod pages;
mod table;

pub use factory::ConfiguredIndexerFactory;
pub use pages::PagesIndexer;
pub use table::TableIndexer;

use anyhow::Result;
use thiserror::Error;

/// Operations every indexer supports
pub trait Indexer {
    /// Canonical identifier of the index, which may differ from the lookup key
    fn identifier(&self) -> &str;

    /// Push all eligible records into the index, creating it when missing
    fn index(&self) -> Result<()>;

    /// Remove every document while keeping the index itself
    fn delete_all_documents(&self) -> Result<()>;

    /// Drop the index together with its documents
    fn delete(&self) -> Result<()>;
}

/// Resolves identifiers to indexers
pub trait IndexerFactory {
    fn get_indexer(&self, identifier: &str) -> Result<Box<dyn Indexer + '_>, IndexerError>;
}

/// Errors raised while resolving an indexer
#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("no indexer configured for identifier '{identifier}'")]
    NoMatchingIndexer { identifier: String },
}
