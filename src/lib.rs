//! searchcore: search index maintenance
//!
//! Indexes records of a SQLite source database into named search indices,
//! empties them, or drops them. Indices are addressed by identifiers declared
//! in the configuration file; each identifier is served by one indexer.
//!
//! ## Commands
//!
//! - `index <identifiers>` - index all documents of each listed index
//! - `delete-documents <identifiers>` - remove all documents of each index
//! - `delete <identifiers>` - drop each index entirely
//! - `status` - list indices and document counts
//!
//! Identifiers are comma separated; blank entries are ignored and unknown
//! ones are reported without aborting the remaining list.

pub mod cli;
pub mod config;
pub mod db;
pub mod index;
pub mod types;

pub use config::Settings;
pub use index::{Indexer, IndexerError, IndexerFactory};
