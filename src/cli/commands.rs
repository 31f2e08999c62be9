//! Command implementations for CLI operations

use std::io::Write;

use anyhow::Result;
use tracing::debug;

use crate::db::Database;
use crate::index::{Indexer, IndexerError, IndexerFactory};

/// Operation applied to every resolved indexer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Index,
    DeleteDocuments,
    DeleteIndex,
}

impl Operation {
    fn apply(self, indexer: &dyn Indexer) -> Result<()> {
        match self {
            Operation::Index => indexer.index(),
            Operation::DeleteDocuments => indexer.delete_all_documents(),
            Operation::DeleteIndex => indexer.delete(),
        }
    }

    fn success_message(self, identifier: &str) -> String {
        match self {
            Operation::Index => format!("Documents in index {} were indexed.", identifier),
            Operation::DeleteDocuments => format!("Documents in index {} were deleted.", identifier),
            Operation::DeleteIndex => format!("Index {} was deleted.", identifier),
        }
    }
}

/// Split a comma separated identifier list, dropping blank entries
pub fn parse_identifiers(identifiers: &str) -> impl Iterator<Item = &str> {
    identifiers
        .split(',')
        .map(str::trim)
        .filter(|identifier| !identifier.is_empty())
}

/// Identifier list argument of `command`
///
/// Writes a usage line to `err` and returns `None` when it is missing.
pub fn identifiers_argument<'a>(
    command: &str,
    args: &'a [String],
    err: &mut dyn Write,
) -> Result<Option<&'a str>> {
    match args.get(2) {
        Some(identifiers) => Ok(Some(identifiers.as_str())),
        None => {
            writeln!(err, "Usage: searchcore {} <identifiers>", command)?;
            Ok(None)
        }
    }
}

/// Index all documents for the given identifiers
pub fn index_command<F>(factory: &F, identifiers: &str, out: &mut dyn Write) -> Result<()>
where
    F: IndexerFactory + ?Sized,
{
    execute_for_identifiers(factory, identifiers, Operation::Index, out)
}

/// Delete all documents of the indices for the given identifiers
pub fn delete_documents_command<F>(
    factory: &F,
    identifiers: &str,
    out: &mut dyn Write,
) -> Result<()>
where
    F: IndexerFactory + ?Sized,
{
    execute_for_identifiers(factory, identifiers, Operation::DeleteDocuments, out)
}

/// Delete the indices for the given identifiers
pub fn delete_command<F>(factory: &F, identifiers: &str, out: &mut dyn Write) -> Result<()>
where
    F: IndexerFactory + ?Sized,
{
    execute_for_identifiers(factory, identifiers, Operation::DeleteIndex, out)
}

/// Resolve each identifier and apply the operation
///
/// Unknown identifiers are reported and skipped. Errors of the operation
/// itself abort the remaining identifiers.
fn execute_for_identifiers<F>(
    factory: &F,
    identifiers: &str,
    operation: Operation,
    out: &mut dyn Write,
) -> Result<()>
where
    F: IndexerFactory + ?Sized,
{
    for identifier in parse_identifiers(identifiers) {
        match factory.get_indexer(identifier) {
            Ok(indexer) => {
                debug!("Running {:?} for {}", operation, indexer.identifier());
                operation.apply(indexer.as_ref())?;
                writeln!(out, "{}", operation.success_message(indexer.identifier()))?;
            }
            Err(IndexerError::NoMatchingIndexer { .. }) => {
                writeln!(out, "No indexer found for: {}.", identifier)?;
            }
        }
    }

    Ok(())
}

/// Show document store statistics
pub fn status_command(store: &Database, out: &mut dyn Write) -> Result<()> {
    let stats = store.get_stats()?;

    if stats.indices.is_empty() {
        writeln!(out, "No indices found.")?;
        writeln!(out, "Run 'searchcore index <identifiers>' first.")?;
        return Ok(());
    }

    writeln!(out, "searchcore Index Status")?;
    writeln!(out, "=======================")?;
    for (identifier, count) in &stats.indices {
        writeln!(out, "  {}: {} documents", identifier, count)?;
    }
    writeln!(out, "Documents: {}", stats.total_documents)?;
    writeln!(out, "Size: {:.2} KB", stats.db_size_bytes as f64 / 1024.0)?;

    Ok(())
}
