//! CLI command implementations
//!
//! Handles all command-line interface operations:
//! - index: Index documents for a list of identifiers
//! - delete-documents: Empty the indices for a list of identifiers
//! - delete: Drop the indices for a list of identifiers
//! - status: Show document store statistics

mod commands;
mod setup;

pub use commands::*;
pub use setup::*;
