//! searchcore: search index maintenance CLI
//!
//! Usage:
//!   searchcore index <identifiers>             Index documents
//!   searchcore delete-documents <identifiers>  Delete all documents of indices
//!   searchcore delete <identifiers>            Delete indices
//!   searchcore status                          Show index statistics

use std::env;
use std::io;

use anyhow::Result;
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use searchcore::cli::{
    delete_command, delete_documents_command, identifiers_argument, index_command,
    open_index_database, status_command, with_indexer_factory,
};
use searchcore::Settings;

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_usage();
        return Ok(());
    }

    match args[1].as_str() {
        cmd @ ("index" | "delete-documents" | "delete") => {
            let Some(identifiers) = identifiers_argument(cmd, &args, &mut io::stderr())? else {
                return Ok(());
            };
            setup_logging();

            let settings = Settings::from_env()?;
            let stdout = io::stdout();
            let mut out = stdout.lock();

            with_indexer_factory(&settings, |factory| match cmd {
                "index" => index_command(factory, identifiers, &mut out),
                "delete-documents" => delete_documents_command(factory, identifiers, &mut out),
                _ => delete_command(factory, identifiers, &mut out),
            })?;
        }
        "status" => {
            setup_logging();
            let settings = Settings::from_env()?;
            let store = open_index_database(&settings)?;
            status_command(&store, &mut io::stdout().lock())?;
        }
        "help" | "--help" | "-h" => {
            print_usage();
        }
        "--version" | "-V" | "version" => {
            print_version();
        }
        cmd => {
            eprintln!("Unknown command: {}", cmd);
            print_usage();
        }
    }

    Ok(())
}

fn print_usage() {
    println!(
        r#"searchcore: search index maintenance

USAGE:
    searchcore <COMMAND> [IDENTIFIERS]

COMMANDS:
    index <identifiers>             Index all documents of the given indices
    delete-documents <identifiers>  Delete all documents of the given indices
    delete <identifiers>            Delete the given indices
    status                          Show indices and document counts
    help                            Show this help message

Identifiers are comma separated, e.g. "pages, tt_address".

ENVIRONMENT:
    SEARCHCORE_CONFIG               Configuration file (default: searchcore.json)
    SEARCHCORE_INDEX_DATABASE       Override the index database location
    SEARCHCORE_DEBUG=1              Enable debug logging
    RUST_LOG                        Log filter, takes precedence when set

EXAMPLES:
    searchcore index pages                 # Index pages with their content
    searchcore index "pages, tt_address"   # Index two tables
    searchcore delete-documents tx_news    # Empty the news index
    searchcore delete pages                # Drop the pages index
"#
    );
}

fn print_version() {
    println!("searchcore {}", env!("CARGO_PKG_VERSION"));
}

fn setup_logging() {
    let level = if env::var("SEARCHCORE_DEBUG").map_or(false, |v| v == "1") {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}
