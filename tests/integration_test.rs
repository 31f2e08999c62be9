//! Integration tests for searchcore
//!
//! These tests verify the end-to-end workflow of indexing, emptying and
//! dropping indices backed by real SQLite databases.

use std::path::Path;

use rusqlite::Connection;
use searchcore::cli::{
    delete_command, delete_documents_command, index_command, open_index_database,
    status_command, with_indexer_factory,
};
use searchcore::db::Database;
use searchcore::Settings;
use tempfile::{tempdir, TempDir};

/// Helper creating a source database and a configuration file
fn setup_project() -> (TempDir, Settings) {
    let dir = tempdir().unwrap();

    let conn = Connection::open(dir.path().join("typo3.db")).unwrap();
    conn.execute_batch(
        r#"
        CREATE TABLE pages (uid INTEGER PRIMARY KEY, title TEXT, deleted INTEGER, hidden INTEGER);
        INSERT INTO pages VALUES (1, 'Home', 0, 0);
        INSERT INTO pages VALUES (2, 'Contact', 0, 0);
        INSERT INTO pages VALUES (3, 'Old', 1, 0);

        CREATE TABLE tt_content (uid INTEGER PRIMARY KEY, pid INTEGER, header TEXT, bodytext TEXT, deleted INTEGER);
        INSERT INTO tt_content VALUES (1, 1, 'Welcome', '<p>Latest <em>news</em></p>', 0);
        INSERT INTO tt_content VALUES (2, 2, 'Write us', 'Mail form', 0);

        CREATE TABLE tt_address (uid INTEGER PRIMARY KEY, name TEXT, hidden INTEGER);
        INSERT INTO tt_address VALUES (1, 'Jane', 0);
        INSERT INTO tt_address VALUES (2, 'John', 1);
        "#,
    )
    .unwrap();
    drop(conn);

    let config = r#"{
        "source_database": "typo3.db",
        "index_database": "index/search.db",
        "indexing": {
            "pages": {"indexer": "pages"},
            "addresses": {"table": "tt_address", "aliases": ["tt_address"]}
        }
    }"#;
    let config_path = dir.path().join("searchcore.json");
    std::fs::write(&config_path, config).unwrap();

    let settings = Settings::load(&config_path).unwrap();
    (dir, settings)
}

fn run(settings: &Settings, command: &str, identifiers: &str) -> Vec<String> {
    let mut out = Vec::new();
    with_indexer_factory(settings, |factory| match command {
        "index" => index_command(factory, identifiers, &mut out),
        "delete-documents" => delete_documents_command(factory, identifiers, &mut out),
        "delete" => delete_command(factory, identifiers, &mut out),
        other => panic!("unknown command {}", other),
    })
    .unwrap();

    String::from_utf8(out)
        .unwrap()
        .lines()
        .map(String::from)
        .collect()
}

fn store(path: &Path) -> Database {
    Database::open(path).unwrap()
}

#[test]
fn test_index_and_report_per_identifier() {
    let (_dir, settings) = setup_project();

    let output = run(&settings, "index", "pages, unknown, tt_address,");

    assert_eq!(
        output,
        vec![
            "Documents in index pages were indexed.",
            "No indexer found for: unknown.",
            "Documents in index addresses were indexed.",
        ]
    );

    let db = store(&settings.index_database);
    assert_eq!(db.count_documents("pages").unwrap(), 2);
    assert_eq!(db.count_documents("addresses").unwrap(), 1);

    let home = db.get_document("pages", "1").unwrap().unwrap();
    assert_eq!(home.body["content"], "Welcome Latest news");
}

#[test]
fn test_reindex_is_idempotent() {
    let (_dir, settings) = setup_project();

    run(&settings, "index", "pages");
    run(&settings, "index", "pages");

    let db = store(&settings.index_database);
    assert_eq!(db.count_documents("pages").unwrap(), 2);
}

#[test]
fn test_delete_documents_keeps_index() {
    let (_dir, settings) = setup_project();
    run(&settings, "index", "pages");

    let output = run(&settings, "delete-documents", "pages");

    assert_eq!(output, vec!["Documents in index pages were deleted."]);
    let db = store(&settings.index_database);
    assert!(db.index_exists("pages").unwrap());
    assert_eq!(db.count_documents("pages").unwrap(), 0);
}

#[test]
fn test_delete_index() {
    let (_dir, settings) = setup_project();
    run(&settings, "index", "pages, addresses");

    let output = run(&settings, "delete", "pages, nonAllowedTable");

    assert_eq!(
        output,
        vec!["Index pages was deleted.", "No indexer found for: nonAllowedTable."]
    );
    let db = store(&settings.index_database);
    assert!(!db.index_exists("pages").unwrap());
    assert!(db.index_exists("addresses").unwrap());
}

#[test]
fn test_missing_source_table_aborts_remaining_identifiers() {
    let (dir, _) = setup_project();
    let config_path = dir.path().join("broken.json");
    std::fs::write(
        &config_path,
        r#"{
            "source_database": "typo3.db",
            "index_database": "index/search.db",
            "indexing": {"tx_news": {}, "pages": {"indexer": "pages"}}
        }"#,
    )
    .unwrap();
    let settings = Settings::load(&config_path).unwrap();

    let mut out = Vec::new();
    let result = with_indexer_factory(&settings, |factory| {
        index_command(factory, "tx_news, pages", &mut out)
    });

    assert!(result.is_err());
    assert!(out.is_empty());
    let db = store(&settings.index_database);
    assert!(!db.index_exists("pages").unwrap());
}

#[test]
fn test_status_after_indexing() {
    let (_dir, settings) = setup_project();
    run(&settings, "index", "pages");

    let db = open_index_database(&settings).unwrap();
    let mut out = Vec::new();
    status_command(&db, &mut out).unwrap();

    let output = String::from_utf8(out).unwrap();
    assert!(output.contains("pages: 2 documents"));
}

#[test]
fn test_command_without_identifiers_prints_usage() {
    let dir = tempdir().unwrap();

    let output = std::process::Command::new(env!("CARGO_BIN_EXE_searchcore"))
        .arg("index")
        .current_dir(dir.path())
        .env_remove("SEARCHCORE_CONFIG")
        .output()
        .unwrap();

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("Usage: searchcore index <identifiers>"));
}
