//! Configuration for searchcore
//!
//! Settings are read from a JSON file (`$SEARCHCORE_CONFIG`, falling back to
//! `searchcore.json` in the working directory). Each entry below `indexing`
//! declares one index: its key is the identifier accepted on the command line.

use std::collections::{BTreeMap, HashSet};
use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;

/// Environment variable pointing at the configuration file
pub const CONFIG_ENV: &str = "SEARCHCORE_CONFIG";

/// Environment variable overriding the document store location
pub const INDEX_DATABASE_ENV: &str = "SEARCHCORE_INDEX_DATABASE";

const DEFAULT_CONFIG_FILE: &str = "searchcore.json";
const DEFAULT_INDEX_DATABASE: &str = ".searchcore/index.db";

/// Top-level settings
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// SQLite database holding the records to index
    pub source_database: PathBuf,
    /// SQLite document store receiving the indexed documents
    #[serde(default = "default_index_database")]
    pub index_database: PathBuf,
    /// Index declarations keyed by identifier
    #[serde(default)]
    pub indexing: BTreeMap<String, IndexingConfig>,
}

fn default_index_database() -> PathBuf {
    PathBuf::from(DEFAULT_INDEX_DATABASE)
}

/// Which indexer implementation serves an identifier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexerKind {
    #[default]
    Table,
    Pages,
}

impl IndexerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            IndexerKind::Table => "table",
            IndexerKind::Pages => "pages",
        }
    }
}

/// Declaration of a single index
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndexingConfig {
    pub indexer: IndexerKind,
    /// Source table, defaults to the identifier
    pub table: Option<String>,
    /// Additional identifiers resolving to this index
    pub aliases: Vec<String>,
    /// Column used as document id
    pub id_field: String,
    /// Extra SQL condition records must satisfy
    pub additional_where_clause: Option<String>,
    /// Flag columns excluding a record when set (ignored if absent)
    pub exclude_flags: Vec<String>,
    /// Pages only: table holding content elements
    pub content_table: String,
    /// Pages only: content columns merged into the page document
    pub content_fields: Vec<String>,
    /// Pages only: content column referencing the page id
    pub content_parent_field: String,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            indexer: IndexerKind::Table,
            table: None,
            aliases: Vec::new(),
            id_field: "uid".to_string(),
            additional_where_clause: None,
            exclude_flags: vec!["deleted".to_string(), "hidden".to_string()],
            content_table: "tt_content".to_string(),
            content_fields: vec!["header".to_string(), "bodytext".to_string()],
            content_parent_field: "pid".to_string(),
        }
    }
}

impl IndexingConfig {
    /// Source table for the given identifier
    pub fn table_name<'a>(&'a self, identifier: &'a str) -> &'a str {
        self.table.as_deref().unwrap_or(identifier)
    }
}

/// Invalid configuration contents
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("identifier '{0}' is declared more than once")]
    DuplicateIdentifier(String),
    #[error("identifier '{0}' is empty, padded with whitespace or contains a comma")]
    UnresolvableIdentifier(String),
    #[error("'{name}' configured for '{identifier}' is not a valid SQL identifier")]
    InvalidSqlIdentifier { identifier: String, name: String },
}

impl Settings {
    /// Load settings from the location given by the environment
    pub fn from_env() -> Result<Self> {
        let mut settings = Self::load(config_path(env::var(CONFIG_ENV).ok()))?;
        if let Ok(index_database) = env::var(INDEX_DATABASE_ENV) {
            settings.index_database = PathBuf::from(index_database);
        }
        Ok(settings)
    }

    /// Load and validate settings from a JSON file
    ///
    /// Relative database paths are resolved against the directory containing
    /// the file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read configuration {}", path.display()))?;
        let mut settings = Self::from_json(&raw)
            .with_context(|| format!("invalid configuration {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        settings.source_database = resolve_relative(base, &settings.source_database);
        settings.index_database = resolve_relative(base, &settings.index_database);

        Ok(settings)
    }

    /// Parse and validate settings from a JSON string
    pub fn from_json(raw: &str) -> Result<Self> {
        let settings: Settings = serde_json::from_str(raw)?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();

        for (identifier, config) in &self.indexing {
            for name in std::iter::once(identifier).chain(config.aliases.iter()) {
                if !is_resolvable_identifier(name) {
                    return Err(ConfigError::UnresolvableIdentifier(name.clone()));
                }
                if !seen.insert(name.as_str()) {
                    return Err(ConfigError::DuplicateIdentifier(name.clone()));
                }
            }

            let mut names = vec![config.table_name(identifier), config.id_field.as_str()];
            names.extend(config.exclude_flags.iter().map(String::as_str));
            if config.indexer == IndexerKind::Pages {
                names.push(config.content_table.as_str());
                names.push(config.content_parent_field.as_str());
                names.extend(config.content_fields.iter().map(String::as_str));
            }

            if let Some(name) = names.into_iter().find(|n| !is_sql_identifier(n)) {
                return Err(ConfigError::InvalidSqlIdentifier {
                    identifier: identifier.clone(),
                    name: name.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Look up the declaration for an identifier or one of its aliases
    ///
    /// Returns the canonical identifier along with the declaration.
    pub fn resolve(&self, identifier: &str) -> Option<(&str, &IndexingConfig)> {
        if let Some((key, config)) = self.indexing.get_key_value(identifier) {
            return Some((key.as_str(), config));
        }
        self.indexing
            .iter()
            .find(|(_, config)| config.aliases.iter().any(|a| a == identifier))
            .map(|(key, config)| (key.as_str(), config))
    }
}

/// Configuration file to read, `searchcore.json` unless set explicitly
pub fn config_path(explicit: Option<String>) -> PathBuf {
    explicit
        .filter(|p| !p.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
}

/// Whether `name` can appear as a token of a comma separated identifier list
fn is_resolvable_identifier(name: &str) -> bool {
    !name.is_empty() && name.trim() == name && !name.contains(',')
}

/// Whether `name` can be used unquoted as a table or column name
pub fn is_sql_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn resolve_relative(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
