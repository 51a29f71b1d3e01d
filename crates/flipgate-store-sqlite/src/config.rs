// crates/flipgate-store-sqlite/src/config.rs
// ============================================================================
// Module: SQLite Feature Store Config
// Description: Configuration model for the SQLite feature store.
// Purpose: Parse, default, and validate store settings (TOML or code).
// Dependencies: serde, toml, thiserror
// ============================================================================

//! ## Overview
//! [`SqliteFeatureStoreConfig`] selects the database file, the keyspace and
//! table that hold feature rows, and the `SQLite` pragmas applied to the
//! connection. Keyspace and table names are interpolated into DDL, so they are
//! restricted to plain identifiers.
//!
//! ```toml
//! path = "/var/lib/flipgate/features.db"
//! keyspace = "flipgate"
//! table = "features"
//! journal_mode = "wal"
//! ```

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Path value that selects a private in-memory database.
pub const IN_MEMORY_PATH: &str = ":memory:";
/// Default keyspace prefix for the feature table.
pub const DEFAULT_KEYSPACE: &str = "flipgate";
/// Default feature table name.
pub const DEFAULT_TABLE: &str = "features";
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a keyspace or table identifier.
pub const MAX_IDENTIFIER_LENGTH: usize = 48;
/// Maximum config file size accepted by [`SqliteFeatureStoreConfig::load`].
const MAX_CONFIG_FILE_SIZE: usize = 64 * 1024;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Pragmas
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode (recommended).
    #[default]
    Wal,
    /// Delete journal mode (legacy).
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode (safest).
    #[default]
    Full,
    /// Normal synchronous mode (balanced).
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

// ============================================================================
// SECTION: Config
// ============================================================================

/// Configuration for the `SQLite` feature store.
///
/// # Invariants
/// - `path` is a file path or [`IN_MEMORY_PATH`].
/// - `keyspace` and `table` match `[A-Za-z_][A-Za-z0-9_]*`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SqliteFeatureStoreConfig {
    /// Path to the `SQLite` database file.
    pub path: PathBuf,
    /// Keyspace prefix of the feature table.
    #[serde(default = "default_keyspace")]
    pub keyspace: String,
    /// Feature table name within the keyspace.
    #[serde(default = "default_table")]
    pub table: String,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
    /// Whether opening the store creates the table and index when missing.
    #[serde(default = "default_create_schema")]
    pub create_schema: bool,
}

/// Returns the default keyspace.
fn default_keyspace() -> String {
    DEFAULT_KEYSPACE.to_string()
}

/// Returns the default table.
fn default_table() -> String {
    DEFAULT_TABLE.to_string()
}

/// Returns the default busy timeout for `SQLite` connections.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

/// Schema creation is on unless disabled.
const fn default_create_schema() -> bool {
    true
}

impl SqliteFeatureStoreConfig {
    /// Creates a config for a database file with default settings.
    #[must_use]
    pub fn for_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            keyspace: default_keyspace(),
            table: default_table(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
            create_schema: true,
        }
    }

    /// Creates a config for a private in-memory database.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::for_path(IN_MEMORY_PATH)
    }

    /// Returns true when the config selects an in-memory database.
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.path.as_os_str() == IN_MEMORY_PATH
    }

    /// Parses and validates a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads and validates a config from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the file cannot be read, is too large, is
    /// not UTF-8, or fails parsing or validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let bytes = fs::read(path).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml_str(content)
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for an empty path, a directory path,
    /// a zero busy timeout, or invalid keyspace/table identifiers.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("store path must not be empty".to_string()));
        }
        if !self.is_in_memory() && self.path.is_dir() {
            return Err(ConfigError::Invalid(
                "store path must be a file, not a directory".to_string(),
            ));
        }
        if self.busy_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "busy_timeout_ms must be greater than zero".to_string(),
            ));
        }
        validate_identifier("keyspace", &self.keyspace)?;
        validate_identifier("table", &self.table)?;
        Ok(())
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Checks that `value` is a plain SQL identifier.
///
/// # Errors
///
/// Returns [`ConfigError::Invalid`] when `value` is empty, too long, starts
/// with a digit, or contains characters outside `[A-Za-z0-9_]`.
pub fn validate_identifier(label: &str, value: &str) -> Result<(), ConfigError> {
    let mut chars = value.chars();
    let Some(first) = chars.next() else {
        return Err(ConfigError::Invalid(format!("{label} must not be empty")));
    };
    if value.len() > MAX_IDENTIFIER_LENGTH {
        return Err(ConfigError::Invalid(format!(
            "{label} exceeds {MAX_IDENTIFIER_LENGTH} characters"
        )));
    }
    if !(first.is_ascii_alphabetic() || first == '_')
        || !chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
    {
        return Err(ConfigError::Invalid(format!("{label} must be a plain identifier: {value}")));
    }
    Ok(())
}
