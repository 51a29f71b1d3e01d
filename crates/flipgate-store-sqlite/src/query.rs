// crates/flipgate-store-sqlite/src/query.rs
// ============================================================================
// Module: Feature Query Builder
// Description: Statement text for the feature table.
// Purpose: Centralize DDL, maintenance, and row statements for one table.
// Dependencies: crate::config
// ============================================================================

//! ## Overview
//! [`QueryBuilder`] renders every statement the store issues against the
//! `{keyspace}_{table}` table. Table and index names are validated identifiers;
//! all values are bound as parameters.
//!
//! Parameter layout for row writes follows [`FEATURE_COLUMNS`]:
//! `?1 uid, ?2 enable, ?3 description, ?4 strategy, ?5 groupname, ?6 roles,
//! ?7 properties`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::config::ConfigError;
use crate::config::SqliteFeatureStoreConfig;
use crate::config::validate_identifier;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Column list used by every row select and insert.
pub const FEATURE_COLUMNS: &str = "uid, enable, description, strategy, groupname, roles, properties";

// ============================================================================
// SECTION: Query Builder
// ============================================================================

/// Statement builder bound to one feature table.
///
/// # Invariants
/// - `table` and `index` are plain identifiers safe to interpolate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryBuilder {
    /// Qualified table name.
    table: String,
    /// Name of the secondary index on the group column.
    index: String,
}

impl QueryBuilder {
    /// Creates a builder for `{keyspace}_{table}`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when either name is not an identifier.
    pub fn new(keyspace: &str, table: &str) -> Result<Self, ConfigError> {
        validate_identifier("keyspace", keyspace)?;
        validate_identifier("table", table)?;
        let table = format!("{keyspace}_{table}");
        let index = format!("{table}_groupname_idx");
        Ok(Self { table, index })
    }

    /// Creates a builder for the table named by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the names are not identifiers.
    pub fn from_config(config: &SqliteFeatureStoreConfig) -> Result<Self, ConfigError> {
        Self::new(&config.keyspace, &config.table)
    }

    /// Returns the qualified table name.
    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table
    }

    /// Returns the group index name.
    #[must_use]
    pub fn index_name(&self) -> &str {
        &self.index
    }

    // ------------------------------------------------------------------------
    // Data definition and maintenance
    // ------------------------------------------------------------------------

    /// Creates the feature table.
    #[must_use]
    pub fn create_table(&self) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {} (
                uid TEXT PRIMARY KEY NOT NULL,
                enable INTEGER NOT NULL DEFAULT 0,
                description TEXT,
                strategy TEXT,
                groupname TEXT,
                roles TEXT NOT NULL DEFAULT '[]',
                properties TEXT NOT NULL DEFAULT '{{}}'
            )",
            self.table
        )
    }

    /// Creates the secondary index on the group column.
    #[must_use]
    pub fn create_group_index(&self) -> String {
        format!("CREATE INDEX IF NOT EXISTS {} ON {} (groupname)", self.index, self.table)
    }

    /// Removes every row (`SQLite` applies its truncate optimization).
    #[must_use]
    pub fn truncate(&self) -> String {
        format!("DELETE FROM {}", self.table)
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    /// Selects every row.
    #[must_use]
    pub fn select_all(&self) -> String {
        format!("SELECT {FEATURE_COLUMNS} FROM {}", self.table)
    }

    /// Selects one row by uid (`?1`).
    #[must_use]
    pub fn select_by_uid(&self) -> String {
        format!("SELECT {FEATURE_COLUMNS} FROM {} WHERE uid = ?1", self.table)
    }

    /// Selects the rows of one group (`?1`) through the group index.
    #[must_use]
    pub fn select_by_group(&self) -> String {
        format!("SELECT {FEATURE_COLUMNS} FROM {} WHERE groupname = ?1", self.table)
    }

    /// Probes for a uid (`?1`).
    #[must_use]
    pub fn uid_exists(&self) -> String {
        format!("SELECT uid FROM {} WHERE uid = ?1 LIMIT 1", self.table)
    }

    /// Probes for any member of a group (`?1`).
    #[must_use]
    pub fn group_exists(&self) -> String {
        format!("SELECT uid FROM {} WHERE groupname = ?1 LIMIT 1", self.table)
    }

    /// Lists member uids of a group (`?1`).
    #[must_use]
    pub fn select_group_uids(&self) -> String {
        format!("SELECT uid FROM {} WHERE groupname = ?1", self.table)
    }

    /// Lists distinct non-empty group names.
    #[must_use]
    pub fn distinct_groups(&self) -> String {
        format!(
            "SELECT DISTINCT groupname FROM {} WHERE groupname IS NOT NULL AND groupname <> ''",
            self.table
        )
    }

    // ------------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------------

    /// Inserts a new row; fails on an existing uid.
    #[must_use]
    pub fn insert(&self) -> String {
        format!(
            "INSERT INTO {} ({FEATURE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            self.table
        )
    }

    /// Deletes a row by uid (`?1`).
    #[must_use]
    pub fn delete_by_uid(&self) -> String {
        format!("DELETE FROM {} WHERE uid = ?1", self.table)
    }

    /// Sets the enabled flag (`?2`) of one row (`?1`).
    #[must_use]
    pub fn update_enabled(&self) -> String {
        format!("UPDATE {} SET enable = ?2 WHERE uid = ?1", self.table)
    }

    /// Sets or clears (`?2` NULL) the group of one row (`?1`).
    #[must_use]
    pub fn update_group(&self) -> String {
        format!("UPDATE {} SET groupname = ?2 WHERE uid = ?1", self.table)
    }

    /// Adds role `?2` to the role set of row `?1` in one statement.
    #[must_use]
    pub fn add_role(&self) -> String {
        format!(
            "UPDATE {t} SET roles = CASE
                WHEN EXISTS (SELECT 1 FROM json_each({t}.roles) WHERE value = ?2) THEN roles
                ELSE json_insert(roles, '$[#]', ?2)
             END
             WHERE uid = ?1",
            t = self.table
        )
    }

    /// Removes role `?2` from the role set of row `?1` in one statement.
    #[must_use]
    pub fn remove_role(&self) -> String {
        format!(
            "UPDATE {t} SET roles = (
                SELECT json_group_array(value) FROM json_each({t}.roles) WHERE value <> ?2
             )
             WHERE uid = ?1",
            t = self.table
        )
    }
}
