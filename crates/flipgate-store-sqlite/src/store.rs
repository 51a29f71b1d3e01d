// crates/flipgate-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Feature Store
// Description: Durable FeatureStore backed by one SQLite table.
// Purpose: Map the feature store contract onto point and scan statements.
// Dependencies: flipgate-core, rusqlite, tracing
// ============================================================================

//! ## Overview
//! [`SqliteFeatureStore`] implements [`FeatureStore`] over a [`Session`]. Each
//! operation validates its inputs, then issues one statement per step. Nothing
//! spans more than one statement atomically:
//! - `update` deletes the row and inserts the replacement; a reader between the
//!   two statements sees the feature as absent.
//! - `enable_group` and `disable_group` write each member separately.
//!
//! Single-row writes are targeted `UPDATE ... WHERE uid = ?` statements, so a
//! row deleted concurrently reports [`FeatureStoreError::NotFound`] instead of
//! being recreated.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;

use flipgate_core::Feature;
use flipgate_core::FeatureStore;
use flipgate_core::FeatureStoreError;
use flipgate_core::require_group;
use flipgate_core::require_role;
use flipgate_core::require_uid;
use flipgate_core::validate_feature;
use rusqlite::ToSql;
use rusqlite::params;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::codec::FeatureRecord;
use crate::codec::decode;
use crate::codec::enabled_flag;
use crate::codec::encode;
use crate::codec::encode_properties;
use crate::codec::encode_roles;
use crate::config::SqliteFeatureStoreConfig;
use crate::error::SqliteStoreError;
use crate::query::QueryBuilder;
use crate::schema::ensure_schema;
use crate::session::Session;
use crate::session::SqliteSession;

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed feature store.
///
/// # Invariants
/// - Cloning shares the session; clones observe each other's writes.
/// - No lock is held across statements.
#[derive(Debug)]
pub struct SqliteFeatureStore<S: Session = SqliteSession> {
    /// Statement execution handle.
    session: Arc<S>,
    /// Statement text for the configured table.
    queries: Arc<QueryBuilder>,
}

impl<S: Session> Clone for SqliteFeatureStore<S> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
            queries: Arc::clone(&self.queries),
        }
    }
}

impl SqliteFeatureStore<SqliteSession> {
    /// Opens the database selected by `config`.
    ///
    /// Creates the table and index when `config.create_schema` is set.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the config is invalid, the database
    /// cannot be opened, or schema setup fails.
    pub fn open(config: &SqliteFeatureStoreConfig) -> Result<Self, SqliteStoreError> {
        let queries = QueryBuilder::from_config(config)?;
        let session = SqliteSession::open(config)?;
        Self::with_session(session, queries, config.create_schema)
    }

    /// Opens a private in-memory store with default names.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be initialized.
    pub fn open_in_memory() -> Result<Self, SqliteStoreError> {
        Self::open(&SqliteFeatureStoreConfig::in_memory())
    }
}

impl<S: Session> SqliteFeatureStore<S> {
    /// Builds a store over an existing session.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::Schema`] when `create_schema` is set and
    /// setup fails.
    pub fn with_session(
        session: S,
        queries: QueryBuilder,
        create_schema: bool,
    ) -> Result<Self, SqliteStoreError> {
        let store = Self {
            session: Arc::new(session),
            queries: Arc::new(queries),
        };
        if create_schema {
            ensure_schema(store.session.as_ref(), &store.queries)?;
        }
        Ok(store)
    }

    /// Returns the statement builder for the store table.
    #[must_use]
    pub fn queries(&self) -> &QueryBuilder {
        &self.queries
    }

    /// Returns the underlying session.
    #[must_use]
    pub fn session(&self) -> &S {
        &self.session
    }

    /// Returns true when a row with `uid` exists.
    fn uid_present(&self, uid: &str) -> Result<bool, SqliteStoreError> {
        let rows = self.session.query_strings(&self.queries.uid_exists(), params![uid])?;
        Ok(!rows.is_empty())
    }

    /// Returns true when any row carries `group`.
    fn group_present(&self, group: &str) -> Result<bool, SqliteStoreError> {
        let rows = self.session.query_strings(&self.queries.group_exists(), params![group])?;
        Ok(!rows.is_empty())
    }

    /// Runs a row select and decodes every result keyed by uid.
    fn collect_features(
        &self,
        statement: &str,
        params: &[&dyn ToSql],
    ) -> Result<BTreeMap<String, Feature>, SqliteStoreError> {
        let mut features = BTreeMap::new();
        self.session.scan(
            statement,
            params,
            &mut |record: FeatureRecord| -> Result<(), SqliteStoreError> {
                let feature = decode(record)?;
                features.insert(feature.uid.clone(), feature);
                Ok(())
            },
        )?;
        Ok(features)
    }

    /// Inserts a fresh row; a taken uid is reported as a conflict.
    fn insert_record(&self, record: &FeatureRecord) -> Result<(), SqliteStoreError> {
        let roles = encode_roles(&record.roles)?;
        let properties = encode_properties(&record.properties)?;
        self.session.execute(
            &self.queries.insert(),
            params![
                record.uid,
                record.enabled,
                record.description,
                record.strategy,
                record.group,
                roles,
                properties
            ],
        )?;
        Ok(())
    }

    /// Executes a single-row write; no changed row means `uid` is absent.
    fn write_row(
        &self,
        uid: &str,
        statement: &str,
        params: &[&dyn ToSql],
    ) -> Result<(), FeatureStoreError> {
        let changed = self.session.execute(statement, params)?;
        if changed == 0 {
            return Err(FeatureStoreError::NotFound(uid.to_string()));
        }
        Ok(())
    }

    /// Sets the enabled flag of every member of `group`, one row at a time.
    fn set_group_enabled(&self, group: &str, enabled: bool) -> Result<(), FeatureStoreError> {
        require_group(group)?;
        let members =
            self.session.query_strings(&self.queries.select_group_uids(), params![group])?;
        if members.is_empty() {
            return Err(FeatureStoreError::GroupNotFound(group.to_string()));
        }
        let statement = self.queries.update_enabled();
        let flag = enabled_flag(enabled);
        let mut changed = 0usize;
        for uid in &members {
            // Members deleted since the scan are skipped.
            changed += self.session.execute(&statement, params![uid, flag])?;
        }
        debug!(group, enabled, members = members.len(), changed, "updated group flag");
        Ok(())
    }
}

// ============================================================================
// SECTION: Contract
// ============================================================================

impl<S: Session> FeatureStore for SqliteFeatureStore<S> {
    fn exist(&self, uid: &str) -> Result<bool, FeatureStoreError> {
        require_uid(uid)?;
        Ok(self.uid_present(uid)?)
    }

    fn create(&self, feature: &Feature) -> Result<(), FeatureStoreError> {
        validate_feature(feature)?;
        let uid = feature.uid.as_str();
        if self.uid_present(uid)? {
            return Err(FeatureStoreError::AlreadyExists(uid.to_string()));
        }
        let record = encode(feature)?;
        self.insert_record(&record).map_err(|err| match err {
            SqliteStoreError::Conflict(_) => FeatureStoreError::AlreadyExists(uid.to_string()),
            other => other.into(),
        })?;
        debug!(uid, "created feature");
        Ok(())
    }

    fn read(&self, uid: &str) -> Result<Feature, FeatureStoreError> {
        require_uid(uid)?;
        let mut found = self.collect_features(&self.queries.select_by_uid(), params![uid])?;
        found.remove(uid).ok_or_else(|| FeatureStoreError::NotFound(uid.to_string()))
    }

    fn read_all(&self) -> Result<BTreeMap<String, Feature>, FeatureStoreError> {
        Ok(self.collect_features(&self.queries.select_all(), &[])?)
    }

    fn update(&self, feature: &Feature) -> Result<(), FeatureStoreError> {
        validate_feature(feature)?;
        let uid = feature.uid.as_str();
        let record = encode(feature)?;
        if !self.uid_present(uid)? {
            return Err(FeatureStoreError::NotFound(uid.to_string()));
        }
        self.delete(uid)?;
        if let Err(err) = self.insert_record(&record) {
            warn!(uid, error = %err, "feature deleted but not recreated during update");
            return Err(err.into());
        }
        debug!(uid, "replaced feature");
        Ok(())
    }

    fn delete(&self, uid: &str) -> Result<(), FeatureStoreError> {
        require_uid(uid)?;
        self.write_row(uid, &self.queries.delete_by_uid(), params![uid])?;
        debug!(uid, "deleted feature");
        Ok(())
    }

    fn enable(&self, uid: &str) -> Result<(), FeatureStoreError> {
        require_uid(uid)?;
        self.write_row(uid, &self.queries.update_enabled(), params![uid, enabled_flag(true)])?;
        debug!(uid, "enabled feature");
        Ok(())
    }

    fn disable(&self, uid: &str) -> Result<(), FeatureStoreError> {
        require_uid(uid)?;
        self.write_row(uid, &self.queries.update_enabled(), params![uid, enabled_flag(false)])?;
        debug!(uid, "disabled feature");
        Ok(())
    }

    fn grant_role(&self, uid: &str, role: &str) -> Result<(), FeatureStoreError> {
        require_uid(uid)?;
        require_role(role)?;
        self.write_row(uid, &self.queries.add_role(), params![uid, role])?;
        debug!(uid, role, "granted role");
        Ok(())
    }

    fn remove_role(&self, uid: &str, role: &str) -> Result<(), FeatureStoreError> {
        require_uid(uid)?;
        require_role(role)?;
        self.write_row(uid, &self.queries.remove_role(), params![uid, role])?;
        debug!(uid, role, "removed role");
        Ok(())
    }

    fn add_to_group(&self, uid: &str, group: &str) -> Result<(), FeatureStoreError> {
        require_uid(uid)?;
        require_group(group)?;
        self.write_row(uid, &self.queries.update_group(), params![uid, group])?;
        debug!(uid, group, "added feature to group");
        Ok(())
    }

    fn remove_from_group(&self, uid: &str, group: &str) -> Result<(), FeatureStoreError> {
        require_uid(uid)?;
        require_group(group)?;
        if !self.uid_present(uid)? {
            return Err(FeatureStoreError::NotFound(uid.to_string()));
        }
        if !self.group_present(group)? {
            return Err(FeatureStoreError::GroupNotFound(group.to_string()));
        }
        self.write_row(uid, &self.queries.update_group(), params![uid, Option::<&str>::None])?;
        debug!(uid, group, "removed feature from group");
        Ok(())
    }

    fn exist_group(&self, group: &str) -> Result<bool, FeatureStoreError> {
        require_group(group)?;
        Ok(self.group_present(group)?)
    }

    fn read_group(&self, group: &str) -> Result<BTreeMap<String, Feature>, FeatureStoreError> {
        require_group(group)?;
        let members = self.collect_features(&self.queries.select_by_group(), params![group])?;
        if members.is_empty() {
            return Err(FeatureStoreError::GroupNotFound(group.to_string()));
        }
        Ok(members)
    }

    fn enable_group(&self, group: &str) -> Result<(), FeatureStoreError> {
        self.set_group_enabled(group, true)
    }

    fn disable_group(&self, group: &str) -> Result<(), FeatureStoreError> {
        self.set_group_enabled(group, false)
    }

    fn read_all_groups(&self) -> Result<BTreeSet<String>, FeatureStoreError> {
        let groups = self.session.query_strings(&self.queries.distinct_groups(), &[])?;
        Ok(groups.into_iter().collect())
    }

    fn clear(&self) -> Result<(), FeatureStoreError> {
        let removed = self.session.execute(&self.queries.truncate(), &[])?;
        info!(table = self.queries.table_name(), removed, "cleared feature table");
        Ok(())
    }

    fn create_schema(&self) -> Result<(), FeatureStoreError> {
        ensure_schema(self.session.as_ref(), &self.queries)?;
        Ok(())
    }

    fn readiness(&self) -> Result<(), FeatureStoreError> {
        Ok(self.session.ping()?)
    }
}
