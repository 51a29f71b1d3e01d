// crates/flipgate-store-sqlite/tests/sqlite_store_unit.rs
// ============================================================================
// Module: SQLite Feature Store Unit Tests
// Description: Contract and integrity tests for the SQLite feature store.
// Purpose: Validate CRUD, roles, groups, schema setup, config loading,
//          corrupted rows, and concurrent access.
// Dependencies: flipgate-core, flipgate-store-sqlite, rusqlite, tempfile
// ============================================================================

//! ## Overview
//! Unit-level tests for the `SQLite` feature store:
//! - Contract behavior of every operation, including error paths
//! - Group lifecycle and the distinct group listing
//! - Schema idempotence and custom keyspace/table names
//! - Stored rows edited outside the store surface as malformed data
//! - Concurrency safety (multi-threaded writers on one store)

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;

use flipgate_core::Feature;
use flipgate_core::FeatureStore;
use flipgate_core::FeatureStoreError;
use flipgate_core::FlippingStrategy;
use flipgate_core::Property;
use flipgate_core::PropertyValue;
use flipgate_store_sqlite::SqliteFeatureStore;
use flipgate_store_sqlite::SqliteFeatureStoreConfig;
use flipgate_store_sqlite::SqliteStoreError;
use flipgate_store_sqlite::SqliteSyncMode;
use rusqlite::Connection;
use rusqlite::params;
use tempfile::TempDir;

// ============================================================================
// SECTION: Helpers
// ============================================================================

fn memory_store() -> SqliteFeatureStore {
    SqliteFeatureStore::open_in_memory().expect("open in-memory store")
}

fn file_store(dir: &TempDir) -> (SqliteFeatureStore, SqliteFeatureStoreConfig) {
    let config = SqliteFeatureStoreConfig::for_path(dir.path().join("features.db"));
    let store = SqliteFeatureStore::open(&config).expect("open file store");
    (store, config)
}

fn full_feature(uid: &str) -> Feature {
    Feature::new(uid)
        .with_enabled(true)
        .with_description("checkout redesign")
        .with_group("checkout")
        .with_permission("ADMIN")
        .with_permission("BETA_TESTER")
        .with_strategy(FlippingStrategy::new(uid, "ponderation").with_param("weight", "0.25"))
        .with_property(
            Property::new("region", PropertyValue::String("eu".to_string()))
                .with_description("rollout region")
                .with_fixed_values(vec![
                    PropertyValue::String("eu".to_string()),
                    PropertyValue::String("us".to_string()),
                ]),
        )
        .with_property(Property::new("ratio", PropertyValue::Double(0.75)))
        .with_property(Property::new("retries", PropertyValue::Long(3)))
}

fn raw_connection(path: &Path) -> Connection {
    Connection::open(path).expect("open raw connection")
}

// ============================================================================
// SECTION: CRUD
// ============================================================================

#[test]
fn create_then_read_preserves_every_field() {
    let store = memory_store();
    let feature = full_feature("f1");
    store.create(&feature).unwrap();
    assert_eq!(store.read("f1").unwrap(), feature);
}

#[test]
fn create_rejects_duplicate_uid() {
    let store = memory_store();
    store.create(&Feature::new("f1")).unwrap();
    let err = store.create(&Feature::new("f1").with_enabled(true)).unwrap_err();
    assert_eq!(err, FeatureStoreError::AlreadyExists("f1".to_string()));
    assert!(!store.read("f1").unwrap().enabled);
}

#[test]
fn create_rejects_empty_uid() {
    let store = memory_store();
    let err = store.create(&Feature::new("")).unwrap_err();
    assert!(matches!(err, FeatureStoreError::InvalidArgument(_)));
}

#[test]
fn create_rejects_property_violating_fixed_values() {
    let store = memory_store();
    let property = Property::new("tier", PropertyValue::Int(5))
        .with_fixed_values(vec![PropertyValue::Int(1), PropertyValue::Int(2)]);
    let err = store.create(&Feature::new("f1").with_property(property)).unwrap_err();
    assert!(matches!(err, FeatureStoreError::InvalidArgument(_)));
    assert!(!store.exist("f1").unwrap());
}

fn unreadable_features() -> Vec<Feature> {
    vec![
        Feature::new("f1").with_strategy(FlippingStrategy::new("f1", "")),
        Feature::new("f1").with_strategy(FlippingStrategy::new("f1", "   ")),
        Feature::new("f1").with_strategy(FlippingStrategy::new("other", "ponderation")),
        Feature::new("f1").with_property(Property::new("ratio", PropertyValue::Double(f64::NAN))),
        Feature::new("f1")
            .with_property(Property::new("ratio", PropertyValue::Double(f64::NEG_INFINITY))),
        Feature::new("f1").with_property(
            Property::new("ratio", PropertyValue::Double(1.0)).with_fixed_values(vec![
                PropertyValue::Double(1.0),
                PropertyValue::Double(f64::INFINITY),
            ]),
        ),
    ]
}

#[test]
fn create_rejects_features_that_cannot_be_read_back() {
    let store = memory_store();
    store.create(&Feature::new("healthy")).unwrap();
    for feature in unreadable_features() {
        let err = store.create(&feature).unwrap_err();
        assert!(matches!(err, FeatureStoreError::InvalidArgument(_)), "{feature:?}");
        assert!(!store.exist("f1").unwrap());
    }
    assert_eq!(store.read_all().unwrap().len(), 1);
}

#[test]
fn update_rejects_features_that_cannot_be_read_back() {
    let store = memory_store();
    store.create(&full_feature("f1")).unwrap();
    for feature in unreadable_features() {
        let err = store.update(&feature).unwrap_err();
        assert!(matches!(err, FeatureStoreError::InvalidArgument(_)), "{feature:?}");
        assert_eq!(store.read("f1").unwrap(), full_feature("f1"));
    }
    assert_eq!(store.read_all().unwrap().len(), 1);
}

#[test]
fn read_missing_feature_is_not_found() {
    let store = memory_store();
    assert_eq!(store.read("nope").unwrap_err(), FeatureStoreError::NotFound("nope".to_string()));
}

#[test]
fn exist_rejects_empty_uid() {
    let store = memory_store();
    assert!(matches!(store.exist(""), Err(FeatureStoreError::InvalidArgument(_))));
}

#[test]
fn read_all_returns_every_feature() {
    let store = memory_store();
    store.create(&Feature::new("a")).unwrap();
    store.create(&full_feature("b")).unwrap();
    let all = store.read_all().unwrap();
    assert_eq!(all.keys().cloned().collect::<Vec<_>>(), vec!["a".to_string(), "b".to_string()]);
    assert_eq!(all["b"], full_feature("b"));
}

#[test]
fn update_replaces_whole_feature() {
    let store = memory_store();
    store.create(&full_feature("f1")).unwrap();
    let replacement = Feature::new("f1").with_description("trimmed");
    store.update(&replacement).unwrap();
    let stored = store.read("f1").unwrap();
    assert_eq!(stored, replacement);
    assert!(stored.permissions.is_empty());
    assert!(stored.custom_properties.is_empty());
    assert!(stored.flipping_strategy.is_none());
}

#[test]
fn update_missing_feature_is_not_found() {
    let store = memory_store();
    let err = store.update(&Feature::new("ghost")).unwrap_err();
    assert_eq!(err, FeatureStoreError::NotFound("ghost".to_string()));
    assert!(!store.exist("ghost").unwrap());
}

#[test]
fn update_rejects_invalid_feature_before_writing() {
    let store = memory_store();
    store.create(&full_feature("f1")).unwrap();
    let err = store.update(&Feature::new("f1").with_permission("")).unwrap_err();
    assert!(matches!(err, FeatureStoreError::InvalidArgument(_)));
    assert_eq!(store.read("f1").unwrap(), full_feature("f1"));
}

#[test]
fn delete_removes_feature() {
    let store = memory_store();
    store.create(&Feature::new("f1")).unwrap();
    store.delete("f1").unwrap();
    assert!(!store.exist("f1").unwrap());
    assert_eq!(store.delete("f1").unwrap_err(), FeatureStoreError::NotFound("f1".to_string()));
}

#[test]
fn enable_and_disable_toggle_flag() {
    let store = memory_store();
    store.create(&Feature::new("f1")).unwrap();
    store.enable("f1").unwrap();
    assert!(store.read("f1").unwrap().enabled);
    store.disable("f1").unwrap();
    assert!(!store.read("f1").unwrap().enabled);
}

#[test]
fn enable_missing_feature_is_not_found_and_not_created() {
    let store = memory_store();
    assert_eq!(store.enable("ghost").unwrap_err(), FeatureStoreError::NotFound("ghost".to_string()));
    assert_eq!(
        store.disable("ghost").unwrap_err(),
        FeatureStoreError::NotFound("ghost".to_string())
    );
    assert!(!store.exist("ghost").unwrap());
}

// ============================================================================
// SECTION: Roles
// ============================================================================

#[test]
fn grant_role_is_idempotent() {
    let store = memory_store();
    store.create(&Feature::new("f1")).unwrap();
    store.grant_role("f1", "ADMIN").unwrap();
    store.grant_role("f1", "ADMIN").unwrap();
    store.grant_role("f1", "OPS").unwrap();
    let roles = store.read("f1").unwrap().permissions;
    assert_eq!(roles, BTreeSet::from(["ADMIN".to_string(), "OPS".to_string()]));
}

#[test]
fn remove_role_keeps_other_roles() {
    let store = memory_store();
    store.create(&full_feature("f1")).unwrap();
    store.remove_role("f1", "ADMIN").unwrap();
    store.remove_role("f1", "NEVER_GRANTED").unwrap();
    let roles = store.read("f1").unwrap().permissions;
    assert_eq!(roles, BTreeSet::from(["BETA_TESTER".to_string()]));
    store.remove_role("f1", "BETA_TESTER").unwrap();
    assert!(store.read("f1").unwrap().permissions.is_empty());
}

#[test]
fn role_operations_validate_inputs() {
    let store = memory_store();
    store.create(&Feature::new("f1")).unwrap();
    assert!(matches!(store.grant_role("f1", ""), Err(FeatureStoreError::InvalidArgument(_))));
    assert!(matches!(store.remove_role("f1", ""), Err(FeatureStoreError::InvalidArgument(_))));
    assert_eq!(
        store.grant_role("ghost", "ADMIN").unwrap_err(),
        FeatureStoreError::NotFound("ghost".to_string())
    );
    assert_eq!(
        store.remove_role("ghost", "ADMIN").unwrap_err(),
        FeatureStoreError::NotFound("ghost".to_string())
    );
}

// ============================================================================
// SECTION: Groups
// ============================================================================

#[test]
fn group_lifecycle() {
    let store = memory_store();
    store.create(&Feature::new("f1")).unwrap();
    store.create(&Feature::new("f2")).unwrap();
    store.create(&Feature::new("f3")).unwrap();
    store.add_to_group("f1", "g1").unwrap();
    store.add_to_group("f2", "g1").unwrap();

    let members = store.read_group("g1").unwrap();
    assert_eq!(members.keys().cloned().collect::<Vec<_>>(), vec!["f1".to_string(), "f2".to_string()]);

    store.enable_group("g1").unwrap();
    assert!(store.read("f1").unwrap().enabled);
    assert!(store.read("f2").unwrap().enabled);
    assert!(!store.read("f3").unwrap().enabled);

    store.disable_group("g1").unwrap();
    assert!(!store.read("f1").unwrap().enabled);

    store.remove_from_group("f1", "g1").unwrap();
    assert!(store.read("f1").unwrap().group_name().is_none());
    assert_eq!(store.read_all_groups().unwrap(), BTreeSet::from(["g1".to_string()]));

    store.remove_from_group("f2", "g1").unwrap();
    assert!(!store.exist_group("g1").unwrap());
    assert!(store.read_all_groups().unwrap().is_empty());
}

#[test]
fn missing_group_operations_report_group_not_found() {
    let store = memory_store();
    store.create(&Feature::new("f1")).unwrap();
    let missing = FeatureStoreError::GroupNotFound("g9".to_string());
    assert_eq!(store.read_group("g9").unwrap_err(), missing);
    assert_eq!(store.enable_group("g9").unwrap_err(), missing);
    assert_eq!(store.disable_group("g9").unwrap_err(), missing);
    assert_eq!(store.remove_from_group("f1", "g9").unwrap_err(), missing);
}

#[test]
fn remove_from_group_checks_feature_before_group() {
    let store = memory_store();
    let err = store.remove_from_group("ghost", "g9").unwrap_err();
    assert_eq!(err, FeatureStoreError::NotFound("ghost".to_string()));
}

#[test]
fn group_operations_validate_inputs() {
    let store = memory_store();
    store.create(&Feature::new("f1")).unwrap();
    assert!(matches!(store.add_to_group("f1", ""), Err(FeatureStoreError::InvalidArgument(_))));
    assert!(matches!(store.exist_group(""), Err(FeatureStoreError::InvalidArgument(_))));
    assert!(matches!(store.read_group(""), Err(FeatureStoreError::InvalidArgument(_))));
    assert_eq!(
        store.add_to_group("ghost", "g1").unwrap_err(),
        FeatureStoreError::NotFound("ghost".to_string())
    );
}

#[test]
fn empty_group_names_are_groupless() {
    let store = memory_store();
    store.create(&Feature::new("blank").with_group("")).unwrap();
    store.create(&Feature::new("none")).unwrap();
    store.create(&Feature::new("named").with_group("ops")).unwrap();
    assert_eq!(store.read_all_groups().unwrap(), BTreeSet::from(["ops".to_string()]));
}

#[test]
fn beta_feature_moves_between_groups() {
    let store = memory_store();
    store.create(&Feature::new("beta").with_enabled(false).with_group("team-a")).unwrap();
    assert!(store.exist("beta").unwrap());
    store.enable("beta").unwrap();
    assert!(store.read("beta").unwrap().enabled);

    let moved = store.read("beta").unwrap().with_group("team-b");
    store.update(&moved).unwrap();

    assert!(matches!(store.read_group("team-a"), Err(FeatureStoreError::GroupNotFound(_))));
    assert!(store.read_group("team-b").unwrap().contains_key("beta"));
    assert!(store.read("beta").unwrap().enabled);
}

#[test]
fn clear_removes_everything() {
    let store = memory_store();
    store.create(&full_feature("f1")).unwrap();
    store.create(&Feature::new("f2").with_group("ops")).unwrap();
    store.clear().unwrap();
    assert!(store.read_all().unwrap().is_empty());
    assert!(store.read_all_groups().unwrap().is_empty());
    store.clear().unwrap();
}

// ============================================================================
// SECTION: Schema and Config
// ============================================================================

#[test]
fn schema_setup_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let (store, config) = file_store(&dir);
    store.create(&Feature::new("f1")).unwrap();
    store.create_schema().unwrap();
    drop(store);
    let reopened = SqliteFeatureStore::open(&config).unwrap();
    reopened.create_schema().unwrap();
    assert!(reopened.exist("f1").unwrap());
}

#[test]
fn store_without_schema_reports_storage_failure() {
    let mut config = SqliteFeatureStoreConfig::in_memory();
    config.create_schema = false;
    let store = SqliteFeatureStore::open(&config).unwrap();
    assert!(matches!(store.exist("f1"), Err(FeatureStoreError::StorageUnavailable(_))));
    store.create_schema().unwrap();
    assert!(!store.exist("f1").unwrap());
}

#[test]
fn schema_creates_group_index() {
    let dir = TempDir::new().unwrap();
    let (store, config) = file_store(&dir);
    let index = store.queries().index_name().to_string();
    drop(store);
    let connection = raw_connection(&config.path);
    let count: i64 = connection
        .query_row(
            "SELECT COUNT(1) FROM sqlite_master WHERE type = 'index' AND name = ?1",
            params![index],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn custom_keyspace_and_table_are_isolated() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("features.db");
    let mut first = SqliteFeatureStoreConfig::for_path(&path);
    first.keyspace = "tenant_a".to_string();
    let mut second = SqliteFeatureStoreConfig::for_path(&path);
    second.keyspace = "tenant_b".to_string();
    second.table = "toggles".to_string();

    let store_a = SqliteFeatureStore::open(&first).unwrap();
    let store_b = SqliteFeatureStore::open(&second).unwrap();
    assert_eq!(store_b.queries().table_name(), "tenant_b_toggles");
    store_a.create(&Feature::new("shared")).unwrap();
    assert!(!store_b.exist("shared").unwrap());
}

#[test]
fn open_rejects_invalid_identifiers() {
    let mut config = SqliteFeatureStoreConfig::in_memory();
    config.table = "features; DROP TABLE users".to_string();
    let err = SqliteFeatureStore::open(&config).unwrap_err();
    assert!(matches!(err, SqliteStoreError::Invalid(_)));
}

#[test]
fn open_rejects_directory_path() {
    let dir = TempDir::new().unwrap();
    let config = SqliteFeatureStoreConfig::for_path(dir.path());
    assert!(matches!(SqliteFeatureStore::open(&config), Err(SqliteStoreError::Invalid(_))));
}

#[test]
fn open_creates_parent_directories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("deeper").join("features.db");
    let store = SqliteFeatureStore::open(&SqliteFeatureStoreConfig::for_path(&path)).unwrap();
    store.readiness().unwrap();
    assert!(path.exists());
}

#[test]
fn config_file_loads_and_opens_store() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("flags.db");
    let config_path = dir.path().join("store.toml");
    fs::write(
        &config_path,
        format!(
            "path = {:?}\nkeyspace = \"ops\"\ntable = \"flags\"\nsync_mode = \"normal\"\n",
            db_path.display().to_string()
        ),
    )
    .unwrap();
    let config = SqliteFeatureStoreConfig::load(&config_path).unwrap();
    assert_eq!(config.sync_mode, SqliteSyncMode::Normal);
    let store = SqliteFeatureStore::open(&config).unwrap();
    assert_eq!(store.queries().table_name(), "ops_flags");
    store.create(&Feature::new("f1")).unwrap();
    assert!(store.exist("f1").unwrap());
}

#[test]
fn config_file_over_size_limit_is_rejected() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("store.toml");
    fs::write(&config_path, format!("path = \"a.db\"\n#{}\n", "x".repeat(70 * 1024))).unwrap();
    assert!(SqliteFeatureStoreConfig::load(&config_path).is_err());
}

#[test]
fn features_survive_reopen() {
    let dir = TempDir::new().unwrap();
    let (store, config) = file_store(&dir);
    store.create(&full_feature("f1")).unwrap();
    store.grant_role("f1", "OPS").unwrap();
    drop(store);
    let reopened = SqliteFeatureStore::open(&config).unwrap();
    let feature = reopened.read("f1").unwrap();
    assert!(feature.permissions.contains("OPS"));
    assert_eq!(feature.custom_properties.len(), 3);
}

// ============================================================================
// SECTION: Corrupted Rows
// ============================================================================

#[test]
fn corrupted_strategy_is_malformed_data() {
    let dir = TempDir::new().unwrap();
    let (store, config) = file_store(&dir);
    store.create(&full_feature("f1")).unwrap();
    let table = store.queries().table_name().to_string();
    raw_connection(&config.path)
        .execute(&format!("UPDATE {table} SET strategy = ?1 WHERE uid = 'f1'"), params!["{oops"])
        .unwrap();
    assert!(matches!(store.read("f1"), Err(FeatureStoreError::MalformedData(_))));
    assert!(matches!(store.read_all(), Err(FeatureStoreError::MalformedData(_))));
    store.delete("f1").unwrap();
}

#[test]
fn corrupted_roles_column_is_malformed_data() {
    let dir = TempDir::new().unwrap();
    let (store, config) = file_store(&dir);
    store.create(&Feature::new("f1").with_group("g1")).unwrap();
    let table = store.queries().table_name().to_string();
    raw_connection(&config.path)
        .execute(&format!("UPDATE {table} SET roles = 'ADMIN' WHERE uid = 'f1'"), [])
        .unwrap();
    assert!(matches!(store.read_group("g1"), Err(FeatureStoreError::MalformedData(_))));
    assert!(matches!(store.grant_role("f1", "OPS"), Err(FeatureStoreError::MalformedData(_))));
    assert!(matches!(store.remove_role("f1", "ADMIN"), Err(FeatureStoreError::MalformedData(_))));
}

#[test]
fn corrupted_property_is_malformed_data() {
    let dir = TempDir::new().unwrap();
    let (store, config) = file_store(&dir);
    store.create(&Feature::new("f1")).unwrap();
    let table = store.queries().table_name().to_string();
    let properties = r#"{"limit":"{\"name\":\"limit\",\"type\":\"int\",\"value\":\"many\"}"}"#;
    raw_connection(&config.path)
        .execute(&format!("UPDATE {table} SET properties = ?1 WHERE uid = 'f1'"), params![
            properties
        ])
        .unwrap();
    assert!(matches!(store.read("f1"), Err(FeatureStoreError::MalformedData(_))));
}

// ============================================================================
// SECTION: Concurrency
// ============================================================================

#[test]
fn concurrent_writers_share_one_store() {
    let dir = TempDir::new().unwrap();
    let (store, _config) = file_store(&dir);
    store.create(&Feature::new("shared")).unwrap();
    let store = Arc::new(store);
    let mut handles = Vec::new();
    for worker in 0 .. 8 {
        let store = Arc::clone(&store);
        handles.push(thread::spawn(move || {
            for index in 0 .. 10 {
                let uid = format!("w{worker}-{index}");
                store.create(&Feature::new(uid.clone()).with_group("load")).unwrap();
                store.enable(&uid).unwrap();
                store.grant_role("shared", &format!("ROLE_{worker}")).unwrap();
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }
    assert_eq!(store.read_group("load").unwrap().len(), 80);
    assert!(store.read_group("load").unwrap().values().all(|feature| feature.enabled));
    assert_eq!(store.read("shared").unwrap().permissions.len(), 8);
}

#[test]
fn clones_observe_each_other() {
    let store = memory_store();
    let clone = store.clone();
    clone.create(&Feature::new("f1")).unwrap();
    assert!(store.exist("f1").unwrap());
    store.readiness().unwrap();
}
