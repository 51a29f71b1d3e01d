// crates/flipgate-store-sqlite/src/lib.rs
// ============================================================================
// Module: Flipgate SQLite Store
// Description: Durable feature store backed by SQLite.
// Purpose: Persist features in one wide row per uid with a group index.
// Dependencies: flipgate-core, rusqlite, serde, toml, tracing
// ============================================================================

//! ## Overview
//! This crate provides [`SqliteFeatureStore`], a [`flipgate_core::FeatureStore`]
//! that keeps every feature in one row of a `{keyspace}_{table}` table. Nested
//! parts (strategy, custom properties) are stored in their JSON forms and the
//! role set and property map are JSON collection columns.
//!
//! ```no_run
//! use flipgate_core::Feature;
//! use flipgate_core::FeatureStore;
//! use flipgate_store_sqlite::SqliteFeatureStore;
//! use flipgate_store_sqlite::SqliteFeatureStoreConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SqliteFeatureStoreConfig::for_path("/var/lib/flipgate/features.db");
//! let store = SqliteFeatureStore::open(&config)?;
//! store.create(&Feature::new("checkout-v2").with_group("beta"))?;
//! store.enable_group("beta")?;
//! # Ok(())
//! # }
//! ```

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod codec;
pub mod config;
pub mod error;
pub mod query;
pub mod schema;
pub mod session;
pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use codec::FeatureRecord;
pub use codec::decode;
pub use codec::encode;
pub use config::ConfigError;
pub use config::SqliteFeatureStoreConfig;
pub use config::SqliteStoreMode;
pub use config::SqliteSyncMode;
pub use error::SqliteStoreError;
pub use query::QueryBuilder;
pub use schema::ensure_schema;
pub use session::RecordVisitor;
pub use session::Session;
pub use session::SqliteSession;
pub use store::SqliteFeatureStore;
