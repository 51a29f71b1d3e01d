// crates/flipgate-store-sqlite/src/schema.rs
// ============================================================================
// Module: Feature Schema Manager
// Description: Creates the feature table and its group index.
// Purpose: Idempotent table setup run at store initialization.
// Dependencies: crate::{query, session}, tracing
// ============================================================================

//! ## Overview
//! [`ensure_schema`] creates the feature table and then the secondary index on
//! its group column when the table is missing. An existing table is left as is;
//! column drift is not detected.

// ============================================================================
// SECTION: Imports
// ============================================================================

use tracing::debug;
use tracing::info;

use crate::error::SqliteStoreError;
use crate::query::QueryBuilder;
use crate::session::Session;

// ============================================================================
// SECTION: Schema Setup
// ============================================================================

/// Creates the feature table and group index when the table is absent.
///
/// Returns true when the table was created by this call.
///
/// # Errors
///
/// Returns [`SqliteStoreError::Schema`] when the table lookup or any DDL
/// statement fails.
pub fn ensure_schema<S: Session + ?Sized>(
    session: &S,
    queries: &QueryBuilder,
) -> Result<bool, SqliteStoreError> {
    let table = queries.table_name();
    if session.table_exists(table).map_err(schema_error)? {
        debug!(table, "feature table already present");
        return Ok(false);
    }
    session.execute(&queries.create_table(), &[]).map_err(schema_error)?;
    session.execute(&queries.create_group_index(), &[]).map_err(schema_error)?;
    info!(table, index = queries.index_name(), "created feature table");
    Ok(true)
}

/// Reclassifies a setup failure as a schema error.
fn schema_error(error: SqliteStoreError) -> SqliteStoreError {
    match error {
        SqliteStoreError::Schema(message) => SqliteStoreError::Schema(message),
        other => SqliteStoreError::Schema(other.to_string()),
    }
}
