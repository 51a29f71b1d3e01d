// crates/flipgate-store-sqlite/src/error.rs
// ============================================================================
// Module: SQLite Feature Store Errors
// Description: Store-internal error type and its mapping to the contract.
// Purpose: Classify engine failures before they reach FeatureStore callers.
// Dependencies: flipgate-core, rusqlite, thiserror
// ============================================================================

//! ## Overview
//! [`SqliteStoreError`] classifies failures raised by the session, schema, and
//! codec layers. Each variant maps onto exactly one
//! [`FeatureStoreError`] variant.

// ============================================================================
// SECTION: Imports
// ============================================================================

use flipgate_core::CodecError;
use flipgate_core::FeatureStoreError;
use rusqlite::ErrorCode;
use thiserror::Error;

use crate::config::ConfigError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Message `SQLite` JSON functions report for an unparseable argument.
const MALFORMED_JSON: &str = "malformed JSON";

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` feature store errors.
///
/// # Invariants
/// - Error messages avoid embedding raw stored payloads.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SqliteStoreError {
    /// Store I/O error (paths, poisoned handles).
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Write rejected by a uniqueness constraint.
    #[error("sqlite store conflict: {0}")]
    Conflict(String),
    /// Table or index setup failed.
    #[error("sqlite store schema error: {0}")]
    Schema(String),
    /// Invalid store configuration or input.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
    /// Stored row could not be decoded.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
}

impl SqliteStoreError {
    /// Classifies an engine error, separating constraint violations and JSON
    /// functions that failed on a stored column.
    #[must_use]
    pub fn from_db(err: &rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(ErrorCode::ConstraintViolation) => Self::Conflict(err.to_string()),
            _ if is_malformed_json(err) => Self::Corrupt(err.to_string()),
            _ => Self::Db(err.to_string()),
        }
    }
}

/// Returns true when `SQLite` rejected a JSON argument as malformed.
fn is_malformed_json(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(_, Some(message)) if message.contains(MALFORMED_JSON)
    )
}

impl From<SqliteStoreError> for FeatureStoreError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) | SqliteStoreError::Db(message) => {
                Self::StorageUnavailable(message)
            }
            SqliteStoreError::Conflict(message) => Self::AlreadyExists(message),
            SqliteStoreError::Schema(message) => Self::Schema(message),
            SqliteStoreError::Invalid(message) => Self::InvalidArgument(message),
            SqliteStoreError::Corrupt(message) => Self::MalformedData(message),
        }
    }
}

impl From<CodecError> for SqliteStoreError {
    fn from(error: CodecError) -> Self {
        Self::Corrupt(error.to_string())
    }
}

impl From<ConfigError> for SqliteStoreError {
    fn from(error: ConfigError) -> Self {
        Self::Invalid(error.to_string())
    }
}
