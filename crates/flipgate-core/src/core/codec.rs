// crates/flipgate-core/src/core/codec.rs
// ============================================================================
// Module: Flipgate Serialized Forms
// Description: Shared error type for strategy and property JSON forms.
// Purpose: Give every serialize/parse pair one failure vocabulary.
// Dependencies: serde_json, thiserror
// ============================================================================

//! ## Overview
//! Flipping strategies and custom properties are persisted as opaque JSON
//! strings. Both serializers report failures through [`CodecError`], which
//! stores map to a malformed-data error at the contract boundary.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Failures raised while encoding or parsing serialized feature parts.
///
/// # Invariants
/// - Messages never embed the full offending payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Serialized flipping strategy could not be parsed.
    #[error("malformed flipping strategy for feature {uid}: {message}")]
    Strategy {
        /// Feature the strategy was bound to.
        uid: String,
        /// Parser diagnostic.
        message: String,
    },
    /// Serialized property could not be parsed or is inconsistent.
    #[error("malformed property: {0}")]
    Property(String),
    /// Value could not be rendered to JSON.
    #[error("json encoding failed: {0}")]
    Encode(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Renders a serializable value as compact JSON text.
pub(crate) fn to_json_string<T: Serialize>(value: &T) -> Result<String, CodecError> {
    serde_json::to_string(value).map_err(|err| CodecError::Encode(err.to_string()))
}
