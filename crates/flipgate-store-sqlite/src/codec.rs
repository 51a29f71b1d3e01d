// crates/flipgate-store-sqlite/src/codec.rs
// ============================================================================
// Module: Feature Record Codec
// Description: Mapping between features and flat storage rows.
// Purpose: Encode/decode features, including JSON nested fields and collections.
// Dependencies: flipgate-core, rusqlite, serde_json
// ============================================================================

//! ## Overview
//! A [`FeatureRecord`] is the denormalized row stored per feature. Strategies
//! and properties are kept in their opaque JSON forms; roles and the property
//! map are collection columns. `SQLite` has no set or map column type, so those
//! two collections are persisted as a JSON array and a JSON object.
//!
//! [`encode`] and [`decode`] are pure and never touch storage.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use flipgate_core::CodecError;
use flipgate_core::Feature;
use flipgate_core::FlippingStrategy;
use flipgate_core::Property;

use crate::error::SqliteStoreError;

// ============================================================================
// SECTION: Feature Record
// ============================================================================

/// Storage row for one feature.
///
/// # Invariants
/// - `enabled` is `0` or `1` when written by this crate; any non-zero value
///   reads as enabled.
/// - `roles` and `properties` are never absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureRecord {
    /// Primary key.
    pub uid: String,
    /// Enabled flag as an integer.
    pub enabled: i64,
    /// Optional description.
    pub description: Option<String>,
    /// Serialized flipping strategy.
    pub strategy: Option<String>,
    /// Group label; empty or absent means ungrouped.
    pub group: Option<String>,
    /// Role names.
    pub roles: BTreeSet<String>,
    /// Property name to serialized property.
    pub properties: BTreeMap<String, String>,
}

impl FeatureRecord {
    /// Creates a disabled record with empty collections.
    #[must_use]
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            enabled: 0,
            description: None,
            strategy: None,
            group: None,
            roles: BTreeSet::new(),
            properties: BTreeMap::new(),
        }
    }

    /// Returns the enabled flag as a boolean.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled != 0
    }
}

/// Converts a boolean into the stored flag value.
#[must_use]
pub const fn enabled_flag(enabled: bool) -> i64 {
    if enabled { 1 } else { 0 }
}

// ============================================================================
// SECTION: Encode / Decode
// ============================================================================

/// Encodes a feature into its storage row.
///
/// # Errors
///
/// Returns [`CodecError::Encode`] when a nested part cannot be rendered.
pub fn encode(feature: &Feature) -> Result<FeatureRecord, CodecError> {
    let strategy = feature.flipping_strategy.as_ref().map(FlippingStrategy::to_json).transpose()?;
    let properties = feature
        .custom_properties
        .iter()
        .map(|(name, property)| property.to_json().map(|json| (name.clone(), json)))
        .collect::<Result<BTreeMap<_, _>, CodecError>>()?;
    Ok(FeatureRecord {
        uid: feature.uid.clone(),
        enabled: enabled_flag(feature.enabled),
        description: feature.description.clone(),
        strategy,
        group: feature.group.clone(),
        roles: feature.permissions.clone(),
        properties,
    })
}

/// Decodes a storage row into a feature.
///
/// # Errors
///
/// Returns [`CodecError`] when the strategy or any property is malformed.
pub fn decode(record: FeatureRecord) -> Result<Feature, CodecError> {
    let flipping_strategy = match record.strategy.as_deref() {
        Some(json) if !json.is_empty() => Some(FlippingStrategy::parse_json(&record.uid, json)?),
        _ => None,
    };
    let custom_properties = record
        .properties
        .iter()
        .map(|(name, json)| Property::parse_json(json).map(|property| (name.clone(), property)))
        .collect::<Result<BTreeMap<_, _>, CodecError>>()?;
    Ok(Feature {
        enabled: record.is_enabled(),
        uid: record.uid,
        description: record.description,
        group: record.group,
        permissions: record.roles,
        flipping_strategy,
        custom_properties,
    })
}

// ============================================================================
// SECTION: Column Encodings
// ============================================================================

/// Raw column values read from one row, before collection decoding.
#[derive(Debug)]
pub(crate) struct StoredRow {
    /// `uid` column.
    pub(crate) uid: String,
    /// `enable` column.
    pub(crate) enabled: i64,
    /// `description` column.
    pub(crate) description: Option<String>,
    /// `strategy` column.
    pub(crate) strategy: Option<String>,
    /// `groupname` column.
    pub(crate) group: Option<String>,
    /// `roles` column (JSON array).
    pub(crate) roles: String,
    /// `properties` column (JSON object).
    pub(crate) properties: String,
}

/// Maps a `SQLite` row selected with [`crate::query::FEATURE_COLUMNS`].
pub(crate) fn map_feature_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<StoredRow> {
    Ok(StoredRow {
        uid: row.get(0)?,
        enabled: row.get(1)?,
        description: row.get(2)?,
        strategy: row.get(3)?,
        group: row.get(4)?,
        roles: row.get(5)?,
        properties: row.get(6)?,
    })
}

impl StoredRow {
    /// Decodes the collection columns into a [`FeatureRecord`].
    pub(crate) fn into_record(self) -> Result<FeatureRecord, SqliteStoreError> {
        let roles = decode_roles(&self.roles)
            .map_err(|err| SqliteStoreError::Corrupt(format!("roles of {}: {err}", self.uid)))?;
        let properties = decode_properties(&self.properties).map_err(|err| {
            SqliteStoreError::Corrupt(format!("properties of {}: {err}", self.uid))
        })?;
        Ok(FeatureRecord {
            uid: self.uid,
            enabled: self.enabled,
            description: self.description,
            strategy: self.strategy,
            group: self.group,
            roles,
            properties,
        })
    }
}

/// Renders the role set column.
pub(crate) fn encode_roles(roles: &BTreeSet<String>) -> Result<String, SqliteStoreError> {
    serde_json::to_string(roles).map_err(|err| SqliteStoreError::Invalid(err.to_string()))
}

/// Parses the role set column.
fn decode_roles(json: &str) -> Result<BTreeSet<String>, serde_json::Error> {
    serde_json::from_str(json)
}

/// Renders the property map column.
pub(crate) fn encode_properties(
    properties: &BTreeMap<String, String>,
) -> Result<String, SqliteStoreError> {
    serde_json::to_string(properties).map_err(|err| SqliteStoreError::Invalid(err.to_string()))
}

/// Parses the property map column.
fn decode_properties(json: &str) -> Result<BTreeMap<String, String>, serde_json::Error> {
    serde_json::from_str(json)
}

// ============================================================================
// SECTION: Tests
// ============================================================================
