// crates/flipgate-core/src/interfaces/mod.rs
// ============================================================================
// Module: Flipgate Interfaces
// Description: Backend-agnostic feature store contract.
// Purpose: Define the CRUD and group surface every feature store implements.
// Dependencies: crate::core, thiserror
// ============================================================================

//! ## Overview
//! [`FeatureStore`] is the contract consumed by flag-management callers. Stores
//! validate inputs before touching storage, never retry engine failures, and
//! report every outcome through [`FeatureStoreError`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use thiserror::Error;

use crate::core::CodecError;
use crate::core::Feature;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Feature store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
/// - `NotFound`, `AlreadyExists` and `GroupNotFound` reflect durable state at
///   the time of the check.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeatureStoreError {
    /// A required input was empty or malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    /// The referenced feature does not exist.
    #[error("feature not found: {0}")]
    NotFound(String),
    /// A feature with the same uid already exists.
    #[error("feature already exists: {0}")]
    AlreadyExists(String),
    /// No stored feature carries the group.
    #[error("group not found: {0}")]
    GroupNotFound(String),
    /// Stored strategy or property data could not be parsed.
    #[error("malformed feature data: {0}")]
    MalformedData(String),
    /// Table or index setup failed.
    #[error("feature store schema error: {0}")]
    Schema(String),
    /// The storage engine is unreachable or failed.
    #[error("feature store unavailable: {0}")]
    StorageUnavailable(String),
}

impl From<CodecError> for FeatureStoreError {
    fn from(error: CodecError) -> Self {
        Self::MalformedData(error.to_string())
    }
}

// ============================================================================
// SECTION: Feature Store
// ============================================================================

/// Persistence contract for features.
///
/// Implementations share one instance across concurrent callers. No operation
/// is atomic across more than one stored record.
pub trait FeatureStore {
    /// Returns true when a feature with `uid` exists.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureStoreError::InvalidArgument`] when `uid` is empty.
    fn exist(&self, uid: &str) -> Result<bool, FeatureStoreError>;

    /// Persists a new feature.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureStoreError::InvalidArgument`] for an invalid feature and
    /// [`FeatureStoreError::AlreadyExists`] when the uid is taken.
    fn create(&self, feature: &Feature) -> Result<(), FeatureStoreError>;

    /// Loads a feature.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureStoreError::NotFound`] when the feature is absent.
    fn read(&self, uid: &str) -> Result<Feature, FeatureStoreError>;

    /// Loads every stored feature keyed by uid.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureStoreError`] when storage or decoding fails.
    fn read_all(&self) -> Result<BTreeMap<String, Feature>, FeatureStoreError>;

    /// Replaces a stored feature with `feature`.
    ///
    /// Fields omitted from `feature` do not survive the update.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureStoreError::NotFound`] when the feature is absent and
    /// [`FeatureStoreError::InvalidArgument`] for an invalid feature.
    fn update(&self, feature: &Feature) -> Result<(), FeatureStoreError>;

    /// Removes a feature.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureStoreError::NotFound`] when the feature is absent.
    fn delete(&self, uid: &str) -> Result<(), FeatureStoreError>;

    /// Sets the enabled flag on a feature.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureStoreError::NotFound`] when the feature is absent.
    fn enable(&self, uid: &str) -> Result<(), FeatureStoreError>;

    /// Clears the enabled flag on a feature.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureStoreError::NotFound`] when the feature is absent.
    fn disable(&self, uid: &str) -> Result<(), FeatureStoreError>;

    /// Adds a role to the feature permissions.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureStoreError::InvalidArgument`] for an empty role and
    /// [`FeatureStoreError::NotFound`] when the feature is absent.
    fn grant_role(&self, uid: &str, role: &str) -> Result<(), FeatureStoreError>;

    /// Removes a role from the feature permissions.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureStoreError::InvalidArgument`] for an empty role and
    /// [`FeatureStoreError::NotFound`] when the feature is absent.
    fn remove_role(&self, uid: &str, role: &str) -> Result<(), FeatureStoreError>;

    /// Assigns a feature to a group.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureStoreError::InvalidArgument`] for an empty group and
    /// [`FeatureStoreError::NotFound`] when the feature is absent.
    fn add_to_group(&self, uid: &str, group: &str) -> Result<(), FeatureStoreError>;

    /// Clears the group of a feature.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureStoreError::NotFound`] when the feature is absent and
    /// [`FeatureStoreError::GroupNotFound`] when no feature carries `group`.
    fn remove_from_group(&self, uid: &str, group: &str) -> Result<(), FeatureStoreError>;

    /// Returns true when any feature carries `group`.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureStoreError::InvalidArgument`] when `group` is empty.
    fn exist_group(&self, group: &str) -> Result<bool, FeatureStoreError>;

    /// Loads every member of a group keyed by uid.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureStoreError::GroupNotFound`] when the group is absent.
    fn read_group(&self, group: &str) -> Result<BTreeMap<String, Feature>, FeatureStoreError>;

    /// Enables every member of a group, one record at a time.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureStoreError::GroupNotFound`] when the group is absent.
    fn enable_group(&self, group: &str) -> Result<(), FeatureStoreError>;

    /// Disables every member of a group, one record at a time.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureStoreError::GroupNotFound`] when the group is absent.
    fn disable_group(&self, group: &str) -> Result<(), FeatureStoreError>;

    /// Returns the distinct non-empty group names across all features.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureStoreError`] when storage fails.
    fn read_all_groups(&self) -> Result<BTreeSet<String>, FeatureStoreError>;

    /// Removes every feature.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureStoreError`] when storage fails.
    fn clear(&self) -> Result<(), FeatureStoreError>;

    /// Creates backing tables and indexes when missing.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureStoreError::Schema`] when setup fails.
    fn create_schema(&self) -> Result<(), FeatureStoreError> {
        Ok(())
    }

    /// Reports store readiness for liveness/readiness probes.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureStoreError`] when the store is unavailable.
    fn readiness(&self) -> Result<(), FeatureStoreError> {
        Ok(())
    }
}

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Rejects an empty feature uid.
///
/// # Errors
///
/// Returns [`FeatureStoreError::InvalidArgument`] when `uid` is empty.
pub fn require_uid(uid: &str) -> Result<(), FeatureStoreError> {
    require_non_empty("feature uid", uid)
}

/// Rejects an empty role name.
///
/// # Errors
///
/// Returns [`FeatureStoreError::InvalidArgument`] when `role` is empty.
pub fn require_role(role: &str) -> Result<(), FeatureStoreError> {
    require_non_empty("role name", role)
}

/// Rejects an empty group name.
///
/// # Errors
///
/// Returns [`FeatureStoreError::InvalidArgument`] when `group` is empty.
pub fn require_group(group: &str) -> Result<(), FeatureStoreError> {
    require_non_empty("group name", group)
}

/// Validates a feature before it is written.
///
/// # Errors
///
/// Returns [`FeatureStoreError::InvalidArgument`] when the uid is empty, a
/// role is empty, the strategy is bound to another uid or has a blank type, a
/// property is keyed under a different name, or a property fails
/// [`crate::core::Property::validate`].
pub fn validate_feature(feature: &Feature) -> Result<(), FeatureStoreError> {
    require_uid(&feature.uid)?;
    if feature.permissions.iter().any(String::is_empty) {
        return Err(FeatureStoreError::InvalidArgument(format!(
            "feature {} has an empty role name",
            feature.uid
        )));
    }
    if let Some(strategy) = &feature.flipping_strategy {
        if strategy.feature_uid != feature.uid {
            return Err(FeatureStoreError::InvalidArgument(format!(
                "feature {} carries a strategy bound to {}",
                feature.uid, strategy.feature_uid
            )));
        }
        strategy.validate().map_err(|err| FeatureStoreError::InvalidArgument(err.to_string()))?;
    }
    for (name, property) in &feature.custom_properties {
        if name != &property.name {
            return Err(FeatureStoreError::InvalidArgument(format!(
                "feature {} stores property {} under key {name}",
                feature.uid, property.name
            )));
        }
        property
            .validate()
            .map_err(|err| FeatureStoreError::InvalidArgument(err.to_string()))?;
    }
    Ok(())
}

/// Rejects an empty required string.
fn require_non_empty(label: &str, value: &str) -> Result<(), FeatureStoreError> {
    if value.is_empty() {
        return Err(FeatureStoreError::InvalidArgument(format!("{label} must not be empty")));
    }
    Ok(())
}
