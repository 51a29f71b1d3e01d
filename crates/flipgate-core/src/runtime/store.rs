// crates/flipgate-core/src/runtime/store.rs
// ============================================================================
// Module: Flipgate In-Memory Store
// Description: Simple in-memory feature store for tests and examples.
// Purpose: Provide a deterministic FeatureStore without external deps.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! This module provides a simple in-memory implementation of [`FeatureStore`]
//! for tests and local demos. Every operation runs under one mutex, so unlike
//! durable stores its `update` and group writes are atomic. It is not intended
//! for production use.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use crate::core::Feature;
use crate::interfaces::FeatureStore;
use crate::interfaces::FeatureStoreError;
use crate::interfaces::require_group;
use crate::interfaces::require_role;
use crate::interfaces::require_uid;
use crate::interfaces::validate_feature;

// ============================================================================
// SECTION: In-Memory Store
// ============================================================================

/// In-memory feature store for tests and examples.
#[derive(Debug, Default, Clone)]
pub struct InMemoryFeatureStore {
    /// Feature map keyed by uid, protected by a mutex.
    features: Arc<Mutex<BTreeMap<String, Feature>>>,
}

impl InMemoryFeatureStore {
    /// Creates an empty in-memory feature store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store pre-populated with `features`.
    ///
    /// # Errors
    ///
    /// Returns [`FeatureStoreError`] when a feature is invalid or duplicated.
    pub fn with_features(
        features: impl IntoIterator<Item = Feature>,
    ) -> Result<Self, FeatureStoreError> {
        let store = Self::new();
        for feature in features {
            store.create(&feature)?;
        }
        Ok(store)
    }

    /// Locks the feature map.
    fn lock(&self) -> Result<MutexGuard<'_, BTreeMap<String, Feature>>, FeatureStoreError> {
        self.features.lock().map_err(|_| {
            FeatureStoreError::StorageUnavailable("in-memory store mutex poisoned".to_string())
        })
    }

    /// Applies `mutate` to an existing feature.
    fn modify(
        &self,
        uid: &str,
        mutate: impl FnOnce(&mut Feature),
    ) -> Result<(), FeatureStoreError> {
        require_uid(uid)?;
        let mut guard = self.lock()?;
        let feature =
            guard.get_mut(uid).ok_or_else(|| FeatureStoreError::NotFound(uid.to_string()))?;
        mutate(feature);
        Ok(())
    }

    /// Applies `mutate` to every member of an existing group.
    fn modify_group(
        &self,
        group: &str,
        mutate: impl Fn(&mut Feature),
    ) -> Result<(), FeatureStoreError> {
        require_group(group)?;
        let mut guard = self.lock()?;
        let mut matched = false;
        for feature in guard.values_mut().filter(|feature| feature.is_in_group(group)) {
            matched = true;
            mutate(feature);
        }
        if matched { Ok(()) } else { Err(FeatureStoreError::GroupNotFound(group.to_string())) }
    }
}

impl FeatureStore for InMemoryFeatureStore {
    fn exist(&self, uid: &str) -> Result<bool, FeatureStoreError> {
        require_uid(uid)?;
        Ok(self.lock()?.contains_key(uid))
    }

    fn create(&self, feature: &Feature) -> Result<(), FeatureStoreError> {
        validate_feature(feature)?;
        let mut guard = self.lock()?;
        if guard.contains_key(&feature.uid) {
            return Err(FeatureStoreError::AlreadyExists(feature.uid.clone()));
        }
        guard.insert(feature.uid.clone(), feature.clone());
        Ok(())
    }

    fn read(&self, uid: &str) -> Result<Feature, FeatureStoreError> {
        require_uid(uid)?;
        self.lock()?.get(uid).cloned().ok_or_else(|| FeatureStoreError::NotFound(uid.to_string()))
    }

    fn read_all(&self) -> Result<BTreeMap<String, Feature>, FeatureStoreError> {
        Ok(self.lock()?.clone())
    }

    fn update(&self, feature: &Feature) -> Result<(), FeatureStoreError> {
        validate_feature(feature)?;
        let mut guard = self.lock()?;
        if guard.remove(&feature.uid).is_none() {
            return Err(FeatureStoreError::NotFound(feature.uid.clone()));
        }
        guard.insert(feature.uid.clone(), feature.clone());
        Ok(())
    }

    fn delete(&self, uid: &str) -> Result<(), FeatureStoreError> {
        require_uid(uid)?;
        match self.lock()?.remove(uid) {
            Some(_) => Ok(()),
            None => Err(FeatureStoreError::NotFound(uid.to_string())),
        }
    }

    fn enable(&self, uid: &str) -> Result<(), FeatureStoreError> {
        self.modify(uid, |feature| feature.enabled = true)
    }

    fn disable(&self, uid: &str) -> Result<(), FeatureStoreError> {
        self.modify(uid, |feature| feature.enabled = false)
    }

    fn grant_role(&self, uid: &str, role: &str) -> Result<(), FeatureStoreError> {
        require_role(role)?;
        self.modify(uid, |feature| {
            feature.permissions.insert(role.to_string());
        })
    }

    fn remove_role(&self, uid: &str, role: &str) -> Result<(), FeatureStoreError> {
        require_role(role)?;
        self.modify(uid, |feature| {
            feature.permissions.remove(role);
        })
    }

    fn add_to_group(&self, uid: &str, group: &str) -> Result<(), FeatureStoreError> {
        require_group(group)?;
        self.modify(uid, |feature| feature.group = Some(group.to_string()))
    }

    fn remove_from_group(&self, uid: &str, group: &str) -> Result<(), FeatureStoreError> {
        require_uid(uid)?;
        require_group(group)?;
        let mut guard = self.lock()?;
        if !guard.contains_key(uid) {
            return Err(FeatureStoreError::NotFound(uid.to_string()));
        }
        if !guard.values().any(|feature| feature.is_in_group(group)) {
            return Err(FeatureStoreError::GroupNotFound(group.to_string()));
        }
        if let Some(feature) = guard.get_mut(uid) {
            feature.group = None;
        }
        Ok(())
    }

    fn exist_group(&self, group: &str) -> Result<bool, FeatureStoreError> {
        require_group(group)?;
        Ok(self.lock()?.values().any(|feature| feature.is_in_group(group)))
    }

    fn read_group(&self, group: &str) -> Result<BTreeMap<String, Feature>, FeatureStoreError> {
        require_group(group)?;
        let members: BTreeMap<String, Feature> = self
            .lock()?
            .values()
            .filter(|feature| feature.is_in_group(group))
            .map(|feature| (feature.uid.clone(), feature.clone()))
            .collect();
        if members.is_empty() {
            return Err(FeatureStoreError::GroupNotFound(group.to_string()));
        }
        Ok(members)
    }

    fn enable_group(&self, group: &str) -> Result<(), FeatureStoreError> {
        self.modify_group(group, |feature| feature.enabled = true)
    }

    fn disable_group(&self, group: &str) -> Result<(), FeatureStoreError> {
        self.modify_group(group, |feature| feature.enabled = false)
    }

    fn read_all_groups(&self) -> Result<BTreeSet<String>, FeatureStoreError> {
        Ok(self
            .lock()?
            .values()
            .filter_map(Feature::group_name)
            .map(ToString::to_string)
            .collect())
    }

    fn clear(&self) -> Result<(), FeatureStoreError> {
        self.lock()?.clear();
        Ok(())
    }
}
