// crates/flipgate-core/src/core/feature.rs
// ============================================================================
// Module: Feature Model
// Description: The feature toggle consumed by store callers.
// Purpose: Hold enabled state, grouping, permissions, strategy, and properties.
// Dependencies: crate::core::{property, strategy}
// ============================================================================

//! ## Overview
//! [`Feature`] is the domain object handed to and returned from every
//! [`crate::FeatureStore`]. Role and property containers are always present
//! (possibly empty). An empty group string and an absent group both mean the
//! feature is ungrouped.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use crate::core::property::Property;
use crate::core::strategy::FlippingStrategy;

// ============================================================================
// SECTION: Feature
// ============================================================================

/// Named, toggleable capability.
///
/// # Invariants
/// - `uid` identifies the feature within a store and never changes after create.
/// - `permissions` and `custom_properties` are never absent.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Unique feature identifier.
    pub uid: String,
    /// Whether the feature is enabled.
    pub enabled: bool,
    /// Optional description.
    pub description: Option<String>,
    /// Optional group label.
    pub group: Option<String>,
    /// Roles allowed to operate the feature.
    pub permissions: BTreeSet<String>,
    /// Optional conditional-enablement strategy.
    pub flipping_strategy: Option<FlippingStrategy>,
    /// Custom properties keyed by name.
    pub custom_properties: BTreeMap<String, Property>,
}

impl Feature {
    /// Creates a disabled, ungrouped feature with empty containers.
    #[must_use]
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            enabled: false,
            description: None,
            group: None,
            permissions: BTreeSet::new(),
            flipping_strategy: None,
            custom_properties: BTreeMap::new(),
        }
    }

    /// Sets the enabled flag.
    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Sets the group label.
    #[must_use]
    pub fn with_group(mut self, group: impl Into<String>) -> Self {
        self.group = Some(group.into());
        self
    }

    /// Adds a permission role.
    #[must_use]
    pub fn with_permission(mut self, role: impl Into<String>) -> Self {
        self.permissions.insert(role.into());
        self
    }

    /// Attaches a flipping strategy.
    #[must_use]
    pub fn with_strategy(mut self, strategy: FlippingStrategy) -> Self {
        self.flipping_strategy = Some(strategy);
        self
    }

    /// Adds a custom property keyed by its name.
    #[must_use]
    pub fn with_property(mut self, property: Property) -> Self {
        self.custom_properties.insert(property.name.clone(), property);
        self
    }

    /// Returns the group label when the feature belongs to a non-empty group.
    #[must_use]
    pub fn group_name(&self) -> Option<&str> {
        self.group.as_deref().filter(|group| !group.is_empty())
    }

    /// Returns true when the feature is in the named group.
    #[must_use]
    pub fn is_in_group(&self, group: &str) -> bool {
        !group.is_empty() && self.group_name() == Some(group)
    }
}
