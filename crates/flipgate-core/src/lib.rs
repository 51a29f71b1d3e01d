// crates/flipgate-core/src/lib.rs
// ============================================================================
// Module: Flipgate Core Library
// Description: Public API surface for the Flipgate core.
// Purpose: Expose feature types, the store contract, and runtime helpers.
// Dependencies: crate::{core, interfaces, runtime}
// ============================================================================

//! ## Overview
//! Flipgate core defines feature toggles, the serialized forms of their
//! strategies and custom properties, and the [`FeatureStore`] contract that
//! persistence backends implement. It carries no storage engine of its own
//! beyond an in-memory reference store.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use crate::core::CodecError;
pub use crate::core::Feature;
pub use crate::core::FlippingStrategy;
pub use crate::core::Property;
pub use crate::core::PropertyValue;

pub use interfaces::FeatureStore;
pub use interfaces::FeatureStoreError;
pub use interfaces::require_group;
pub use interfaces::require_role;
pub use interfaces::require_uid;
pub use interfaces::validate_feature;
pub use runtime::InMemoryFeatureStore;
