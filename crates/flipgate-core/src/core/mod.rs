// crates/flipgate-core/src/core/mod.rs
// ============================================================================
// Module: Flipgate Core Types
// Description: Feature toggles, strategies, and custom properties.
// Purpose: Provide the canonical domain types shared by all feature stores.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Core types define the feature model and the serialized forms of its nested
//! parts. Stores persist those forms opaquely and rely on this module to
//! parse them back.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod codec;
pub mod feature;
pub mod property;
pub mod strategy;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use codec::CodecError;
pub use feature::Feature;
pub use property::Property;
pub use property::PropertyValue;
pub use strategy::FlippingStrategy;
