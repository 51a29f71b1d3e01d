// crates/flipgate-core/src/runtime/mod.rs
// ============================================================================
// Module: Flipgate Runtime
// Description: Ready-to-use feature store implementations.
// Purpose: Ship a dependency-free FeatureStore for tests and demos.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! Runtime helpers that implement the [`crate::FeatureStore`] contract without
//! a storage engine.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod store;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use store::InMemoryFeatureStore;
