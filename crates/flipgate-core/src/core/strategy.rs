// crates/flipgate-core/src/core/strategy.rs
// ============================================================================
// Module: Flipping Strategy
// Description: Pluggable conditional-enablement configuration for a feature.
// Purpose: Carry strategy identity and init parameters through storage.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A flipping strategy is stored as an opaque JSON blob of the form
//! `{"initParams":{...},"type":"<class>"}`. Evaluation of strategies is out of
//! scope here; this module only owns their identity and serialized form. A
//! parsed strategy is always bound to the uid of the feature that owns it.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use crate::core::codec::CodecError;
use crate::core::codec::to_json_string;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Strategy configuration attached to a feature.
///
/// # Invariants
/// - `class_name` is non-blank once validated or parsed from storage.
/// - `feature_uid` is not part of the serialized form; it is supplied on parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlippingStrategy {
    /// Uid of the feature this strategy is bound to.
    pub feature_uid: String,
    /// Strategy implementation identifier.
    pub class_name: String,
    /// Initialization parameters handed to the strategy.
    pub init_params: BTreeMap<String, String>,
}

/// Wire shape of a serialized strategy.
#[derive(Debug, Serialize, Deserialize)]
struct StrategyJson {
    /// Strategy init parameters.
    #[serde(rename = "initParams", default)]
    init_params: BTreeMap<String, String>,
    /// Strategy implementation identifier.
    #[serde(rename = "type")]
    class_name: String,
}

impl FlippingStrategy {
    /// Creates a strategy without init parameters.
    #[must_use]
    pub fn new(feature_uid: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            feature_uid: feature_uid.into(),
            class_name: class_name.into(),
            init_params: BTreeMap::new(),
        }
    }

    /// Adds an init parameter.
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.init_params.insert(key.into(), value.into());
        self
    }

    /// Serializes the strategy to its stored JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Encode`] when JSON rendering fails.
    pub fn to_json(&self) -> Result<String, CodecError> {
        to_json_string(&StrategyJson {
            init_params: self.init_params.clone(),
            class_name: self.class_name.clone(),
        })
    }

    /// Parses a stored strategy and binds it to `feature_uid`.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Strategy`] when the payload is not a strategy
    /// object, has no `type`, or carries non-string init parameters.
    pub fn parse_json(feature_uid: &str, json: &str) -> Result<Self, CodecError> {
        let parsed: StrategyJson =
            serde_json::from_str(json).map_err(|err| CodecError::Strategy {
                uid: feature_uid.to_string(),
                message: err.to_string(),
            })?;
        let strategy = Self {
            feature_uid: feature_uid.to_string(),
            class_name: parsed.class_name,
            init_params: parsed.init_params,
        };
        strategy.validate()?;
        Ok(strategy)
    }

    /// Checks that the strategy names an implementation.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Strategy`] when `class_name` is blank.
    pub fn validate(&self) -> Result<(), CodecError> {
        if self.class_name.trim().is_empty() {
            return Err(CodecError::Strategy {
                uid: self.feature_uid.clone(),
                message: "strategy type must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
