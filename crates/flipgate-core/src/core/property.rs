// crates/flipgate-core/src/core/property.rs
// ============================================================================
// Module: Custom Properties
// Description: Named, typed values attached to a feature.
// Purpose: Define property values and their tagged JSON storage form.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! A custom property is stored as one JSON object per property. The `type` tag
//! embedded in that object selects how the string-rendered `value` (and any
//! `fixedValues`) are parsed back into a [`PropertyValue`].
//!
//! ```text
//! {"name":"timeout","type":"int","value":"30","fixedValues":["30","60"]}
//! ```

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Serialize;

use crate::core::codec::CodecError;
use crate::core::codec::to_json_string;

// ============================================================================
// SECTION: Property Values
// ============================================================================

/// Type tag for string properties.
pub const TYPE_STRING: &str = "string";
/// Type tag for boolean properties.
pub const TYPE_BOOLEAN: &str = "boolean";
/// Type tag for 32-bit integer properties.
pub const TYPE_INT: &str = "int";
/// Type tag for 64-bit integer properties.
pub const TYPE_LONG: &str = "long";
/// Type tag for double-precision properties.
pub const TYPE_DOUBLE: &str = "double";

/// Typed property value.
///
/// # Invariants
/// - `Double` values parsed from storage or accepted by
///   [`Property::validate`] are finite.
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// UTF-8 string value.
    String(String),
    /// Boolean value.
    Boolean(bool),
    /// 32-bit signed integer.
    Int(i32),
    /// 64-bit signed integer.
    Long(i64),
    /// Finite double-precision value.
    Double(f64),
}

impl PropertyValue {
    /// Returns the type tag stored alongside the value.
    #[must_use]
    pub const fn type_tag(&self) -> &'static str {
        match self {
            Self::String(_) => TYPE_STRING,
            Self::Boolean(_) => TYPE_BOOLEAN,
            Self::Int(_) => TYPE_INT,
            Self::Long(_) => TYPE_LONG,
            Self::Double(_) => TYPE_DOUBLE,
        }
    }

    /// Returns false for a NaN or infinite double.
    #[must_use]
    pub const fn is_finite(&self) -> bool {
        match self {
            Self::Double(value) => value.is_finite(),
            _ => true,
        }
    }

    /// Parses a string-rendered value for the given type tag.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Property`] for unknown tags or unparseable values.
    pub fn parse(type_tag: &str, raw: &str) -> Result<Self, CodecError> {
        let invalid = |kind: &str| {
            CodecError::Property(format!("value is not a valid {kind}"))
        };
        match type_tag {
            TYPE_STRING => Ok(Self::String(raw.to_string())),
            TYPE_BOOLEAN => raw.parse().map(Self::Boolean).map_err(|_| invalid(TYPE_BOOLEAN)),
            TYPE_INT => raw.parse().map(Self::Int).map_err(|_| invalid(TYPE_INT)),
            TYPE_LONG => raw.parse().map(Self::Long).map_err(|_| invalid(TYPE_LONG)),
            TYPE_DOUBLE => {
                let value: f64 = raw.parse().map_err(|_| invalid(TYPE_DOUBLE))?;
                if value.is_finite() { Ok(Self::Double(value)) } else { Err(invalid(TYPE_DOUBLE)) }
            }
            other => Err(CodecError::Property(format!("unknown property type: {other}"))),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(value) => value.fmt(f),
            Self::Boolean(value) => value.fmt(f),
            Self::Int(value) => value.fmt(f),
            Self::Long(value) => value.fmt(f),
            Self::Double(value) => value.fmt(f),
        }
    }
}

// ============================================================================
// SECTION: Property
// ============================================================================

/// Named custom property.
///
/// # Invariants
/// - When `fixed_values` is non-empty, every entry shares the value's type and
///   `value` is one of them.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Property name.
    pub name: String,
    /// Optional human-readable description.
    pub description: Option<String>,
    /// Current value.
    pub value: PropertyValue,
    /// Allowed values; empty means unrestricted.
    pub fixed_values: Vec<PropertyValue>,
}

/// Wire shape of a serialized property.
#[derive(Debug, Serialize, Deserialize)]
struct PropertyJson {
    /// Property name.
    name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    /// Type tag.
    #[serde(rename = "type")]
    type_tag: String,
    /// String-rendered value.
    value: String,
    /// String-rendered allowed values.
    #[serde(rename = "fixedValues", default, skip_serializing_if = "Vec::is_empty")]
    fixed_values: Vec<String>,
}

impl Property {
    /// Creates an unrestricted property.
    #[must_use]
    pub fn new(name: impl Into<String>, value: PropertyValue) -> Self {
        Self {
            name: name.into(),
            description: None,
            value,
            fixed_values: Vec::new(),
        }
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Restricts the property to a fixed set of values.
    #[must_use]
    pub fn with_fixed_values(mut self, values: Vec<PropertyValue>) -> Self {
        self.fixed_values = values;
        self
    }

    /// Checks the fixed-value invariant.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Property`] when a double is NaN or infinite, a fixed
    /// value has a different type than the current value, or the value is not
    /// among the fixed values.
    pub fn validate(&self) -> Result<(), CodecError> {
        if !self.value.is_finite() || !self.fixed_values.iter().all(PropertyValue::is_finite) {
            return Err(CodecError::Property(format!(
                "property {} holds a non-finite double",
                self.name
            )));
        }
        if self.fixed_values.is_empty() {
            return Ok(());
        }
        let tag = self.value.type_tag();
        if self.fixed_values.iter().any(|fixed| fixed.type_tag() != tag) {
            return Err(CodecError::Property(format!(
                "property {} mixes fixed value types",
                self.name
            )));
        }
        if !self.fixed_values.contains(&self.value) {
            return Err(CodecError::Property(format!(
                "property {} value is not one of its fixed values",
                self.name
            )));
        }
        Ok(())
    }

    /// Serializes the property to its stored JSON form.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Encode`] when JSON rendering fails.
    pub fn to_json(&self) -> Result<String, CodecError> {
        to_json_string(&PropertyJson {
            name: self.name.clone(),
            description: self.description.clone(),
            type_tag: self.value.type_tag().to_string(),
            value: self.value.to_string(),
            fixed_values: self.fixed_values.iter().map(ToString::to_string).collect(),
        })
    }

    /// Parses a stored property.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Property`] when the payload is not a property
    /// object, the type tag is unknown, a value does not parse for the tag, or
    /// the fixed-value invariant is violated.
    pub fn parse_json(json: &str) -> Result<Self, CodecError> {
        let parsed: PropertyJson =
            serde_json::from_str(json).map_err(|err| CodecError::Property(err.to_string()))?;
        let value = PropertyValue::parse(&parsed.type_tag, &parsed.value)?;
        let fixed_values = parsed
            .fixed_values
            .iter()
            .map(|raw| PropertyValue::parse(&parsed.type_tag, raw))
            .collect::<Result<Vec<_>, _>>()?;
        let property = Self {
            name: parsed.name,
            description: parsed.description,
            value,
            fixed_values,
        };
        property.validate()?;
        Ok(property)
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================
