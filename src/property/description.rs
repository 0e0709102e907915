// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Property metadata advertised to the gateway.

use serde::Serialize;

use crate::error::ValueError;

use super::PropertyValue;

/// Semantic annotation of a property (`@type`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum SemanticType {
    /// Boolean on/off state.
    OnOffProperty,
    /// Instantaneous power draw.
    InstantaneousPowerProperty,
    /// Mains voltage.
    VoltageProperty,
    /// Current draw.
    CurrentProperty,
    /// Dimmer level of a switch.
    LevelProperty,
    /// `#rrggbb` color.
    ColorProperty,
    /// White color temperature.
    ColorTemperatureProperty,
    /// Color vs. temperature rendering mode.
    ColorModeProperty,
    /// Light brightness.
    BrightnessProperty,
}

/// JSON type of a property value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// `true` or `false`.
    Boolean,
    /// A whole number.
    Integer,
    /// Any number.
    Number,
    /// A string, optionally restricted to an enumeration.
    String,
}

impl ValueType {
    /// Returns the JSON type name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::String => "string",
        }
    }

    /// Returns whether `value` may be stored in a property of this type.
    #[must_use]
    pub fn accepts(&self, value: &PropertyValue) -> bool {
        matches!(
            (self, value),
            (Self::Boolean, PropertyValue::Boolean(_))
                | (Self::Integer, PropertyValue::Integer(_))
                | (Self::Number, PropertyValue::Integer(_) | PropertyValue::Number(_))
                | (Self::String, PropertyValue::String(_))
        )
    }
}

/// Unit of a numeric property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    /// Watts.
    Watt,
    /// Volts.
    Volt,
    /// Amperes.
    Ampere,
    /// Percent (0-100).
    Percent,
    /// Kelvin.
    Kelvin,
}

/// Metadata of one property, in the gateway's JSON shape.
///
/// # Examples
///
/// ```
/// use aztech_adapter::property::{PropertyDescription, SemanticType, Unit, ValueType};
///
/// let level = PropertyDescription::new("Level", ValueType::Integer)
///     .semantic(SemanticType::LevelProperty)
///     .unit(Unit::Percent)
///     .range(0, 100);
///
/// let json = serde_json::to_value(&level).unwrap();
/// assert_eq!(json["@type"], "LevelProperty");
/// assert_eq!(json["maximum"], 100);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDescription {
    /// Semantic annotation, if the property has a standard meaning.
    #[serde(rename = "@type", skip_serializing_if = "Option::is_none")]
    pub semantic_type: Option<SemanticType>,

    /// Human readable title.
    pub title: &'static str,

    /// JSON type of the value.
    #[serde(rename = "type")]
    pub value_type: ValueType,

    /// Unit of a numeric value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<Unit>,

    /// Inclusive lower bound of an integer value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<i64>,

    /// Inclusive upper bound of an integer value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<i64>,

    /// Allowed values of a string property.
    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<&'static str>,

    /// Whether the gateway may write the property.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub read_only: bool,
}

impl PropertyDescription {
    /// Creates a description with only a title and a type.
    #[must_use]
    pub fn new(title: &'static str, value_type: ValueType) -> Self {
        Self {
            semantic_type: None,
            title,
            value_type,
            unit: None,
            minimum: None,
            maximum: None,
            choices: Vec::new(),
            read_only: false,
        }
    }

    /// Sets the semantic annotation.
    #[must_use]
    pub fn semantic(mut self, semantic_type: SemanticType) -> Self {
        self.semantic_type = Some(semantic_type);
        self
    }

    /// Sets the unit.
    #[must_use]
    pub fn unit(mut self, unit: Unit) -> Self {
        self.unit = Some(unit);
        self
    }

    /// Sets inclusive bounds.
    #[must_use]
    pub fn range(mut self, minimum: i64, maximum: i64) -> Self {
        self.minimum = Some(minimum);
        self.maximum = Some(maximum);
        self
    }

    /// Restricts a string property to a set of values.
    #[must_use]
    pub fn choices(mut self, choices: &[&'static str]) -> Self {
        self.choices = choices.to_vec();
        self
    }

    /// Marks the property read-only.
    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Checks a value written by the gateway against this description.
    ///
    /// # Errors
    ///
    /// Returns `ValueError` if the value has the wrong type, is out of range,
    /// or is not one of the allowed choices.
    pub fn validate(&self, property: &str, value: &PropertyValue) -> Result<(), ValueError> {
        if !self.value_type.accepts(value) {
            return Err(ValueError::TypeMismatch {
                property: property.to_string(),
                expected: self.value_type.as_str(),
            });
        }

        if let Some(actual) = value.as_i64() {
            let min = self.minimum.unwrap_or(i64::MIN);
            let max = self.maximum.unwrap_or(i64::MAX);
            if !(min..=max).contains(&actual) {
                return Err(ValueError::OutOfRange { min, max, actual });
            }
        }

        if let Some(s) = value.as_str()
            && !self.choices.is_empty()
            && !self.choices.contains(&s)
        {
            return Err(ValueError::NotInEnum(s.to_string()));
        }

        Ok(())
    }
}
