// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device event types.

use serde::Serialize;

use crate::property::PropertyValue;

use super::DeviceId;

/// Events published by the adapter.
///
/// # Examples
///
/// ```
/// use aztech_adapter::event::{DeviceEvent, DeviceId};
/// use aztech_adapter::property::PropertyValue;
///
/// let event = DeviceEvent::property_changed(
///     DeviceId::new("aztech-8006F2"),
///     "on",
///     PropertyValue::Boolean(true),
/// );
/// assert!(event.is_property_change());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum DeviceEvent {
    /// A device was registered and its poll loop started.
    DeviceAdded {
        /// The ID of the added device.
        device_id: DeviceId,
    },

    /// A device was removed and its poll loop joined.
    DeviceRemoved {
        /// The ID of the removed device.
        device_id: DeviceId,
    },

    /// The device became reachable or unreachable.
    ConnectionChanged {
        /// The ID of the device.
        device_id: DeviceId,
        /// Whether the last vendor call succeeded.
        connected: bool,
        /// Error message if the device became unreachable.
        error: Option<String>,
    },

    /// A property took a new value.
    PropertyChanged {
        /// The ID of the device.
        device_id: DeviceId,
        /// The property name, e.g. `instantaneousPower`.
        property: String,
        /// The new value.
        value: PropertyValue,
    },
}

impl DeviceEvent {
    /// Returns the device ID associated with this event.
    #[must_use]
    pub fn device_id(&self) -> &DeviceId {
        match self {
            Self::DeviceAdded { device_id }
            | Self::DeviceRemoved { device_id }
            | Self::ConnectionChanged { device_id, .. }
            | Self::PropertyChanged { device_id, .. } => device_id,
        }
    }

    /// Returns `true` if this is a device lifecycle event (added/removed).
    #[must_use]
    pub fn is_lifecycle(&self) -> bool {
        matches!(self, Self::DeviceAdded { .. } | Self::DeviceRemoved { .. })
    }

    /// Returns `true` if this is a connection event.
    #[must_use]
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::ConnectionChanged { .. })
    }

    /// Returns `true` if this is a property change.
    #[must_use]
    pub fn is_property_change(&self) -> bool {
        matches!(self, Self::PropertyChanged { .. })
    }

    /// Creates a device added event.
    #[must_use]
    pub fn device_added(device_id: DeviceId) -> Self {
        Self::DeviceAdded { device_id }
    }

    /// Creates a device removed event.
    #[must_use]
    pub fn device_removed(device_id: DeviceId) -> Self {
        Self::DeviceRemoved { device_id }
    }

    /// Creates a reachable event.
    #[must_use]
    pub fn connected(device_id: DeviceId) -> Self {
        Self::ConnectionChanged {
            device_id,
            connected: true,
            error: None,
        }
    }

    /// Creates an unreachable event.
    #[must_use]
    pub fn disconnected(device_id: DeviceId, error: impl Into<String>) -> Self {
        Self::ConnectionChanged {
            device_id,
            connected: false,
            error: Some(error.into()),
        }
    }

    /// Creates a property change event.
    #[must_use]
    pub fn property_changed(
        device_id: DeviceId,
        property: impl Into<String>,
        value: PropertyValue,
    ) -> Self {
        Self::PropertyChanged {
            device_id,
            property: property.into(),
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_id_accessor_covers_all_variants() {
        let id = DeviceId::new("aztech-1");
        let events = [
            DeviceEvent::device_added(id.clone()),
            DeviceEvent::device_removed(id.clone()),
            DeviceEvent::connected(id.clone()),
            DeviceEvent::disconnected(id.clone(), "timeout"),
            DeviceEvent::property_changed(id.clone(), "on", PropertyValue::Boolean(false)),
        ];
        for event in &events {
            assert_eq!(event.device_id(), &id);
        }
    }

    #[test]
    fn classification() {
        let id = DeviceId::new("aztech-1");
        assert!(DeviceEvent::device_added(id.clone()).is_lifecycle());
        assert!(DeviceEvent::disconnected(id.clone(), "x").is_connection());
        assert!(!DeviceEvent::connected(id).is_property_change());
    }

    #[test]
    fn property_change_serializes_for_the_gateway() {
        let event = DeviceEvent::property_changed(
            DeviceId::new("aztech-1"),
            "level",
            PropertyValue::Integer(40),
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "event": "propertyChanged",
                "deviceId": "aztech-1",
                "property": "level",
                "value": 40
            })
        );
    }

    #[test]
    fn connection_change_serializes_fields_in_camel_case() {
        let event = DeviceEvent::disconnected(DeviceId::new("aztech-1"), "timed out");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "event": "connectionChanged",
                "deviceId": "aztech-1",
                "connected": false,
                "error": "timed out"
            })
        );
    }
}
