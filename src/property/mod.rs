// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Typed, self-updating properties.
//!
//! A [`Property`] binds one exposed attribute (`on`, `level`, `color`, ...)
//! to a [`PropertyKind`] that knows how to read it from a vendor snapshot.
//! The same [`PropertyKind::read`] derives the value when the property is
//! created and on every poll, so the two can never drift apart.
//!
//! Properties are materialized once, when the device is registered. A kind
//! whose reading is absent at that point (an energy meter without a voltage
//! sensor, for instance) produces no property at all.

mod description;
mod value;

pub use description::{PropertyDescription, SemanticType, Unit, ValueType};
pub use value::PropertyValue;

use std::fmt;

use parking_lot::RwLock;

use crate::error::SnapshotError;
use crate::event::{DeviceEvent, DeviceId, EventBus};

/// How a property is derived from vendor snapshots.
///
/// Implemented by the plug and bulb descriptor enums. The associated
/// snapshot bundles everything one poll cycle fetched for that device kind.
pub trait PropertyKind: fmt::Debug + Send + Sync + 'static {
    /// Snapshots read by one poll cycle.
    type Snapshot;

    /// Property name exposed to the gateway.
    fn name(&self) -> &'static str;

    /// Property metadata.
    fn description(&self) -> PropertyDescription;

    /// Derives the property value from a snapshot.
    ///
    /// Returns `Ok(None)` when the snapshot carries no reading for this
    /// property. At registration this suppresses the property; during polling
    /// it keeps the cached value.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError` if the snapshot lacks a field this property
    /// requires.
    fn read(&self, snapshot: &Self::Snapshot) -> Result<Option<PropertyValue>, SnapshotError>;
}

/// Publishes property changes on behalf of one device.
#[derive(Debug, Clone)]
pub(crate) struct Notifier {
    device_id: DeviceId,
    bus: EventBus,
}

impl Notifier {
    pub(crate) fn new(device_id: DeviceId, bus: EventBus) -> Self {
        Self { device_id, bus }
    }

    pub(crate) fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    pub(crate) fn bus(&self) -> &EventBus {
        &self.bus
    }

    fn property_changed(&self, name: &str, value: PropertyValue) {
        tracing::debug!(device = %self.device_id, property = name, %value, "Property changed");
        self.bus.publish(DeviceEvent::property_changed(
            self.device_id.clone(),
            name,
            value,
        ));
    }
}

/// A property value holder bound to one exposed attribute.
///
/// The value type and description are fixed at creation; only the value
/// changes. The value sits behind its own lock so the gateway can read it
/// while the poll loop writes.
pub struct Property<K: PropertyKind> {
    kind: K,
    description: PropertyDescription,
    value: RwLock<PropertyValue>,
    notifier: Notifier,
}

impl<K: PropertyKind> Property<K> {
    /// Reads the initial value and creates the property, or returns `None`
    /// if the snapshot has no reading for it.
    pub(crate) fn materialize(
        kind: K,
        snapshot: &K::Snapshot,
        notifier: &Notifier,
    ) -> Result<Option<Self>, SnapshotError> {
        let Some(initial) = kind.read(snapshot)? else {
            return Ok(None);
        };

        Ok(Some(Self {
            description: kind.description(),
            kind,
            value: RwLock::new(initial),
            notifier: notifier.clone(),
        }))
    }

    /// Returns the property name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Returns the descriptor this property was built from.
    #[must_use]
    pub fn kind(&self) -> &K {
        &self.kind
    }

    /// Returns the property metadata.
    #[must_use]
    pub fn description(&self) -> &PropertyDescription {
        &self.description
    }

    /// Returns the cached value.
    #[must_use]
    pub fn value(&self) -> PropertyValue {
        self.value.read().clone()
    }

    /// Recomputes the value from a fresh snapshot and publishes a change
    /// notification if it differs from the cached value.
    ///
    /// Returns `true` if the value changed.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError` if the snapshot is malformed. The cached value
    /// is left untouched.
    pub fn update(&self, snapshot: &K::Snapshot) -> Result<bool, SnapshotError> {
        match self.kind.read(snapshot)? {
            Some(value) => Ok(self.set(value)),
            None => Ok(false),
        }
    }

    /// Replaces the cached value, publishing a notification if it changed.
    pub(crate) fn set(&self, value: PropertyValue) -> bool {
        {
            let mut current = self.value.write();
            if *current == value {
                return false;
            }
            current.clone_from(&value);
        }
        self.notifier.property_changed(self.name(), value);
        true
    }
}

impl<K: PropertyKind> fmt::Debug for Property<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name())
            .field("value", &*self.value.read())
            .finish_non_exhaustive()
    }
}

/// The ordered set of properties a device exposes.
///
/// Which properties exist is decided at registration and never changes.
pub struct PropertySet<K: PropertyKind> {
    properties: Vec<Property<K>>,
}

impl<K: PropertyKind> PropertySet<K> {
    /// Materializes every candidate in order, skipping those without a reading.
    pub(crate) fn materialize(
        candidates: impl IntoIterator<Item = K>,
        snapshot: &K::Snapshot,
        notifier: &Notifier,
    ) -> Result<Self, SnapshotError> {
        let mut properties = Vec::new();
        for kind in candidates {
            if let Some(property) = Property::materialize(kind, snapshot, notifier)? {
                properties.push(property);
            }
        }
        Ok(Self { properties })
    }

    /// Returns the property with this name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Property<K>> {
        self.properties.iter().find(|p| p.name() == name)
    }

    /// Returns whether a property with this name exists.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterates the properties in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Property<K>> {
        self.properties.iter()
    }

    /// Returns the property names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.properties.iter().map(Property::name).collect()
    }

    /// Returns the number of properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Returns `true` if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Returns `(name, description)` pairs in registration order.
    #[must_use]
    pub fn descriptions(&self) -> Vec<(&'static str, PropertyDescription)> {
        self.properties
            .iter()
            .map(|p| (p.name(), p.description().clone()))
            .collect()
    }

    /// Updates every property from one snapshot.
    ///
    /// Returns the number of properties whose value changed. Stops at the
    /// first malformed read; properties before it keep their new values.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError` if the snapshot is malformed.
    pub fn update_all(&self, snapshot: &K::Snapshot) -> Result<usize, SnapshotError> {
        let mut changed = 0;
        for property in &self.properties {
            if property.update(snapshot)? {
                changed += 1;
            }
        }
        Ok(changed)
    }
}

impl<K: PropertyKind> fmt::Debug for PropertySet<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.properties.iter()).finish()
    }
}
