// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Plug, wall switch and strip outlet adapter.

use std::sync::Arc;

use super::common::{
    derive_id, derive_name, extract_current, extract_power, extract_voltage, written_bool,
    written_int,
};
use super::{Capability, DeviceDescription, DeviceInfo, push_tag};
use crate::config::AdapterConfig;
use crate::error::{Error, Result, SnapshotError};
use crate::event::{DeviceId, EventBus};
use crate::property::{
    Notifier, PropertyDescription, PropertyKind, PropertySet, PropertyValue, SemanticType, Unit,
    ValueType,
};
use crate::vendor::{EnergySnapshot, SysInfo, VendorClient, fetch};

/// Snapshots read by one plug poll cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct PlugSnapshot {
    /// Outlet index, `None` for the device itself.
    pub outlet: Option<usize>,
    /// System information.
    pub status: SysInfo,
    /// Energy meter reading, fetched only for metered plugs.
    pub energy: Option<EnergySnapshot>,
}

/// Capabilities detected from a plug's system information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlugFeatures {
    /// The device is the wall light switch SKU.
    pub light_switch: bool,
    /// The feature list advertises an energy meter.
    pub energy_meter: bool,
    /// The device reports a dimmer level.
    pub dimmable: bool,
}

impl PlugFeatures {
    /// Detects plug capabilities.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError::MissingField` if the feature list is absent.
    pub fn detect(status: &SysInfo) -> std::result::Result<Self, SnapshotError> {
        Ok(Self {
            light_switch: status.is_light_switch(),
            energy_meter: status.has_energy_meter()?,
            dimmable: status.brightness.is_some(),
        })
    }
}

/// Properties a plug may expose, in exposure order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlugProperty {
    /// Power draw in watts.
    InstantaneousPower,
    /// Mains voltage in volts.
    Voltage,
    /// Current in amperes.
    Current,
    /// Dimmer level (0-100).
    Level,
    /// Relay state.
    On,
    /// Status LED state.
    LedOn,
}

impl PlugProperty {
    /// Every candidate, in exposure order.
    pub const ALL: [Self; 6] = [
        Self::InstantaneousPower,
        Self::Voltage,
        Self::Current,
        Self::Level,
        Self::On,
        Self::LedOn,
    ];

    /// Returns whether a device with these features has this property.
    ///
    /// Energy candidates still need a reading to materialize.
    #[must_use]
    pub fn applies(self, features: PlugFeatures) -> bool {
        match self {
            Self::InstantaneousPower | Self::Voltage | Self::Current => features.energy_meter,
            Self::Level => features.dimmable,
            Self::On | Self::LedOn => true,
        }
    }
}

impl PropertyKind for PlugProperty {
    type Snapshot = PlugSnapshot;

    fn name(&self) -> &'static str {
        match self {
            Self::InstantaneousPower => "instantaneousPower",
            Self::Voltage => "voltage",
            Self::Current => "current",
            Self::Level => "level",
            Self::On => "on",
            Self::LedOn => "led-on",
        }
    }

    fn description(&self) -> PropertyDescription {
        match self {
            Self::InstantaneousPower => PropertyDescription::new("Power", ValueType::Number)
                .semantic(SemanticType::InstantaneousPowerProperty)
                .unit(Unit::Watt)
                .read_only(),
            Self::Voltage => PropertyDescription::new("Voltage", ValueType::Number)
                .semantic(SemanticType::VoltageProperty)
                .unit(Unit::Volt)
                .read_only(),
            Self::Current => PropertyDescription::new("Current", ValueType::Number)
                .semantic(SemanticType::CurrentProperty)
                .unit(Unit::Ampere)
                .read_only(),
            Self::Level => PropertyDescription::new("Level", ValueType::Integer)
                .semantic(SemanticType::LevelProperty)
                .unit(Unit::Percent)
                .range(0, 100),
            Self::On => PropertyDescription::new("On/Off", ValueType::Boolean)
                .semantic(SemanticType::OnOffProperty),
            Self::LedOn => PropertyDescription::new("LED On/Off", ValueType::Boolean),
        }
    }

    fn read(
        &self,
        snapshot: &PlugSnapshot,
    ) -> std::result::Result<Option<PropertyValue>, SnapshotError> {
        let energy = snapshot.energy.as_ref();
        let value = match self {
            Self::InstantaneousPower => energy.and_then(extract_power).map(PropertyValue::from),
            Self::Voltage => energy.and_then(extract_voltage).map(PropertyValue::from),
            Self::Current => energy.and_then(extract_current).map(PropertyValue::from),
            Self::Level => Some(snapshot.status.switch_brightness()?.into()),
            Self::On => Some(snapshot.status.relay_on(snapshot.outlet)?.into()),
            Self::LedOn => Some(snapshot.status.led_on()?.into()),
        };
        Ok(value)
    }
}

/// A plug, wall switch, or one outlet of a multi-outlet strip.
pub struct PlugDevice<C> {
    client: Arc<C>,
    outlet: Option<usize>,
    features: PlugFeatures,
    info: DeviceInfo,
    properties: PropertySet<PlugProperty>,
}

impl<C: VendorClient> PlugDevice<C> {
    /// Reads the device's system information and builds the adapter.
    ///
    /// # Errors
    ///
    /// Returns an error if a vendor fetch fails or the snapshot is malformed.
    pub async fn connect(
        client: Arc<C>,
        outlet: Option<usize>,
        config: &AdapterConfig,
        bus: EventBus,
    ) -> Result<Self> {
        let status = fetch(config.poll.fetch_timeout, client.sys_info()).await?;
        Self::from_status(client, outlet, status, config, bus).await
    }

    /// Builds the adapter from system information that was already fetched.
    ///
    /// Multi-outlet strips share one status read across all outlets. Metered
    /// plugs still fetch an energy snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the energy fetch fails or a snapshot is malformed.
    pub async fn from_status(
        client: Arc<C>,
        outlet: Option<usize>,
        status: SysInfo,
        config: &AdapterConfig,
        bus: EventBus,
    ) -> Result<Self> {
        let fetch_timeout = config.poll.fetch_timeout;
        let features = PlugFeatures::detect(&status)?;
        let id = derive_id(&config.id_prefix, &status, outlet)?;
        let name = derive_name(&status, outlet)?;

        let energy = if features.energy_meter {
            Some(fetch(fetch_timeout, client.energy()).await?)
        } else {
            None
        };

        let description = status.model.clone();
        let snapshot = PlugSnapshot {
            outlet,
            status,
            energy,
        };

        let notifier = Notifier::new(id, bus);
        let candidates = PlugProperty::ALL
            .into_iter()
            .filter(|p| p.applies(features));
        let properties = PropertySet::materialize(candidates, &snapshot, &notifier)?;
        let capabilities = plug_capabilities(features, &properties);

        tracing::debug!(
            device = %notifier.device_id(),
            properties = ?properties.names(),
            "Plug properties materialized"
        );

        Ok(Self {
            client,
            outlet,
            features,
            info: DeviceInfo::new(name, description, capabilities, notifier, fetch_timeout),
            properties,
        })
    }

    /// Fetches fresh snapshots and updates every property.
    ///
    /// Returns the number of properties whose value changed. A failed fetch
    /// leaves every property untouched and marks the device unreachable.
    ///
    /// # Errors
    ///
    /// Returns an error if a vendor fetch fails or the snapshot is malformed.
    pub async fn refresh(&self) -> Result<usize> {
        let snapshot = match self.fetch_snapshot().await {
            Ok(snapshot) => {
                self.info.mark_reachable();
                snapshot
            }
            Err(e) => {
                self.info.mark_unreachable(&e);
                return Err(e);
            }
        };
        Ok(self.properties.update_all(&snapshot)?)
    }

    async fn fetch_snapshot(&self) -> Result<PlugSnapshot> {
        let fetch_timeout = self.info.fetch_timeout();
        let status = fetch(fetch_timeout, self.client.sys_info()).await?;
        let energy = if self.features.energy_meter {
            Some(fetch(fetch_timeout, self.client.energy()).await?)
        } else {
            None
        };
        Ok(PlugSnapshot {
            outlet: self.outlet,
            status,
            energy,
        })
    }

    /// Writes a property value to the device.
    ///
    /// The value is validated before any vendor call. On success the cached
    /// value is replaced and a change notification is published.
    ///
    /// # Errors
    ///
    /// Returns `Error::PropertyNotFound`, `Error::ReadOnly`, `Error::Value`,
    /// or the vendor failure.
    pub async fn set_property(&self, name: &str, value: PropertyValue) -> Result<()> {
        let property = self
            .properties
            .get(name)
            .ok_or_else(|| Error::PropertyNotFound(name.to_string()))?;
        let description = property.description();
        if description.read_only {
            return Err(Error::ReadOnly(name.to_string()));
        }
        description.validate(name, &value)?;

        let fetch_timeout = self.info.fetch_timeout();
        match property.kind() {
            PlugProperty::On => {
                let on = written_bool(name, &value)?;
                fetch(fetch_timeout, self.client.set_relay_state(self.outlet, on)).await?;
            }
            PlugProperty::LedOn => {
                let on = written_bool(name, &value)?;
                fetch(fetch_timeout, self.client.set_led_off(!on)).await?;
            }
            PlugProperty::Level => {
                let level = written_int::<u8>(name, &value, 0, 100)?;
                fetch(fetch_timeout, self.client.set_brightness(level)).await?;
            }
            PlugProperty::InstantaneousPower | PlugProperty::Voltage | PlugProperty::Current => {
                return Err(Error::ReadOnly(name.to_string()));
            }
        }

        tracing::debug!(device = %self.id(), property = name, %value, "Property written");
        property.set(value);
        Ok(())
    }
}

impl<C> PlugDevice<C> {
    /// Returns the stable device identifier.
    #[must_use]
    pub fn id(&self) -> &DeviceId {
        self.info.id()
    }

    /// Returns identity and connectivity state.
    #[must_use]
    pub fn info(&self) -> &DeviceInfo {
        &self.info
    }

    /// Returns the outlet index, `None` for the device itself.
    #[must_use]
    pub fn outlet(&self) -> Option<usize> {
        self.outlet
    }

    /// Returns the detected capabilities.
    #[must_use]
    pub fn features(&self) -> PlugFeatures {
        self.features
    }

    /// Returns the exposed properties.
    #[must_use]
    pub fn properties(&self) -> &PropertySet<PlugProperty> {
        &self.properties
    }

    /// Returns the cached value of a property.
    #[must_use]
    pub fn property_value(&self, name: &str) -> Option<PropertyValue> {
        self.properties.get(name).map(|p| p.value())
    }

    /// Returns the gateway-facing description.
    #[must_use]
    pub fn description(&self) -> DeviceDescription {
        DeviceDescription {
            id: self.info.id().clone(),
            title: self.info.name().to_string(),
            description: self.info.description().to_string(),
            capabilities: self.info.capabilities().to_vec(),
            properties: self.properties.descriptions(),
        }
    }
}

impl<C> std::fmt::Debug for PlugDevice<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlugDevice")
            .field("info", &self.info)
            .field("outlet", &self.outlet)
            .field("properties", &self.properties)
            .finish_non_exhaustive()
    }
}

fn plug_capabilities(
    features: PlugFeatures,
    properties: &PropertySet<PlugProperty>,
) -> Vec<Capability> {
    let mut tags = vec![Capability::OnOffSwitch];
    if !features.light_switch {
        push_tag(&mut tags, Capability::SmartPlug);
    }
    if properties.contains(PlugProperty::InstantaneousPower.name()) {
        push_tag(&mut tags, Capability::EnergyMonitor);
    }
    if features.dimmable {
        push_tag(&mut tags, Capability::MultiLevelSwitch);
    }
    tags
}
