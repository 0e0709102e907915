// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Color and tunable-white bulb adapter.
//!
//! While a bulb is off its firmware zeroes the live color fields and keeps the
//! values it will resume with in a nested default-on record. Every color,
//! temperature, mode and brightness read goes through
//! [`LightState::active`] so the exposed values describe the light the bulb
//! shows when lit.

use std::sync::Arc;

use parking_lot::RwLock;

use super::common::{
    derive_id, derive_name, extract_current, extract_power, extract_voltage, written_bool,
    written_int,
};
use super::{Capability, DeviceDescription, DeviceInfo, push_tag};
use crate::config::AdapterConfig;
use crate::error::{Error, Result, SnapshotError, ValueError};
use crate::event::{DeviceId, EventBus};
use crate::property::{
    Notifier, PropertyDescription, PropertyKind, PropertySet, PropertyValue, SemanticType, Unit,
    ValueType,
};
use crate::types::{ColorMode, RgbColor, hsv_to_hex};
use crate::vendor::{
    EnergySnapshot, LightClient, LightState, LightStateChange, SysInfo, fetch,
};

/// Snapshots read by one bulb poll cycle.
#[derive(Debug, Clone, PartialEq)]
pub struct BulbSnapshot {
    /// System information.
    pub status: SysInfo,
    /// Light state.
    pub light: LightState,
    /// Energy meter reading, `None` if it could not be fetched.
    pub energy: Option<EnergySnapshot>,
}

/// Capabilities detected from a bulb's system information.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BulbFeatures {
    /// The bulb renders HSV colors.
    pub color: bool,
    /// The bulb renders tunable white.
    pub variable_color_temp: bool,
    /// The bulb can be dimmed.
    pub dimmable: bool,
}

impl BulbFeatures {
    /// Detects bulb capabilities.
    ///
    /// # Errors
    ///
    /// Returns `SnapshotError::MissingField` if a capability flag is absent.
    pub fn detect(status: &SysInfo) -> std::result::Result<Self, SnapshotError> {
        Ok(Self {
            color: status.bulb_color()?,
            variable_color_temp: status.bulb_variable_color_temp()?,
            dimmable: status.bulb_dimmable()?,
        })
    }
}

/// Properties a bulb may expose, in exposure order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulbProperty {
    /// Hex `#rrggbb` color.
    Color,
    /// White color temperature, bounded by the model's range.
    ColorTemperature {
        /// Warmest supported temperature in kelvin.
        min: u16,
        /// Coldest supported temperature in kelvin.
        max: u16,
    },
    /// Whether the bulb renders a color or a temperature.
    ColorMode,
    /// Brightness percentage.
    Level,
    /// Power draw in watts.
    InstantaneousPower,
    /// Mains voltage in volts.
    Voltage,
    /// Current in amperes.
    Current,
    /// Lit or not.
    On,
}

impl BulbProperty {
    /// Every candidate, in exposure order, for a bulb with this color
    /// temperature range.
    #[must_use]
    pub fn candidates((min, max): (u16, u16)) -> [Self; 8] {
        [
            Self::Color,
            Self::ColorTemperature { min, max },
            Self::ColorMode,
            Self::Level,
            Self::InstantaneousPower,
            Self::Voltage,
            Self::Current,
            Self::On,
        ]
    }

    /// Returns whether a bulb with these features has this property.
    ///
    /// Energy candidates still need a reading to materialize.
    #[must_use]
    pub fn applies(self, features: BulbFeatures) -> bool {
        match self {
            Self::Color => features.color,
            Self::ColorTemperature { .. } => features.variable_color_temp,
            Self::ColorMode => features.color && features.variable_color_temp,
            Self::Level => features.dimmable,
            Self::InstantaneousPower | Self::Voltage | Self::Current | Self::On => true,
        }
    }
}

impl PropertyKind for BulbProperty {
    type Snapshot = BulbSnapshot;

    fn name(&self) -> &'static str {
        match self {
            Self::Color => "color",
            Self::ColorTemperature { .. } => "colorTemperature",
            Self::ColorMode => "colorMode",
            Self::Level => "level",
            Self::InstantaneousPower => "instantaneousPower",
            Self::Voltage => "voltage",
            Self::Current => "current",
            Self::On => "on",
        }
    }

    fn description(&self) -> PropertyDescription {
        match *self {
            Self::Color => PropertyDescription::new("Color", ValueType::String)
                .semantic(SemanticType::ColorProperty),
            Self::ColorTemperature { min, max } => {
                PropertyDescription::new("Color Temperature", ValueType::Integer)
                    .semantic(SemanticType::ColorTemperatureProperty)
                    .unit(Unit::Kelvin)
                    .range(i64::from(min), i64::from(max))
            }
            Self::ColorMode => PropertyDescription::new("Color Mode", ValueType::String)
                .semantic(SemanticType::ColorModeProperty)
                .choices(&[ColorMode::Color.as_str(), ColorMode::Temperature.as_str()])
                .read_only(),
            Self::Level => PropertyDescription::new("Brightness", ValueType::Integer)
                .semantic(SemanticType::BrightnessProperty)
                .unit(Unit::Percent)
                .range(0, 100),
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
            Self::On => PropertyDescription::new("On/Off", ValueType::Boolean)
                .semantic(SemanticType::OnOffProperty),
        }
    }

    fn read(
        &self,
        snapshot: &BulbSnapshot,
    ) -> std::result::Result<Option<PropertyValue>, SnapshotError> {
        let light = &snapshot.light;
        let energy = snapshot.energy.as_ref();
        let value = match self {
            Self::Color => {
                let (hue, saturation, value) = light.active()?.hsv_value()?;
                Some(hsv_to_hex(hue, saturation, value).into())
            }
            Self::ColorTemperature { .. } => Some(light.active()?.color_temp()?.into()),
            Self::ColorMode => {
                let mode = ColorMode::from_color_temp(light.active()?.color_temp()?);
                Some(mode.as_str().into())
            }
            Self::Level => Some(light.active()?.brightness()?.into()),
            Self::InstantaneousPower => energy.and_then(extract_power).map(PropertyValue::from),
            Self::Voltage => energy.and_then(extract_voltage).map(PropertyValue::from),
            Self::Current => energy.and_then(extract_current).map(PropertyValue::from),
            Self::On => Some(light.is_on()?.into()),
        };
        Ok(value)
    }
}

/// A color or tunable-white bulb.
pub struct BulbDevice<C> {
    client: Arc<C>,
    features: BulbFeatures,
    info: DeviceInfo,
    properties: PropertySet<BulbProperty>,
    last_status: RwLock<SysInfo>,
}

impl<C: LightClient> BulbDevice<C> {
    /// Reads the bulb's system information and builds the adapter.
    ///
    /// # Errors
    ///
    /// Returns an error if a vendor fetch fails or a snapshot is malformed.
    pub async fn connect(client: Arc<C>, config: &AdapterConfig, bus: EventBus) -> Result<Self> {
        let status = fetch(config.poll.fetch_timeout, client.sys_info()).await?;
        Self::from_status(client, status, config, bus).await
    }

    /// Builds the adapter from system information that was already fetched.
    ///
    /// Fetches the light state and, best effort, the energy meter. A bulb
    /// whose meter cannot be read is registered without energy properties.
    ///
    /// # Errors
    ///
    /// Returns an error if the light state fetch fails or a snapshot is
    /// malformed.
    pub async fn from_status(
        client: Arc<C>,
        status: SysInfo,
        config: &AdapterConfig,
        bus: EventBus,
    ) -> Result<Self> {
        let fetch_timeout = config.poll.fetch_timeout;
        let features = BulbFeatures::detect(&status)?;
        let id = derive_id(&config.id_prefix, &status, None)?;
        let name = derive_name(&status, None)?;

        let light = fetch(fetch_timeout, client.light_state()).await?;
        let energy = match fetch(fetch_timeout, client.energy()).await {
            Ok(energy) => Some(energy),
            Err(e) => {
                tracing::warn!(device = %id, error = %e, "Energy meter unavailable, skipping energy properties");
                None
            }
        };

        let description = status.model.clone();
        let snapshot = BulbSnapshot {
            status,
            light,
            energy,
        };

        let notifier = Notifier::new(id, bus);
        let candidates = BulbProperty::candidates(client.color_temperature_range())
            .into_iter()
            .filter(|p| p.applies(features));
        let properties = PropertySet::materialize(candidates, &snapshot, &notifier)?;
        let capabilities = bulb_capabilities(features, &properties);

        tracing::debug!(
            device = %notifier.device_id(),
            properties = ?properties.names(),
            "Bulb properties materialized"
        );

        Ok(Self {
            client,
            features,
            info: DeviceInfo::new(name, description, capabilities, notifier, fetch_timeout),
            properties,
            last_status: RwLock::new(snapshot.status),
        })
    }

    /// Fetches fresh snapshots and updates every property.
    ///
    /// Returns the number of properties whose value changed. A failed status
    /// or light state fetch leaves every property untouched and marks the
    /// device unreachable. A failed energy fetch only keeps the energy
    /// properties at their cached values.
    ///
    /// # Errors
    ///
    /// Returns an error if a vendor fetch fails or a snapshot is malformed.
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
        let changed = self.properties.update_all(&snapshot)?;
        *self.last_status.write() = snapshot.status;
        Ok(changed)
    }

    async fn fetch_snapshot(&self) -> Result<BulbSnapshot> {
        let fetch_timeout = self.info.fetch_timeout();
        let status = fetch(fetch_timeout, self.client.sys_info()).await?;
        let light = fetch(fetch_timeout, self.client.light_state()).await?;
        let energy = match fetch(fetch_timeout, self.client.energy()).await {
            Ok(energy) => Some(energy),
            Err(e) => {
                tracing::trace!(device = %self.id(), error = %e, "Energy meter read failed");
                None
            }
        };
        Ok(BulbSnapshot {
            status,
            light,
            energy,
        })
    }

    /// Writes a property value to the bulb.
    ///
    /// Colors are accepted as `#rrggbb` or `#rgb`. The light state the bulb
    /// replies with is applied to every property, so a color write also
    /// updates `colorMode` and `level`. Energy readings keep their cached
    /// values until the next poll.
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

        let (change, cached) = match *property.kind() {
            BulbProperty::On => {
                let on = written_bool(name, &value)?;
                (LightStateChange::power(on), value)
            }
            BulbProperty::Color => {
                let hex = value.as_str().ok_or_else(|| ValueError::TypeMismatch {
                    property: name.to_string(),
                    expected: "string",
                })?;
                let color = RgbColor::from_hex(hex)?;
                (
                    LightStateChange::color(color.to_hsv()),
                    PropertyValue::String(color.to_hex()),
                )
            }
            BulbProperty::ColorTemperature { min, max } => {
                let kelvin = written_int::<u16>(name, &value, min, max)?;
                (LightStateChange::color_temp(kelvin), value)
            }
            BulbProperty::Level => {
                let level = written_int::<u8>(name, &value, 0, 100)?;
                (LightStateChange::brightness(level), value)
            }
            BulbProperty::ColorMode
            | BulbProperty::InstantaneousPower
            | BulbProperty::Voltage
            | BulbProperty::Current => return Err(Error::ReadOnly(name.to_string())),
        };

        let light = fetch(
            self.info.fetch_timeout(),
            self.client.transition_light_state(&change),
        )
        .await?;

        let reply = BulbSnapshot {
            status: self.last_status.read().clone(),
            light,
            energy: None,
        };
        match self.properties.update_all(&reply) {
            Ok(changed) => {
                tracing::debug!(device = %self.id(), property = name, changed, "Property written");
            }
            Err(e) => {
                tracing::warn!(device = %self.id(), property = name, error = %e, "Ignoring malformed transition reply");
                property.set(cached);
            }
        }
        Ok(())
    }
}

impl<C> BulbDevice<C> {
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

    /// Returns the detected capabilities.
    #[must_use]
    pub fn features(&self) -> BulbFeatures {
        self.features
    }

    /// Returns the exposed properties.
    #[must_use]
    pub fn properties(&self) -> &PropertySet<BulbProperty> {
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

impl<C> std::fmt::Debug for BulbDevice<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BulbDevice")
            .field("info", &self.info)
            .field("properties", &self.properties)
            .finish_non_exhaustive()
    }
}

fn bulb_capabilities(
    features: BulbFeatures,
    properties: &PropertySet<BulbProperty>,
) -> Vec<Capability> {
    let mut tags = vec![Capability::OnOffSwitch, Capability::Light];
    if features.color || features.variable_color_temp {
        push_tag(&mut tags, Capability::ColorControl);
    }
    if properties.contains(BulbProperty::InstantaneousPower.name()) {
        push_tag(&mut tags, Capability::EnergyMonitor);
    }
    tags
}
