// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Gateway-facing device adapters.
//!
//! Two adapters project vendor snapshots onto typed properties:
//!
//! - [`PlugDevice`]: plugs, wall switches and single outlets of a strip
//! - [`BulbDevice`]: color and tunable-white bulbs
//!
//! Both inspect the device once at construction, decide which capabilities it
//! has, and materialize one property per capability. The capability set is
//! fixed for the device's lifetime; only values change afterwards, through
//! [`refresh`](PlugDevice::refresh) or a gateway write.
//!
//! ```ignore
//! use std::sync::Arc;
//! use aztech_adapter::{AdapterConfig, EventBus, PlugDevice, PropertyValue};
//!
//! # async fn example(client: Arc<impl aztech_adapter::vendor::VendorClient>) -> aztech_adapter::Result<()> {
//! let plug = PlugDevice::connect(client, None, &AdapterConfig::default(), EventBus::new()).await?;
//! plug.set_property("on", PropertyValue::Boolean(true)).await?;
//! plug.refresh().await?;
//! # Ok(())
//! # }
//! ```

mod bulb;
mod common;
mod info;
mod plug;

pub use bulb::{BulbDevice, BulbFeatures, BulbProperty, BulbSnapshot};
pub use common::{derive_id, derive_name, extract_current, extract_power, extract_voltage};
pub use info::{ConnectionStatus, DeviceInfo};
pub use plug::{PlugDevice, PlugFeatures, PlugProperty, PlugSnapshot};

use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

use crate::event::DeviceId;
use crate::property::PropertyDescription;

/// Device-level capability tags advertised to the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Capability {
    /// The device can be switched on and off.
    OnOffSwitch,
    /// The device is a smart plug.
    SmartPlug,
    /// The device reports power consumption.
    EnergyMonitor,
    /// The device has a dimmer.
    MultiLevelSwitch,
    /// The device can change color or color temperature.
    ColorControl,
    /// The device emits light.
    Light,
}

/// Gateway-facing description of a device.
///
/// Serializes to the gateway's JSON shape, with properties in registration
/// order.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceDescription {
    /// Stable device identifier.
    pub id: DeviceId,

    /// Display name.
    pub title: String,

    /// Free-form description (the hardware model).
    pub description: String,

    /// Capability tags.
    #[serde(rename = "@type")]
    pub capabilities: Vec<Capability>,

    /// Property descriptions keyed by property name.
    #[serde(serialize_with = "serialize_ordered")]
    pub properties: Vec<(&'static str, PropertyDescription)>,
}

fn serialize_ordered<S: Serializer>(
    properties: &[(&'static str, PropertyDescription)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    let mut map = serializer.serialize_map(Some(properties.len()))?;
    for (name, description) in properties {
        map.serialize_entry(name, description)?;
    }
    map.end()
}

/// Appends `tag` unless already present.
pub(crate) fn push_tag(tags: &mut Vec<Capability>, tag: Capability) {
    if !tags.contains(&tag) {
        tags.push(tag);
    }
}
