// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `aztech_adapter` - gateway adapter for Wi-Fi smart plugs and bulbs.
//!
//! This library turns the snapshots a vendor client reads from a plug, wall
//! switch, power strip or bulb into typed, self-updating properties that a
//! home-automation gateway can expose and write.
//!
//! # Supported Devices
//!
//! - **Plugs and wall switches**: relay, status LED, dimmer, energy meter
//! - **Power strips**: one device per outlet, sharing one client
//! - **Bulbs**: HSV color, tunable white, brightness, energy meter
//!
//! # How It Works
//!
//! At registration the adapter reads the device once, detects its
//! capabilities, and materializes one [`Property`](property::Property) per
//! capability. A background task per device then re-reads the snapshots
//! every [`PollConfig::interval`] and publishes a [`DeviceEvent`] for every
//! value that changed. A failed read skips the cycle; the loop never dies on
//! an error.
//!
//! The network side is not part of this crate: callers implement
//! [`VendorClient`](vendor::VendorClient) (and
//! [`LightClient`](vendor::LightClient) for bulbs) on top of their SDK.
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use aztech_adapter::{Adapter, AdapterConfig, DeviceEvent, PropertyValue};
//!
//! #[tokio::main]
//! async fn main() -> aztech_adapter::Result<()> {
//!     let adapter = Adapter::new(AdapterConfig::default());
//!     let mut events = adapter.subscribe();
//!
//!     // Plug, strip or bulb: the device class decides.
//!     let ids = adapter.add_device(Arc::new(MyClient::new("192.168.1.40"))).await?;
//!     adapter.set_property(&ids[0], "on", PropertyValue::Boolean(true)).await?;
//!
//!     while let Ok(event) = events.recv().await {
//!         if let DeviceEvent::PropertyChanged { device_id, property, value } = event {
//!             println!("{device_id}: {property} = {value}");
//!         }
//!     }
//!     Ok(())
//! }
//! ```

pub mod adapter;
pub mod config;
pub mod device;
pub mod error;
pub mod event;
pub mod poller;
pub mod property;
pub mod types;
pub mod vendor;

pub use adapter::{Adapter, AdapterDevice};
pub use config::{AdapterConfig, PollConfig};
pub use device::{BulbDevice, Capability, DeviceDescription, DeviceInfo, PlugDevice};
pub use error::{Error, Result, SnapshotError, ValueError, VendorError};
pub use event::{DeviceEvent, DeviceId, EventBus};
pub use poller::{PollHandle, Pollable};
pub use property::{PropertyDescription, PropertyValue};
pub use types::{ColorMode, RgbColor};
