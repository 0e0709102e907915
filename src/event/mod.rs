// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Notifications pushed from devices to the gateway.
//!
//! Every property value change detected by a poll cycle or caused by a write
//! is published on an [`EventBus`] as a [`DeviceEvent`]. The bus is a tokio
//! broadcast channel, so the gateway may attach as many listeners as it needs.
//!
//! # Examples
//!
//! ```
//! use aztech_adapter::event::{DeviceEvent, DeviceId, EventBus};
//!
//! let bus = EventBus::new();
//! let mut rx = bus.subscribe();
//!
//! bus.publish(DeviceEvent::device_added(DeviceId::new("aztech-8006F2")));
//! assert!(rx.try_recv().unwrap().is_lifecycle());
//! ```

mod device_event;
mod device_id;
mod event_bus;

pub use device_event::DeviceEvent;
pub use device_id::DeviceId;
pub use event_bus::{DEFAULT_CHANNEL_CAPACITY, EventBus};
