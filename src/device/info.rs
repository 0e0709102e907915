// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Identity and connectivity state shared by every device kind.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

use super::Capability;
use crate::error::Error;
use crate::event::{DeviceEvent, DeviceId, EventBus};
use crate::property::Notifier;

/// Point-in-time connectivity of a device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatus {
    /// Whether the last vendor fetch succeeded.
    pub connected: bool,
    /// When the device last answered a fetch.
    pub last_seen: Option<DateTime<Utc>>,
}

/// Identity, capability tags and connectivity of a registered device.
#[derive(Debug)]
pub struct DeviceInfo {
    name: String,
    description: String,
    capabilities: Vec<Capability>,
    notifier: Notifier,
    fetch_timeout: Option<Duration>,
    connected: AtomicBool,
    last_seen: RwLock<Option<DateTime<Utc>>>,
}

impl DeviceInfo {
    /// Creates the state of a device that has just answered.
    pub(crate) fn new(
        name: String,
        description: String,
        capabilities: Vec<Capability>,
        notifier: Notifier,
        fetch_timeout: Option<Duration>,
    ) -> Self {
        Self {
            name,
            description,
            capabilities,
            notifier,
            fetch_timeout,
            connected: AtomicBool::new(true),
            last_seen: RwLock::new(Some(Utc::now())),
        }
    }

    /// Returns the stable device identifier.
    #[must_use]
    pub fn id(&self) -> &DeviceId {
        self.notifier.device_id()
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description (the hardware model).
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the capability tags.
    #[must_use]
    pub fn capabilities(&self) -> &[Capability] {
        &self.capabilities
    }

    /// Returns whether the last vendor fetch succeeded.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Returns when the device last answered a fetch.
    #[must_use]
    pub fn last_seen(&self) -> Option<DateTime<Utc>> {
        *self.last_seen.read()
    }

    /// Returns connectivity as one snapshot.
    #[must_use]
    pub fn connection(&self) -> ConnectionStatus {
        ConnectionStatus {
            connected: self.is_connected(),
            last_seen: self.last_seen(),
        }
    }

    pub(crate) fn fetch_timeout(&self) -> Option<Duration> {
        self.fetch_timeout
    }

    /// Records a successful fetch.
    pub(crate) fn mark_reachable(&self) {
        *self.last_seen.write() = Some(Utc::now());

        if !self.connected.swap(true, Ordering::AcqRel) {
            tracing::info!(device = %self.id(), "Device reachable again");
            self.bus().publish(DeviceEvent::connected(self.id().clone()));
        }
    }

    /// Records a failed fetch.
    pub(crate) fn mark_unreachable(&self, error: &Error) {
        if self.connected.swap(false, Ordering::AcqRel) {
            tracing::warn!(device = %self.id(), error = %error, "Device unreachable");
            self.bus()
                .publish(DeviceEvent::disconnected(self.id().clone(), error.to_string()));
        }
    }

    fn bus(&self) -> &EventBus {
        self.notifier.bus()
    }
}
