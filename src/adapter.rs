// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Registry of adapted devices.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tokio::sync::{RwLock, broadcast};

use crate::config::AdapterConfig;
use crate::device::{BulbDevice, DeviceDescription, DeviceInfo, PlugDevice};
use crate::error::{Error, Result};
use crate::event::{DeviceEvent, DeviceId, EventBus};
use crate::poller::PollHandle;
use crate::property::PropertyValue;
use crate::vendor::{LightClient, SysInfo, VendorClient, fetch};

/// A registered device of either kind.
pub enum AdapterDevice<C> {
    /// A plug, wall switch, or strip outlet.
    Plug(Arc<PlugDevice<C>>),
    /// A bulb.
    Bulb(Arc<BulbDevice<C>>),
}

impl<C> AdapterDevice<C> {
    /// Returns the stable device identifier.
    #[must_use]
    pub fn id(&self) -> &DeviceId {
        self.info().id()
    }

    /// Returns identity and connectivity state.
    #[must_use]
    pub fn info(&self) -> &DeviceInfo {
        match self {
            Self::Plug(plug) => plug.info(),
            Self::Bulb(bulb) => bulb.info(),
        }
    }

    /// Returns the gateway-facing description.
    #[must_use]
    pub fn description(&self) -> DeviceDescription {
        match self {
            Self::Plug(plug) => plug.description(),
            Self::Bulb(bulb) => bulb.description(),
        }
    }

    /// Returns the cached value of a property.
    #[must_use]
    pub fn property_value(&self, name: &str) -> Option<PropertyValue> {
        match self {
            Self::Plug(plug) => plug.property_value(name),
            Self::Bulb(bulb) => bulb.property_value(name),
        }
    }

    /// Returns the plug, if this is one.
    #[must_use]
    pub fn as_plug(&self) -> Option<&Arc<PlugDevice<C>>> {
        match self {
            Self::Plug(plug) => Some(plug),
            Self::Bulb(_) => None,
        }
    }

    /// Returns the bulb, if this is one.
    #[must_use]
    pub fn as_bulb(&self) -> Option<&Arc<BulbDevice<C>>> {
        match self {
            Self::Bulb(bulb) => Some(bulb),
            Self::Plug(_) => None,
        }
    }
}

impl<C: LightClient> AdapterDevice<C> {
    /// Writes a property value to the device.
    ///
    /// # Errors
    ///
    /// See [`PlugDevice::set_property`] and [`BulbDevice::set_property`].
    pub async fn set_property(&self, name: &str, value: PropertyValue) -> Result<()> {
        match self {
            Self::Plug(plug) => plug.set_property(name, value).await,
            Self::Bulb(bulb) => bulb.set_property(name, value).await,
        }
    }
}

impl<C> Clone for AdapterDevice<C> {
    fn clone(&self) -> Self {
        match self {
            Self::Plug(plug) => Self::Plug(Arc::clone(plug)),
            Self::Bulb(bulb) => Self::Bulb(Arc::clone(bulb)),
        }
    }
}

impl<C> fmt::Debug for AdapterDevice<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plug(plug) => f.debug_tuple("Plug").field(plug).finish(),
            Self::Bulb(bulb) => f.debug_tuple("Bulb").field(bulb).finish(),
        }
    }
}

struct Registered<C> {
    device: AdapterDevice<C>,
    poller: PollHandle,
}

/// Registers devices, polls them, and forwards their events to the gateway.
///
/// Each device is inspected once at registration and then polled by its own
/// task. Property changes, connectivity changes and registry changes all go
/// out on one event stream.
///
/// Clients that only implement [`VendorClient`] can register plugs. The
/// [`LightClient`] extension unlocks bulbs, autodetection, and
/// [`set_property`](Self::set_property); plug-only callers write through
/// [`PlugDevice::set_property`] instead.
///
/// # Examples
///
/// ```ignore
/// use std::sync::Arc;
/// use aztech_adapter::{Adapter, AdapterConfig, PropertyValue};
///
/// # async fn example(client: Arc<MyVendorClient>) -> aztech_adapter::Result<()> {
/// let adapter = Adapter::new(AdapterConfig::default());
/// let mut events = adapter.subscribe();
///
/// for id in adapter.add_device(client).await? {
///     adapter.set_property(&id, "on", PropertyValue::Boolean(true)).await?;
/// }
///
/// while let Ok(event) = events.recv().await {
///     println!("{event:?}");
/// }
/// # Ok(())
/// # }
/// ```
pub struct Adapter<C> {
    config: AdapterConfig,
    devices: RwLock<HashMap<DeviceId, Registered<C>>>,
    event_bus: EventBus,
}

impl<C: VendorClient> Adapter<C> {
    /// Creates an empty adapter.
    #[must_use]
    pub fn new(config: AdapterConfig) -> Self {
        let event_bus = EventBus::with_capacity(config.event_capacity);
        Self {
            config,
            devices: RwLock::new(HashMap::new()),
            event_bus,
        }
    }

    /// Returns the adapter configuration.
    #[must_use]
    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    /// Subscribes to events published after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<DeviceEvent> {
        self.event_bus.subscribe()
    }

    /// Registers a plug, or every outlet of a multi-outlet strip.
    ///
    /// Outlets share the client. Registration is all-or-nothing: if any outlet
    /// fails to build, none is registered.
    ///
    /// # Errors
    ///
    /// Returns an error if a vendor fetch fails or a snapshot is malformed.
    pub async fn add_plug(&self, client: Arc<C>) -> Result<Vec<DeviceId>> {
        let status = fetch(self.config.poll.fetch_timeout, client.sys_info()).await?;
        self.register_plugs(client, status).await
    }

    async fn register_plugs(&self, client: Arc<C>, status: SysInfo) -> Result<Vec<DeviceId>> {
        let outlets: Vec<Option<usize>> = if status.children.is_empty() {
            vec![None]
        } else {
            (0..status.children.len()).map(Some).collect()
        };

        let mut plugs = Vec::with_capacity(outlets.len());
        for outlet in outlets {
            let plug = PlugDevice::from_status(
                Arc::clone(&client),
                outlet,
                status.clone(),
                &self.config,
                self.event_bus.clone(),
            )
            .await?;
            plugs.push(Arc::new(plug));
        }

        let mut ids = Vec::with_capacity(plugs.len());
        for plug in plugs {
            let poller = PollHandle::spawn(Arc::clone(&plug), self.config.poll.interval);
            ids.push(self.insert(AdapterDevice::Plug(plug), poller).await);
        }
        Ok(ids)
    }

    async fn insert(&self, device: AdapterDevice<C>, poller: PollHandle) -> DeviceId {
        let id = device.id().clone();
        tracing::info!(
            device = %id,
            name = device.info().name(),
            capabilities = ?device.info().capabilities(),
            "Device registered"
        );

        let replaced = self
            .devices
            .write()
            .await
            .insert(id.clone(), Registered { device, poller });

        if let Some(previous) = replaced {
            tracing::info!(device = %id, "Replacing previous registration");
            previous.poller.stop().await;
        }

        self.event_bus.publish(DeviceEvent::device_added(id.clone()));
        id
    }

    /// Stops polling a device and forgets it.
    ///
    /// # Errors
    ///
    /// Returns `Error::DeviceNotFound` if no such device is registered.
    pub async fn remove_device(&self, id: &DeviceId) -> Result<()> {
        let registered = self
            .devices
            .write()
            .await
            .remove(id)
            .ok_or(Error::DeviceNotFound)?;

        registered.poller.stop().await;
        tracing::info!(device = %id, "Device removed");
        self.event_bus.publish(DeviceEvent::device_removed(id.clone()));
        Ok(())
    }

    /// Stops every poll loop and empties the registry.
    ///
    /// No removal events are published.
    pub async fn shutdown(&self) {
        let drained: Vec<_> = self.devices.write().await.drain().collect();
        tracing::info!(devices = drained.len(), "Shutting down adapter");

        for (_, registered) in drained {
            registered.poller.stop().await;
        }
    }

    /// Returns a registered device.
    pub async fn device(&self, id: &DeviceId) -> Option<AdapterDevice<C>> {
        self.devices
            .read()
            .await
            .get(id)
            .map(|r| r.device.clone())
    }

    /// Returns the identifiers of all registered devices, sorted.
    pub async fn device_ids(&self) -> Vec<DeviceId> {
        let mut ids: Vec<_> = self.devices.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Returns the number of registered devices.
    pub async fn device_count(&self) -> usize {
        self.devices.read().await.len()
    }

    /// Returns the gateway-facing description of a device.
    pub async fn description(&self, id: &DeviceId) -> Option<DeviceDescription> {
        self.devices
            .read()
            .await
            .get(id)
            .map(|r| r.device.description())
    }
}

impl<C: LightClient> Adapter<C> {
    /// Registers a bulb.
    ///
    /// # Errors
    ///
    /// Returns an error if a vendor fetch fails or a snapshot is malformed.
    pub async fn add_bulb(&self, client: Arc<C>) -> Result<DeviceId> {
        let status = fetch(self.config.poll.fetch_timeout, client.sys_info()).await?;
        self.register_bulb(client, status).await
    }

    async fn register_bulb(&self, client: Arc<C>, status: SysInfo) -> Result<DeviceId> {
        let bulb = Arc::new(
            BulbDevice::from_status(client, status, &self.config, self.event_bus.clone()).await?,
        );
        let poller = PollHandle::spawn(Arc::clone(&bulb), self.config.poll.interval);
        Ok(self.insert(AdapterDevice::Bulb(bulb), poller).await)
    }

    /// Registers a device, choosing the bulb or plug adapter from the
    /// device class it reports.
    ///
    /// # Errors
    ///
    /// Returns an error if a vendor fetch fails or a snapshot is malformed.
    pub async fn add_device(&self, client: Arc<C>) -> Result<Vec<DeviceId>> {
        let status = fetch(self.config.poll.fetch_timeout, client.sys_info()).await?;

        if status.is_bulb() {
            tracing::debug!(model = %status.model, "Detected bulb");
            Ok(vec![self.register_bulb(client, status).await?])
        } else {
            tracing::debug!(model = %status.model, "Detected plug");
            self.register_plugs(client, status).await
        }
    }

    /// Writes a property value to a registered device.
    ///
    /// # Errors
    ///
    /// Returns `Error::DeviceNotFound` if no such device is registered, or
    /// the device's write error.
    pub async fn set_property(
        &self,
        id: &DeviceId,
        name: &str,
        value: PropertyValue,
    ) -> Result<()> {
        let device = self.device(id).await.ok_or(Error::DeviceNotFound)?;
        device.set_property(name, value).await
    }
}

impl<C: VendorClient> Default for Adapter<C> {
    fn default() -> Self {
        Self::new(AdapterConfig::default())
    }
}

impl<C> fmt::Debug for Adapter<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adapter")
            .field("config", &self.config)
            .field("event_bus", &self.event_bus)
            .finish_non_exhaustive()
    }
}
