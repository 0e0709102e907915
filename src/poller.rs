// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Per-device poll loop.
//!
//! Every registered device gets one task that waits for the poll interval,
//! runs one refresh cycle, and starts over. A cycle that fails is logged and
//! skipped; nothing short of [`PollHandle::stop`] (or dropping the handle)
//! ends the loop.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::device::{BulbDevice, PlugDevice};
use crate::error::Result;
use crate::event::DeviceId;
use crate::vendor::{LightClient, VendorClient};

/// A device that can be refreshed periodically.
pub trait Pollable: Send + Sync + 'static {
    /// Returns the identifier used in log records.
    fn device_id(&self) -> &DeviceId;

    /// Runs one refresh cycle, returning the number of changed properties.
    ///
    /// # Errors
    ///
    /// Returns an error if the cycle was skipped.
    fn poll_cycle(&self) -> impl Future<Output = Result<usize>> + Send;
}

impl<C: VendorClient> Pollable for PlugDevice<C> {
    fn device_id(&self) -> &DeviceId {
        self.id()
    }

    fn poll_cycle(&self) -> impl Future<Output = Result<usize>> + Send {
        self.refresh()
    }
}

impl<C: LightClient> Pollable for BulbDevice<C> {
    fn device_id(&self) -> &DeviceId {
        self.id()
    }

    fn poll_cycle(&self) -> impl Future<Output = Result<usize>> + Send {
        self.refresh()
    }
}

/// Owner of a running poll loop.
///
/// Dropping the handle also ends the loop, at its next await point, but
/// without waiting for it.
#[derive(Debug)]
pub struct PollHandle {
    device_id: DeviceId,
    stop: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Starts polling `device` every `interval`.
    ///
    /// The first cycle runs one interval after the call: the device was just
    /// read during construction.
    #[must_use]
    pub fn spawn<D: Pollable>(device: Arc<D>, interval: Duration) -> Self {
        let device_id = device.device_id().clone();
        let (stop, stop_rx) = watch::channel(false);

        tracing::debug!(device = %device_id, ?interval, "Starting poll loop");
        let task = tokio::spawn(run(device, interval, stop_rx));

        Self {
            device_id,
            stop,
            task,
        }
    }

    /// Returns the identifier of the polled device.
    #[must_use]
    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    /// Returns `true` once the loop has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signals the loop to stop and waits for it to exit.
    ///
    /// A cycle in progress is abandoned at its current vendor call.
    pub async fn stop(self) {
        // Err only means the loop already exited.
        let _ = self.stop.send(true);

        if let Err(e) = self.task.await {
            tracing::warn!(device = %self.device_id, error = %e, "Poll loop ended abnormally");
        }
    }
}

async fn run<D: Pollable>(device: Arc<D>, interval: Duration, mut stop: watch::Receiver<bool>) {
    loop {
        tokio::select! {
            biased;
            _ = stop.changed() => break,
            () = tokio::time::sleep(interval) => {}
        }

        tracing::trace!(device = %device.device_id(), "Poll tick");

        tokio::select! {
            biased;
            _ = stop.changed() => break,
            result = device.poll_cycle() => report(device.device_id(), &result),
        }
    }

    tracing::debug!(device = %device.device_id(), "Poll loop stopped");
}

fn report(device_id: &DeviceId, result: &Result<usize>) {
    match result {
        Ok(changed) => {
            tracing::trace!(device = %device_id, changed, "Poll cycle complete");
        }
        Err(e) if e.is_transient() => {
            tracing::warn!(device = %device_id, error = %e, "Skipping poll cycle");
        }
        Err(e) => {
            tracing::warn!(device = %device_id, error = %e, "Discarding malformed poll cycle");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::config::AdapterConfig;
    use crate::error::{Error, VendorError};
    use crate::event::EventBus;
    use crate::property::PropertyValue;
    use crate::vendor::SysInfo;
    use crate::vendor::mock::MockClient;

    const INTERVAL: Duration = Duration::from_secs(5);

    /// Counts cycles; fails the first `failures` of them.
    struct Counter {
        id: DeviceId,
        cycles: AtomicUsize,
        failures: usize,
        stall: Option<Duration>,
    }

    impl Counter {
        fn new(failures: usize) -> Arc<Self> {
            Arc::new(Self {
                id: DeviceId::new("counter"),
                cycles: AtomicUsize::new(0),
                failures,
                stall: None,
            })
        }

        fn cycles(&self) -> usize {
            self.cycles.load(Ordering::SeqCst)
        }
    }

    impl Pollable for Counter {
        fn device_id(&self) -> &DeviceId {
            &self.id
        }

        async fn poll_cycle(&self) -> Result<usize> {
            let cycle = self.cycles.fetch_add(1, Ordering::SeqCst);
            if let Some(stall) = self.stall {
                tokio::time::sleep(stall).await;
            }
            if cycle < self.failures {
                Err(Error::Vendor(VendorError::Communication("offline".to_string())))
            } else {
                Ok(0)
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn polls_every_interval() {
        let counter = Counter::new(0);
        let handle = PollHandle::spawn(Arc::clone(&counter), INTERVAL);

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(counter.cycles(), 0);

        tokio::time::sleep(Duration::from_secs(12)).await;
        assert_eq!(counter.cycles(), 3);

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn failures_do_not_end_the_loop() {
        let counter = Counter::new(2);
        let handle = PollHandle::spawn(Arc::clone(&counter), INTERVAL);

        tokio::time::sleep(Duration::from_secs(21)).await;
        assert_eq!(counter.cycles(), 4);
        assert!(!handle.is_finished());

        handle.stop().await;
    }

    #[tokio::test(start_paused = true)]
    async fn stop_joins_the_loop() {
        let counter = Counter::new(0);
        let handle = PollHandle::spawn(Arc::clone(&counter), INTERVAL);

        tokio::time::sleep(Duration::from_secs(6)).await;
        handle.stop().await;
        assert_eq!(Arc::strong_count(&counter), 1);

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert_eq!(counter.cycles(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn stop_abandons_a_stalled_cycle() {
        let counter = Arc::new(Counter {
            id: DeviceId::new("stalled"),
            cycles: AtomicUsize::new(0),
            failures: 0,
            stall: Some(Duration::from_secs(3600)),
        });
        let handle = PollHandle::spawn(Arc::clone(&counter), INTERVAL);

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(counter.cycles(), 1);

        let started = tokio::time::Instant::now();
        handle.stop().await;
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_handle_ends_the_loop() {
        let counter = Counter::new(0);
        drop(PollHandle::spawn(Arc::clone(&counter), INTERVAL));

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(counter.cycles(), 0);
        assert_eq!(Arc::strong_count(&counter), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_cycle_leaves_plug_untouched() {
        let status = SysInfo {
            device_id: Some("8006F2".to_string()),
            feature: Some("TIM".to_string()),
            relay_state: Some(1),
            led_off: Some(0),
            ..SysInfo::default()
        };
        let client = Arc::new(MockClient::plug(status.clone()));
        let plug = Arc::new(
            PlugDevice::connect(Arc::clone(&client), None, &AdapterConfig::default(), EventBus::new())
                .await
                .unwrap(),
        );

        client.push_sys_info(None);
        client.push_sys_info(Some(SysInfo {
            relay_state: Some(0),
            ..status
        }));
        let handle = PollHandle::spawn(Arc::clone(&plug), INTERVAL);

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert!(!plug.info().is_connected());
        assert_eq!(plug.property_value("on"), Some(PropertyValue::Boolean(true)));

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert!(plug.info().is_connected());
        assert_eq!(plug.property_value("on"), Some(PropertyValue::Boolean(false)));

        handle.stop().await;
    }
}
