// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Adapter configuration.

use std::time::Duration;

use crate::event::DEFAULT_CHANNEL_CAPACITY;

/// Polling cadence and vendor call bounds.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use aztech_adapter::PollConfig;
///
/// let poll = PollConfig::new()
///     .with_interval(Duration::from_secs(10))
///     .with_fetch_timeout(Duration::from_secs(3));
/// assert_eq!(poll.fetch_timeout, Some(Duration::from_secs(3)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Delay between two poll cycles.
    pub interval: Duration,
    /// Upper bound on each vendor call (None = unbounded).
    pub fetch_timeout: Option<Duration>,
}

impl PollConfig {
    /// Default delay between two poll cycles.
    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(5);

    /// Default upper bound on each vendor call.
    pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a polling configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the delay between two poll cycles.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the upper bound on each vendor call.
    #[must_use]
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = Some(timeout);
        self
    }

    /// Lets vendor calls run for as long as the client takes.
    #[must_use]
    pub fn without_fetch_timeout(mut self) -> Self {
        self.fetch_timeout = None;
        self
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Self::DEFAULT_INTERVAL,
            fetch_timeout: Some(Self::DEFAULT_FETCH_TIMEOUT),
        }
    }
}

/// Configuration of an [`Adapter`](crate::Adapter).
///
/// # Examples
///
/// ```
/// use aztech_adapter::{AdapterConfig, PollConfig};
///
/// let config = AdapterConfig::new()
///     .with_id_prefix("kasa")
///     .with_event_capacity(1024)
///     .with_poll(PollConfig::new().without_fetch_timeout());
/// assert_eq!(config.id_prefix, "kasa");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterConfig {
    /// Polling configuration shared by every device.
    pub poll: PollConfig,
    /// Number of events buffered per subscriber.
    pub event_capacity: usize,
    /// Prefix of every device identifier.
    pub id_prefix: String,
}

impl AdapterConfig {
    /// Default device identifier prefix.
    pub const DEFAULT_ID_PREFIX: &'static str = "aztech";

    /// Creates an adapter configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the polling configuration.
    #[must_use]
    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Sets the event channel capacity.
    #[must_use]
    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Sets the device identifier prefix.
    #[must_use]
    pub fn with_id_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.id_prefix = prefix.into();
        self
    }
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            poll: PollConfig::default(),
            event_capacity: DEFAULT_CHANNEL_CAPACITY,
            id_prefix: Self::DEFAULT_ID_PREFIX.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = AdapterConfig::default();
        assert_eq!(config.poll.interval, Duration::from_secs(5));
        assert_eq!(config.poll.fetch_timeout, Some(Duration::from_secs(10)));
        assert_eq!(config.event_capacity, 256);
        assert_eq!(config.id_prefix, "aztech");
    }

    #[test]
    fn fetch_timeout_can_be_lifted() {
        let poll = PollConfig::new()
            .with_fetch_timeout(Duration::from_secs(1))
            .without_fetch_timeout();
        assert_eq!(poll.fetch_timeout, None);
    }
}
