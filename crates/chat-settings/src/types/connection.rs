//! Transport settings.

use std::ops::RangeInclusive;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Accepted `connectTimeoutMs` values.
pub const CONNECT_TIMEOUT_MS: RangeInclusive<u64> = 1000..=600_000;
/// Accepted `closeTimeoutMs` values.
pub const CLOSE_TIMEOUT_MS: RangeInclusive<u64> = 100..=60_000;
/// Accepted non-zero `pingIntervalMs` values. `0` is also accepted.
pub const PING_INTERVAL_MS: RangeInclusive<u64> = 1000..=600_000;
/// Accepted `commandQueue` values.
pub const COMMAND_QUEUE: RangeInclusive<usize> = 1..=10_000;

/// Timing and queueing for the WebSocket transport.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectionSettings {
    /// Upper bound on the opening handshake, in milliseconds.
    pub connect_timeout_ms: u64,
    /// How long a graceful close may wait for the peer, in milliseconds.
    pub close_timeout_ms: u64,
    /// Keep-alive Ping interval in milliseconds. `0` disables pings.
    pub ping_interval_ms: u64,
    /// Capacity of the user command queue feeding the session.
    pub command_queue: usize,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            connect_timeout_ms: 10_000,
            close_timeout_ms: 5_000,
            ping_interval_ms: 30_000,
            command_queue: 64,
        }
    }
}

impl ConnectionSettings {
    /// Handshake timeout.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Graceful close timeout.
    pub fn close_timeout(&self) -> Duration {
        Duration::from_millis(self.close_timeout_ms)
    }

    /// Keep-alive interval, if enabled.
    pub fn ping_interval(&self) -> Option<Duration> {
        (self.ping_interval_ms > 0).then(|| Duration::from_millis(self.ping_interval_ms))
    }

    /// Reset every out-of-range field to its default, logging each reset.
    pub fn enforce_limits(&mut self) {
        let defaults = Self::default();
        if !CONNECT_TIMEOUT_MS.contains(&self.connect_timeout_ms) {
            warn!(value = self.connect_timeout_ms, "connectTimeoutMs out of range, using default");
            self.connect_timeout_ms = defaults.connect_timeout_ms;
        }
        if !CLOSE_TIMEOUT_MS.contains(&self.close_timeout_ms) {
            warn!(value = self.close_timeout_ms, "closeTimeoutMs out of range, using default");
            self.close_timeout_ms = defaults.close_timeout_ms;
        }
        if self.ping_interval_ms != 0 && !PING_INTERVAL_MS.contains(&self.ping_interval_ms) {
            warn!(value = self.ping_interval_ms, "pingIntervalMs out of range, using default");
            self.ping_interval_ms = defaults.ping_interval_ms;
        }
        if !COMMAND_QUEUE.contains(&self.command_queue) {
            warn!(value = self.command_queue, "commandQueue out of range, using default");
            self.command_queue = defaults.command_queue;
        }
    }
}
