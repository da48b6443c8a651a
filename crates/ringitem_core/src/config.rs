//! Construction-time configuration.

use std::time::Duration;

/// Controls how an item is placed inside a shared destination sink.
///
/// Producers that build items in place first ask the sink for contiguous
/// space. If it is not there, the producer either waits (bounded by
/// `wait_timeout`) or immediately falls back to an owned buffer that is
/// copied into the sink on commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReserveConfig {
    /// How long to wait for contiguous space before falling back.
    ///
    /// `Duration::ZERO` tries exactly once. A timeout too large to add to the
    /// current instant waits until space appears. Waiting only helps for
    /// sinks whose space is freed by another party through interior or
    /// shared-memory mutability.
    pub wait_timeout: Duration,

    /// Sleep between space checks while waiting.
    pub poll_interval: Duration,

    /// Extra bytes requested on top of the capacity hint, the envelope and a
    /// minimal body header.
    pub slack: usize,
}

impl Default for ReserveConfig {
    fn default() -> Self {
        Self {
            wait_timeout: Duration::ZERO,
            poll_interval: Duration::from_micros(50),
            slack: 64,
        }
    }
}

impl ReserveConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how long to wait for contiguous space.
    #[must_use]
    pub const fn wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = timeout;
        self
    }

    /// Sets the sleep between space checks.
    #[must_use]
    pub const fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the extra bytes requested beyond the item's minimum footprint.
    #[must_use]
    pub const fn slack(mut self, bytes: usize) -> Self {
        self.slack = bytes;
        self
    }
}

/// Configuration for a fragment pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolConfig {
    /// Header blocks allocated up front so the first allocations do not hit
    /// the system allocator.
    pub preallocate_headers: usize,
}

impl PoolConfig {
    /// Creates a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of header blocks allocated up front.
    #[must_use]
    pub const fn preallocate_headers(mut self, count: usize) -> Self {
        self.preallocate_headers = count;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_reserve_config_tries_once() {
        let config = ReserveConfig::default();
        assert_eq!(config.wait_timeout, Duration::ZERO);
        assert_eq!(config.slack, 64);
    }

    #[test]
    fn builder_pattern() {
        let config = ReserveConfig::new()
            .wait_timeout(Duration::from_millis(5))
            .poll_interval(Duration::from_micros(10))
            .slack(0);

        assert_eq!(config.wait_timeout, Duration::from_millis(5));
        assert_eq!(config.poll_interval, Duration::from_micros(10));
        assert_eq!(config.slack, 0);

        let pool = PoolConfig::new().preallocate_headers(16);
        assert_eq!(pool.preallocate_headers, 16);
    }
}
