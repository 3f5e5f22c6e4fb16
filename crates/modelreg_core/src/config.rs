//! Registry configuration.

use std::time::Duration;

/// Configuration for opening a registry.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Whether to create the registry root if it doesn't exist.
    pub create_if_missing: bool,

    /// How long to poll for a lock marker before giving up.
    pub lock_timeout: Duration,

    /// Delay between two attempts to create a lock marker.
    pub poll_interval: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            lock_timeout: Duration::from_secs(60),
            poll_interval: Duration::from_millis(10),
        }
    }
}

impl RegistryConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether to create the registry root if missing.
    #[must_use]
    pub const fn create_if_missing(mut self, value: bool) -> Self {
        self.create_if_missing = value;
        self
    }

    /// Sets the lock timeout.
    #[must_use]
    pub const fn lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Sets the lock poll interval.
    #[must_use]
    pub const fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}
