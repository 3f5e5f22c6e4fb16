//! Test fixtures and registry helpers.
//!
//! Provides temporary registries whose id timestamps come from a
//! [`FixedClock`], so allocated ids are predictable.

use chrono::{NaiveDate, NaiveDateTime};
use modelreg_core::{FixedClock, Registry, RegistryConfig};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

/// The instant test registries start at: 2024-06-15 09:30.
pub fn default_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 6, 15)
        .and_then(|d| d.and_hms_opt(9, 30, 0))
        .expect("valid fixture time")
}

/// A configuration with short lock timeouts, so contention tests fail fast.
pub fn fast_config() -> RegistryConfig {
    RegistryConfig::new()
        .lock_timeout(Duration::from_millis(100))
        .poll_interval(Duration::from_millis(1))
}

/// A configuration patient enough for many workers to queue on one lock.
pub fn patient_config() -> RegistryConfig {
    RegistryConfig::new()
        .lock_timeout(Duration::from_secs(30))
        .poll_interval(Duration::from_millis(1))
}

/// A registry in a temporary directory with automatic cleanup.
pub struct TestRegistry {
    /// The registry instance.
    pub registry: Registry,
    clock: Arc<FixedClock>,
    config: RegistryConfig,
    /// The temporary directory (kept alive to prevent cleanup).
    _temp_dir: TempDir,
}

impl TestRegistry {
    /// Creates a registry at [`default_time`] with [`fast_config`].
    pub fn new() -> Self {
        Self::with(default_time(), fast_config())
    }

    /// Creates a registry whose clock starts at `now`.
    pub fn at(now: NaiveDateTime) -> Self {
        Self::with(now, fast_config())
    }

    /// Creates a registry with an explicit start time and configuration.
    pub fn with(now: NaiveDateTime, config: RegistryConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let clock = Arc::new(FixedClock::new(now));
        let registry = Registry::open_with_clock(temp_dir.path(), config.clone(), clock.clone())
            .expect("Failed to open test registry");

        Self {
            registry,
            clock,
            config,
            _temp_dir: temp_dir,
        }
    }

    /// Returns the registry root.
    pub fn root(&self) -> &Path {
        self.registry.root()
    }

    /// Returns the clock driving id allocation.
    pub fn clock(&self) -> &FixedClock {
        &self.clock
    }

    /// Opens a second registry on the same root, as another process would.
    pub fn open_peer(&self) -> Registry {
        Registry::open_with_clock(self.root(), self.config.clone(), self.clock.clone())
            .expect("Failed to open peer registry")
    }
}

impl Default for TestRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::ops::Deref for TestRegistry {
    type Target = Registry;

    fn deref(&self) -> &Self::Target {
        &self.registry
    }
}

/// Runs a test with a temporary registry.
pub fn with_temp_registry<F, R>(f: F) -> R
where
    F: FnOnce(&Registry) -> R,
{
    let test_registry = TestRegistry::new();
    f(&test_registry.registry)
}

/// Test scenario helpers.
pub mod scenarios {
    use super::*;
    use modelreg_core::ModelId;

    /// Creates a registry with `count` committed models, each with a
    /// directory and a `name` and `index` field.
    pub fn populated_registry(count: usize) -> (TestRegistry, Vec<ModelId>) {
        let test_registry = TestRegistry::new();
        let mut ids = Vec::with_capacity(count);

        for i in 0..count {
            let mut model = test_registry.create().expect("Failed to create model");
            model
                .set_field("name", format!("model_{i}"))
                .and_then(|m| m.set_field("index", i as i64))
                .expect("Failed to set fields");
            model.directory().expect("Failed to commit model");
            ids.push(model.id().clone());
        }

        (test_registry, ids)
    }
}
