//! Stress tests for shared registries.
//!
//! Each worker opens its own [`Registry`] on a common root, the way separate
//! processes would, and contends only through the lock markers.

use modelreg_core::{Clock, ModelId, Registry, RegistryConfig};
use parking_lot::Mutex;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Failed operations.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
    /// Ids of models that were created and committed.
    pub committed: Vec<ModelId>,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, failed: usize, duration: Duration, committed: Vec<ModelId>) -> Self {
        let total = successful + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            failed_ops: failed,
            duration,
            ops_per_second,
            committed,
        }
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {} ===", name);
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Number of concurrent workers.
    pub workers: usize,
    /// Operations per worker.
    pub ops_per_worker: usize,
    /// Registry configuration each worker opens with.
    pub registry: RegistryConfig,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            ops_per_worker: 10,
            registry: RegistryConfig::new()
                .lock_timeout(Duration::from_secs(30))
                .poll_interval(Duration::from_millis(1)),
        }
    }
}

/// Every worker creates models, sets a field tagging itself and commits.
///
/// One operation is one create-set-commit cycle.
pub fn stress_concurrent_creates(
    root: &Path,
    clock: Arc<dyn Clock>,
    config: &StressConfig,
) -> StressTestResult {
    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));
    let committed = Arc::new(Mutex::new(Vec::new()));

    let start = Instant::now();

    let handles: Vec<_> = (0..config.workers)
        .map(|worker| {
            let root = root.to_path_buf();
            let clock = Arc::clone(&clock);
            let registry_config = config.registry.clone();
            let ops = config.ops_per_worker;
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);
            let committed = Arc::clone(&committed);

            thread::spawn(move || {
                let registry = match Registry::open_with_clock(&root, registry_config, clock) {
                    Ok(r) => r,
                    Err(_) => {
                        failed.fetch_add(ops, Ordering::Relaxed);
                        return;
                    }
                };

                for op in 0..ops {
                    let result = registry.create().and_then(|mut model| {
                        model
                            .set_field("worker", worker as i64)?
                            .set_field("op", op as i64)?;
                        model.commit()?;
                        Ok(model.id().clone())
                    });
                    match result {
                        Ok(id) => {
                            successful.fetch_add(1, Ordering::Relaxed);
                            committed.lock().push(id);
                        }
                        Err(_) => {
                            failed.fetch_add(1, Ordering::Relaxed);
                        }
                    }
                }
            })
        })
        .collect();

    for handle in handles {
        let _ = handle.join();
    }

    let committed = committed.lock().clone();
    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
        committed,
    )
}

/// Every worker repeatedly rewrites the same model's row.
///
/// Rows are replaced whole, so the final row's `worker` field names
/// whichever worker committed last.
pub fn stress_same_row_updates(
    root: &Path,
    clock: Arc<dyn Clock>,
    id: &ModelId,
    config: &StressConfig,
) -> StressTestResult {
    let successful = Arc::new(AtomicUsize::new(0));
    let failed = Arc::new(AtomicUsize::new(0));

    let start = Instant::now();

    let handles: Vec<_> = (0..config.workers)
        .map(|worker| {
            let root = root.to_path_buf();
            let clock = Arc::clone(&clock);
            let registry_config = config.registry.clone();
            let ops = config.ops_per_worker;
            let id = id.clone();
            let successful = Arc::clone(&successful);
            let failed = Arc::clone(&failed);

            thread::spawn(move || {
                let registry = match Registry::open_with_clock(&root, registry_config, clock) {
                    Ok(r) => r,
                    Err(_) => {
                        failed.fetch_add(ops, Ordering::Relaxed);
                        return;
                    }
                };

                for op in 0..ops {
                    let result = registry.open_model(id.clone()).and_then(|mut model| {
                        model
                            .set_field("worker", worker as i64)?
                            .set_field(&format!("seen_by_{worker}"), op as i64)?;
                        model.commit()
                    });
                    match result {
                        Ok(_) => successful.fetch_add(1, Ordering::Relaxed),
                        Err(_) => failed.fetch_add(1, Ordering::Relaxed),
                    };
                }
            })
        })
        .collect();

    for handle in handles {
        let _ = handle.join();
    }

    StressTestResult::new(
        successful.load(Ordering::Relaxed),
        failed.load(Ordering::Relaxed),
        start.elapsed(),
        vec![id.clone()],
    )
}
