//! Marker-file advisory locks.
//!
//! A resource is locked while a marker file with the resource's name exists
//! in the registry root. Every participant must honor the marker; the
//! filesystem only guarantees that creating it is atomic.
//!
//! Acquisition uses `create_new` (`O_CREAT | O_EXCL`), so two callers can never
//! both observe "no marker" and both believe they own the lock. Waiting is
//! bounded: when the timeout elapses the caller gets [`CoreError::LockTimeout`]
//! and never proceeds unlocked.
//!
//! A holder that crashes leaks its marker. The `modelreg unlock` command
//! removes leaked markers.

use crate::error::{CoreError, CoreResult};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// An advisory lock over one named resource.
#[derive(Debug, Clone)]
pub struct AdvisoryLock {
    resource: String,
    marker: PathBuf,
}

impl AdvisoryLock {
    /// Creates a lock whose marker is `dir/<resource>`.
    ///
    /// No file is touched until the lock is acquired.
    #[must_use]
    pub fn new(dir: &Path, resource: &str) -> Self {
        Self {
            resource: resource.to_string(),
            marker: dir.join(resource),
        }
    }

    /// Returns the resource name.
    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Returns the path of the marker file.
    #[must_use]
    pub fn marker_path(&self) -> &Path {
        &self.marker
    }

    /// Returns true if a marker currently exists, whoever created it.
    #[must_use]
    pub fn is_held(&self) -> bool {
        self.marker.exists()
    }

    /// Makes a single attempt to create the marker.
    ///
    /// Returns `Ok(false)` if the marker already exists.
    pub fn try_acquire(&self) -> CoreResult<bool> {
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.marker)
        {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Polls until the marker is created or `timeout` elapses.
    ///
    /// The timeout is measured on a monotonic clock. A zero timeout makes
    /// exactly one attempt.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::LockTimeout`] if the marker could not be created
    /// in time, or an I/O error if creating it failed for another reason.
    pub fn acquire(&self, timeout: Duration, poll_interval: Duration) -> CoreResult<LockGuard<'_>> {
        let start = Instant::now();
        loop {
            if self.try_acquire()? {
                debug!(resource = %self.resource, waited = ?start.elapsed(), "lock acquired");
                return Ok(LockGuard {
                    lock: self,
                    released: false,
                });
            }

            let waited = start.elapsed();
            if waited >= timeout {
                warn!(resource = %self.resource, ?waited, "lock timer expired");
                return Err(CoreError::lock_timeout(&self.resource, waited));
            }
            thread::sleep(poll_interval.min(timeout - waited));
        }
    }

    /// Removes the marker if present.
    ///
    /// Returns `Ok(true)` if a marker was removed, `Ok(false)` if there was
    /// none.
    pub fn release(&self) -> CoreResult<bool> {
        match fs::remove_file(&self.marker) {
            Ok(()) => {
                debug!(resource = %self.resource, "lock released");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Holds an acquired [`AdvisoryLock`]; the marker is removed on drop.
#[derive(Debug)]
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct LockGuard<'a> {
    lock: &'a AdvisoryLock,
    released: bool,
}

impl LockGuard<'_> {
    /// Returns the locked resource name.
    #[must_use]
    pub fn resource(&self) -> &str {
        self.lock.resource()
    }

    /// Releases the lock now, reporting whether a marker was removed.
    ///
    /// `Ok(false)` means someone else removed the marker while it was held.
    pub fn release(mut self) -> CoreResult<bool> {
        self.released = true;
        let removed = self.lock.release()?;
        if !removed {
            warn!(resource = %self.lock.resource, "lock marker vanished while held");
        }
        Ok(removed)
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        match self.lock.release() {
            Ok(true) => {}
            Ok(false) => {
                warn!(resource = %self.lock.resource, "lock marker vanished while held");
            }
            Err(e) => {
                warn!(resource = %self.lock.resource, error = %e, "failed to remove lock marker");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::tempdir;

    const POLL: Duration = Duration::from_millis(2);

    #[test]
    fn acquire_creates_and_drop_removes_marker() {
        let temp = tempdir().unwrap();
        let lock = AdvisoryLock::new(temp.path(), ".infolock");

        {
            let guard = lock.acquire(Duration::from_millis(100), POLL).unwrap();
            assert_eq!(guard.resource(), ".infolock");
            assert!(temp.path().join(".infolock").exists());
        }

        assert!(!lock.is_held());
    }

    #[test]
    fn marker_is_empty() {
        let temp = tempdir().unwrap();
        let lock = AdvisoryLock::new(temp.path(), ".infolock");
        let _guard = lock.acquire(Duration::ZERO, POLL).unwrap();

        let len = fs::metadata(lock.marker_path()).unwrap().len();
        assert_eq!(len, 0);
    }

    #[test]
    fn try_acquire_fails_while_held() {
        let temp = tempdir().unwrap();
        let lock = AdvisoryLock::new(temp.path(), ".idlistlock");

        assert!(lock.try_acquire().unwrap());
        assert!(!lock.try_acquire().unwrap());
        assert!(lock.release().unwrap());
        assert!(lock.try_acquire().unwrap());
    }

    #[test]
    fn release_reports_missing_marker() {
        let temp = tempdir().unwrap();
        let lock = AdvisoryLock::new(temp.path(), ".infolock");

        assert!(!lock.release().unwrap());
    }

    #[test]
    fn explicit_guard_release() {
        let temp = tempdir().unwrap();
        let lock = AdvisoryLock::new(temp.path(), ".infolock");

        let guard = lock.acquire(Duration::ZERO, POLL).unwrap();
        assert!(guard.release().unwrap());
        assert!(!lock.is_held());
    }

    #[test]
    fn guard_release_after_outside_unlock() {
        let temp = tempdir().unwrap();
        let lock = AdvisoryLock::new(temp.path(), ".infolock");

        let guard = lock.acquire(Duration::ZERO, POLL).unwrap();
        // `modelreg unlock` removes the marker out from under the holder.
        assert!(AdvisoryLock::new(temp.path(), ".infolock").release().unwrap());
        assert!(!guard.release().unwrap());
        assert!(!lock.is_held());
    }

    #[test]
    fn held_lock_times_out() {
        let temp = tempdir().unwrap();
        let holder = AdvisoryLock::new(temp.path(), ".infolock");
        let _held = holder.acquire(Duration::ZERO, POLL).unwrap();

        let contender = AdvisoryLock::new(temp.path(), ".infolock");
        let start = Instant::now();
        let result = contender.acquire(Duration::from_millis(50), POLL);

        match result {
            Err(CoreError::LockTimeout { resource, waited }) => {
                assert_eq!(resource, ".infolock");
                assert!(waited >= Duration::from_millis(50));
            }
            other => panic!("expected lock timeout, got {other:?}"),
        }
        assert!(start.elapsed() < Duration::from_secs(5));
        // The holder's marker is untouched by the failed contender.
        assert!(holder.is_held());
    }

    #[test]
    fn waiter_acquires_after_release() {
        let temp = tempdir().unwrap();
        let path = temp.path().to_path_buf();
        let lock = AdvisoryLock::new(&path, ".infolock");
        let guard = lock.acquire(Duration::ZERO, POLL).unwrap();

        let waiter = thread::spawn(move || {
            let lock = AdvisoryLock::new(&path, ".infolock");
            let guard = lock.acquire(Duration::from_secs(5), POLL).unwrap();
            drop(guard);
        });

        thread::sleep(Duration::from_millis(20));
        drop(guard);
        waiter.join().unwrap();
        assert!(!lock.is_held());
    }

    #[test]
    fn mutual_exclusion_across_threads() {
        let temp = tempdir().unwrap();
        let inside = Arc::new(AtomicUsize::new(0));
        let max_inside = Arc::new(AtomicUsize::new(0));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let path = temp.path().to_path_buf();
                let inside = Arc::clone(&inside);
                let max_inside = Arc::clone(&max_inside);
                thread::spawn(move || {
                    let lock = AdvisoryLock::new(&path, ".infolock");
                    for _ in 0..10 {
                        let guard = lock.acquire(Duration::from_secs(10), POLL).unwrap();
                        let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                        max_inside.fetch_max(now, Ordering::SeqCst);
                        thread::sleep(Duration::from_micros(200));
                        inside.fetch_sub(1, Ordering::SeqCst);
                        drop(guard);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
    }
}
