//! Time-derived identifier allocation.
//!
//! A new id is the current local minute (`YYMMDD_HHMM`) plus the smallest
//! sequence suffix that the ledger has not seen yet: `240615_0930_0`, then
//! `240615_0930_1` for a second model registered in the same minute.
//!
//! The whole load-pick-append-save cycle runs under the ledger lock, so an id
//! is on disk in the ledger before it is handed out. Probing suffixes is
//! linear in the number of ids already issued for that minute.

use crate::clock::Clock;
use crate::config::RegistryConfig;
use crate::dir::RegistryDir;
use crate::error::{CoreError, CoreResult};
use crate::id::ModelId;
use crate::ledger::IdLedger;
use crate::lock::AdvisoryLock;
use std::sync::Arc;
use tracing::debug;

/// Issues collision-free model ids.
pub struct IdAllocator {
    dir: RegistryDir,
    lock: AdvisoryLock,
    clock: Arc<dyn Clock>,
    config: RegistryConfig,
}

impl IdAllocator {
    /// Creates an allocator over the ledger in `dir`.
    pub fn new(dir: RegistryDir, clock: Arc<dyn Clock>, config: RegistryConfig) -> Self {
        let lock = dir.ledger_lock();
        Self {
            dir,
            lock,
            clock,
            config,
        }
    }

    /// Issues a new id and records it in the ledger.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AllocationFailed`] if the ledger lock cannot be
    /// obtained within the configured timeout. No id is returned in that
    /// case, since uniqueness could not be checked.
    pub fn allocate(&self) -> CoreResult<ModelId> {
        let guard = self
            .lock
            .acquire(self.config.lock_timeout, self.config.poll_interval)
            .map_err(|e| match e {
                CoreError::LockTimeout { resource, waited } => CoreError::allocation_failed(
                    format!("{resource} still locked after {waited:?}"),
                ),
                other => other,
            })?;

        let path = self.dir.ledger_path();
        let mut ledger = IdLedger::load(&path)?;
        let id = next_free(&ledger, self.clock.as_ref());
        ledger.push(id.clone());
        ledger.save(&path)?;

        guard.release()?;
        debug!(%id, issued = ledger.len(), "allocated model id");
        Ok(id)
    }

    /// Returns a snapshot of the ledger, read without the lock.
    pub fn ledger(&self) -> CoreResult<IdLedger> {
        IdLedger::load(&self.dir.ledger_path())
    }
}

impl std::fmt::Debug for IdAllocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdAllocator")
            .field("ledger", &self.dir.ledger_path())
            .finish_non_exhaustive()
    }
}

/// Picks the first `<minute>_<n>` not present in `ledger`.
fn next_free(ledger: &IdLedger, clock: &dyn Clock) -> ModelId {
    let now = clock.now();
    (0u32..)
        .map(|seq| ModelId::from_parts(now, seq))
        .find(|id| !ledger.contains(id))
        .unwrap_or_else(|| ModelId::from_parts(now, u32::MAX))
}
