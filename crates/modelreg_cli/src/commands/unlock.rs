//! Unlock command implementation.
//!
//! Only safe when no other process is using the registry: a marker removed
//! from under a live holder lets a second writer in.

use modelreg_core::{AdvisoryLock, Registry};
use tracing::warn;

/// Runs the unlock command.
pub fn run(registry: &Registry, table: bool, ledger: bool) -> Result<(), Box<dyn std::error::Error>> {
    let mut locks = Vec::new();
    if table {
        locks.push(registry.dir().table_lock());
    }
    if ledger {
        locks.push(registry.dir().ledger_lock());
    }

    for lock in &locks {
        report(lock)?;
    }
    Ok(())
}

fn report(lock: &AdvisoryLock) -> Result<(), Box<dyn std::error::Error>> {
    if lock.release()? {
        warn!(resource = lock.resource(), "removed lock marker");
        println!("✓ Removed {}", lock.marker_path().display());
    } else {
        println!("  {} not present", lock.resource());
    }
    Ok(())
}
