//! Prune command implementation.
//!
//! Drops table rows whose model directory was deleted. The ledger is left
//! alone so pruned ids are never issued again.

use modelreg_core::Registry;
use tracing::info;

/// Runs the prune command.
pub fn run(registry: &Registry, dry_run: bool) -> Result<(), Box<dyn std::error::Error>> {
    println!("Pruning registry at {:?}", registry.root());
    if dry_run {
        println!("(dry run - no changes will be made)");
    }
    println!();

    let removed = if dry_run {
        registry.store().orphans()?
    } else {
        registry.store().prune_orphans()?
    };

    if removed.is_empty() {
        println!("No missing models - table is already clean");
        return Ok(());
    }

    for id in &removed {
        println!("Found non-existing model {id}");
    }
    println!();
    if dry_run {
        println!("{} row(s) would be removed", removed.len());
    } else {
        info!(removed = removed.len(), "prune complete");
        println!("✓ Removed {} row(s)", removed.len());
    }

    Ok(())
}
