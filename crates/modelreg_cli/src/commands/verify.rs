//! Verify command implementation.

use modelreg_core::{CoreResult, ModelId, Registry};
use std::collections::HashSet;

/// Verification result.
#[derive(Debug, Default)]
pub struct VerifyReport {
    /// Rows in the table.
    pub rows: usize,
    /// Ids in the ledger.
    pub issued: usize,
    /// Ids appearing on more than one row.
    pub duplicate_ids: Vec<ModelId>,
    /// Table ids that the allocator never issued (opened by explicit id).
    pub unissued_ids: Vec<ModelId>,
    /// Issued ids that were never committed.
    pub uncommitted_ids: Vec<ModelId>,
    /// Table ids without a model directory.
    pub missing_dirs: Vec<ModelId>,
    /// Lock markers currently present.
    pub held_locks: Vec<String>,
}

impl VerifyReport {
    /// Duplicate rows are the only hard failure; everything else is advisory.
    pub fn is_ok(&self) -> bool {
        self.duplicate_ids.is_empty()
    }
}

/// Collects the report without printing.
pub fn check(registry: &Registry) -> CoreResult<VerifyReport> {
    let table = registry.store().snapshot()?;
    let ledger = registry.allocator().ledger()?;
    let table_ids: HashSet<&ModelId> = table.ids().collect();

    let held_locks = [registry.dir().table_lock(), registry.dir().ledger_lock()]
        .iter()
        .filter(|lock| lock.is_held())
        .map(|lock| lock.resource().to_string())
        .collect();

    Ok(VerifyReport {
        rows: table.len(),
        issued: ledger.len(),
        duplicate_ids: table.duplicate_ids(),
        unissued_ids: table
            .ids()
            .filter(|id| !ledger.contains(id))
            .cloned()
            .collect(),
        uncommitted_ids: ledger
            .iter()
            .filter(|id| !table_ids.contains(id))
            .cloned()
            .collect(),
        missing_dirs: table
            .ids()
            .filter(|id| !registry.dir().has_model_dir(id))
            .cloned()
            .collect(),
        held_locks,
    })
}

/// Runs the verify command.
pub fn run(registry: &Registry) -> Result<(), Box<dyn std::error::Error>> {
    println!("Verifying registry at {:?}", registry.root());
    println!();

    let report = check(registry)?;
    println!("  Rows:       {}", report.rows);
    println!("  Issued ids: {}", report.issued);
    print_ids("Duplicate ids", &report.duplicate_ids);
    print_ids("Ids not in ledger", &report.unissued_ids);
    print_ids("Issued but never committed", &report.uncommitted_ids);
    print_ids("Rows without directory (run `prune`)", &report.missing_dirs);
    for lock in &report.held_locks {
        println!("  Lock held: {lock} (run `unlock` if no process is using the registry)");
    }

    println!();
    if report.is_ok() {
        println!("✓ Registry verification passed");
        Ok(())
    } else {
        println!("✗ Registry verification failed");
        Err("Verification failed".into())
    }
}

fn print_ids(label: &str, ids: &[ModelId]) {
    if ids.is_empty() {
        return;
    }
    println!("  {label}: {}", ids.len());
    for id in ids {
        println!("    - {id}");
    }
}
