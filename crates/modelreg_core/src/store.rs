//! Locked access to the shared record table.

use crate::config::RegistryConfig;
use crate::dir::RegistryDir;
use crate::error::CoreResult;
use crate::id::ModelId;
use crate::lock::AdvisoryLock;
use crate::record::Record;
use crate::table::{RecordTable, UpsertReport};
use tracing::{debug, info};

/// Reads and merges rows of the record table.
///
/// Every mutation is a full load-merge-save cycle under the table lock.
/// Reads skip the lock; since the file is replaced by rename they always see
/// a complete table, possibly one write behind.
#[derive(Debug, Clone)]
pub struct RecordStore {
    dir: RegistryDir,
    lock: AdvisoryLock,
    config: RegistryConfig,
}

impl RecordStore {
    /// Creates a store over the table in `dir`.
    #[must_use]
    pub fn new(dir: RegistryDir, config: RegistryConfig) -> Self {
        let lock = dir.table_lock();
        Self { dir, lock, config }
    }

    /// Inserts `record` or replaces the row with the same id.
    ///
    /// # Errors
    ///
    /// Returns [`crate::CoreError::LockTimeout`] if the table lock cannot be
    /// obtained; the table is left untouched and the caller must treat the
    /// record as not persisted.
    pub fn upsert(&self, record: &Record) -> CoreResult<UpsertReport> {
        self.with_table(|table| table.upsert(record.clone()))
            .inspect(|report| {
                debug!(
                    id = %record.id(),
                    outcome = ?report.outcome,
                    added_columns = ?report.added_columns,
                    "upserted record"
                );
            })
    }

    /// Returns the row for `id`, or `None` if there is none.
    pub fn retrieve(&self, id: &ModelId) -> CoreResult<Option<Record>> {
        let table = self.snapshot()?;
        Ok(table.get(id).cloned())
    }

    /// Returns the whole table, read without the lock.
    pub fn snapshot(&self) -> CoreResult<RecordTable> {
        RecordTable::load(&self.dir.table_path())
    }

    /// Returns every id in the table, read without the lock.
    pub fn ids(&self) -> CoreResult<Vec<ModelId>> {
        Ok(self.snapshot()?.ids().cloned().collect())
    }

    /// Removes rows whose model directory no longer exists.
    ///
    /// Runs under the table lock. The table is only rewritten if a row was
    /// removed. Returns the removed ids.
    pub fn prune_orphans(&self) -> CoreResult<Vec<ModelId>> {
        let removed = self.with_table(|table| {
            Ok(table.retain(|record| self.dir.has_model_dir(record.id())))
        })?;
        for id in &removed {
            info!(%id, "removed row for missing model directory");
        }
        Ok(removed)
    }

    /// Returns ids whose model directory no longer exists, without changing
    /// anything.
    pub fn orphans(&self) -> CoreResult<Vec<ModelId>> {
        Ok(self
            .snapshot()?
            .ids()
            .filter(|id| !self.dir.has_model_dir(id))
            .cloned()
            .collect())
    }

    /// Returns the lock guarding the table.
    #[must_use]
    pub fn lock(&self) -> &AdvisoryLock {
        &self.lock
    }

    /// Runs `f` on the freshly loaded table under the lock and saves it.
    ///
    /// `f` may leave the table unchanged, in which case nothing is written.
    fn with_table<T, F>(&self, f: F) -> CoreResult<T>
    where
        F: FnOnce(&mut RecordTable) -> CoreResult<T>,
    {
        let guard = self
            .lock
            .acquire(self.config.lock_timeout, self.config.poll_interval)?;

        let path = self.dir.table_path();
        let mut table = RecordTable::load(&path)?;
        let before = table.clone();
        let result = f(&mut table)?;
        if table != before {
            table.save(&path)?;
        }

        guard.release()?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::table::UpsertOutcome;
    use crate::value::FieldValue;
    use std::fs;
    use std::path::Path;
    use std::time::Duration;
    use tempfile::tempdir;

    fn store(root: &Path) -> RecordStore {
        let config = RegistryConfig::new()
            .lock_timeout(Duration::from_millis(50))
            .poll_interval(Duration::from_millis(1));
        RecordStore::new(RegistryDir::open(root, true).unwrap(), config)
    }

    fn named(id: &str, name: &str) -> Record {
        let mut r = Record::new(ModelId::from(id));
        r.set("name", name.into());
        r
    }

    #[test]
    fn upsert_then_retrieve() {
        let temp = tempdir().unwrap();
        let store = store(temp.path());

        let report = store.upsert(&named("a", "alpha")).unwrap();
        assert_eq!(report.outcome, UpsertOutcome::Inserted);

        let got = store.retrieve(&ModelId::from("a")).unwrap().unwrap();
        assert_eq!(got, named("a", "alpha"));
        assert!(!store.lock().is_held());
    }

    #[test]
    fn number_like_text_survives_other_commits() {
        let temp = tempdir().unwrap();
        let store = store(temp.path());

        let mut m = Record::new(ModelId::from("m"));
        m.set("zip", "007".into());
        m.set("ver", "1e3".into());
        store.upsert(&m).unwrap();
        store.upsert(&named("n", "x")).unwrap();

        let got = store.retrieve(&ModelId::from("m")).unwrap().unwrap();
        assert_eq!(got.get("zip"), Some(&FieldValue::from("007")));
        assert_eq!(got.get("ver"), Some(&FieldValue::from("1e3")));
        assert_eq!(
            fs::read_to_string(temp.path().join("modelsinfo.csv")).unwrap(),
            "id,zip,ver,name\nm,007,1e3,\nn,,,x\n"
        );
    }

    #[test]
    fn empty_id_is_rejected_and_table_stays_readable() {
        let temp = tempdir().unwrap();
        let store = store(temp.path());
        store.upsert(&named("a", "alpha")).unwrap();

        let result = store.upsert(&named("", "x"));
        assert!(matches!(result, Err(CoreError::InvalidOperation { .. })));
        assert!(!store.lock().is_held());

        assert_eq!(store.ids().unwrap(), vec![ModelId::from("a")]);
        store.upsert(&named("b", "bravo")).unwrap();
        assert_eq!(store.snapshot().unwrap().len(), 2);
    }

    #[test]
    fn retrieve_missing_is_none() {
        let temp = tempdir().unwrap();
        let store = store(temp.path());

        assert!(store.retrieve(&ModelId::from("nope")).unwrap().is_none());
    }

    #[test]
    fn new_column_is_null_for_other_rows() {
        let temp = tempdir().unwrap();
        let store = store(temp.path());

        store.upsert(&named("a", "alpha")).unwrap();
        store.upsert(&named("b", "bravo")).unwrap();

        let mut a = named("a", "alpha");
        a.set("accuracy", 0.9.into());
        let report = store.upsert(&a).unwrap();
        assert_eq!(report.outcome, UpsertOutcome::Replaced);
        assert_eq!(report.added_columns, vec!["accuracy".to_string()]);

        let b = store.retrieve(&ModelId::from("b")).unwrap().unwrap();
        assert_eq!(b.get("name"), Some(&FieldValue::from("bravo")));
        assert_eq!(b.get("accuracy"), None);
        assert_eq!(
            fs::read_to_string(temp.path().join("modelsinfo.csv")).unwrap(),
            "id,name,accuracy\na,alpha,0.9\nb,bravo,\n"
        );
    }

    #[test]
    fn locked_table_rejects_upsert() {
        let temp = tempdir().unwrap();
        let store = store(temp.path());
        store.upsert(&named("a", "alpha")).unwrap();

        let other = AdvisoryLock::new(temp.path(), ".infolock");
        let held = other.acquire(Duration::ZERO, Duration::from_millis(1)).unwrap();

        let result = store.upsert(&named("a", "changed"));
        assert!(matches!(result, Err(CoreError::LockTimeout { .. })));
        // Reads still work while the lock is held.
        let got = store.retrieve(&ModelId::from("a")).unwrap().unwrap();
        assert_eq!(got.get("name"), Some(&FieldValue::from("alpha")));

        drop(held);
        store.upsert(&named("a", "changed")).unwrap();
    }

    #[test]
    fn concurrent_upserts_of_different_ids_all_land() {
        let temp = tempdir().unwrap();

        let handles: Vec<_> = (0..2)
            .map(|worker| {
                let root = temp.path().to_path_buf();
                std::thread::spawn(move || {
                    let config = RegistryConfig::new()
                        .lock_timeout(Duration::from_secs(10))
                        .poll_interval(Duration::from_millis(1));
                    let store = RecordStore::new(RegistryDir::open(&root, true).unwrap(), config);
                    for i in 0..15i64 {
                        let mut r = Record::new(ModelId::new(format!("w{worker}_{i}")));
                        r.set(&format!("col_{worker}"), i.into());
                        store.upsert(&r).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let table = store(temp.path()).snapshot().unwrap();
        assert_eq!(table.len(), 30);
        assert!(table.duplicate_ids().is_empty());
        assert!(table.has_column("col_0"));
        assert!(table.has_column("col_1"));
    }

    #[test]
    fn prune_removes_rows_without_directory() {
        let temp = tempdir().unwrap();
        let store = store(temp.path());
        store.upsert(&named("kept", "k")).unwrap();
        store.upsert(&named("gone", "g")).unwrap();
        fs::create_dir(temp.path().join("kept")).unwrap();

        assert_eq!(store.orphans().unwrap(), vec![ModelId::from("gone")]);
        let removed = store.prune_orphans().unwrap();
        assert_eq!(removed, vec![ModelId::from("gone")]);
        assert_eq!(store.ids().unwrap(), vec![ModelId::from("kept")]);
        // Columns survive pruning.
        assert!(store.snapshot().unwrap().has_column("name"));
    }

    #[test]
    fn prune_without_orphans_does_not_write() {
        let temp = tempdir().unwrap();
        let store = store(temp.path());

        assert!(store.prune_orphans().unwrap().is_empty());
        assert!(!temp.path().join("modelsinfo.csv").exists());
    }
}
