//! Registry directory management.
//!
//! This module handles the file system layout of a registry:
//!
//! ```text
//! <root>/
//! ├─ modelsinfo.csv    # Record table
//! ├─ usedidlist.csv    # Ledger of issued ids
//! ├─ .infolock         # Lock marker for the record table
//! ├─ .idlistlock       # Lock marker for the ledger
//! └─ <id>/             # One directory per model
//! ```
//!
//! The table and the ledger are always rewritten through a temporary file
//! and a rename, so a reader that does not take the lock sees either the old
//! or the new content, never a partial write.

use crate::error::{CoreError, CoreResult};
use crate::id::ModelId;
use crate::lock::AdvisoryLock;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Component, Path, PathBuf};

/// File names within the registry directory.
pub const TABLE_FILE: &str = "modelsinfo.csv";
/// Ledger of issued ids.
pub const LEDGER_FILE: &str = "usedidlist.csv";
/// Lock marker guarding [`TABLE_FILE`].
pub const TABLE_LOCK: &str = ".infolock";
/// Lock marker guarding [`LEDGER_FILE`].
pub const LEDGER_LOCK: &str = ".idlistlock";

/// The on-disk layout of one registry.
#[derive(Debug, Clone)]
pub struct RegistryDir {
    /// Root directory path.
    path: PathBuf,
}

impl RegistryDir {
    /// Opens or creates a registry directory.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The directory doesn't exist and `create_if_missing` is false
    /// - The path exists but is not a directory
    /// - I/O errors occur
    pub fn open(path: &Path, create_if_missing: bool) -> CoreResult<Self> {
        if !path.exists() {
            if create_if_missing {
                fs::create_dir_all(path)?;
            } else {
                return Err(CoreError::invalid_format(format!(
                    "registry directory does not exist: {}",
                    path.display()
                )));
            }
        }

        if !path.is_dir() {
            return Err(CoreError::invalid_format(format!(
                "path is not a directory: {}",
                path.display()
            )));
        }

        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    /// Returns the registry root.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the path to the record table.
    #[must_use]
    pub fn table_path(&self) -> PathBuf {
        self.path.join(TABLE_FILE)
    }

    /// Returns the path to the id ledger.
    #[must_use]
    pub fn ledger_path(&self) -> PathBuf {
        self.path.join(LEDGER_FILE)
    }

    /// Returns the lock guarding the record table.
    #[must_use]
    pub fn table_lock(&self) -> AdvisoryLock {
        AdvisoryLock::new(&self.path, TABLE_LOCK)
    }

    /// Returns the lock guarding the id ledger.
    #[must_use]
    pub fn ledger_lock(&self) -> AdvisoryLock {
        AdvisoryLock::new(&self.path, LEDGER_LOCK)
    }

    /// Returns the directory owned by model `id`, without creating it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if `id` is not a single plain path
    /// component (empty, `.`, `..`, or containing a separator).
    pub fn model_dir(&self, id: &ModelId) -> CoreResult<PathBuf> {
        let mut components = Path::new(id.as_str()).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) if name == id.as_str() => {
                Ok(self.path.join(name))
            }
            _ => Err(CoreError::invalid_operation(format!(
                "model id `{id}` cannot be used as a directory name"
            ))),
        }
    }

    /// Returns the directory owned by model `id`, creating it if needed.
    pub fn create_model_dir(&self, id: &ModelId) -> CoreResult<PathBuf> {
        let dir = self.model_dir(id)?;
        fs::create_dir_all(&dir)?;
        Ok(dir)
    }

    /// Returns true if model `id` has a directory on disk.
    #[must_use]
    pub fn has_model_dir(&self, id: &ModelId) -> bool {
        self.model_dir(id).map(|d| d.is_dir()).unwrap_or(false)
    }

    /// Checks if this is a new (empty) registry.
    #[must_use]
    pub fn is_new_registry(&self) -> bool {
        !self.table_path().exists() && !self.ledger_path().exists()
    }
}

/// Writes `path` atomically.
///
/// Uses write-then-rename:
/// 1. Write to `<path>.tmp`
/// 2. Sync the temporary file to disk
/// 3. Rename it over `path`
/// 4. Fsync the parent directory so the rename is durable
pub(crate) fn write_atomic<F>(path: &Path, write: F) -> CoreResult<()>
where
    F: FnOnce(&mut File) -> CoreResult<()>,
{
    let mut temp_name = path.as_os_str().to_os_string();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);

    let mut file = File::create(&temp_path)?;
    let written = write(&mut file).and_then(|()| {
        file.flush()?;
        file.sync_all()?;
        Ok(())
    });
    drop(file);
    if let Err(e) = written {
        let _ = fs::remove_file(&temp_path);
        return Err(e);
    }

    fs::rename(&temp_path, path)?;

    if let Some(parent) = path.parent() {
        sync_directory(parent)?;
    }
    Ok(())
}

#[cfg(unix)]
fn sync_directory(dir: &Path) -> CoreResult<()> {
    // On Unix, fsync on a directory syncs the directory entries
    File::open(dir)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_directory(_dir: &Path) -> CoreResult<()> {
    // Directory fsync is not supported on Windows
    Ok(())
}
