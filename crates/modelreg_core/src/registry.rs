//! Registry entry point.

use crate::allocator::IdAllocator;
use crate::clock::{Clock, SystemClock};
use crate::config::RegistryConfig;
use crate::dir::RegistryDir;
use crate::error::{CoreError, CoreResult};
use crate::handle::ModelHandle;
use crate::id::ModelId;
use crate::record::Record;
use crate::store::RecordStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// A model registry rooted at one directory.
///
/// Any number of `Registry` values, in this process or others, may share a
/// root. They coordinate only through the lock markers in that root.
///
/// # Example
///
/// ```rust,no_run
/// use modelreg_core::Registry;
/// use std::path::Path;
///
/// let registry = Registry::open_default(Path::new("models"))?;
/// let mut model = registry.create()?;
/// model.set_field("name", "alpha")?.set_field("epochs", 10)?;
/// let weights = model.file_path("weights", Some("bin"))?;
/// # let _ = weights;
/// # Ok::<(), modelreg_core::CoreError>(())
/// ```
#[derive(Debug)]
pub struct Registry {
    dir: RegistryDir,
    config: RegistryConfig,
    store: RecordStore,
    allocator: IdAllocator,
}

impl Registry {
    /// Opens the registry at `root` using the system clock.
    pub fn open(root: &Path, config: RegistryConfig) -> CoreResult<Self> {
        Self::open_with_clock(root, config, Arc::new(SystemClock))
    }

    /// Opens the registry at `root` with the default configuration.
    pub fn open_default(root: &Path) -> CoreResult<Self> {
        Self::open(root, RegistryConfig::default())
    }

    /// Opens the registry at `root`, taking id timestamps from `clock`.
    pub fn open_with_clock(
        root: &Path,
        config: RegistryConfig,
        clock: Arc<dyn Clock>,
    ) -> CoreResult<Self> {
        let dir = RegistryDir::open(root, config.create_if_missing)?;
        let store = RecordStore::new(dir.clone(), config.clone());
        let allocator = IdAllocator::new(dir.clone(), clock, config.clone());
        Ok(Self {
            dir,
            config,
            store,
            allocator,
        })
    }

    /// Allocates a new id and returns a handle holding only that id.
    ///
    /// Nothing is written to the table until the handle is committed.
    pub fn create(&self) -> CoreResult<ModelHandle<'_>> {
        let id = self.allocator.allocate()?;
        Ok(ModelHandle::new(self, Record::new(id)))
    }

    /// Returns a handle for `id`, loaded from the table if the row exists
    /// and empty otherwise.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` for an empty id.
    pub fn open_model(&self, id: impl Into<ModelId>) -> CoreResult<ModelHandle<'_>> {
        let id = id.into();
        if id.as_str().is_empty() {
            return Err(CoreError::invalid_operation("model id must not be empty"));
        }
        let record = self.store.retrieve(&id)?.unwrap_or_else(|| Record::new(id));
        Ok(ModelHandle::new(self, record))
    }

    /// Returns the stored row for `id`.
    pub fn retrieve(&self, id: &ModelId) -> CoreResult<Option<Record>> {
        self.store.retrieve(id)
    }

    /// Returns the registry root.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Returns the directory of model `id`, without creating it.
    pub fn model_dir(&self, id: &ModelId) -> CoreResult<PathBuf> {
        self.dir.model_dir(id)
    }

    /// Returns the directory layout.
    #[must_use]
    pub fn dir(&self) -> &RegistryDir {
        &self.dir
    }

    /// Returns the record store.
    #[must_use]
    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Returns the id allocator.
    #[must_use]
    pub fn allocator(&self) -> &IdAllocator {
        &self.allocator
    }

    /// Returns the configuration the registry was opened with.
    #[must_use]
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }
}
