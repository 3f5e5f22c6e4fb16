//! Per-model handle for staging and committing metadata.

use crate::error::{CoreError, CoreResult};
use crate::id::ModelId;
use crate::record::{Record, ID_COLUMN};
use crate::registry::Registry;
use crate::table::UpsertReport;
use crate::value::FieldValue;
use std::path::PathBuf;

/// One model's metadata, edited in memory and written on [`commit`].
///
/// Edits that are never committed are lost when the handle is dropped.
///
/// [`commit`]: ModelHandle::commit
#[derive(Debug)]
pub struct ModelHandle<'r> {
    registry: &'r Registry,
    record: Record,
}

impl<'r> ModelHandle<'r> {
    pub(crate) fn new(registry: &'r Registry, record: Record) -> Self {
        Self { registry, record }
    }

    /// Returns the model id.
    #[must_use]
    pub fn id(&self) -> &ModelId {
        self.record.id()
    }

    /// Returns the staged record.
    #[must_use]
    pub fn record(&self) -> &Record {
        &self.record
    }

    /// Stages `name = value`, replacing any value staged before.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if `name` is empty or is the `id` column.
    pub fn set_field(
        &mut self,
        name: &str,
        value: impl Into<FieldValue>,
    ) -> CoreResult<&mut Self> {
        if name.is_empty() || name == ID_COLUMN {
            return Err(CoreError::invalid_operation(format!(
                "`{name}` cannot be used as a field name"
            )));
        }
        self.record.set(name, value.into());
        Ok(self)
    }

    /// Returns the staged value of `name`.
    #[must_use]
    pub fn get_field(&self, name: &str) -> Option<&FieldValue> {
        self.record.get(name)
    }

    /// Writes the staged record to the table, replacing the stored row.
    ///
    /// # Errors
    ///
    /// Returns `LockTimeout` if the table lock could not be obtained, in
    /// which case nothing was written. Staged edits are kept so the caller
    /// can retry.
    pub fn commit(&self) -> CoreResult<UpsertReport> {
        self.registry.store().upsert(&self.record)
    }

    /// Commits, then returns the model directory, creating it if needed.
    pub fn directory(&self) -> CoreResult<PathBuf> {
        self.commit()?;
        self.registry.dir().create_model_dir(self.id())
    }

    /// Commits, then returns the path of `name[.extension]` inside the model
    /// directory. The file itself is not created.
    pub fn file_path(&self, name: &str, extension: Option<&str>) -> CoreResult<PathBuf> {
        let dir = self.directory()?;
        Ok(match extension {
            Some(ext) => dir.join(format!("{name}.{ext}")),
            None => dir.join(name),
        })
    }
}
