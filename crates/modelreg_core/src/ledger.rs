//! The ledger of issued identifiers.

use crate::dir::write_atomic;
use crate::error::{CoreError, CoreResult};
use crate::id::ModelId;
use crate::record::ID_COLUMN;
use std::collections::HashSet;
use std::fs::File;
use std::io;
use std::path::Path;

/// Every identifier the allocator has ever issued, in issue order.
///
/// Stored as a CSV file with a single `id` column.
#[derive(Debug, Clone, Default)]
pub struct IdLedger {
    ids: Vec<ModelId>,
    issued: HashSet<ModelId>,
}

impl IdLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the ledger from `path`. A missing or empty file is an empty ledger.
    pub fn load(path: &Path) -> CoreResult<Self> {
        match File::open(path) {
            Ok(file) => Self::from_reader(file),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes the ledger to `path` via a temporary file and rename.
    pub fn save(&self, path: &Path) -> CoreResult<()> {
        write_atomic(path, |file| self.write_to(file))
    }

    /// Parses a ledger from CSV. Columns after `id` are ignored.
    pub fn from_reader<R: io::Read>(reader: R) -> CoreResult<Self> {
        let mut csv = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = csv.headers()?;
        let mut ledger = Self::new();
        if headers.is_empty() {
            return Ok(ledger);
        }
        if headers.get(0) != Some(ID_COLUMN) {
            return Err(CoreError::invalid_format(format!(
                "ledger must start with an `{ID_COLUMN}` column"
            )));
        }

        for row in csv.records() {
            let row = row?;
            if let Some(id) = row.get(0).filter(|id| !id.is_empty()) {
                ledger.push(ModelId::new(id));
            }
        }
        Ok(ledger)
    }

    /// Serializes the ledger as CSV.
    pub fn write_to<W: io::Write>(&self, writer: W) -> CoreResult<()> {
        let mut csv = csv::Writer::from_writer(writer);
        csv.write_record([ID_COLUMN])?;
        for id in &self.ids {
            csv.write_record([id.as_str()])?;
        }
        csv.flush()?;
        Ok(())
    }

    /// Returns true if `id` was issued.
    #[must_use]
    pub fn contains(&self, id: &ModelId) -> bool {
        self.issued.contains(id)
    }

    /// Records `id` as issued. Returns false if it already was.
    pub fn push(&mut self, id: ModelId) -> bool {
        if self.issued.insert(id.clone()) {
            self.ids.push(id);
            true
        } else {
            false
        }
    }

    /// Iterates over issued ids in issue order.
    pub fn iter(&self) -> impl Iterator<Item = &ModelId> {
        self.ids.iter()
    }

    /// Returns the number of issued ids.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Returns true if nothing was issued yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
