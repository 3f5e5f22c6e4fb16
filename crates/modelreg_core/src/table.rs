//! The shared, schema-evolving record table.
//!
//! On disk the table is a CSV file whose header starts with `id`; every other
//! header cell is a metadata column and an empty cell is null. The column set
//! only grows: upserting a record with a new field appends a column, and every
//! other row reads as null in it.
//!
//! Rows are held without null fields, so a table read back from disk compares
//! equal to the table that was written.

use crate::dir::write_atomic;
use crate::error::{CoreError, CoreResult};
use crate::id::ModelId;
use crate::record::{Record, ID_COLUMN};
use crate::value::FieldValue;
use std::collections::HashSet;
use std::fs::File;
use std::io;
use std::path::Path;

/// Whether an upsert added a row or replaced one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// The id was new.
    Inserted,
    /// A row with the same id was replaced.
    Replaced,
}

/// What an upsert did to the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpsertReport {
    /// Insert or replace.
    pub outcome: UpsertOutcome,
    /// Columns that did not exist before this upsert.
    pub added_columns: Vec<String>,
}

/// An in-memory copy of the record table.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordTable {
    /// Metadata columns in header order, excluding `id`.
    columns: Vec<String>,
    /// Same names as `columns`, for membership checks.
    column_set: HashSet<String>,
    rows: Vec<Record>,
}

impl RecordTable {
    /// Creates an empty table with only the `id` column.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the table from `path`. A missing or empty file is an empty table.
    pub fn load(path: &Path) -> CoreResult<Self> {
        match File::open(path) {
            Ok(file) => Self::from_reader(file),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Writes the table to `path` via a temporary file and rename.
    pub fn save(&self, path: &Path) -> CoreResult<()> {
        write_atomic(path, |file| self.write_to(file))
    }

    /// Parses a table from CSV.
    pub fn from_reader<R: io::Read>(reader: R) -> CoreResult<Self> {
        let mut csv = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let headers = csv.headers()?.clone();
        let mut table = Self::new();
        if headers.is_empty() {
            return Ok(table);
        }
        if headers.get(0) != Some(ID_COLUMN) {
            return Err(CoreError::invalid_format(format!(
                "first column must be `{ID_COLUMN}`, found `{}`",
                headers.get(0).unwrap_or_default()
            )));
        }
        for name in headers.iter().skip(1) {
            if name == ID_COLUMN || !table.add_column(name) {
                return Err(CoreError::invalid_format(format!(
                    "duplicate column `{name}`"
                )));
            }
        }

        for (line, row) in csv.records().enumerate() {
            let row = row?;
            let id = row.get(0).unwrap_or_default();
            if id.is_empty() {
                return Err(CoreError::invalid_format(format!(
                    "row {} has an empty id",
                    line + 1
                )));
            }
            let mut record = Record::new(ModelId::new(id));
            for (name, cell) in table.columns.iter().zip(row.iter().skip(1)) {
                let value = FieldValue::parse_cell(cell);
                if !value.is_null() {
                    record.set(name, value);
                }
            }
            table.rows.push(record);
        }

        Ok(table)
    }

    /// Serializes the table as CSV.
    pub fn write_to<W: io::Write>(&self, writer: W) -> CoreResult<()> {
        let mut csv = csv::Writer::from_writer(writer);

        csv.write_record(self.header())?;
        for record in &self.rows {
            let mut row = Vec::with_capacity(self.columns.len() + 1);
            row.push(record.id().as_str().to_string());
            for name in &self.columns {
                row.push(record.get(name).map(FieldValue::to_cell).unwrap_or_default());
            }
            csv.write_record(&row)?;
        }
        csv.flush()?;
        Ok(())
    }

    /// Returns the header: `id` followed by the metadata columns.
    pub fn header(&self) -> impl Iterator<Item = &str> {
        std::iter::once(ID_COLUMN).chain(self.columns.iter().map(String::as_str))
    }

    /// Returns the metadata columns, excluding `id`.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Returns true if the table has a column called `name`.
    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        name == ID_COLUMN || self.column_set.contains(name)
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterates over rows in file order.
    pub fn rows(&self) -> impl Iterator<Item = &Record> {
        self.rows.iter()
    }

    /// Iterates over row ids in file order.
    pub fn ids(&self) -> impl Iterator<Item = &ModelId> {
        self.rows.iter().map(Record::id)
    }

    /// Returns the row for `id`.
    #[must_use]
    pub fn get(&self, id: &ModelId) -> Option<&Record> {
        self.rows.iter().find(|r| r.id() == id)
    }

    /// Returns true if a row for `id` exists.
    #[must_use]
    pub fn contains(&self, id: &ModelId) -> bool {
        self.get(id).is_some()
    }

    /// Adds any of `names` that are not columns yet, returning the new ones.
    ///
    /// Existing rows read as null in the new columns.
    pub fn widen<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let mut added = Vec::new();
        for name in names {
            if name != ID_COLUMN && self.add_column(name) {
                added.push(name.to_string());
            }
        }
        added
    }

    fn add_column(&mut self, name: &str) -> bool {
        if self.column_set.insert(name.to_string()) {
            self.columns.push(name.to_string());
            true
        } else {
            false
        }
    }

    /// Inserts `record`, or replaces the whole row with the same id.
    ///
    /// Columns the record introduces are added first. Fields of the old row
    /// that the record does not carry become null. Duplicate rows for the id,
    /// which only an outside edit of the file can create, are collapsed.
    ///
    /// # Errors
    ///
    /// Returns `InvalidOperation` if the record's id is empty or the record
    /// carries a field named `id`. The table is left untouched.
    pub fn upsert(&mut self, record: Record) -> CoreResult<UpsertReport> {
        if record.id().as_str().is_empty() {
            return Err(CoreError::invalid_operation("record id must not be empty"));
        }
        if record.get(ID_COLUMN).is_some() {
            return Err(CoreError::invalid_operation(
                "record fields must not include the `id` column",
            ));
        }

        let added_columns = self.widen(record.column_names().collect::<Vec<_>>());
        let record = record.without_nulls();

        let outcome = match self.rows.iter().position(|r| r.id() == record.id()) {
            Some(pos) => {
                let id = record.id().clone();
                self.rows[pos] = record;
                let mut index = 0;
                self.rows.retain(|r| {
                    let keep = index <= pos || r.id() != &id;
                    index += 1;
                    keep
                });
                UpsertOutcome::Replaced
            }
            None => {
                self.rows.push(record);
                UpsertOutcome::Inserted
            }
        };

        Ok(UpsertReport {
            outcome,
            added_columns,
        })
    }

    /// Keeps only the rows for which `keep` returns true, returning the ids
    /// of removed rows. Columns are left as they are.
    pub fn retain<F>(&mut self, mut keep: F) -> Vec<ModelId>
    where
        F: FnMut(&Record) -> bool,
    {
        let mut removed = Vec::new();
        self.rows.retain(|r| {
            let k = keep(r);
            if !k {
                removed.push(r.id().clone());
            }
            k
        });
        removed
    }

    /// Returns ids that appear on more than one row.
    #[must_use]
    pub fn duplicate_ids(&self) -> Vec<ModelId> {
        let mut seen = HashSet::new();
        let mut dups = Vec::new();
        for id in self.ids() {
            if !seen.insert(id) && !dups.contains(id) {
                dups.push(id.clone());
            }
        }
        dups
    }
}
