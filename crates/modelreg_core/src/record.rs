//! A single row of model metadata.

use crate::id::ModelId;
use crate::value::FieldValue;

/// Name of the key column.
pub const ID_COLUMN: &str = "id";

/// One model's metadata row.
///
/// Fields keep the order in which they were first set, which becomes the
/// order of any columns they add to the table. A field that is absent and a
/// field holding [`FieldValue::Null`] are equivalent once persisted.
///
/// Equality compares the id and the field mapping; field order is ignored.
#[derive(Debug, Clone)]
pub struct Record {
    id: ModelId,
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    /// Creates a record holding only its id.
    #[must_use]
    pub fn new(id: ModelId) -> Self {
        Self {
            id,
            fields: Vec::new(),
        }
    }

    /// Returns the record's id.
    #[must_use]
    pub fn id(&self) -> &ModelId {
        &self.id
    }

    /// Sets a field, replacing any previous value in place.
    ///
    /// The caller is responsible for not passing the key column.
    pub fn set(&mut self, name: &str, value: FieldValue) {
        if let Some(slot) = self.fields.iter_mut().find(|(n, _)| n == name) {
            slot.1 = value;
        } else {
            self.fields.push((name.to_string(), value));
        }
    }

    /// Returns a field's value. Missing fields are `None`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Removes a field, returning its value.
    pub fn remove(&mut self, name: &str) -> Option<FieldValue> {
        let pos = self.fields.iter().position(|(n, _)| n == name)?;
        Some(self.fields.remove(pos).1)
    }

    /// Iterates over field names and values in insertion order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// Iterates over field names in insertion order.
    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(n, _)| n.as_str())
    }

    /// Returns the number of fields, excluding the id.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if the record has no fields besides its id.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns a copy without null fields, as the record reads back from disk.
    #[must_use]
    pub fn without_nulls(&self) -> Self {
        Self {
            id: self.id.clone(),
            fields: self
                .fields
                .iter()
                .filter(|(_, v)| !v.is_null())
                .cloned()
                .collect(),
        }
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.fields.len() == other.fields.len()
            && self.fields().all(|(name, value)| other.get(name) == Some(value))
    }
}
