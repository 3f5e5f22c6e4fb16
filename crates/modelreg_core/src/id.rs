//! Model identifier.

use chrono::NaiveDateTime;
use std::fmt;

/// Format of the minute-resolution base: `YYMMDD_HHMM`.
pub const BASE_FORMAT: &str = "%y%m%d_%H%M";

/// Identifier of a registered model.
///
/// Allocated identifiers look like `240615_0930_0`: the local minute they
/// were issued in, followed by a per-minute sequence number. Identifiers
/// opened by callers are taken verbatim and need not follow that shape.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ModelId(String);

impl ModelId {
    /// Wraps an identifier string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Builds the identifier for `time` with the given sequence number.
    #[must_use]
    pub fn from_parts(time: NaiveDateTime, sequence: u32) -> Self {
        Self(format!("{}_{sequence}", minute_base(time)))
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the part before the sequence suffix, if the id has one.
    #[must_use]
    pub fn base(&self) -> Option<&str> {
        self.split().map(|(base, _)| base)
    }

    /// Returns the per-minute sequence number, if the id has one.
    #[must_use]
    pub fn sequence(&self) -> Option<u32> {
        self.split().map(|(_, seq)| seq)
    }

    fn split(&self) -> Option<(&str, u32)> {
        let (base, seq) = self.0.rsplit_once('_')?;
        let seq = seq.parse().ok()?;
        Some((base, seq))
    }

    /// Consumes the id, returning the inner string.
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

/// Formats `time` truncated to the minute as `YYMMDD_HHMM`.
#[must_use]
pub fn minute_base(time: NaiveDateTime) -> String {
    time.format(BASE_FORMAT).to_string()
}

impl fmt::Display for ModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ModelId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ModelId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ModelId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<ModelId> for String {
    fn from(id: ModelId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn morning() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_opt(9, 30, 42)
            .unwrap()
    }

    #[test]
    fn from_parts_truncates_to_minute() {
        let id = ModelId::from_parts(morning(), 0);
        assert_eq!(id.as_str(), "240615_0930_0");
    }

    #[test]
    fn base_and_sequence() {
        let id = ModelId::from("240101_1200_12");
        assert_eq!(id.base(), Some("240101_1200"));
        assert_eq!(id.sequence(), Some(12));
    }

    #[test]
    fn free_form_ids_have_no_sequence() {
        let id = ModelId::from("baseline");
        assert_eq!(id.base(), None);
        assert_eq!(id.sequence(), None);

        let id = ModelId::from("resnet_large");
        assert_eq!(id.sequence(), None);
    }

    #[test]
    fn display() {
        let id = ModelId::from("240101_1200_0");
        assert_eq!(format!("{id}"), "240101_1200_0");
    }
}
