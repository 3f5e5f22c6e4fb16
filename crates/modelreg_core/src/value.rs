//! Scalar cell values.

use std::fmt;

/// A single metadata value.
///
/// Values are stored as text cells. Reading a cell back infers the variant:
/// an empty cell is [`FieldValue::Null`], a cell that is exactly how an
/// integer or finite float renders is that number, and anything else is
/// text. Writing a parsed cell always reproduces the original text, so
/// `007` or `1e3` stay text.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum FieldValue {
    /// Missing value.
    #[default]
    Null,
    /// Signed integer.
    Int(i64),
    /// Floating point number.
    Float(f64),
    /// Free text.
    Text(String),
}

impl FieldValue {
    /// Infers a value from a table cell.
    #[must_use]
    pub fn parse_cell(cell: &str) -> Self {
        if cell.is_empty() {
            return Self::Null;
        }
        if let Ok(v) = cell.parse::<i64>() {
            if v.to_string() == cell {
                return Self::Int(v);
            }
        }
        match cell.parse::<f64>() {
            Ok(v) if v.is_finite() && format!("{v:?}") == cell => Self::Float(v),
            _ => Self::Text(cell.to_string()),
        }
    }

    /// Renders the value as a table cell.
    #[must_use]
    pub fn to_cell(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Int(v) => v.to_string(),
            // Debug keeps the fractional part (`1.0`, not `1`) so the cell
            // reads back as a float.
            Self::Float(v) => format!("{v:?}"),
            Self::Text(s) => s.clone(),
        }
    }

    /// Returns true for [`FieldValue::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the text, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as `i64`, if it is an integer.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the value as `f64`, widening integers.
    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for FieldValue {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<u32> for FieldValue {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<f32> for FieldValue {
    fn from(v: f32) -> Self {
        Self::Float(f64::from(v))
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}
