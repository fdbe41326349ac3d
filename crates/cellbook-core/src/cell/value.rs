//! Cell value types

use std::fmt;

use crate::attributes::Attributes;

/// The typed value stored in a cell
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "t", content = "v", rename_all = "lowercase"))]
pub enum CellValue {
    /// Empty or untyped cell
    #[default]
    Empty,

    /// Text value
    String(String),

    /// Numeric value
    Number(f64),
}

impl CellValue {
    /// Create a new string value
    pub fn string<S: Into<String>>(s: S) -> Self {
        CellValue::String(s.into())
    }

    /// Check if the cell is empty
    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }

    /// Try to get the value as a number
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Try to get the value as a string
    pub fn as_string(&self) -> Option<&str> {
        match self {
            CellValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            CellValue::Empty => "empty",
            CellValue::String(_) => "string",
            CellValue::Number(_) => "number",
        }
    }
}

/// Numbers use Rust's shortest round-trip formatting, so `5.0` prints as `5`
/// and the output never depends on locale.
impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::String(s) => f.write_str(s),
            CellValue::Number(n) => write!(f, "{}", n),
        }
    }
}

impl From<f64> for CellValue {
    fn from(n: f64) -> Self {
        CellValue::Number(n)
    }
}

impl From<i32> for CellValue {
    fn from(n: i32) -> Self {
        CellValue::Number(n as f64)
    }
}

impl From<&str> for CellValue {
    fn from(s: &str) -> Self {
        CellValue::String(s.to_string())
    }
}

impl From<String> for CellValue {
    fn from(s: String) -> Self {
        CellValue::String(s)
    }
}

impl From<Scalar> for CellValue {
    fn from(scalar: Scalar) -> Self {
        match scalar {
            Scalar::Number(n) => CellValue::Number(n),
            Scalar::Text(s) => CellValue::String(s),
        }
    }
}

/// A value supplied by a host to be written into a cell
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum Scalar {
    /// Numeric input, stored as [`CellValue::Number`]
    Number(f64),
    /// Anything else, stored as [`CellValue::String`]
    Text(String),
}

impl From<f64> for Scalar {
    fn from(n: f64) -> Self {
        Scalar::Number(n)
    }
}

impl From<i32> for Scalar {
    fn from(n: i32) -> Self {
        Scalar::Number(n as f64)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Scalar::Text(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Scalar::Text(s)
    }
}

/// Everything stored at one sheet address
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cell {
    /// The cell's value
    pub value: CellValue,
    /// Presentation properties (border, font, fill, alignment, ...), never interpreted here
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Attributes::is_empty"))]
    pub style: Attributes,
    /// Whether the presenting UI refuses edits to this cell
    #[cfg_attr(feature = "serde", serde(default))]
    pub disabled: bool,
}

impl Cell {
    /// Create a cell holding a value, with no style
    pub fn new<V: Into<CellValue>>(value: V) -> Self {
        Self {
            value: value.into(),
            ..Self::default()
        }
    }

    /// Create an empty placeholder cell
    pub fn stub() -> Self {
        Self::default()
    }

    /// An empty, unstyled, enabled cell: it occupies its address but counts as
    /// absent for bounds.
    pub fn is_stub(&self) -> bool {
        self.value.is_empty() && self.style.is_empty() && !self.disabled
    }

    /// Whether the cell carries style or disabled data
    pub fn has_attributes(&self) -> bool {
        !self.style.is_empty() || self.disabled
    }

    /// Store a host value, retagging the cell by the value's kind
    pub fn set_scalar(&mut self, value: Scalar) {
        self.value = value.into();
    }
}
