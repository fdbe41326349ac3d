//! # cellbook-core
//!
//! Core data structures for the cellbook spreadsheet library.
//!
//! This crate provides the fundamental types used throughout cellbook:
//! - [`CellAddress`], [`CellRange`] and [`RangeRef`] - A1-style addressing
//! - [`CellValue`], [`Cell`] and [`Attributes`] - What a sheet address holds
//! - [`Workbook`], [`Worksheet`] - The main document structures
//! - The range operations on [`Workbook`]: `update_range`, `fill_range`,
//!   `slice` and `resolve_ref`
//!
//! ## Example
//!
//! ```rust
//! use cellbook_core::{CellOrRange, Scalar, Workbook};
//!
//! let wb = Workbook::new()
//!     .fill_range("A1:B1", vec![vec![Scalar::from("x"), Scalar::from(5)]])
//!     .unwrap();
//!
//! assert_eq!(wb.resolve_ref("B1").unwrap(), CellOrRange::Single("5".into()));
//! ```

pub mod algebra;
pub mod attributes;
pub mod cell;
pub mod error;
pub mod named_range;
#[cfg(feature = "serde")]
mod serde_impls;
pub mod workbook;
pub mod worksheet;

// Re-exports for convenience
pub use algebra::{CellOrRange, FillValues};
pub use attributes::{AttrValue, Attributes};
pub use cell::{
    decode_cell, decode_range, encode_cell, encode_range, parse_range, quote_sheet_name, Area,
    Cell, CellAddress, CellRange, CellRangeIterator, CellValue, RangeRef, Scalar,
};
pub use error::{Error, Result};
pub use named_range::{NamedRange, NamedRangeCollection};
pub use workbook::{Workbook, DEFAULT_SHEET_NAME};
pub use worksheet::Worksheet;

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u16 = 16_384;

/// Maximum length of a sheet name
pub const MAX_SHEET_NAME_LEN: usize = 31;
