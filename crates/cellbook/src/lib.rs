//! # cellbook
//!
//! Sparse spreadsheet workbooks with merge-aware range operations and XLSX
//! round-tripping.
//!
//! ## Example
//!
//! ```rust
//! use cellbook::prelude::*;
//!
//! let wb = Workbook::from_rows(vec![vec![Scalar::from("Item"), Scalar::from("Qty")]]);
//! let wb = wb.fill_range("A2:B2", vec![vec![Scalar::from("Apples"), Scalar::from(3)]])?;
//! let wb = wb.update_range("A1:B1", &Attributes::new().with("disabled", true))?;
//!
//! let bytes = cellbook::to_bytes(&wb)?;
//! let back = cellbook::from_bytes(&bytes)?;
//! assert_eq!(back, wb);
//! assert_eq!(back.resolve_ref("B2")?, CellOrRange::Single("3".into()));
//! # Ok::<(), cellbook::Error>(())
//! ```

pub mod error;
pub mod host;
pub mod prelude;

use std::io::Cursor;
use std::path::Path;

pub use error::{Error, Result};

// Re-export core types
pub use cellbook_core::{
    decode_cell, decode_range, encode_cell, encode_range, parse_range, quote_sheet_name, Area,
    AttrValue, Attributes, Cell, CellAddress, CellOrRange, CellRange, CellValue, FillValues,
    NamedRange, NamedRangeCollection, RangeRef, Scalar, Workbook, Worksheet, DEFAULT_SHEET_NAME,
    MAX_COLS, MAX_ROWS, MAX_SHEET_NAME_LEN,
};

// Re-export I/O types
pub use cellbook_xlsx::{XlsxError, XlsxReader, XlsxWriter};

/// Serialize a workbook to XLSX bytes
pub fn to_bytes(workbook: &Workbook) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    XlsxWriter::write(workbook, Cursor::new(&mut buf)).map_err(Error::Encode)?;
    log::debug!("encoded workbook into {} bytes", buf.len());
    Ok(buf)
}

/// Deserialize a workbook from XLSX bytes
pub fn from_bytes(bytes: &[u8]) -> Result<Workbook> {
    XlsxReader::read(Cursor::new(bytes)).map_err(Error::Decode)
}

/// Extension trait for Workbook to add file I/O
pub trait WorkbookExt {
    /// Open a workbook from an XLSX file
    fn open<P: AsRef<Path>>(path: P) -> Result<Workbook>;

    /// Save the workbook to an XLSX file
    fn save<P: AsRef<Path>>(&self, path: P) -> Result<()>;
}

impl WorkbookExt for Workbook {
    fn open<P: AsRef<Path>>(path: P) -> Result<Workbook> {
        XlsxReader::read_file(path).map_err(Error::Decode)
    }

    fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        XlsxWriter::write_file(self, path).map_err(Error::Encode)
    }
}
