//! Prelude module - common imports for cellbook users
//!
//! ```rust
//! use cellbook::prelude::*;
//! ```

pub use crate::{
    // Values and attributes
    AttrValue,
    Attributes,
    Cell,
    // Addressing
    CellAddress,
    // Range operation types
    CellOrRange,
    CellRange,
    CellValue,
    // Error types
    Error,
    FillValues,
    RangeRef,
    Result,
    Scalar,
    // Main types
    Workbook,
    // Extension traits
    WorkbookExt,
    Worksheet,
    // I/O types
    XlsxReader,
    XlsxWriter,
};
