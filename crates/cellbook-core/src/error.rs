//! Error types for cellbook-core

use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in cellbook-core
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// Unparsable cell or range text
    #[error("Malformed reference: {0}")]
    MalformedReference(String),

    /// A sheet was requested by name and is not in the workbook
    #[error("Sheet not found: {0}")]
    SheetNotFound(String),

    /// Fill input cannot be laid onto the target range
    #[error("Cannot fill {rows}x{cols} range {range} from a flat list of {len} values")]
    ShapeMismatch {
        range: String,
        rows: u32,
        cols: u16,
        len: usize,
    },

    /// Invalid sheet name
    #[error("Invalid sheet name: {0}")]
    InvalidSheetName(String),

    /// Duplicate sheet name
    #[error("Sheet name already exists: {0}")]
    DuplicateSheetName(String),

    /// Duplicate defined name
    #[error("Named range already exists: {0}")]
    DuplicateName(String),

    /// Merge region overlaps an existing one
    #[error("Merge region {0} overlaps an existing merged region")]
    MergedCellConflict(String),
}
