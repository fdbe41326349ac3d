//! Error type for the cellbook facade

use cellbook_xlsx::XlsxError;
use thiserror::Error;

/// Result type alias using [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by the facade
#[derive(Debug, Error)]
pub enum Error {
    /// Reference, sheet or shape error from the workbook model
    #[error(transparent)]
    Core(#[from] cellbook_core::Error),

    /// Bytes or file could not be decoded into a workbook
    #[error("Failed to decode workbook: {0}")]
    Decode(#[source] XlsxError),

    /// Workbook could not be encoded
    #[error("Failed to encode workbook: {0}")]
    Encode(#[source] XlsxError),

    /// A host-supplied value has the wrong shape
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}
