//! # cellbook-xlsx
//!
//! XLSX (Office Open XML) reader and writer for cellbook.
//!
//! Besides the standard package parts, the writer stores every cell's full
//! style bag and disabled flag in `xl/cellbook/attributes.json`, so style keys
//! that styles.xml cannot express survive a round trip. Packages without that
//! part (files from other producers) get their style bags from styles.xml.

pub mod error;
pub mod reader;
pub mod writer;

mod attribute_part;
mod styles;

pub use error::{XlsxError, XlsxResult};
pub use reader::XlsxReader;
pub use writer::XlsxWriter;
