//! Cell addressing and cell contents

mod address;
mod value;

pub use address::{
    decode_cell, decode_range, encode_cell, encode_range, parse_range, quote_sheet_name, Area,
    CellAddress, CellRange, CellRangeIterator, RangeRef,
};
pub use value::{Cell, CellValue, Scalar};
