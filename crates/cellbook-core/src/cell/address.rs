//! Cell address and range types

use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};
use std::fmt;
use std::str::FromStr;

/// A cell address (e.g., "A1", "B2")
///
/// Rows and columns are 0-based internally. The derived ordering is
/// row-major, which is the order cells are stored and written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellAddress {
    /// Row index (0-based internally, 1-based in display)
    pub row: u32,
    /// Column index (0-based, A=0, B=1, ..., XFD=16383)
    pub col: u16,
}

impl CellAddress {
    /// Create a new cell address
    pub fn new(row: u32, col: u16) -> Self {
        Self { row, col }
    }

    /// Parse a cell address from A1-style notation
    ///
    /// Column letters must be upper case. `$` absolute markers are accepted
    /// and discarded.
    ///
    /// # Examples
    /// ```
    /// use cellbook_core::CellAddress;
    ///
    /// let addr = CellAddress::parse("B2").unwrap();
    /// assert_eq!((addr.row, addr.col), (1, 1));
    ///
    /// let addr = CellAddress::parse("$C$10").unwrap();
    /// assert_eq!((addr.row, addr.col), (9, 2));
    ///
    /// assert!(CellAddress::parse("b2").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let malformed = || Error::MalformedReference(s.to_string());
        let bytes = s.as_bytes();
        let mut pos = 0;

        if bytes.get(pos) == Some(&b'$') {
            pos += 1;
        }

        let col_start = pos;
        while pos < bytes.len() && bytes[pos].is_ascii_uppercase() {
            pos += 1;
        }
        if pos == col_start {
            return Err(malformed());
        }
        let col = Self::letters_to_column(&s[col_start..pos]).ok_or_else(malformed)?;

        if bytes.get(pos) == Some(&b'$') {
            pos += 1;
        }

        let row_str = &s[pos..];
        if row_str.is_empty() || !row_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        let row: u32 = row_str.parse().map_err(|_| malformed())?;

        // Rows are 1-based in A1 notation
        if row == 0 || row > MAX_ROWS {
            return Err(malformed());
        }

        Ok(Self { row: row - 1, col })
    }

    /// Convert column index to letters (0 = A, 25 = Z, 26 = AA, etc.)
    pub fn column_to_letters(col: u16) -> String {
        let mut result = String::new();
        let mut n = col as u32 + 1; // 1-based for calculation

        while n > 0 {
            n -= 1;
            let c = ((n % 26) as u8 + b'A') as char;
            result.insert(0, c);
            n /= 26;
        }

        result
    }

    /// Convert upper-case column letters to an index (A = 0, Z = 25, AA = 26, etc.)
    ///
    /// Returns `None` for empty input, non-letters, or columns past the grid.
    pub fn letters_to_column(letters: &str) -> Option<u16> {
        if letters.is_empty() {
            return None;
        }

        let mut col: u32 = 0;
        for c in letters.bytes() {
            if !c.is_ascii_uppercase() {
                return None;
            }
            col = col * 26 + (c - b'A') as u32 + 1;
            if col > MAX_COLS as u32 {
                return None;
            }
        }

        Some((col - 1) as u16)
    }

    /// Format as A1-style string
    pub fn to_a1_string(&self) -> String {
        format!("{}{}", Self::column_to_letters(self.col), self.row + 1)
    }

    /// Create a range from this address to another
    pub fn to(&self, other: CellAddress) -> CellRange {
        CellRange::new(*self, other)
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for CellAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Encode a 0-based (row, column) pair as an A1 reference
pub fn encode_cell(row: u32, col: u16) -> String {
    CellAddress::new(row, col).to_a1_string()
}

/// Decode an A1 reference into a 0-based address
pub fn decode_cell(text: &str) -> Result<CellAddress> {
    CellAddress::parse(text)
}

/// A rectangle of cells (e.g., "A1:B10"), always stored top-left to bottom-right
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRange {
    /// Start address (top-left)
    pub start: CellAddress,
    /// End address (bottom-right)
    pub end: CellAddress,
}

impl CellRange {
    /// Create a new cell range
    pub fn new(start: CellAddress, end: CellAddress) -> Self {
        Self {
            start: CellAddress::new(start.row.min(end.row), start.col.min(end.col)),
            end: CellAddress::new(start.row.max(end.row), start.col.max(end.col)),
        }
    }

    /// Create a range from row/column indices
    pub fn from_indices(start_row: u32, start_col: u16, end_row: u32, end_col: u16) -> Self {
        Self::new(
            CellAddress::new(start_row, start_col),
            CellAddress::new(end_row, end_col),
        )
    }

    /// Create a single-cell range
    pub fn single(addr: CellAddress) -> Self {
        Self {
            start: addr,
            end: addr,
        }
    }

    /// Parse an unqualified range from A1:B10 (or A1) notation
    pub fn parse(s: &str) -> Result<Self> {
        Ok(Area::parse(s)?.range())
    }

    /// Check if a cell is within this range
    pub fn contains(&self, addr: &CellAddress) -> bool {
        addr.row >= self.start.row
            && addr.row <= self.end.row
            && addr.col >= self.start.col
            && addr.col <= self.end.col
    }

    /// Check if another range lies entirely within this one
    pub fn contains_range(&self, other: &CellRange) -> bool {
        self.contains(&other.start) && self.contains(&other.end)
    }

    /// Whether the range covers a single cell
    pub fn is_single(&self) -> bool {
        self.start == self.end
    }

    /// Get the number of rows in the range
    pub fn row_count(&self) -> u32 {
        self.end.row - self.start.row + 1
    }

    /// Get the number of columns in the range
    pub fn col_count(&self) -> u16 {
        self.end.col - self.start.col + 1
    }

    /// Get the total number of cells in the range
    pub fn cell_count(&self) -> u64 {
        self.row_count() as u64 * self.col_count() as u64
    }

    /// Check if this range overlaps with another
    pub fn overlaps(&self, other: &CellRange) -> bool {
        self.start.row <= other.end.row
            && self.end.row >= other.start.row
            && self.start.col <= other.end.col
            && self.end.col >= other.start.col
    }

    /// Smallest range covering both `self` and `other`
    pub fn union(&self, other: &CellRange) -> CellRange {
        CellRange::from_indices(
            self.start.row.min(other.start.row),
            self.start.col.min(other.start.col),
            self.end.row.max(other.end.row),
            self.end.col.max(other.end.col),
        )
    }

    /// Iterate over all cell addresses in the range (row by row)
    pub fn cells(&self) -> CellRangeIterator {
        CellRangeIterator {
            range: *self,
            current_row: self.start.row,
            current_col: self.start.col,
            remaining: self.cell_count(),
        }
    }

    /// Format as A1:B10 string (a single cell formats as "A1")
    pub fn to_a1_string(&self) -> String {
        if self.is_single() {
            self.start.to_a1_string()
        } else {
            format!("{}:{}", self.start.to_a1_string(), self.end.to_a1_string())
        }
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for CellRange {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Iterator over cells in a range
pub struct CellRangeIterator {
    range: CellRange,
    current_row: u32,
    current_col: u16,
    remaining: u64,
}

impl Iterator for CellRangeIterator {
    type Item = CellAddress;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let addr = CellAddress::new(self.current_row, self.current_col);
        self.remaining -= 1;

        // Move to next cell
        if self.current_col == self.range.end.col {
            self.current_col = self.range.start.col;
            self.current_row = self.current_row.saturating_add(1);
        } else {
            self.current_col += 1;
        }

        Some(addr)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.remaining as usize;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for CellRangeIterator {}

/// The address part of a reference: one cell or a rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Area {
    /// A single cell ("A1")
    Scalar(CellAddress),
    /// A rectangle ("A1:B2"), normalized top-left to bottom-right
    Rect(CellAddress, CellAddress),
}

impl Area {
    /// Parse "A1" or "A1:B2". "A1:A1" stays rectangular.
    pub fn parse(s: &str) -> Result<Self> {
        match s.split_once(':') {
            Some((start, end)) => {
                let range = CellRange::new(CellAddress::parse(start)?, CellAddress::parse(end)?);
                Ok(Area::Rect(range.start, range.end))
            }
            None => Ok(Area::Scalar(CellAddress::parse(s)?)),
        }
    }

    /// The rectangle this area covers
    pub fn range(&self) -> CellRange {
        match *self {
            Area::Scalar(addr) => CellRange::single(addr),
            Area::Rect(start, end) => CellRange::new(start, end),
        }
    }

    /// Collapse a one-cell rectangle to the scalar form
    pub fn collapse(self) -> Self {
        match self {
            Area::Rect(start, end) if start == end => Area::Scalar(start),
            other => other,
        }
    }

    /// Whether this is the single-cell form
    pub fn is_scalar(&self) -> bool {
        matches!(self, Area::Scalar(_))
    }
}

impl From<CellRange> for Area {
    fn from(range: CellRange) -> Self {
        Area::Rect(range.start, range.end)
    }
}

impl fmt::Display for Area {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Area::Scalar(addr) => write!(f, "{}", addr),
            Area::Rect(start, end) => write!(f, "{}:{}", start, end),
        }
    }
}

/// A possibly sheet-qualified reference ("B2:D10", "Sheet1!A1", "'My Sheet'!A1:B2")
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RangeRef {
    /// Sheet qualifier; `None` means the workbook's default sheet
    pub sheet: Option<String>,
    /// The referenced cells
    pub area: Area,
}

impl RangeRef {
    /// Create an unqualified reference
    pub fn new(area: Area) -> Self {
        Self { sheet: None, area }
    }

    /// Create a sheet-qualified reference
    pub fn on_sheet(sheet: impl Into<String>, area: Area) -> Self {
        Self {
            sheet: Some(sheet.into()),
            area,
        }
    }

    /// Parse a reference, splitting off an optional `Sheet!` qualifier
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        match s.rsplit_once('!') {
            Some((sheet, address)) => {
                let sheet = unquote_sheet_name(sheet)
                    .ok_or_else(|| Error::MalformedReference(s.to_string()))?;
                let area = Area::parse(address)
                    .map_err(|_| Error::MalformedReference(s.to_string()))?;
                Ok(Self::on_sheet(sheet, area))
            }
            None => Ok(Self::new(Area::parse(s)?)),
        }
    }

    /// The rectangle this reference covers
    pub fn range(&self) -> CellRange {
        self.area.range()
    }

    /// Format back to text, quoting the sheet name when needed
    pub fn to_a1_string(&self) -> String {
        match &self.sheet {
            Some(sheet) => format!("{}!{}", quote_sheet_name(sheet), self.area),
            None => self.area.to_string(),
        }
    }
}

impl fmt::Display for RangeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_a1_string())
    }
}

impl FromStr for RangeRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Encode a reference as "A1", "A1:B2" or "Sheet!A1:B2"
pub fn encode_range(range: &RangeRef) -> String {
    range.to_a1_string()
}

/// Decode a reference, with or without a sheet qualifier
pub fn decode_range(text: &str) -> Result<RangeRef> {
    RangeRef::parse(text)
}

/// List every cell address of a range in row-major order
pub fn parse_range(text: &str) -> Result<Vec<String>> {
    let range = RangeRef::parse(text)?.range();
    Ok(range.cells().map(|addr| addr.to_a1_string()).collect())
}

/// Quote a sheet name for use in a reference when it is not a plain identifier
pub fn quote_sheet_name(name: &str) -> String {
    let plain = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.');
    if plain {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}

fn unquote_sheet_name(raw: &str) -> Option<String> {
    if let Some(inner) = raw.strip_prefix('\'') {
        let inner = inner.strip_suffix('\'')?;
        if inner.is_empty() {
            return None;
        }
        Some(inner.replace("''", "'"))
    } else if raw.is_empty() {
        None
    } else {
        Some(raw.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_column_to_letters() {
        assert_eq!(CellAddress::column_to_letters(0), "A");
        assert_eq!(CellAddress::column_to_letters(25), "Z");
        assert_eq!(CellAddress::column_to_letters(26), "AA");
        assert_eq!(CellAddress::column_to_letters(51), "AZ");
        assert_eq!(CellAddress::column_to_letters(52), "BA");
        assert_eq!(CellAddress::column_to_letters(701), "ZZ");
        assert_eq!(CellAddress::column_to_letters(702), "AAA");
        assert_eq!(CellAddress::column_to_letters(16383), "XFD");
    }

    #[test]
    fn test_letters_to_column() {
        assert_eq!(CellAddress::letters_to_column("A"), Some(0));
        assert_eq!(CellAddress::letters_to_column("AA"), Some(26));
        assert_eq!(CellAddress::letters_to_column("XFD"), Some(16383));
        assert_eq!(CellAddress::letters_to_column("XFE"), None);
        assert_eq!(CellAddress::letters_to_column("a"), None);
        assert_eq!(CellAddress::letters_to_column(""), None);
    }

    #[test]
    fn test_decode_cell() {
        assert_eq!(decode_cell("A1").unwrap(), CellAddress::new(0, 0));
        assert_eq!(decode_cell("B2").unwrap(), CellAddress::new(1, 1));
        assert_eq!(decode_cell("$A$1").unwrap(), CellAddress::new(0, 0));
        assert_eq!(decode_cell("XFD1048576").unwrap(), CellAddress::new(1048575, 16383));
    }

    #[test]
    fn test_decode_cell_errors() {
        for bad in ["", "A", "1", "A0", "a1", "A1B", " A1", "A-1", "A1048577", "XFE1", "$$A1"] {
            assert!(
                matches!(decode_cell(bad), Err(Error::MalformedReference(_))),
                "{bad:?} should be malformed"
            );
        }
    }

    #[test]
    fn test_encode_cell() {
        assert_eq!(encode_cell(0, 0), "A1");
        assert_eq!(encode_cell(99, 2), "C100");
        assert_eq!(encode_cell(0, 26), "AA1");
    }

    #[test]
    fn test_area_parse() {
        assert_eq!(Area::parse("C3").unwrap(), Area::Scalar(CellAddress::new(2, 2)));
        assert_eq!(
            Area::parse("A1:B2").unwrap(),
            Area::Rect(CellAddress::new(0, 0), CellAddress::new(1, 1))
        );
        // Reversed corners normalize
        assert_eq!(
            Area::parse("B2:A1").unwrap(),
            Area::Rect(CellAddress::new(0, 0), CellAddress::new(1, 1))
        );
        assert!(Area::parse("A1:").is_err());
        assert!(Area::parse(":B2").is_err());
    }

    #[test]
    fn test_area_collapse() {
        let a1 = CellAddress::new(0, 0);
        assert_eq!(Area::parse("A1:A1").unwrap().collapse(), Area::Scalar(a1));
        assert!(!Area::parse("A1:A2").unwrap().collapse().is_scalar());
    }

    #[test]
    fn test_range_ref_sheet_qualifier() {
        let r = decode_range("Sheet1!$C$1:$C$3").unwrap();
        assert_eq!(r.sheet.as_deref(), Some("Sheet1"));
        assert_eq!(r.range(), CellRange::from_indices(0, 2, 2, 2));

        let r = decode_range("'Bob''s data'!A1").unwrap();
        assert_eq!(r.sheet.as_deref(), Some("Bob's data"));
        assert_eq!(encode_range(&r), "'Bob''s data'!A1");

        assert!(decode_range("!A1").is_err());
        assert!(decode_range("''!A1").is_err());
        assert!(decode_range("Sheet1!").is_err());
    }

    #[test]
    fn test_encode_range() {
        assert_eq!(encode_range(&decode_range("B2:D10").unwrap()), "B2:D10");
        assert_eq!(encode_range(&decode_range("B2").unwrap()), "B2");
        assert_eq!(encode_range(&decode_range("Data!A1:B2").unwrap()), "Data!A1:B2");
    }

    #[test]
    fn test_parse_range_lists_cells() {
        assert_eq!(parse_range("A1:B2").unwrap(), vec!["A1", "B1", "A2", "B2"]);
        assert_eq!(parse_range("C3").unwrap(), vec!["C3"]);
    }

    #[test]
    fn test_cell_range_contains() {
        let range = CellRange::parse("B2:D4").unwrap();

        assert!(range.contains(&CellAddress::new(1, 1))); // B2
        assert!(range.contains(&CellAddress::new(3, 3))); // D4
        assert!(!range.contains(&CellAddress::new(0, 0))); // A1
        assert!(!range.contains(&CellAddress::new(4, 1))); // B5
    }

    #[test]
    fn test_cell_range_union() {
        let a = CellRange::parse("B2:C3").unwrap();
        let b = CellRange::parse("A4:B5").unwrap();
        assert_eq!(a.union(&b), CellRange::parse("A2:C5").unwrap());
        assert!(a.union(&b).contains_range(&a));
    }

    #[test]
    fn test_cell_range_iterator() {
        let cells: Vec<_> = CellRange::parse("A1:B2").unwrap().cells().collect();

        assert_eq!(
            cells,
            vec![
                CellAddress::new(0, 0),
                CellAddress::new(0, 1),
                CellAddress::new(1, 0),
                CellAddress::new(1, 1),
            ]
        );
    }

    #[test]
    fn test_iterator_at_grid_edge() {
        let range = CellRange::from_indices(1048575, 16383, 1048575, 16383);
        assert_eq!(range.cells().count(), 1);
    }
}
