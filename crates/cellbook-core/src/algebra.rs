//! Merge-aware range operations
//!
//! Every operation here reads a [`Workbook`] and returns a new one built from a
//! private copy, so the input is never mutated and a failed call leaves
//! nothing half-written. Reads and writes go through
//! [`Worksheet::find_corner`]: every address inside a merge region lands on
//! the region's top-left cell.
//!
//! ```
//! use cellbook_core::{Attributes, CellRange, CellValue, Workbook};
//!
//! let mut wb = Workbook::new();
//! wb.worksheet_mut(None).unwrap().unwrap()
//!     .merge_cells(&CellRange::parse("A1:B2").unwrap()).unwrap();
//!
//! let locked = wb.update_range("B2", &Attributes::new().with("disabled", true)).unwrap();
//! let sheet = locked.worksheet(None).unwrap().unwrap();
//! assert!(sheet.cell("A1".parse().unwrap()).unwrap().disabled);
//! assert!(sheet.cell("B2".parse().unwrap()).is_none());
//! ```

use log::{debug, warn};

use crate::attributes::{AttrValue, Attributes};
use crate::cell::{Area, Cell, CellAddress, CellRange, CellValue, RangeRef, Scalar};
use crate::error::{Error, Result};
use crate::workbook::{Workbook, DEFAULT_SHEET_NAME};
use crate::worksheet::Worksheet;

/// Values for [`Workbook::fill_range`]
#[derive(Debug, Clone, PartialEq)]
pub enum FillValues {
    /// Rows of values, laid out from the range's top-left cell. Rows and
    /// columns past the end of a ragged input are left untouched.
    Rows(Vec<Vec<Scalar>>),
    /// A flat list, laid along whichever dimension of the range is a single
    /// row or column
    Flat(Vec<Scalar>),
}

impl FillValues {
    fn into_rows(self, range: &CellRange) -> Result<Vec<Vec<Scalar>>> {
        match self {
            FillValues::Rows(rows) => Ok(rows),
            FillValues::Flat(values) if range.row_count() == 1 => Ok(vec![values]),
            FillValues::Flat(values) if range.col_count() == 1 => {
                Ok(values.into_iter().map(|v| vec![v]).collect())
            }
            FillValues::Flat(values) => Err(Error::ShapeMismatch {
                range: range.to_string(),
                rows: range.row_count(),
                cols: range.col_count(),
                len: values.len(),
            }),
        }
    }
}

impl From<Vec<Vec<Scalar>>> for FillValues {
    fn from(rows: Vec<Vec<Scalar>>) -> Self {
        FillValues::Rows(rows)
    }
}

impl From<Vec<Scalar>> for FillValues {
    fn from(values: Vec<Scalar>) -> Self {
        FillValues::Flat(values)
    }
}

/// Result of reading a reference: one stringified value or a grid of them
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellOrRange {
    Single(String),
    Grid(Vec<Vec<String>>),
}

impl CellOrRange {
    pub fn as_single(&self) -> Option<&str> {
        match self {
            CellOrRange::Single(s) => Some(s),
            CellOrRange::Grid(_) => None,
        }
    }

    pub fn as_grid(&self) -> Option<&[Vec<String>]> {
        match self {
            CellOrRange::Single(_) => None,
            CellOrRange::Grid(rows) => Some(rows),
        }
    }
}

impl Workbook {
    /// Deep-merge `changes` into every cell of a range
    ///
    /// Cells are visited row-major. Each address resolves to its merge
    /// corner, a stub is created there if needed, and the changes are merged
    /// in; a corner aliased by several addresses receives the merge once per
    /// address. Recognized keys are `style`/`s` (bag merged into the cell
    /// style), `disabled` (bool) and `value`/`v` (scalar). Any other key is
    /// merged into the style bag untouched.
    pub fn update_range(&self, range_text: &str, changes: &Attributes) -> Result<Workbook> {
        let target = RangeRef::parse(range_text)?;
        let range = target.range();

        let mut wb = self.copy();
        let sheet = wb.target_sheet_mut(target.sheet.as_deref())?;
        for addr in range.cells() {
            let corner = sheet.find_corner(addr);
            apply_changes(sheet.ensure_cell(corner), changes);
        }
        sheet.extend_used_range(&range);

        debug!("updated {} cells in {}", range.cell_count(), target);
        Ok(wb)
    }

    /// Apply [`Workbook::update_range`] to several ranges in turn
    pub fn update_ranges<S: AsRef<str>>(&self, ranges: &[S], changes: &Attributes) -> Result<Workbook> {
        let mut wb = self.copy();
        for range in ranges {
            wb = wb.update_range(range.as_ref(), changes)?;
        }
        Ok(wb)
    }

    /// Write values into a range, laid out from its top-left cell
    ///
    /// Each written cell is retagged by its new value (`Number` for numeric
    /// input, `String` otherwise); style and disabled data are kept. The
    /// sheet's used range is widened to cover the range.
    ///
    /// A flat list onto a range with more than one row and more than one
    /// column is [`Error::ShapeMismatch`].
    pub fn fill_range(&self, range_text: &str, values: impl Into<FillValues>) -> Result<Workbook> {
        let target = RangeRef::parse(range_text)?;
        let range = target.range();
        let rows = values.into().into_rows(&range)?;

        let mut wb = self.copy();
        let sheet = wb.target_sheet_mut(target.sheet.as_deref())?;
        let mut written = 0usize;
        for (r, row) in rows.into_iter().take(range.row_count() as usize).enumerate() {
            for (c, value) in row.into_iter().take(range.col_count() as usize).enumerate() {
                let addr = CellAddress::new(range.start.row + r as u32, range.start.col + c as u16);
                let corner = sheet.find_corner(addr);
                sheet.ensure_cell(corner).set_scalar(value);
                written += 1;
            }
        }
        sheet.extend_used_range(&range);

        debug!("filled {} of {} cells in {}", written, range.cell_count(), target);
        Ok(wb)
    }

    /// Extract the cells of a range into a new one-sheet workbook
    ///
    /// Addresses are kept as they are (not moved to A1), merge regions are
    /// carried over unchanged, and the used range is exactly the sliced
    /// rectangle. Named ranges are not carried.
    pub fn slice(&self, range_text: &str) -> Result<Workbook> {
        let target = RangeRef::parse(range_text)?;
        let range = target.range();

        let name = match target.sheet.as_deref() {
            Some(name) => self.sheet_name(name).unwrap_or(name),
            None => self.default_sheet_name().unwrap_or(DEFAULT_SHEET_NAME),
        };

        let mut sheet = Worksheet::new();
        if let Some(source) = self.worksheet(target.sheet.as_deref())? {
            for (addr, cell) in source.cells_in(range) {
                sheet.set_cell(addr, cell.clone());
            }
            for region in source.merged_regions() {
                sheet.merge_cells(region)?;
            }
        }
        sheet.set_used_range(Some(range));

        let mut wb = Workbook::empty();
        wb.add_worksheet(name, sheet)?;
        Ok(wb)
    }

    /// Read a reference as text
    ///
    /// `ref_text` is tried as a named range first (a one-cell target reads as
    /// a single value), then as a literal range or cell reference. Addresses
    /// inside a merge region read the region's corner. Absent and empty cells
    /// read as the empty string.
    pub fn resolve_ref(&self, ref_text: &str) -> Result<CellOrRange> {
        let target = match self.resolve_named_range(ref_text) {
            Some(target) => target,
            None => RangeRef::parse(ref_text)?,
        };
        let sheet = self.worksheet(target.sheet.as_deref())?;
        let read = |addr: CellAddress| {
            sheet
                .map(|ws| ws.get(ws.find_corner(addr)))
                .unwrap_or(CellValue::Empty)
                .to_string()
        };

        if let Area::Scalar(addr) = target.area {
            return Ok(CellOrRange::Single(read(addr)));
        }

        let range = target.range();
        let grid = (range.start.row..=range.end.row)
            .map(|row| {
                (range.start.col..=range.end.col)
                    .map(|col| read(CellAddress::new(row, col)))
                    .collect()
            })
            .collect();
        Ok(CellOrRange::Grid(grid))
    }
}

fn apply_changes(cell: &mut Cell, changes: &Attributes) {
    for (key, value) in changes.iter() {
        match key {
            "style" | "s" => match value.as_map() {
                Some(style) => cell.style.merge(style),
                None => warn!("ignoring non-map style change {:?}", value),
            },
            "disabled" => match value.as_bool() {
                Some(disabled) => cell.disabled = disabled,
                None => warn!("ignoring non-boolean disabled change {:?}", value),
            },
            "value" | "v" => match value {
                AttrValue::Number(n) => cell.set_scalar(Scalar::Number(*n)),
                AttrValue::Text(s) => cell.set_scalar(Scalar::Text(s.clone())),
                AttrValue::Bool(b) => cell.set_scalar(Scalar::Text(b.to_string())),
                AttrValue::Map(_) => warn!("ignoring map-valued value change"),
            },
            other => cell
                .style
                .merge(&Attributes::new().with(other, value.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn addr(s: &str) -> CellAddress {
        CellAddress::parse(s).unwrap()
    }

    fn sheet(wb: &Workbook) -> &Worksheet {
        wb.worksheet(None).unwrap().unwrap()
    }

    fn merged_workbook() -> Workbook {
        let mut wb = Workbook::new();
        let ws = wb.worksheet_mut(None).unwrap().unwrap();
        ws.merge_cells(&CellRange::parse("A1:B2").unwrap()).unwrap();
        ws.set_cell(addr("A1"), Cell::new("corner"));
        wb
    }

    fn bold() -> Attributes {
        Attributes::new().with("style", Attributes::new().with("font", Attributes::new().with("bold", true)))
    }

    #[test]
    fn test_update_range_creates_stubs_and_merges() {
        let wb = Workbook::new().update_range("A1:B1", &bold()).unwrap();
        let ws = sheet(&wb);
        for a in ["A1", "B1"] {
            let cell = ws.cell(addr(a)).unwrap();
            assert_eq!(cell.value, CellValue::Empty);
            assert_eq!(cell.style.get_path(&["font", "bold"]), Some(&AttrValue::Bool(true)));
        }
        assert_eq!(ws.used_range(), Some(CellRange::parse("A1:B1").unwrap()));
    }

    #[test]
    fn test_update_range_writes_through_merge_corner() {
        let wb = merged_workbook();
        let updated = wb
            .update_range("B2", &Attributes::new().with("disabled", true))
            .unwrap();
        let ws = sheet(&updated);

        assert!(ws.cell(addr("A1")).unwrap().disabled);
        assert_eq!(ws.cell(addr("A1")).unwrap().value, CellValue::string("corner"));
        assert!(ws.cell(addr("B2")).is_none());
        // Input untouched
        assert!(!sheet(&wb).cell(addr("A1")).unwrap().disabled);
    }

    #[test]
    fn test_update_whole_merge_region_equals_corner_update() {
        let wb = merged_workbook();
        let whole = wb.update_range("A1:B2", &bold()).unwrap();
        let corner = wb.update_range("A1", &bold()).unwrap();
        assert_eq!(
            sheet(&whole).cell(addr("A1")),
            sheet(&corner).cell(addr("A1"))
        );
        assert_eq!(sheet(&whole).cell_count(), sheet(&corner).cell_count());
    }

    #[test]
    fn test_update_range_value_and_passthrough_keys() {
        let changes = Attributes::new()
            .with("v", 12.5)
            .with("numFmt", "0.00")
            .with("style", "not a map");
        let wb = Workbook::new().update_range("C3", &changes).unwrap();
        let cell = sheet(&wb).cell(addr("C3")).unwrap();
        assert_eq!(cell.value, CellValue::Number(12.5));
        assert_eq!(cell.style.get("numFmt"), Some(&AttrValue::Text("0.00".into())));
        assert!(cell.style.get("style").is_none());
    }

    #[test]
    fn test_update_ranges_in_sequence() {
        let wb = Workbook::new();
        let changes = Attributes::new().with("disabled", true);
        let both = wb.update_ranges(&["A1", "C1:C2"], &changes).unwrap();
        let stepwise = wb
            .update_range("A1", &changes)
            .unwrap()
            .update_range("C1:C2", &changes)
            .unwrap();
        assert_eq!(both, stepwise);
    }

    #[test]
    fn test_update_range_errors() {
        let wb = Workbook::new();
        assert!(matches!(
            wb.update_range("A1:", &bold()),
            Err(Error::MalformedReference(_))
        ));
        assert!(matches!(
            wb.update_range("Nope!A1", &bold()),
            Err(Error::SheetNotFound(_))
        ));
    }

    #[test]
    fn test_fill_range_scenario() {
        let mut wb = Workbook::new();
        wb.worksheet_mut(None).unwrap().unwrap().ensure_cell(addr("A1"));

        let filled = wb
            .fill_range("A1:B1", vec![vec![Scalar::from("x"), Scalar::from(5)]])
            .unwrap();
        let ws = sheet(&filled);
        assert_eq!(ws.get(addr("A1")), CellValue::string("x"));
        assert_eq!(ws.get(addr("B1")), CellValue::Number(5.0));
        assert!(ws
            .used_range()
            .unwrap()
            .contains_range(&CellRange::parse("A1:B1").unwrap()));
    }

    #[test]
    fn test_fill_range_keeps_attributes_and_ragged_gaps() {
        let wb = Workbook::new()
            .update_range("B2", &Attributes::new().with("disabled", true))
            .unwrap();
        let filled = wb
            .fill_range(
                "A1:C2",
                vec![vec![Scalar::from(1)], vec![Scalar::from(2), Scalar::from("kept")]],
            )
            .unwrap();
        let ws = sheet(&filled);
        assert_eq!(ws.get(addr("A1")), CellValue::Number(1.0));
        assert!(ws.cell(addr("B1")).is_none());
        assert!(ws.cell(addr("C1")).is_none());
        let b2 = ws.cell(addr("B2")).unwrap();
        assert_eq!(b2.value, CellValue::string("kept"));
        assert!(b2.disabled);
    }

    #[test]
    fn test_fill_range_extra_values_ignored() {
        let filled = Workbook::new()
            .fill_range("A1", vec![vec![Scalar::from(1), Scalar::from(2)]])
            .unwrap();
        assert_eq!(sheet(&filled).cell_count(), 1);
    }

    #[test]
    fn test_fill_range_through_merge() {
        let filled = merged_workbook()
            .fill_range("B1:C1", vec![vec![Scalar::from("m"), Scalar::from("c")]])
            .unwrap();
        let ws = sheet(&filled);
        assert_eq!(ws.get(addr("A1")), CellValue::string("m"));
        assert!(ws.cell(addr("B1")).is_none());
        assert_eq!(ws.get(addr("C1")), CellValue::string("c"));
    }

    #[test]
    fn test_fill_range_flat_values() {
        let wb = Workbook::new();
        let row = wb
            .fill_range("A1:C1", vec![Scalar::from(1), Scalar::from(2), Scalar::from(3)])
            .unwrap();
        assert_eq!(sheet(&row).get(addr("C1")), CellValue::Number(3.0));

        let col = wb
            .fill_range("A1:A3", vec![Scalar::from(1), Scalar::from(2), Scalar::from(3)])
            .unwrap();
        assert_eq!(sheet(&col).get(addr("A3")), CellValue::Number(3.0));

        let single = wb.fill_range("D4", vec![Scalar::from("only")]).unwrap();
        assert_eq!(sheet(&single).get(addr("D4")), CellValue::string("only"));

        assert!(matches!(
            wb.fill_range("A1:B2", vec![Scalar::from(1)]),
            Err(Error::ShapeMismatch { rows: 2, cols: 2, len: 1, .. })
        ));
    }

    #[test]
    fn test_fill_range_never_narrows_used_range() {
        let mut wb = Workbook::new();
        wb.worksheet_mut(None)
            .unwrap()
            .unwrap()
            .set_used_range(Some(CellRange::parse("A1:J20").unwrap()));
        let filled = wb
            .fill_range("K2:K3", vec![Scalar::from(1), Scalar::from(2)])
            .unwrap();
        assert_eq!(
            sheet(&filled).used_range(),
            Some(CellRange::parse("A1:K20").unwrap())
        );
    }

    #[test]
    fn test_fill_empty_workbook_creates_default_sheet() {
        let filled = Workbook::empty()
            .fill_range("A1", vec![vec![Scalar::from(1)]])
            .unwrap();
        assert_eq!(filled.default_sheet_name(), Some(DEFAULT_SHEET_NAME));
    }

    #[test]
    fn test_slice_keeps_addresses() {
        let mut wb = Workbook::new();
        {
            let ws = wb.worksheet_mut(None).unwrap().unwrap();
            ws.set_cell(addr("A1"), Cell::new("outside"));
            ws.set_cell(addr("B2"), Cell::new("inside"));
            ws.merge_cells(&CellRange::parse("E5:F6").unwrap()).unwrap();
        }
        wb.add_worksheet("Other", Worksheet::new()).unwrap();
        wb.define_name("Total", "B2").unwrap();

        let sliced = wb.slice("B2:C3").unwrap();
        assert_eq!(sliced.sheet_count(), 1);
        assert!(sliced.named_ranges().is_empty());

        let ws = sheet(&sliced);
        assert_eq!(ws.cell_count(), 1);
        assert_eq!(ws.get(addr("B2")), CellValue::string("inside"));
        assert_eq!(ws.used_range(), Some(CellRange::parse("B2:C3").unwrap()));
        assert_eq!(ws.merged_regions(), &[CellRange::parse("E5:F6").unwrap()]);
    }

    #[test]
    fn test_slice_named_sheet() {
        let mut wb = Workbook::new();
        let mut other = Worksheet::new();
        other.set_cell_value("A1", 7).unwrap();
        wb.add_worksheet("Other", other).unwrap();

        let sliced = wb.slice("Other!A1:A2").unwrap();
        assert_eq!(sliced.default_sheet_name(), Some("Other"));
        assert_eq!(sheet(&sliced).get(addr("A1")), CellValue::Number(7.0));
    }

    #[test]
    fn test_sheet_qualified_refs_ignore_case() {
        let mut wb = Workbook::new();
        let mut data = Worksheet::new();
        data.set_cell_value("A1", "x").unwrap();
        wb.add_worksheet("Data", data).unwrap();

        assert_eq!(wb.resolve_ref("data!A1").unwrap(), CellOrRange::Single("x".into()));

        let sliced = wb.slice("DATA!A1").unwrap();
        assert_eq!(sliced.default_sheet_name(), Some("Data"));

        let filled = wb.fill_range("data!B1", vec![vec![Scalar::from("y")]]).unwrap();
        assert_eq!(filled.sheet_count(), 2);
        let data = filled.worksheet(Some("Data")).unwrap().unwrap();
        assert_eq!(data.get(addr("B1")), CellValue::string("y"));
    }

    #[test]
    fn test_resolve_ref_named_single_cell() {
        let mut wb = Workbook::new()
            .fill_range("C1", vec![vec![Scalar::from(1234.5)]])
            .unwrap();
        wb.define_name("TotalSales", "C1:C1").unwrap();

        assert_eq!(
            wb.resolve_ref("TotalSales").unwrap(),
            CellOrRange::Single("1234.5".into())
        );
    }

    #[test]
    fn test_resolve_ref_literal_forms() {
        let wb = Workbook::from_rows(vec![
            vec![Scalar::from("a"), Scalar::from(2)],
            vec![Scalar::from("c"), Scalar::from(0.25)],
        ]);

        assert_eq!(wb.resolve_ref("B1").unwrap(), CellOrRange::Single("2".into()));
        assert_eq!(wb.resolve_ref("Z9").unwrap(), CellOrRange::Single(String::new()));
        assert_eq!(
            wb.resolve_ref("A1:B2").unwrap(),
            CellOrRange::Grid(vec![
                vec!["a".to_string(), "2".to_string()],
                vec!["c".to_string(), "0.25".to_string()],
            ])
        );
        // A literal one-cell rectangle stays a grid
        assert_eq!(
            wb.resolve_ref("A1:A1").unwrap(),
            CellOrRange::Grid(vec![vec!["a".to_string()]])
        );
        assert!(wb.resolve_ref("NotAName").is_err());
    }

    #[test]
    fn test_resolve_ref_reads_through_merge_corner() {
        let wb = merged_workbook();
        assert_eq!(wb.resolve_ref("B2").unwrap(), CellOrRange::Single("corner".into()));
        assert_eq!(
            wb.resolve_ref("A1:C2").unwrap(),
            CellOrRange::Grid(vec![
                vec!["corner".to_string(), "corner".to_string(), String::new()],
                vec!["corner".to_string(), "corner".to_string(), String::new()],
            ])
        );
    }

    #[test]
    fn test_resolve_ref_named_rectangle_on_sheet() {
        let mut wb = Workbook::new();
        let mut data = Worksheet::new();
        data.set_cell_value("A1", "x").unwrap();
        wb.add_worksheet("Data", data).unwrap();
        wb.define_name("Block", "Data!A1:A2").unwrap();

        assert_eq!(
            wb.resolve_ref("Block").unwrap(),
            CellOrRange::Grid(vec![vec!["x".to_string()], vec![String::new()]])
        );
    }

    #[test]
    fn test_operations_leave_input_untouched() {
        let wb = merged_workbook();
        let before = wb.clone();
        let _ = wb.update_range("A1:C3", &bold()).unwrap();
        let _ = wb.fill_range("A1:C3", vec![vec![Scalar::from(1)]]).unwrap();
        let _ = wb.slice("A1:B1").unwrap();
        let _ = wb.fill_range("A1:B2", vec![Scalar::from(1)]);
        assert_eq!(wb, before);
    }
}
