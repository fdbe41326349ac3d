//! Worksheet type

use std::collections::BTreeMap;

use crate::cell::{Cell, CellAddress, CellRange, CellValue, Scalar};
use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};

/// A sparse worksheet
///
/// Only touched cells are stored. Merge regions alias every cell of their
/// rectangle to the top-left "corner", which is the only address that holds
/// content for the region.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Worksheet {
    /// Cells keyed by address, in row-major order
    cells: BTreeMap<CellAddress, Cell>,
    /// Merged cell regions, in the order they were declared
    merged_regions: Vec<CellRange>,
    /// Declared bounding box; a hint that may be wider than the populated cells
    used_range: Option<CellRange>,
}

impl Worksheet {
    /// Create an empty worksheet
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a worksheet from rows of values, anchored at A1
    ///
    /// The used range spans A1 to the longest row and the last row. Values
    /// past the last grid row or column are dropped.
    pub fn from_rows<R, V>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = V>,
        V: Into<Scalar>,
    {
        let mut sheet = Self::new();
        let mut extent: Option<(u32, u16)> = None;

        for (r, row) in rows.into_iter().take(MAX_ROWS as usize).enumerate() {
            let r = r as u32;
            extent = Some((r, extent.map_or(0, |(_, c)| c)));
            for (c, value) in row.into_iter().take(MAX_COLS as usize).enumerate() {
                let c = c as u16;
                sheet
                    .cells
                    .insert(CellAddress::new(r, c), Cell::new(value.into()));
                extent = extent.map(|(er, ec)| (er, ec.max(c)));
            }
        }

        if let Some((end_row, end_col)) = extent {
            sheet.used_range = Some(CellRange::from_indices(0, 0, end_row, end_col));
        }
        sheet
    }

    // === Cell Access ===

    /// Get the stored cell at an address, if any
    pub fn cell(&self, addr: CellAddress) -> Option<&Cell> {
        self.cells.get(&addr)
    }

    /// Get a mutable stored cell at an address, if any
    pub fn cell_mut(&mut self, addr: CellAddress) -> Option<&mut Cell> {
        self.cells.get_mut(&addr)
    }

    /// Get the value at an address; absent cells read as [`CellValue::Empty`]
    pub fn get(&self, addr: CellAddress) -> CellValue {
        self.cells
            .get(&addr)
            .map(|c| c.value.clone())
            .unwrap_or(CellValue::Empty)
    }

    /// Get cell value by A1 address string
    pub fn get_value(&self, address: &str) -> Result<CellValue> {
        Ok(self.get(CellAddress::parse(address)?))
    }

    /// Whether a cell (including a stub) is stored at the address
    pub fn contains(&self, addr: CellAddress) -> bool {
        self.cells.contains_key(&addr)
    }

    /// Resolve the address that stores content for `addr`
    ///
    /// A stored address, or any address on a sheet without merges, is its own
    /// corner. Otherwise the top-left of the first merge region containing it
    /// is returned, falling back to `addr` itself.
    pub fn find_corner(&self, addr: CellAddress) -> CellAddress {
        if self.cells.contains_key(&addr) || self.merged_regions.is_empty() {
            return addr;
        }
        self.merged_regions
            .iter()
            .find(|region| region.contains(&addr))
            .map(|region| region.start)
            .unwrap_or(addr)
    }

    /// Get the cell at `addr`, inserting an empty stub first if needed
    pub fn ensure_cell(&mut self, addr: CellAddress) -> &mut Cell {
        self.cells.entry(addr).or_insert_with(Cell::stub)
    }

    // === Cell Modification ===

    /// Store a cell, replacing whatever was at the address
    pub fn set_cell(&mut self, addr: CellAddress, cell: Cell) {
        self.cells.insert(addr, cell);
    }

    /// Set a cell value by A1 address string, keeping existing attributes
    pub fn set_cell_value<V: Into<CellValue>>(&mut self, address: &str, value: V) -> Result<()> {
        let addr = CellAddress::parse(address)?;
        self.ensure_cell(addr).value = value.into();
        Ok(())
    }

    /// Remove a cell
    pub fn remove_cell(&mut self, addr: CellAddress) -> Option<Cell> {
        self.cells.remove(&addr)
    }

    // === Merged Cells ===

    /// Get merged regions
    pub fn merged_regions(&self) -> &[CellRange] {
        &self.merged_regions
    }

    /// Merge cells
    pub fn merge_cells(&mut self, range: &CellRange) -> Result<()> {
        if self.merged_regions.iter().any(|existing| range.overlaps(existing)) {
            return Err(Error::MergedCellConflict(range.to_string()));
        }
        self.merged_regions.push(*range);
        Ok(())
    }

    /// Unmerge cells
    pub fn unmerge_cells(&mut self, range: &CellRange) -> bool {
        match self.merged_regions.iter().position(|existing| existing == range) {
            Some(i) => {
                self.merged_regions.remove(i);
                true
            }
            None => false,
        }
    }

    // === Used Range ===

    /// The declared used range, if any
    pub fn used_range(&self) -> Option<CellRange> {
        self.used_range
    }

    /// Replace the declared used range
    pub fn set_used_range(&mut self, range: Option<CellRange>) {
        self.used_range = range;
    }

    /// Widen the declared used range to cover `range`; never shrinks it
    ///
    /// With nothing declared, the populated bounds are the starting point.
    pub fn extend_used_range(&mut self, range: &CellRange) {
        let base = self.used_range.or_else(|| self.populated_bounds());
        self.used_range = Some(match base {
            Some(current) => current.union(range),
            None => *range,
        });
    }

    /// Bounding box of every non-stub cell
    pub fn populated_bounds(&self) -> Option<CellRange> {
        self.cells
            .iter()
            .filter(|(_, cell)| !cell.is_stub())
            .map(|(addr, _)| CellRange::single(*addr))
            .reduce(|acc, r| acc.union(&r))
    }

    // === Iteration ===

    /// Get the number of stored cells, stubs included
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Check if the worksheet stores no cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Iterate over stored cells in row-major order
    pub fn iter_cells(&self) -> impl Iterator<Item = (CellAddress, &Cell)> {
        self.cells.iter().map(|(addr, cell)| (*addr, cell))
    }

    /// Iterate over stored cells inside a range, in row-major order
    pub fn cells_in(&self, range: CellRange) -> impl Iterator<Item = (CellAddress, &Cell)> {
        self.cells
            .range(range.start..=range.end)
            .filter(move |(addr, _)| range.contains(addr))
            .map(|(addr, cell)| (*addr, cell))
    }
}
