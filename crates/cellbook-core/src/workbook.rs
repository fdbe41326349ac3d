//! Workbook type - the main document structure

use crate::cell::{RangeRef, Scalar};
use crate::error::{Error, Result};
use crate::named_range::{NamedRange, NamedRangeCollection};
use crate::worksheet::Worksheet;
use crate::MAX_SHEET_NAME_LEN;

/// Name given to the sheet of a fresh workbook
pub const DEFAULT_SHEET_NAME: &str = "Sheet1";

/// A workbook (spreadsheet document)
///
/// An ordered list of named worksheets plus workbook-level named ranges. The
/// first sheet is the default sheet. Workbooks own all of their data, so
/// `clone` is a deep copy sharing nothing with the original.
#[derive(Debug, Clone, PartialEq)]
pub struct Workbook {
    /// Worksheets in the workbook, with their names
    worksheets: Vec<(String, Worksheet)>,
    /// Named ranges (defined names)
    named_ranges: NamedRangeCollection,
}

impl Workbook {
    /// Create a new workbook with one empty worksheet
    pub fn new() -> Self {
        Self {
            worksheets: vec![(DEFAULT_SHEET_NAME.to_string(), Worksheet::new())],
            named_ranges: NamedRangeCollection::new(),
        }
    }

    /// Create an empty workbook with no worksheets
    pub fn empty() -> Self {
        Self {
            worksheets: Vec::new(),
            named_ranges: NamedRangeCollection::new(),
        }
    }

    /// Create a one-sheet workbook from rows of values, anchored at A1
    ///
    /// ```
    /// use cellbook_core::{CellValue, Scalar, Workbook};
    ///
    /// let wb = Workbook::from_rows(vec![vec![Scalar::from("x"), Scalar::from(5)]]);
    /// let sheet = wb.worksheet(None).unwrap().unwrap();
    /// assert_eq!(sheet.get_value("B1").unwrap(), CellValue::Number(5.0));
    /// ```
    pub fn from_rows<R, V>(rows: R) -> Self
    where
        R: IntoIterator,
        R::Item: IntoIterator<Item = V>,
        V: Into<Scalar>,
    {
        Self {
            worksheets: vec![(DEFAULT_SHEET_NAME.to_string(), Worksheet::from_rows(rows))],
            named_ranges: NamedRangeCollection::new(),
        }
    }

    /// Structural deep copy
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Get the number of worksheets
    pub fn sheet_count(&self) -> usize {
        self.worksheets.len()
    }

    /// Check if the workbook has no worksheets
    pub fn is_empty(&self) -> bool {
        self.worksheets.is_empty()
    }

    /// Name of the default (first) sheet
    pub fn default_sheet_name(&self) -> Option<&str> {
        self.worksheets.first().map(|(name, _)| name.as_str())
    }

    /// Sheet names in workbook order
    pub fn sheet_names(&self) -> impl Iterator<Item = &str> {
        self.worksheets.iter().map(|(name, _)| name.as_str())
    }

    /// Iterate over `(name, sheet)` pairs in workbook order
    pub fn worksheets(&self) -> impl Iterator<Item = (&str, &Worksheet)> {
        self.worksheets.iter().map(|(name, ws)| (name.as_str(), ws))
    }

    /// Look up a worksheet by name, or the default sheet when `name` is `None`
    ///
    /// A missing named sheet is [`Error::SheetNotFound`]. Asking for the
    /// default sheet of a workbook with no sheets yields `Ok(None)`.
    pub fn worksheet(&self, name: Option<&str>) -> Result<Option<&Worksheet>> {
        match name {
            Some(name) => self
                .position(name)
                .map(|i| Some(&self.worksheets[i].1))
                .ok_or_else(|| Error::SheetNotFound(name.to_string())),
            None => Ok(self.worksheets.first().map(|(_, ws)| ws)),
        }
    }

    /// Mutable counterpart of [`Workbook::worksheet`]
    pub fn worksheet_mut(&mut self, name: Option<&str>) -> Result<Option<&mut Worksheet>> {
        match name {
            Some(name) => match self.position(name) {
                Some(i) => Ok(Some(&mut self.worksheets[i].1)),
                None => Err(Error::SheetNotFound(name.to_string())),
            },
            None => Ok(self.worksheets.first_mut().map(|(_, ws)| ws)),
        }
    }

    /// Like [`Workbook::worksheet_mut`], but a workbook with no sheets gets a
    /// default sheet instead of `None`
    pub(crate) fn target_sheet_mut(&mut self, name: Option<&str>) -> Result<&mut Worksheet> {
        if name.is_none() && self.worksheets.is_empty() {
            self.worksheets
                .push((DEFAULT_SHEET_NAME.to_string(), Worksheet::new()));
        }
        match self.worksheet_mut(name)? {
            Some(ws) => Ok(ws),
            None => Err(Error::SheetNotFound(DEFAULT_SHEET_NAME.to_string())),
        }
    }

    /// Replace the named sheet (default sheet when `name` is `None`), or
    /// append it when no sheet has that name. Other sheets are untouched.
    pub fn replace_worksheet(&mut self, sheet: Worksheet, name: Option<&str>) -> Result<()> {
        let name = match name.or_else(|| self.default_sheet_name()) {
            Some(name) => name.to_string(),
            None => DEFAULT_SHEET_NAME.to_string(),
        };
        match self.position(&name) {
            Some(i) => self.worksheets[i].1 = sheet,
            None => {
                self.validate_sheet_name(&name)?;
                self.worksheets.push((name, sheet));
            }
        }
        Ok(())
    }

    /// Append a worksheet under a new name
    pub fn add_worksheet(&mut self, name: &str, sheet: Worksheet) -> Result<usize> {
        self.validate_sheet_name(name)?;
        self.worksheets.push((name.to_string(), sheet));
        Ok(self.worksheets.len() - 1)
    }

    // ==================== Named Ranges ====================

    /// Define a named range
    ///
    /// # Example
    /// ```
    /// use cellbook_core::Workbook;
    ///
    /// let mut wb = Workbook::new();
    /// wb.define_name("TaxRate", "Sheet1!$B$1").unwrap();
    /// assert_eq!(wb.resolve_named_range("taxrate").unwrap().to_string(), "Sheet1!B1");
    /// ```
    pub fn define_name(&mut self, name: &str, refers_to: &str) -> Result<()> {
        self.named_ranges.define(NamedRange::parse(name, refers_to)?)
    }

    /// Remove a named range
    pub fn remove_name(&mut self, name: &str) -> Option<NamedRange> {
        self.named_ranges.remove(name)
    }

    /// Get the named range collection (read-only)
    pub fn named_ranges(&self) -> &NamedRangeCollection {
        &self.named_ranges
    }

    /// Get the named range collection (mutable)
    pub fn named_ranges_mut(&mut self) -> &mut NamedRangeCollection {
        &mut self.named_ranges
    }

    /// Dereference a name to its target, collapsing a one-cell rectangle to
    /// the single-cell form. Unknown names give `None`.
    pub fn resolve_named_range(&self, name: &str) -> Option<RangeRef> {
        self.named_ranges.get(name).map(|nr| RangeRef {
            sheet: nr.target.sheet.clone(),
            area: nr.target.area.collapse(),
        })
    }

    /// Stored spelling of a sheet name; lookups ignore case
    pub fn sheet_name(&self, name: &str) -> Option<&str> {
        self.position(name).map(|i| self.worksheets[i].0.as_str())
    }

    fn position(&self, name: &str) -> Option<usize> {
        let name_lower = name.to_lowercase();
        self.worksheets
            .iter()
            .position(|(n, _)| n.to_lowercase() == name_lower)
    }

    /// Validate a name for a new sheet
    fn validate_sheet_name(&self, name: &str) -> Result<()> {
        if name.is_empty() {
            return Err(Error::InvalidSheetName("Sheet name cannot be empty".into()));
        }
        if name.chars().count() > MAX_SHEET_NAME_LEN {
            return Err(Error::InvalidSheetName(format!(
                "Sheet name too long (max {} characters)",
                MAX_SHEET_NAME_LEN
            )));
        }

        const INVALID_CHARS: &[char] = &[':', '\\', '/', '?', '*', '[', ']'];
        if let Some(c) = name.chars().find(|c| INVALID_CHARS.contains(c)) {
            return Err(Error::InvalidSheetName(format!(
                "Sheet name cannot contain '{}'",
                c
            )));
        }

        if self.position(name).is_some() {
            return Err(Error::DuplicateSheetName(name.into()));
        }

        Ok(())
    }
}

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}
