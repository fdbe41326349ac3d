//! Named range definitions
//!
//! A named range binds a workbook-level name to a (possibly sheet-qualified)
//! reference, e.g. `TotalSales` -> `Sheet1!$C$1:$C$1`.

use crate::cell::RangeRef;
use crate::error::{Error, Result};

/// A named range definition
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NamedRange {
    /// The name (e.g., "SalesData"); compared case-insensitively
    pub name: String,
    /// What the name refers to
    pub target: RangeRef,
}

impl NamedRange {
    /// Create a new named range
    pub fn new(name: impl Into<String>, target: RangeRef) -> Self {
        Self {
            name: name.into(),
            target,
        }
    }

    /// Create a named range from reference text such as `Sheet1!$A$1:$B$2`
    pub fn parse(name: impl Into<String>, refers_to: &str) -> Result<Self> {
        Ok(Self::new(name, RangeRef::parse(refers_to)?))
    }
}

/// Collection of named ranges, kept in definition order
#[derive(Debug, Default, Clone, PartialEq)]
pub struct NamedRangeCollection {
    ranges: Vec<NamedRange>,
}

impl NamedRangeCollection {
    /// Create a new empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a new named range
    ///
    /// Returns an error if the name is already taken
    pub fn define(&mut self, range: NamedRange) -> Result<()> {
        if self.get(&range.name).is_some() {
            return Err(Error::DuplicateName(range.name));
        }
        self.ranges.push(range);
        Ok(())
    }

    /// Define or replace a named range
    pub fn define_or_update(&mut self, range: NamedRange) {
        match self
            .ranges
            .iter_mut()
            .find(|r| r.name.eq_ignore_ascii_case(&range.name))
        {
            Some(existing) => *existing = range,
            None => self.ranges.push(range),
        }
    }

    /// Look up a named range (case-insensitive)
    pub fn get(&self, name: &str) -> Option<&NamedRange> {
        self.ranges.iter().find(|r| r.name.eq_ignore_ascii_case(name))
    }

    /// Remove a named range
    pub fn remove(&mut self, name: &str) -> Option<NamedRange> {
        let idx = self
            .ranges
            .iter()
            .position(|r| r.name.eq_ignore_ascii_case(name))?;
        Some(self.ranges.remove(idx))
    }

    /// Iterate over all named ranges
    pub fn iter(&self) -> impl Iterator<Item = &NamedRange> {
        self.ranges.iter()
    }

    /// Get the number of named ranges
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// Check if the collection is empty
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{Area, CellAddress};

    #[test]
    fn test_parse_target() {
        let nr = NamedRange::parse("TaxRate", "Sheet1!$B$1").unwrap();
        assert_eq!(nr.target.sheet.as_deref(), Some("Sheet1"));
        assert_eq!(nr.target.area, Area::Scalar(CellAddress::new(0, 1)));

        assert!(NamedRange::parse("Bad", "not a ref").is_err());
    }

    #[test]
    fn test_case_insensitive() {
        let mut coll = NamedRangeCollection::new();
        coll.define(NamedRange::parse("TaxRate", "B1").unwrap()).unwrap();

        assert!(coll.get("taxrate").is_some());
        assert!(coll.get("TAXRATE").is_some());
        assert!(matches!(
            coll.define(NamedRange::parse("TAXRATE", "B2").unwrap()),
            Err(Error::DuplicateName(_))
        ));
    }

    #[test]
    fn test_define_or_update_and_remove() {
        let mut coll = NamedRangeCollection::new();
        coll.define_or_update(NamedRange::parse("Total", "A1").unwrap());
        coll.define_or_update(NamedRange::parse("total", "A2").unwrap());
        assert_eq!(coll.len(), 1);
        assert_eq!(coll.get("Total").unwrap().target.to_string(), "A2");

        assert!(coll.remove("TOTAL").is_some());
        assert!(coll.is_empty());
    }
}
