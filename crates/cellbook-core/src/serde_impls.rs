//! Serde support for the workbook model
//!
//! Addresses, ranges and references serialize as their A1 text, so cell maps
//! become JSON objects keyed by address:
//!
//! ```json
//! {"sheets": [{"name": "Sheet1",
//!              "cells": {"A1": {"value": {"t": "number", "v": 1.0}}},
//!              "merged_regions": ["A1:B1"],
//!              "used_range": "A1:B1"}],
//!  "names": [{"name": "Total", "target": "Sheet1!A1"}]}
//! ```
//!
//! Deserializing goes through the public constructors, so sheet names,
//! duplicate names and overlapping merges are rejected as they would be when
//! building the workbook by hand.

use std::collections::BTreeMap;

use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::cell::{Cell, CellAddress, CellRange, RangeRef};
use crate::named_range::NamedRange;
use crate::workbook::Workbook;
use crate::worksheet::Worksheet;

impl Serialize for CellAddress {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_a1_string())
    }
}

impl<'de> Deserialize<'de> for CellAddress {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        CellAddress::parse(&s).map_err(D::Error::custom)
    }
}

impl Serialize for CellRange {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for CellRange {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        CellRange::parse(&s).map_err(D::Error::custom)
    }
}

impl Serialize for RangeRef {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_a1_string())
    }
}

impl<'de> Deserialize<'de> for RangeRef {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        RangeRef::parse(&s).map_err(D::Error::custom)
    }
}

/// Stored cells of a sheet as an address-keyed map
struct CellMap<'a>(&'a Worksheet);

impl Serialize for CellMap<'_> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.cell_count()))?;
        for (addr, cell) in self.0.iter_cells() {
            map.serialize_entry(&addr, cell)?;
        }
        map.end()
    }
}

#[derive(Serialize)]
struct SheetOut<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    cells: CellMap<'a>,
    merged_regions: &'a [CellRange],
    #[serde(skip_serializing_if = "Option::is_none")]
    used_range: Option<CellRange>,
}

impl<'a> SheetOut<'a> {
    fn new(name: Option<&'a str>, sheet: &'a Worksheet) -> Self {
        Self {
            name,
            cells: CellMap(sheet),
            merged_regions: sheet.merged_regions(),
            used_range: sheet.used_range(),
        }
    }
}

#[derive(Deserialize)]
struct SheetIn {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    cells: BTreeMap<CellAddress, Cell>,
    #[serde(default)]
    merged_regions: Vec<CellRange>,
    #[serde(default)]
    used_range: Option<CellRange>,
}

impl SheetIn {
    fn into_worksheet(self) -> crate::Result<Worksheet> {
        let mut sheet = Worksheet::new();
        for (addr, cell) in self.cells {
            sheet.set_cell(addr, cell);
        }
        for region in &self.merged_regions {
            sheet.merge_cells(region)?;
        }
        sheet.set_used_range(self.used_range);
        Ok(sheet)
    }
}

impl Serialize for Worksheet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        SheetOut::new(None, self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Worksheet {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        SheetIn::deserialize(deserializer)?
            .into_worksheet()
            .map_err(D::Error::custom)
    }
}

impl Serialize for Workbook {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        #[derive(Serialize)]
        struct Helper<'a> {
            sheets: Vec<SheetOut<'a>>,
            names: Vec<&'a NamedRange>,
        }

        Helper {
            sheets: self
                .worksheets()
                .map(|(name, sheet)| SheetOut::new(Some(name), sheet))
                .collect(),
            names: self.named_ranges().iter().collect(),
        }
        .serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Workbook {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Helper {
            #[serde(default)]
            sheets: Vec<SheetIn>,
            #[serde(default)]
            names: Vec<NamedRange>,
        }

        let helper = Helper::deserialize(deserializer)?;

        let mut wb = Workbook::empty();
        for (i, entry) in helper.sheets.into_iter().enumerate() {
            let name = entry
                .name
                .clone()
                .ok_or_else(|| D::Error::custom(format!("sheet {} has no name", i)))?;
            let sheet = entry.into_worksheet().map_err(D::Error::custom)?;
            wb.add_worksheet(&name, sheet).map_err(D::Error::custom)?;
        }
        for name in helper.names {
            wb.named_ranges_mut().define(name).map_err(D::Error::custom)?;
        }
        Ok(wb)
    }
}
