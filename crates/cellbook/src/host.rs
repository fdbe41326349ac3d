//! Helpers for scripting hosts that exchange JSON
//!
//! Hosts pass rows, change sets and references as [`serde_json::Value`]s.
//! These functions convert them to the typed API and back; every operation
//! still returns a fresh workbook and leaves its input untouched.

use serde::Deserialize;
use serde_json::Value;

use cellbook_core::{Attributes, CellOrRange, FillValues, Scalar, Workbook};

use crate::{Error, Result};

/// Convert a JSON number or string into a cell scalar
///
/// Booleans become the text `"true"` / `"false"`.
pub fn scalar_from_json(value: &Value) -> Result<Scalar> {
    match value {
        Value::Number(n) => n
            .as_f64()
            .map(Scalar::Number)
            .ok_or_else(|| Error::InvalidValue(format!("number out of range: {}", n))),
        Value::String(s) => Ok(Scalar::Text(s.clone())),
        Value::Bool(b) => Ok(Scalar::Text(b.to_string())),
        other => Err(Error::InvalidValue(format!(
            "expected a number or string, got {}",
            json_kind(other)
        ))),
    }
}

/// Convert a JSON object into an attribute bag
pub fn attributes_from_json(value: &Value) -> Result<Attributes> {
    if !value.is_object() {
        return Err(Error::InvalidValue(format!(
            "expected an object of changes, got {}",
            json_kind(value)
        )));
    }
    serde_json::from_value(value.clone()).map_err(|e| Error::InvalidValue(e.to_string()))
}

/// Convert JSON fill values: an array of row arrays, or a flat array of scalars
pub fn fill_values_from_json(value: &Value) -> Result<FillValues> {
    let items = value.as_array().ok_or_else(|| {
        Error::InvalidValue(format!("expected an array of values, got {}", json_kind(value)))
    })?;

    if items.iter().any(Value::is_array) {
        items
            .iter()
            .map(|row| match row {
                Value::Array(cells) => cells.iter().map(scalar_from_json).collect(),
                other => Err(Error::InvalidValue(format!(
                    "expected a row array, got {}",
                    json_kind(other)
                ))),
            })
            .collect::<Result<Vec<Vec<Scalar>>>>()
            .map(FillValues::Rows)
    } else {
        items
            .iter()
            .map(scalar_from_json)
            .collect::<Result<Vec<Scalar>>>()
            .map(FillValues::Flat)
    }
}

/// Build a one-sheet workbook from JSON rows
pub fn spreadsheet(rows: &Value) -> Result<Workbook> {
    let rows = match fill_values_from_json(rows)? {
        FillValues::Rows(rows) => rows,
        FillValues::Flat(row) => vec![row],
    };
    Ok(Workbook::from_rows(rows))
}

/// Rebuild a workbook from its JSON form, as produced by [`workbook_to_json`]
pub fn spreadsheet_from_workbook(value: &Value) -> Result<Workbook> {
    if !value.is_object() {
        return Err(Error::InvalidValue(format!(
            "expected a workbook object, got {}",
            json_kind(value)
        )));
    }
    Workbook::deserialize(value).map_err(|e| Error::InvalidValue(e.to_string()))
}

/// JSON form of a workbook: its sheets (cells keyed by A1 address, merge
/// regions, used range) and its named ranges
pub fn workbook_to_json(workbook: &Workbook) -> Result<Value> {
    serde_json::to_value(workbook).map_err(|e| Error::InvalidValue(e.to_string()))
}

/// Apply a JSON change set to one range, or to each range of an array
pub fn update_range(workbook: &Workbook, ranges: &Value, changes: &Value) -> Result<Workbook> {
    let changes = attributes_from_json(changes)?;
    match ranges {
        Value::String(range) => Ok(workbook.update_range(range, &changes)?),
        Value::Array(items) => {
            let ranges = items
                .iter()
                .map(|item| {
                    item.as_str().ok_or_else(|| {
                        Error::InvalidValue(format!(
                            "expected a range string, got {}",
                            json_kind(item)
                        ))
                    })
                })
                .collect::<Result<Vec<&str>>>()?;
            Ok(workbook.update_ranges(&ranges, &changes)?)
        }
        other => Err(Error::InvalidValue(format!(
            "expected a range or list of ranges, got {}",
            json_kind(other)
        ))),
    }
}

/// Apply one JSON change set to several ranges
pub fn update_ranges<S: AsRef<str>>(
    workbook: &Workbook,
    ranges: &[S],
    changes: &Value,
) -> Result<Workbook> {
    let changes = attributes_from_json(changes)?;
    Ok(workbook.update_ranges(ranges, &changes)?)
}

/// Write JSON values into a range
pub fn fill_range(workbook: &Workbook, range: &str, values: &Value) -> Result<Workbook> {
    let values = fill_values_from_json(values)?;
    Ok(workbook.fill_range(range, values)?)
}

/// Every cell address of a range, row-major
pub fn parse_range(range: &str) -> Result<Vec<String>> {
    Ok(cellbook_core::parse_range(range)?)
}

/// Display values of a reference: a string for one cell, rows of strings otherwise
pub fn listval(workbook: &Workbook, reference: &str) -> Result<Value> {
    Ok(match workbook.resolve_ref(reference)? {
        CellOrRange::Single(text) => Value::String(text),
        CellOrRange::Grid(rows) => Value::Array(
            rows.into_iter()
                .map(|row| Value::Array(row.into_iter().map(Value::String).collect()))
                .collect(),
        ),
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
