//! `xl/cellbook/attributes.json`: per-cell style bags and disabled flags

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use cellbook_core::{Attributes, CellAddress, Workbook};

/// Path of the part inside the package
pub(crate) const PART_NAME: &str = "xl/cellbook/attributes.json";

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct AttributePart {
    pub sheets: Vec<SheetAttributes>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SheetAttributes {
    pub name: String,
    /// Keyed by A1 address
    pub cells: BTreeMap<String, CellAttributes>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub(crate) struct CellAttributes {
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub style: Attributes,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disabled: bool,
}

impl AttributePart {
    /// Collect every cell that carries style or disabled data
    pub(crate) fn collect(workbook: &Workbook) -> Self {
        let sheets = workbook
            .worksheets()
            .map(|(name, sheet)| SheetAttributes {
                name: name.to_string(),
                cells: sheet
                    .iter_cells()
                    .filter(|(_, cell)| cell.has_attributes())
                    .map(|(addr, cell)| {
                        (
                            addr.to_a1_string(),
                            CellAttributes {
                                style: cell.style.clone(),
                                disabled: cell.disabled,
                            },
                        )
                    })
                    .collect(),
            })
            .filter(|sheet| !sheet.cells.is_empty())
            .collect();
        Self { sheets }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Write the collected attributes back onto a decoded workbook
    ///
    /// Entries for unknown sheets or unreadable addresses are skipped.
    pub(crate) fn apply(self, workbook: &mut Workbook) {
        for sheet_attrs in self.sheets {
            let sheet = match workbook.worksheet_mut(Some(&sheet_attrs.name)) {
                Ok(Some(sheet)) => sheet,
                _ => {
                    log::warn!("attribute part names unknown sheet {:?}", sheet_attrs.name);
                    continue;
                }
            };
            for (address, attrs) in sheet_attrs.cells {
                match CellAddress::parse(&address) {
                    Ok(addr) => {
                        let cell = sheet.ensure_cell(addr);
                        cell.style = attrs.style;
                        cell.disabled = attrs.disabled;
                    }
                    Err(e) => log::warn!("skipping attribute entry {:?}: {}", address, e),
                }
            }
        }
    }
}
