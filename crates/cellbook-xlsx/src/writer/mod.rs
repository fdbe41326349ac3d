//! XLSX writer
//!
//! Every part is rendered to a string (or JSON bytes) first and then stored
//! in the package, in the order Excel itself writes them.

use std::fs::File;
use std::io::{Seek, Write};
use std::path::Path;

use log::{debug, warn};

use crate::attribute_part::{self, AttributePart};
use crate::error::XlsxResult;
use crate::styles::XlsxStyleTable;
use cellbook_core::{
    quote_sheet_name, Area, CellAddress, CellValue, RangeRef, Workbook, Worksheet,
    DEFAULT_SHEET_NAME,
};

const XML_DECL: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_PACKAGE_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const NS_DOC_RELS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const CT_PREFIX: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml";

/// XLSX file writer
pub struct XlsxWriter;

impl XlsxWriter {
    /// Write a workbook to a file path
    pub fn write_file<P: AsRef<Path>>(workbook: &Workbook, path: P) -> XlsxResult<()> {
        let file = File::create(path)?;
        Self::write(workbook, file)
    }

    /// Write a workbook to a writer
    pub fn write<W: Write + Seek>(workbook: &Workbook, writer: W) -> XlsxResult<()> {
        let mut zip = zip::ZipWriter::new(writer);

        let style_table = XlsxStyleTable::build(workbook);
        let attributes = AttributePart::collect(workbook);
        let with_attributes = !attributes.is_empty();

        write_part(&mut zip, "[Content_Types].xml", &content_types_xml(workbook, with_attributes))?;
        write_part(&mut zip, "_rels/.rels", &root_rels_xml())?;
        write_part(&mut zip, "xl/workbook.xml", &workbook_xml(workbook))?;
        write_part(&mut zip, "xl/_rels/workbook.xml.rels", &workbook_rels_xml(workbook.sheet_count()))?;
        write_part(&mut zip, "xl/styles.xml", &style_table.to_styles_xml())?;

        for (i, (name, sheet)) in workbook.worksheets().enumerate() {
            let path = format!("xl/worksheets/sheet{}.xml", i + 1);
            write_part(&mut zip, &path, &worksheet_xml(sheet, &style_table))?;
            debug!("wrote {} for {:?} ({} cells)", path, name, sheet.cell_count());
        }

        if with_attributes {
            let json = serde_json::to_vec(&attributes)?;
            write_part(&mut zip, attribute_part::PART_NAME, &json)?;
        }

        zip.finish()?;
        debug!(
            "wrote xlsx package with {} sheet(s), {} with cell attributes",
            workbook.sheet_count(),
            attributes.sheets.len()
        );
        Ok(())
    }
}

fn write_part<W: Write + Seek, C: AsRef<[u8]> + ?Sized>(
    zip: &mut zip::ZipWriter<W>,
    path: &str,
    content: &C,
) -> XlsxResult<()> {
    zip.start_file(path, zip::write::SimpleFileOptions::default())?;
    zip.write_all(content.as_ref())?;
    Ok(())
}

fn content_types_xml(workbook: &Workbook, with_attributes: bool) -> String {
    let mut xml = format!(
        "{XML_DECL}\n<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
         \n    <Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
         \n    <Default Extension=\"xml\" ContentType=\"application/xml\"/>"
    );
    if with_attributes {
        xml.push_str("\n    <Default Extension=\"json\" ContentType=\"application/json\"/>");
    }
    xml.push_str(&format!(
        "\n    <Override PartName=\"/xl/workbook.xml\" ContentType=\"{CT_PREFIX}.sheet.main+xml\"/>\
         \n    <Override PartName=\"/xl/styles.xml\" ContentType=\"{CT_PREFIX}.styles+xml\"/>"
    ));
    for n in 1..=workbook.sheet_count() {
        xml.push_str(&format!(
            "\n    <Override PartName=\"/xl/worksheets/sheet{n}.xml\" ContentType=\"{CT_PREFIX}.worksheet+xml\"/>"
        ));
    }
    xml.push_str("\n</Types>");
    xml
}

fn root_rels_xml() -> String {
    format!(
        "{XML_DECL}\n<Relationships xmlns=\"{NS_PACKAGE_RELS}\">\
         \n    <Relationship Id=\"rId1\" Type=\"{NS_DOC_RELS}/officeDocument\" Target=\"xl/workbook.xml\"/>\
         \n</Relationships>"
    )
}

/// Sheet list plus defined names; sheet `n` is relationship `rId{n}`
/// `<definedName>` text: sheet-qualified with absolute coordinates.
/// Unqualified targets point at the default sheet.
fn defined_name_target(workbook: &Workbook, target: &RangeRef) -> String {
    let sheet = target
        .sheet
        .as_deref()
        .or_else(|| workbook.default_sheet_name())
        .unwrap_or(DEFAULT_SHEET_NAME);
    let absolute = |addr: CellAddress| {
        format!("${}${}", CellAddress::column_to_letters(addr.col), addr.row + 1)
    };
    let area = match target.area {
        Area::Scalar(addr) => absolute(addr),
        Area::Rect(start, end) => format!("{}:{}", absolute(start), absolute(end)),
    };
    format!("{}!{}", quote_sheet_name(sheet), area)
}

fn workbook_xml(workbook: &Workbook) -> String {
    let mut xml = format!(
        "{XML_DECL}\n<workbook xmlns=\"{NS_MAIN}\" xmlns:r=\"{NS_DOC_RELS}\">\n    <sheets>"
    );
    for (i, name) in workbook.sheet_names().enumerate() {
        xml.push_str(&format!(
            "\n        <sheet name=\"{}\" sheetId=\"{n}\" r:id=\"rId{n}\"/>",
            escape_xml(name),
            n = i + 1
        ));
    }
    xml.push_str("\n    </sheets>");

    let names = workbook.named_ranges();
    if !names.is_empty() {
        xml.push_str("\n    <definedNames>");
        for nr in names.iter() {
            xml.push_str(&format!(
                "\n        <definedName name=\"{}\">{}</definedName>",
                escape_xml(&nr.name),
                escape_xml(&defined_name_target(workbook, &nr.target))
            ));
        }
        xml.push_str("\n    </definedNames>");
    }

    xml.push_str("\n</workbook>");
    xml
}

/// Worksheet relationships first, then styles as `rId{sheet_count + 1}`
fn workbook_rels_xml(sheet_count: usize) -> String {
    let mut xml = format!("{XML_DECL}\n<Relationships xmlns=\"{NS_PACKAGE_RELS}\">");
    for n in 1..=sheet_count {
        xml.push_str(&format!(
            "\n    <Relationship Id=\"rId{n}\" Type=\"{NS_DOC_RELS}/worksheet\" Target=\"worksheets/sheet{n}.xml\"/>"
        ));
    }
    xml.push_str(&format!(
        "\n    <Relationship Id=\"rId{}\" Type=\"{NS_DOC_RELS}/styles\" Target=\"styles.xml\"/>",
        sheet_count + 1
    ));
    xml.push_str("\n</Relationships>");
    xml
}

/// Cells go out sparse and row-major; stubs keep their address as empty `<c/>`
fn worksheet_xml(sheet: &Worksheet, style_table: &XlsxStyleTable) -> String {
    let mut xml = format!("{XML_DECL}\n<worksheet xmlns=\"{NS_MAIN}\">");

    if let Some(used) = sheet.used_range() {
        xml.push_str(&format!("\n    <dimension ref=\"{}\"/>", used));
    }

    xml.push_str("\n    <sheetData>");
    let mut open_row: Option<u32> = None;
    for (addr, cell) in sheet.iter_cells() {
        if open_row != Some(addr.row) {
            if open_row.is_some() {
                xml.push_str("\n        </row>");
            }
            xml.push_str(&format!("\n        <row r=\"{}\">", addr.row + 1));
            open_row = Some(addr.row);
        }

        let style = match style_table.xf_id_for(&cell.style) {
            0 => String::new(),
            xf_id => format!(" s=\"{}\"", xf_id),
        };
        let element = match &cell.value {
            CellValue::Number(n) if n.is_finite() => {
                format!("<c r=\"{}\"{}><v>{}</v></c>", addr, style, n)
            }
            CellValue::Number(n) => {
                warn!("writing non-finite number {} at {} as #NUM!", n, addr);
                format!("<c r=\"{}\"{} t=\"e\"><v>#NUM!</v></c>", addr, style)
            }
            CellValue::String(s) => format!(
                "<c r=\"{}\"{} t=\"inlineStr\"><is><t xml:space=\"preserve\">{}</t></is></c>",
                addr,
                style,
                escape_xml(&encode_excel_escapes(s))
            ),
            CellValue::Empty => format!("<c r=\"{}\"{}/>", addr, style),
        };
        xml.push_str("\n            ");
        xml.push_str(&element);
    }
    if open_row.is_some() {
        xml.push_str("\n        </row>");
    }
    xml.push_str("\n    </sheetData>");

    let merged = sheet.merged_regions();
    if !merged.is_empty() {
        xml.push_str(&format!("\n    <mergeCells count=\"{}\">", merged.len()));
        for region in merged {
            xml.push_str(&format!("\n        <mergeCell ref=\"{}\"/>", region));
        }
        xml.push_str("\n    </mergeCells>");
    }

    xml.push_str("\n</worksheet>");
    xml
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Encode text for a `<t>` element using Excel's `_xHHHH_` escapes
///
/// Control characters XML cannot carry are escaped, and so is any `_` that
/// would otherwise be read back as the start of an escape.
fn encode_excel_escapes(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut out = String::with_capacity(s.len());
    for (i, &c) in chars.iter().enumerate() {
        let escapes_control = c.is_control() && c != '\t' && c != '\n';
        let starts_escape = c == '_' && looks_like_escape(&chars[i..]);
        if escapes_control || starts_escape {
            out.push_str(&format!("_x{:04X}_", c as u32));
        } else {
            out.push(c);
        }
    }
    out
}

fn looks_like_escape(chars: &[char]) -> bool {
    chars.len() >= 7
        && chars[1] == 'x'
        && chars[2..6].iter().all(|c| c.is_ascii_hexdigit())
        && chars[6] == '_'
}
