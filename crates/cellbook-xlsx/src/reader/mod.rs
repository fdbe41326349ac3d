//! XLSX reader

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use log::{debug, warn};
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::attribute_part::{self, AttributePart};
use crate::error::{XlsxError, XlsxResult};
use crate::styles::{read_styles_xml, style_bags};
use cellbook_core::{
    Attributes, CellAddress, CellRange, CellValue, NamedRange, Workbook, Worksheet,
};

/// Decode Excel's `_xHHHH_` escape sequences in strings.
///
/// Excel uses this format to encode special characters in XML:
/// - `_x000d_` = CR (carriage return)
/// - `_x0009_` = Tab
/// - `_x005f_` = Underscore (escaped underscore)
fn decode_excel_escapes(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(pos) = rest.find("_x") {
        result.push_str(&rest[..pos]);
        let candidate = &rest[pos..];
        let decoded = candidate
            .get(2..6)
            .filter(|hex| hex.chars().all(|c| c.is_ascii_hexdigit()))
            .filter(|_| candidate[6..].starts_with('_'))
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .and_then(char::from_u32);

        match decoded {
            Some(c) => {
                result.push(c);
                rest = &candidate[7..];
            }
            None => {
                // Not an escape; keep the underscore and move on
                result.push('_');
                rest = &candidate[1..];
            }
        }
    }

    result.push_str(rest);
    result
}

fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.to_string()))
}

/// Sheets and defined names from xl/workbook.xml
#[derive(Debug, Default)]
struct WorkbookInfo {
    /// `(name, relationship id)` in workbook order
    sheets: Vec<(String, String)>,
    /// `(name, reference text)`
    defined_names: Vec<(String, String)>,
}

/// XLSX file reader
pub struct XlsxReader;

impl XlsxReader {
    /// Read a workbook from a file path
    pub fn read_file<P: AsRef<Path>>(path: P) -> XlsxResult<Workbook> {
        let file = File::open(path)?;
        Self::read(file)
    }

    /// Read a workbook from a reader
    pub fn read<R: Read + Seek>(reader: R) -> XlsxResult<Workbook> {
        let mut archive = zip::ZipArchive::new(reader)?;

        // Verify this is an XLSX file
        if archive.by_name("[Content_Types].xml").is_err() {
            return Err(XlsxError::InvalidFormat(
                "Missing [Content_Types].xml".into(),
            ));
        }

        // Read shared strings (if present)
        let shared_strings = Self::read_shared_strings(&mut archive)?;

        // Full style bags win over the styles.xml projection when present
        let attributes = Self::read_attribute_part(&mut archive)?;
        let cell_styles = if attributes.is_some() {
            Vec::new()
        } else {
            Self::read_styles(&mut archive)?
        };

        // Read workbook.xml to get sheet info
        let info = Self::read_workbook_xml(&mut archive)?;

        // Read workbook.xml.rels to get sheet paths
        let sheet_paths = Self::read_workbook_rels(&mut archive)?;

        let mut workbook = Workbook::empty();

        for (name, r_id) in &info.sheets {
            let Some(path) = sheet_paths.get(r_id) else {
                warn!("sheet {:?} has no worksheet relationship {:?}", name, r_id);
                continue;
            };
            let mut sheet = Worksheet::new();
            Self::read_worksheet(&mut archive, path, &mut sheet, &shared_strings, &cell_styles)?;
            debug!("read sheet {:?} from {} ({} cells)", name, path, sheet.cell_count());
            workbook.add_worksheet(name, sheet)?;
        }

        for (name, refers_to) in info.defined_names {
            if name.starts_with("_xlnm.") {
                continue;
            }
            match NamedRange::parse(name.as_str(), &refers_to) {
                Ok(nr) => workbook.named_ranges_mut().define_or_update(nr),
                Err(e) => warn!("skipping defined name {:?}: {}", name, e),
            }
        }

        if let Some(part) = attributes {
            part.apply(&mut workbook);
        }

        Ok(workbook)
    }

    /// Read the shared strings table
    fn read_shared_strings<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Vec<String>> {
        let mut strings = Vec::new();

        let file = match archive.by_name("xl/sharedStrings.xml") {
            Ok(f) => f,
            Err(_) => return Ok(strings), // No shared strings is valid
        };

        let reader = BufReader::new(file);
        let mut xml_reader = Reader::from_reader(reader);

        let mut buf = Vec::new();
        let mut current_string = String::new();
        let mut in_si = false;
        let mut in_t = false;
        // Phonetic runs are not part of the string value
        let mut in_phonetic = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"si" => {
                        in_si = true;
                        current_string.clear();
                    }
                    b"rPh" => in_phonetic = true,
                    b"t" if in_si && !in_phonetic => in_t = true,
                    _ => {}
                },
                Ok(Event::Empty(e)) if e.name().as_ref() == b"si" => strings.push(String::new()),
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"si" => {
                        strings.push(decode_excel_escapes(&current_string));
                        current_string.clear();
                        in_si = false;
                    }
                    b"rPh" => in_phonetic = false,
                    b"t" => in_t = false,
                    _ => {}
                },
                Ok(Event::Text(e)) if in_t => {
                    current_string.push_str(&e.unescape()?);
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        debug!("read {} shared strings", strings.len());
        Ok(strings)
    }

    /// Style bags per cellXfs index
    fn read_styles<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Vec<Attributes>> {
        let file = match archive.by_name("xl/styles.xml") {
            Ok(f) => f,
            Err(_) => return Ok(Vec::new()),
        };
        Ok(style_bags(&read_styles_xml(file)?))
    }

    fn read_attribute_part<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<Option<AttributePart>> {
        let file = match archive.by_name(attribute_part::PART_NAME) {
            Ok(f) => f,
            Err(_) => return Ok(None),
        };
        let part = serde_json::from_reader(BufReader::new(file))?;
        Ok(Some(part))
    }

    /// Read workbook.xml to get sheet names, rIds and defined names
    fn read_workbook_xml<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<WorkbookInfo> {
        let file = archive
            .by_name("xl/workbook.xml")
            .map_err(|_| XlsxError::MissingPart("xl/workbook.xml".into()))?;

        let reader = BufReader::new(file);
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut info = WorkbookInfo::default();
        let mut current_name: Option<String> = None;
        let mut current_ref = String::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e)) if e.name().as_ref() == b"sheet" => {
                    if let (Some(name), Some(r_id)) = (attr_value(&e, b"name"), attr_value(&e, b"r:id")) {
                        info.sheets.push((name, r_id));
                    }
                }
                Ok(Event::Start(e)) if e.name().as_ref() == b"definedName" => {
                    current_name = attr_value(&e, b"name");
                    current_ref.clear();
                }
                Ok(Event::Text(e)) if current_name.is_some() => {
                    current_ref.push_str(&e.unescape()?);
                }
                Ok(Event::End(e)) if e.name().as_ref() == b"definedName" => {
                    if let Some(name) = current_name.take() {
                        info.defined_names.push((name, current_ref.clone()));
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(info)
    }

    /// Read workbook.xml.rels to get sheet file paths
    fn read_workbook_rels<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
    ) -> XlsxResult<HashMap<String, String>> {
        let file = archive
            .by_name("xl/_rels/workbook.xml.rels")
            .map_err(|_| XlsxError::MissingPart("xl/_rels/workbook.xml.rels".into()))?;

        let reader = BufReader::new(file);
        let mut xml_reader = Reader::from_reader(reader);
        xml_reader.trim_text(true);

        let mut buf = Vec::new();
        let mut rels = HashMap::new();

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Empty(e)) | Ok(Event::Start(e))
                    if e.name().as_ref() == b"Relationship" =>
                {
                    let id = attr_value(&e, b"Id");
                    let target = attr_value(&e, b"Target");
                    let rel_type = attr_value(&e, b"Type");

                    // Only include worksheet relationships
                    if let (Some(id), Some(target), Some(rel_type)) = (id, target, rel_type) {
                        if rel_type.ends_with("/worksheet") {
                            // Target is relative to xl/ folder
                            let full_path = match target.strip_prefix('/') {
                                Some(absolute) => absolute.to_string(),
                                None => format!("xl/{}", target),
                            };
                            rels.insert(id, full_path);
                        }
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(rels)
    }

    /// Read a worksheet from the archive
    fn read_worksheet<R: Read + Seek>(
        archive: &mut zip::ZipArchive<R>,
        path: &str,
        worksheet: &mut Worksheet,
        shared_strings: &[String],
        cell_styles: &[Attributes],
    ) -> XlsxResult<()> {
        let file = archive
            .by_name(path)
            .map_err(|_| XlsxError::MissingPart(path.to_string()))?;

        let reader = BufReader::new(file);
        // Text is not trimmed: inline strings keep their whitespace
        let mut xml_reader = Reader::from_reader(reader);

        let mut buf = Vec::new();

        // Current cell state
        let mut cell = PendingCell::default();
        let mut in_cell = false;
        let mut in_value = false;
        let mut in_inline_str = false;
        let mut in_inline_text = false;
        let mut in_phonetic = false;

        loop {
            match xml_reader.read_event_into(&mut buf) {
                Ok(Event::Start(e)) => match e.name().as_ref() {
                    b"c" => {
                        in_cell = true;
                        cell = PendingCell::from_element(&e);
                    }
                    b"v" if in_cell => {
                        in_value = true;
                        cell.value = Some(String::new());
                    }
                    b"is" if in_cell => {
                        in_inline_str = true;
                        cell.value = Some(String::new());
                        cell.cell_type = Some("inlineStr".to_string());
                    }
                    b"t" if in_inline_str && !in_phonetic => in_inline_text = true,
                    b"rPh" => in_phonetic = true,
                    _ => {}
                },
                Ok(Event::Empty(e)) => match e.name().as_ref() {
                    b"c" => {
                        PendingCell::from_element(&e).apply(worksheet, shared_strings, cell_styles)?;
                    }
                    b"dimension" => {
                        if let Some(r) = attr_value(&e, b"ref") {
                            match CellRange::parse(&r) {
                                Ok(range) => worksheet.set_used_range(Some(range)),
                                Err(err) => warn!("ignoring dimension {:?}: {}", r, err),
                            }
                        }
                    }
                    b"mergeCell" => {
                        if let Some(r) = attr_value(&e, b"ref") {
                            let merged = CellRange::parse(&r)
                                .and_then(|range| worksheet.merge_cells(&range));
                            if let Err(err) = merged {
                                warn!("ignoring merge region {:?}: {}", r, err);
                            }
                        }
                    }
                    _ => {}
                },
                Ok(Event::End(e)) => match e.name().as_ref() {
                    b"c" => {
                        std::mem::take(&mut cell).apply(worksheet, shared_strings, cell_styles)?;
                        in_cell = false;
                    }
                    b"v" => in_value = false,
                    b"is" => in_inline_str = false,
                    b"t" => in_inline_text = false,
                    b"rPh" => in_phonetic = false,
                    _ => {}
                },
                Ok(Event::Text(e)) if in_value || in_inline_text => {
                    if let Some(value) = cell.value.as_mut() {
                        value.push_str(&e.unescape()?);
                    }
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(XlsxError::Xml(e)),
                _ => {}
            }
            buf.clear();
        }

        Ok(())
    }
}

/// A `<c>` element collected while parsing
#[derive(Debug, Default)]
struct PendingCell {
    cell_ref: Option<String>,
    cell_type: Option<String>,
    style_idx: Option<usize>,
    /// Text of `<v>` or of the inline string; formula text is not kept
    value: Option<String>,
}

impl PendingCell {
    fn from_element(e: &BytesStart<'_>) -> Self {
        Self {
            cell_ref: attr_value(e, b"r"),
            cell_type: attr_value(e, b"t"),
            style_idx: attr_value(e, b"s").and_then(|s| s.parse().ok()),
            value: None,
        }
    }

    /// Store the cell in the worksheet
    ///
    /// A cell without a value (style-only, or a formula with no cached
    /// result) becomes a stub so its address survives.
    fn apply(
        self,
        worksheet: &mut Worksheet,
        shared_strings: &[String],
        cell_styles: &[Attributes],
    ) -> XlsxResult<()> {
        let Some(cell_ref) = self.cell_ref else {
            warn!("skipping cell without a reference");
            return Ok(());
        };
        let addr = CellAddress::parse(&cell_ref).map_err(|e| {
            XlsxError::Parse(format!("Invalid cell reference '{}': {}", cell_ref, e))
        })?;

        let value = match self.value {
            None => CellValue::Empty,
            Some(value) => match self.cell_type.as_deref() {
                // Shared string
                Some("s") => {
                    let idx: usize = value.parse().map_err(|_| {
                        XlsxError::Parse(format!("Invalid shared string index: {}", value))
                    })?;
                    let s = shared_strings.get(idx).ok_or_else(|| {
                        XlsxError::Parse(format!("Shared string index {} out of bounds", idx))
                    })?;
                    CellValue::String(s.clone())
                }

                // Boolean
                Some("b") => {
                    let truthy = value == "1" || value.eq_ignore_ascii_case("true");
                    CellValue::Number(if truthy { 1.0 } else { 0.0 })
                }

                // Error text (#DIV/0!, #N/A, ...)
                Some("e") => CellValue::String(value),

                // Inline or formula string - decode Excel escape sequences
                Some("inlineStr") | Some("str") => CellValue::String(decode_excel_escapes(&value)),

                // Number (default type or explicit "n")
                None | Some("n") => match value.parse::<f64>() {
                    Ok(n) => CellValue::Number(n),
                    Err(_) => CellValue::String(value),
                },

                Some(other) => {
                    warn!("reading cell {} of unknown type {:?} as text", cell_ref, other);
                    CellValue::String(value)
                }
            },
        };

        let cell = worksheet.ensure_cell(addr);
        cell.value = value;
        if let Some(style) = self.style_idx.and_then(|idx| cell_styles.get(idx)) {
            cell.style = style.clone();
        }

        Ok(())
    }
}
