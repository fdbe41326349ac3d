//! XLSX styles (styles.xml) read/write helpers
//!
//! Cell style bags are free-form, so only a recognized subset is projected
//! onto real fonts, fills, borders and cellXfs:
//!
//! - `font.bold`, `font.italic`, `font.underline`, `font.sz`, `font.name`,
//!   `font.color.rgb`
//! - `fill.fgColor.rgb` (solid fill)
//! - `alignment.horizontal`, `alignment.vertical`, `alignment.wrapText`
//! - `border.{left,right,top,bottom}.style` and `.color.rgb`
//!
//! Everything else only survives through the attribute part.

use std::collections::HashMap;
use std::io::{BufReader, Read};

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::error::{XlsxError, XlsxResult};
use cellbook_core::{AttrValue, Attributes, Workbook};

const EDGES: [&str; 4] = ["left", "right", "top", "bottom"];

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
struct FontFormat {
    bold: bool,
    italic: bool,
    underline: bool,
    /// Point size, kept as text so the format can be hashed
    size: Option<String>,
    name: Option<String>,
    color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct BorderEdge {
    style: String,
    color: Option<String>,
}

type BorderFormat = [Option<BorderEdge>; 4];

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
struct AlignmentFormat {
    horizontal: Option<String>,
    vertical: Option<String>,
    wrap_text: bool,
}

impl AlignmentFormat {
    fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// The part of a style bag that styles.xml can express
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub(crate) struct CellFormat {
    font: FontFormat,
    /// Solid fill colour
    fill: Option<String>,
    border: BorderFormat,
    alignment: AlignmentFormat,
}

fn flag(style: &Attributes, path: &[&str]) -> bool {
    style
        .get_path(path)
        .and_then(AttrValue::as_bool)
        .unwrap_or(false)
}

fn text(style: &Attributes, path: &[&str]) -> Option<String> {
    style
        .get_path(path)
        .and_then(AttrValue::as_str)
        .map(str::to_string)
}

impl CellFormat {
    /// Project a style bag onto the recognized subset
    pub(crate) fn from_attributes(style: &Attributes) -> Self {
        let font = FontFormat {
            bold: flag(style, &["font", "bold"]),
            italic: flag(style, &["font", "italic"]),
            underline: flag(style, &["font", "underline"]),
            size: style
                .get_path(&["font", "sz"])
                .and_then(AttrValue::as_number)
                .map(|n| n.to_string()),
            name: text(style, &["font", "name"]),
            color: text(style, &["font", "color", "rgb"]),
        };

        let mut border: BorderFormat = Default::default();
        for (slot, edge) in border.iter_mut().zip(EDGES) {
            *slot = text(style, &["border", edge, "style"]).map(|line| BorderEdge {
                style: line,
                color: text(style, &["border", edge, "color", "rgb"]),
            });
        }

        Self {
            font,
            fill: text(style, &["fill", "fgColor", "rgb"]),
            border,
            alignment: AlignmentFormat {
                horizontal: text(style, &["alignment", "horizontal"]),
                vertical: text(style, &["alignment", "vertical"]),
                wrap_text: flag(style, &["alignment", "wrapText"]),
            },
        }
    }

    /// Rebuild a style bag from a decoded cell format
    pub(crate) fn to_attributes(&self) -> Attributes {
        let mut style = Attributes::new();

        let mut font = Attributes::new();
        if self.font.bold {
            font.insert("bold", true);
        }
        if self.font.italic {
            font.insert("italic", true);
        }
        if self.font.underline {
            font.insert("underline", true);
        }
        if let Some(size) = self.font.size.as_deref().and_then(|s| s.parse::<f64>().ok()) {
            font.insert("sz", size);
        }
        if let Some(name) = &self.font.name {
            font.insert("name", name.as_str());
        }
        if let Some(color) = &self.font.color {
            font.insert("color", Attributes::new().with("rgb", color.as_str()));
        }
        if !font.is_empty() {
            style.insert("font", font);
        }

        if let Some(color) = &self.fill {
            style.insert(
                "fill",
                Attributes::new().with("fgColor", Attributes::new().with("rgb", color.as_str())),
            );
        }

        let mut border = Attributes::new();
        for (edge, name) in self.border.iter().zip(EDGES) {
            if let Some(edge) = edge {
                let mut bag = Attributes::new().with("style", edge.style.as_str());
                if let Some(color) = &edge.color {
                    bag.insert("color", Attributes::new().with("rgb", color.as_str()));
                }
                border.insert(name, bag);
            }
        }
        if !border.is_empty() {
            style.insert("border", border);
        }

        let mut alignment = Attributes::new();
        if let Some(h) = &self.alignment.horizontal {
            alignment.insert("horizontal", h.as_str());
        }
        if let Some(v) = &self.alignment.vertical {
            alignment.insert("vertical", v.as_str());
        }
        if self.alignment.wrap_text {
            alignment.insert("wrapText", true);
        }
        if !alignment.is_empty() {
            style.insert("alignment", alignment);
        }

        style
    }

    fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

// === Writing ===

#[derive(Debug)]
pub(crate) struct XlsxStyleTable {
    /// Deduplicated formats. Index corresponds to the cellXfs index (xfId).
    formats: Vec<CellFormat>,
    xf_ids: HashMap<CellFormat, u32>,
}

impl XlsxStyleTable {
    pub(crate) fn build(workbook: &Workbook) -> Self {
        let mut formats = vec![CellFormat::default()];
        let mut xf_ids = HashMap::new();
        xf_ids.insert(CellFormat::default(), 0);

        for (_, sheet) in workbook.worksheets() {
            for (_, cell) in sheet.iter_cells() {
                if cell.style.is_empty() {
                    continue;
                }
                let format = CellFormat::from_attributes(&cell.style);
                if !xf_ids.contains_key(&format) {
                    xf_ids.insert(format.clone(), formats.len() as u32);
                    formats.push(format);
                }
            }
        }

        Self { formats, xf_ids }
    }

    pub(crate) fn xf_id_for(&self, style: &Attributes) -> u32 {
        if style.is_empty() {
            return 0;
        }
        self.xf_ids
            .get(&CellFormat::from_attributes(style))
            .copied()
            .unwrap_or(0)
    }

    pub(crate) fn to_styles_xml(&self) -> String {
        let mut fonts = vec![FontFormat::default()];
        let mut font_ids: HashMap<FontFormat, u32> = HashMap::new();
        font_ids.insert(FontFormat::default(), 0);

        // Excel requires the first two fills to be none and gray125
        let mut fills: Vec<String> = Vec::new();
        let mut fill_ids: HashMap<String, u32> = HashMap::new();

        let mut borders: Vec<BorderFormat> = vec![Default::default()];
        let mut border_ids: HashMap<BorderFormat, u32> = HashMap::new();
        border_ids.insert(Default::default(), 0);

        let mut resolved = Vec::with_capacity(self.formats.len());
        for format in &self.formats {
            let font_id = *font_ids.entry(format.font.clone()).or_insert_with(|| {
                fonts.push(format.font.clone());
                fonts.len() as u32 - 1
            });
            let fill_id = match &format.fill {
                None => 0,
                Some(color) => *fill_ids.entry(color.clone()).or_insert_with(|| {
                    fills.push(color.clone());
                    fills.len() as u32 + 1
                }),
            };
            let border_id = *border_ids.entry(format.border.clone()).or_insert_with(|| {
                borders.push(format.border.clone());
                borders.len() as u32 - 1
            });
            resolved.push((font_id, fill_id, border_id));
        }

        let mut xml = String::from(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
        );

        xml.push_str(&format!("\n  <fonts count=\"{}\">", fonts.len()));
        for (i, font) in fonts.iter().enumerate() {
            xml.push_str("\n    ");
            xml.push_str(&write_font(font, i == 0));
        }
        xml.push_str("\n  </fonts>");

        xml.push_str(&format!("\n  <fills count=\"{}\">", fills.len() + 2));
        xml.push_str("\n    <fill><patternFill patternType=\"none\"/></fill>");
        xml.push_str("\n    <fill><patternFill patternType=\"gray125\"/></fill>");
        for color in &fills {
            xml.push_str(&format!(
                "\n    <fill><patternFill patternType=\"solid\"><fgColor rgb=\"{}\"/><bgColor indexed=\"64\"/></patternFill></fill>",
                escape_xml_attr(&argb(color))
            ));
        }
        xml.push_str("\n  </fills>");

        xml.push_str(&format!("\n  <borders count=\"{}\">", borders.len()));
        for border in &borders {
            xml.push_str("\n    ");
            xml.push_str(&write_border(border));
        }
        xml.push_str("\n  </borders>");

        xml.push_str(
            r#"
  <cellStyleXfs count="1">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0"/>
  </cellStyleXfs>"#,
        );

        xml.push_str(&format!("\n  <cellXfs count=\"{}\">", self.formats.len()));
        for (format, ids) in self.formats.iter().zip(resolved) {
            xml.push_str("\n    ");
            xml.push_str(&write_xf(format, ids));
        }
        xml.push_str("\n  </cellXfs>");

        xml.push_str(
            r#"
  <cellStyles count="1">
    <cellStyle name="Normal" xfId="0" builtinId="0"/>
  </cellStyles>
  <dxfs count="0"/>
</styleSheet>"#,
        );
        xml
    }
}

fn escape_xml_attr(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

/// `FF0000` -> `FFFF0000`; anything that is not six hex digits is kept
fn argb(rgb: &str) -> String {
    let hex = rgb.trim_start_matches('#');
    if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        format!("FF{}", hex.to_ascii_uppercase())
    } else {
        hex.to_string()
    }
}

fn write_font(font: &FontFormat, is_default: bool) -> String {
    let mut s = String::from("<font>");
    if font.bold {
        s.push_str("<b/>");
    }
    if font.italic {
        s.push_str("<i/>");
    }
    if font.underline {
        s.push_str("<u/>");
    }
    match &font.size {
        Some(size) => s.push_str(&format!("<sz val=\"{}\"/>", escape_xml_attr(size))),
        None if is_default => s.push_str("<sz val=\"11\"/>"),
        None => {}
    }
    if let Some(color) = &font.color {
        s.push_str(&format!("<color rgb=\"{}\"/>", escape_xml_attr(&argb(color))));
    }
    match &font.name {
        Some(name) => s.push_str(&format!("<name val=\"{}\"/>", escape_xml_attr(name))),
        None if is_default => s.push_str("<name val=\"Calibri\"/>"),
        None => {}
    }
    s.push_str("</font>");
    s
}

fn write_border(border: &BorderFormat) -> String {
    let mut s = String::from("<border>");
    for (edge, tag) in border.iter().zip(EDGES) {
        match edge {
            None => s.push_str(&format!("<{tag}/>")),
            Some(edge) => {
                s.push_str(&format!("<{tag} style=\"{}\">", escape_xml_attr(&edge.style)));
                if let Some(color) = &edge.color {
                    s.push_str(&format!("<color rgb=\"{}\"/>", escape_xml_attr(&argb(color))));
                }
                s.push_str(&format!("</{tag}>"));
            }
        }
    }
    s.push_str("<diagonal/></border>");
    s
}

fn write_xf(format: &CellFormat, (font_id, fill_id, border_id): (u32, u32, u32)) -> String {
    let mut attrs = String::new();
    if font_id != 0 {
        attrs.push_str(" applyFont=\"1\"");
    }
    if fill_id != 0 {
        attrs.push_str(" applyFill=\"1\"");
    }
    if border_id != 0 {
        attrs.push_str(" applyBorder=\"1\"");
    }
    if !format.alignment.is_default() {
        attrs.push_str(" applyAlignment=\"1\"");
    }

    let mut s = format!(
        "<xf numFmtId=\"0\" fontId=\"{}\" fillId=\"{}\" borderId=\"{}\" xfId=\"0\"{}",
        font_id, fill_id, border_id, attrs
    );
    if format.alignment.is_default() {
        s.push_str("/>");
        return s;
    }

    let al = &format.alignment;
    s.push_str("><alignment");
    if let Some(h) = &al.horizontal {
        s.push_str(&format!(" horizontal=\"{}\"", escape_xml_attr(h)));
    }
    if let Some(v) = &al.vertical {
        s.push_str(&format!(" vertical=\"{}\"", escape_xml_attr(v)));
    }
    if al.wrap_text {
        s.push_str(" wrapText=\"1\"");
    }
    s.push_str("/></xf>");
    s
}

// === Reading ===

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    Other,
    Fonts,
    Fills,
    Borders,
    CellXfs,
}

#[derive(Debug)]
struct StylesParser {
    section: Section,
    fonts: Vec<FontFormat>,
    fills: Vec<Option<String>>,
    borders: Vec<BorderFormat>,
    xfs: Vec<(usize, usize, usize, AlignmentFormat)>,

    font: Option<FontFormat>,
    fill: Option<(bool, Option<String>)>,
    border: Option<BorderFormat>,
    edge: Option<usize>,
    xf: Option<(usize, usize, usize, AlignmentFormat)>,
}

fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.to_string()))
}

fn attr_flag(e: &BytesStart<'_>, key: &[u8]) -> Option<bool> {
    attr_value(e, key).map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
}

fn rgb_value(e: &BytesStart<'_>) -> Option<String> {
    attr_value(e, b"rgb").map(|rgb| match rgb.len() {
        8 if rgb.starts_with("FF") => rgb[2..].to_string(),
        _ => rgb,
    })
}

impl StylesParser {
    fn new() -> Self {
        Self {
            section: Section::Other,
            fonts: Vec::new(),
            fills: Vec::new(),
            borders: Vec::new(),
            xfs: Vec::new(),
            font: None,
            fill: None,
            border: None,
            edge: None,
            xf: None,
        }
    }

    fn start(&mut self, e: &BytesStart<'_>) {
        match e.name().as_ref() {
            b"fonts" => self.section = Section::Fonts,
            b"fills" => self.section = Section::Fills,
            b"borders" => self.section = Section::Borders,
            b"cellXfs" => self.section = Section::CellXfs,
            b"cellStyleXfs" | b"dxfs" | b"cellStyles" => self.section = Section::Other,

            b"font" if self.section == Section::Fonts => self.font = Some(FontFormat::default()),
            b"b" | b"i" | b"u" => {
                if let Some(font) = self.font.as_mut() {
                    let on = match e.name().as_ref() {
                        b"u" => attr_value(e, b"val").map_or(true, |v| v != "none"),
                        _ => attr_flag(e, b"val").unwrap_or(true),
                    };
                    match e.name().as_ref() {
                        b"b" => font.bold = on,
                        b"i" => font.italic = on,
                        _ => font.underline = on,
                    }
                }
            }
            b"sz" => {
                if let Some(font) = self.font.as_mut() {
                    font.size = attr_value(e, b"val");
                }
            }
            b"name" => {
                if let Some(font) = self.font.as_mut() {
                    font.name = attr_value(e, b"val");
                }
            }
            b"color" => {
                if let Some(font) = self.font.as_mut() {
                    font.color = rgb_value(e);
                } else if let (Some(border), Some(edge)) = (self.border.as_mut(), self.edge) {
                    if let Some(edge) = border[edge].as_mut() {
                        edge.color = rgb_value(e);
                    }
                }
            }

            b"fill" if self.section == Section::Fills => self.fill = Some((false, None)),
            b"patternFill" => {
                if let Some((solid, _)) = self.fill.as_mut() {
                    *solid = attr_value(e, b"patternType").as_deref() == Some("solid");
                }
            }
            b"fgColor" => {
                if let Some((_, color)) = self.fill.as_mut() {
                    *color = rgb_value(e);
                }
            }

            b"border" if self.section == Section::Borders => {
                self.border = Some(Default::default())
            }
            name @ (b"left" | b"right" | b"top" | b"bottom") => {
                if let Some(border) = self.border.as_mut() {
                    let idx = EDGES
                        .iter()
                        .position(|edge| edge.as_bytes() == name)
                        .unwrap_or(0);
                    self.edge = Some(idx);
                    border[idx] = attr_value(e, b"style")
                        .filter(|style| style != "none")
                        .map(|style| BorderEdge { style, color: None });
                }
            }

            b"xf" if self.section == Section::CellXfs => {
                let id = |key: &[u8]| {
                    attr_value(e, key)
                        .and_then(|v| v.parse::<usize>().ok())
                        .unwrap_or(0)
                };
                self.xf = Some((
                    id(b"fontId"),
                    id(b"fillId"),
                    id(b"borderId"),
                    AlignmentFormat::default(),
                ));
            }
            b"alignment" => {
                if let Some((_, _, _, alignment)) = self.xf.as_mut() {
                    alignment.horizontal = attr_value(e, b"horizontal");
                    alignment.vertical = attr_value(e, b"vertical");
                    alignment.wrap_text = attr_flag(e, b"wrapText").unwrap_or(false);
                }
            }
            _ => {}
        }
    }

    fn end(&mut self, name: &[u8]) {
        match name {
            b"font" => {
                if let Some(font) = self.font.take() {
                    self.fonts.push(font);
                }
            }
            b"fill" => {
                if let Some((solid, color)) = self.fill.take() {
                    self.fills.push(color.filter(|_| solid));
                }
            }
            b"border" => {
                if let Some(border) = self.border.take() {
                    self.borders.push(border);
                }
            }
            b"left" | b"right" | b"top" | b"bottom" => self.edge = None,
            b"xf" => {
                if let Some(xf) = self.xf.take() {
                    self.xfs.push(xf);
                }
            }
            b"fonts" | b"fills" | b"borders" | b"cellXfs" => self.section = Section::Other,
            _ => {}
        }
    }

    fn finish(self) -> Vec<CellFormat> {
        self.xfs
            .into_iter()
            .map(|(font_id, fill_id, border_id, alignment)| CellFormat {
                // Index 0 of each table is the workbook default
                font: match font_id {
                    0 => FontFormat::default(),
                    id => self.fonts.get(id).cloned().unwrap_or_default(),
                },
                fill: self.fills.get(fill_id).cloned().flatten(),
                border: match border_id {
                    0 => Default::default(),
                    id => self.borders.get(id).cloned().unwrap_or_default(),
                },
                alignment,
            })
            .collect()
    }
}

/// Parse styles.xml into cell formats indexed by xf id
pub(crate) fn read_styles_xml<R: Read>(reader: R) -> XlsxResult<Vec<CellFormat>> {
    let mut xml_reader = Reader::from_reader(BufReader::new(reader));
    xml_reader.trim_text(true);

    let mut buf = Vec::new();
    let mut parser = StylesParser::new();

    loop {
        match xml_reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => parser.start(&e),
            Ok(Event::Empty(e)) => {
                parser.start(&e);
                parser.end(e.name().as_ref());
            }
            Ok(Event::End(e)) => parser.end(e.name().as_ref()),
            Ok(Event::Eof) => break,
            Err(e) => return Err(XlsxError::Xml(e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(parser.finish())
}

/// Style bags per xf id; unstyled formats map to an empty bag
pub(crate) fn style_bags(formats: &[CellFormat]) -> Vec<Attributes> {
    formats
        .iter()
        .map(|format| {
            if format.is_default() {
                Attributes::new()
            } else {
                format.to_attributes()
            }
        })
        .collect()
}
