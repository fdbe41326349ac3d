//! End-to-end tests for XLSX roundtrip (build -> to_bytes -> from_bytes -> verify)

use cellbook::prelude::*;
use cellbook::MAX_COLS;
use pretty_assertions::assert_eq;
use std::io::Cursor;

fn addr(s: &str) -> CellAddress {
    CellAddress::parse(s).unwrap()
}

/// Test basic roundtrip with numeric values
#[test]
fn test_roundtrip_numbers() {
    let mut wb = Workbook::new();
    let sheet = wb.worksheet_mut(None).unwrap().unwrap();

    sheet.set_cell_value("A1", 42.0).unwrap();
    sheet.set_cell_value("B1", 3.14159).unwrap();
    sheet.set_cell_value("C1", -100.5).unwrap();
    sheet.set_cell_value("A2", 0.0).unwrap();
    sheet.set_cell_value("B2", 1e10).unwrap();
    sheet.set_cell_value("C2", 0.1 + 0.2).unwrap();

    let wb2 = cellbook::from_bytes(&cellbook::to_bytes(&wb).unwrap()).unwrap();
    let sheet2 = wb2.worksheet(None).unwrap().unwrap();

    assert_eq!(sheet2.get_value("A1").unwrap().as_number(), Some(42.0));
    assert_eq!(sheet2.get_value("B1").unwrap().as_number(), Some(3.14159));
    assert_eq!(sheet2.get_value("C1").unwrap().as_number(), Some(-100.5));
    assert_eq!(sheet2.get_value("A2").unwrap().as_number(), Some(0.0));
    assert_eq!(sheet2.get_value("B2").unwrap().as_number(), Some(1e10));
    assert_eq!(sheet2.get_value("C2").unwrap().as_number(), Some(0.1 + 0.2));
}

/// Test roundtrip with string values, including ones the XML layer must escape
#[test]
fn test_roundtrip_strings() {
    let mut wb = Workbook::new();
    let sheet = wb.worksheet_mut(None).unwrap().unwrap();

    sheet.set_cell_value("A1", "Hello, World!").unwrap();
    sheet.set_cell_value("B1", "").unwrap();
    sheet.set_cell_value("C1", "Special: <>&\"'").unwrap();
    sheet.set_cell_value("A2", "Multi\nLine").unwrap();
    sheet.set_cell_value("B2", "Unicode: \u{1F600}").unwrap();
    sheet.set_cell_value("C2", "  padded  ").unwrap();
    sheet.set_cell_value("D2", "tab\there").unwrap();
    sheet.set_cell_value("E2", "looks escaped _x0041_").unwrap();
    sheet.set_cell_value("F2", "42").unwrap();

    let wb2 = cellbook::from_bytes(&cellbook::to_bytes(&wb).unwrap()).unwrap();
    let sheet = wb.worksheet(None).unwrap().unwrap();
    let sheet2 = wb2.worksheet(None).unwrap().unwrap();

    for a in ["A1", "B1", "C1", "A2", "B2", "C2", "D2", "E2", "F2"] {
        assert_eq!(
            sheet2.get_value(a).unwrap(),
            sheet.get_value(a).unwrap(),
            "cell {}",
            a
        );
    }
    assert_eq!(sheet2.get_value("F2").unwrap().type_name(), "string");
}

/// Stubs keep their address and come back Empty
#[test]
fn test_roundtrip_stub_cells() {
    let mut wb = Workbook::new();
    let sheet = wb.worksheet_mut(None).unwrap().unwrap();
    sheet.ensure_cell(addr("C3"));
    sheet.set_cell_value("A1", 1).unwrap();

    let wb2 = cellbook::from_bytes(&cellbook::to_bytes(&wb).unwrap()).unwrap();
    let sheet2 = wb2.worksheet(None).unwrap().unwrap();
    assert!(sheet2.contains(addr("C3")));
    assert_eq!(sheet2.get_value("C3").unwrap(), CellValue::Empty);
    assert_eq!(wb2, wb);
}

/// Merge regions and the used range survive, and the corner still aliases the region
#[test]
fn test_roundtrip_merges() {
    let mut wb = Workbook::new();
    {
        let sheet = wb.worksheet_mut(None).unwrap().unwrap();
        sheet.set_cell_value("A1", "Title").unwrap();
        sheet.merge_cells(&CellRange::parse("A1:C1").unwrap()).unwrap();
        sheet.merge_cells(&CellRange::parse("B3:C4").unwrap()).unwrap();
        sheet.set_used_range(Some(CellRange::parse("A1:E6").unwrap()));
    }

    let wb2 = cellbook::from_bytes(&cellbook::to_bytes(&wb).unwrap()).unwrap();
    let sheet2 = wb2.worksheet(None).unwrap().unwrap();
    assert_eq!(
        sheet2.merged_regions(),
        &[CellRange::parse("A1:C1").unwrap(), CellRange::parse("B3:C4").unwrap()]
    );
    assert_eq!(sheet2.used_range(), Some(CellRange::parse("A1:E6").unwrap()));
    assert_eq!(sheet2.find_corner(addr("C4")), addr("B3"));

    let updated = wb2
        .update_range("C1", &Attributes::new().with("disabled", true))
        .unwrap();
    let sheet3 = updated.worksheet(None).unwrap().unwrap();
    assert!(sheet3.cell(addr("A1")).unwrap().disabled);
    assert!(!sheet3.contains(addr("C1")));
}

/// Every attribute, including keys the styles part cannot express, survives
#[test]
fn test_roundtrip_attributes() {
    let wb = Workbook::from_rows(vec![vec![Scalar::from("a"), Scalar::from(1)]]);
    let changes = Attributes::new()
        .with(
            "style",
            Attributes::new()
                .with("font", Attributes::new().with("bold", true).with("sz", 14.0))
                .with("fill", Attributes::new().with("fgColor", Attributes::new().with("rgb", "FFFF00")))
                .with("numFmt", "0.00%"),
        )
        .with("disabled", true)
        .with("note", "pass-through");
    let wb = wb.update_range("A1:B1", &changes).unwrap();

    let wb2 = cellbook::from_bytes(&cellbook::to_bytes(&wb).unwrap()).unwrap();
    assert_eq!(wb2, wb);

    let b1 = wb2.worksheet(None).unwrap().unwrap().cell(addr("B1")).unwrap();
    assert!(b1.disabled);
    assert_eq!(b1.style.get("note").and_then(|v| v.as_str()), Some("pass-through"));
    assert_eq!(b1.style.get("numFmt").and_then(|v| v.as_str()), Some("0.00%"));
}

/// Several sheets, quoted sheet names and named ranges
#[test]
fn test_roundtrip_sheets_and_names() {
    let mut wb = Workbook::new();
    let mut other = Worksheet::new();
    other.set_cell_value("B2", 7).unwrap();
    wb.add_worksheet("My Data", other).unwrap();
    wb.define_name("Lucky", "'My Data'!B2").unwrap();
    wb.define_name("Header", "Sheet1!A1:C1").unwrap();

    let wb2 = cellbook::from_bytes(&cellbook::to_bytes(&wb).unwrap()).unwrap();
    assert_eq!(wb2.sheet_names().collect::<Vec<_>>(), vec!["Sheet1", "My Data"]);
    assert_eq!(wb2.named_ranges(), wb.named_ranges());
    assert_eq!(wb2.resolve_ref("Lucky").unwrap(), CellOrRange::Single("7".into()));
    assert_eq!(wb2, wb);
}

/// Unqualified names are saved against the default sheet
#[test]
fn test_roundtrip_unqualified_name() {
    let mut wb = Workbook::from_rows(vec![vec![Scalar::from("a"), Scalar::from(2)]]);
    wb.define_name("Second", "B1").unwrap();

    let wb2 = cellbook::from_bytes(&cellbook::to_bytes(&wb).unwrap()).unwrap();
    let second = wb2.resolve_named_range("Second").unwrap();
    assert_eq!(second.to_string(), "Sheet1!B1");
    assert_eq!(wb2.resolve_ref("Second").unwrap(), CellOrRange::Single("2".into()));
}

/// NaN and infinities are stored as #NUM! error cells
#[test]
fn test_roundtrip_non_finite_numbers() {
    let mut wb = Workbook::new();
    let sheet = wb.worksheet_mut(None).unwrap().unwrap();
    sheet.set_cell_value("A1", f64::NAN).unwrap();
    sheet.set_cell_value("A2", f64::INFINITY).unwrap();
    sheet.set_cell_value("A3", 1.0).unwrap();

    let wb2 = cellbook::from_bytes(&cellbook::to_bytes(&wb).unwrap()).unwrap();
    let sheet2 = wb2.worksheet(None).unwrap().unwrap();
    assert_eq!(sheet2.get_value("A1").unwrap(), CellValue::string("#NUM!"));
    assert_eq!(sheet2.get_value("A2").unwrap(), CellValue::string("#NUM!"));
    assert_eq!(sheet2.get_value("A3").unwrap().as_number(), Some(1.0));
}

/// The writer and reader also work directly on any Write + Seek / Read + Seek
#[test]
fn test_reader_writer_cursor() {
    let wb = Workbook::from_rows(vec![vec![Scalar::from("x")]]);

    let mut buf = Vec::new();
    XlsxWriter::write(&wb, Cursor::new(&mut buf)).unwrap();
    let wb2 = XlsxReader::read(Cursor::new(&buf)).unwrap();
    assert_eq!(wb2, wb);
}

/// Rows wider than the grid are cut at column XFD and still reload
#[test]
fn test_roundtrip_row_at_grid_width() {
    let row: Vec<Scalar> = (0..MAX_COLS as i32 + 1).map(Scalar::from).collect();
    let wb = Workbook::from_rows(vec![row]);
    let sheet = wb.worksheet(None).unwrap().unwrap();
    assert_eq!(sheet.used_range(), Some(CellRange::parse("A1:XFD1").unwrap()));

    let wb2 = cellbook::from_bytes(&cellbook::to_bytes(&wb).unwrap()).unwrap();
    assert_eq!(wb2, wb);
}

/// Files on disk through the extension trait
#[test]
fn test_open_and_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("book.xlsx");

    let wb = Workbook::from_rows(vec![vec![Scalar::from(1), Scalar::from(2)]]);
    wb.save(&path).unwrap();
    let wb2 = Workbook::open(&path).unwrap();
    assert_eq!(wb2, wb);
}

#[test]
fn test_decode_errors() {
    assert!(matches!(
        cellbook::from_bytes(b"definitely not a zip"),
        Err(Error::Decode(_))
    ));
    assert!(matches!(
        Workbook::open("/nonexistent/path/book.xlsx"),
        Err(Error::Decode(_))
    ));
}
