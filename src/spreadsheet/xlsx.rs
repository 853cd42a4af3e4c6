use crate::error::TrimError;
use crate::helpers::reader::FileReader;
use crate::helpers::xml::XmlElementExt;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::spreadsheet::cell::to_error_value;
use crate::spreadsheet::cell::CellType;
use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::excel;
use crate::spreadsheet::excel::load_relationships;
use crate::spreadsheet::merge::MergeRegion;
use crate::spreadsheet::range::CellRange;
use crate::spreadsheet::range::RangeError;
use crate::spreadsheet::reference::index_to_reference;
use crate::spreadsheet::reference::reference_to_index;
use crate::spreadsheet::reference::MAX_ROWS;
use crate::spreadsheet::sheet::Cell;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::Spreadsheet;
use crate::spreadsheet::SpreadsheetError;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::borrow::Cow;
use std::collections::HashMap;
use zip::ZipArchive;

// XML tag names for parsing XLSX parts
const TAG_CUSTOM_FORMATS: QName = QName(b"numFmts"); // Custom number formats container
const TAG_CUSTOM_FORMAT: QName = QName(b"numFmt");   // Individual custom number format
const TAG_FORMAT_INDEXES: QName = QName(b"cellXfs");  // Cell format indexes container
const TAG_FORMAT_INDEX: QName = QName(b"xf");         // Individual cell format index
const TAG_SHARED_STRING_ITEM: QName = QName(b"si");   // Shared string table item
const TAG_WORKBOOK_PROPERTIES: QName = QName(b"workbookPr");
const TAG_SHEET: QName = QName(b"sheet");
const TAG_ROW: QName = QName(b"row");
const TAG_CELL: QName = QName(b"c");
const TAG_INLINE_STRING: QName = QName(b"is");
const TAG_VALUE: QName = QName(b"v");
const TAG_MERGE_CELL: QName = QName(b"mergeCell");

/// An Office Open XML workbook (.xlsx, .xlsm, .xltx, .xltm)
pub(crate) struct XlsxSpreadsheet {
    /// File name of the workbook
    pub(crate) name: String,
    zip: ZipArchive<FileReader>,
    number_formats: Vec<CellType>,
    /// Worksheets as (name, zip path) in workbook order
    sheets: Vec<(String, String)>,
    shared_strings: Vec<String>,
    is_1904: bool,
}

impl XlsxSpreadsheet {
    /// Opens a workbook and loads its sheet list, styles and shared strings.
    pub(crate) fn open(file_name: &str) -> Result<XlsxSpreadsheet, TrimError> {
        let mut package = excel::open(file_name, load_workbook, load_number_formats)?;
        let shared_strings = load_shared_strings(&mut package.zip)?;
        Ok(XlsxSpreadsheet {
            name: file_name.to_owned(),
            zip: package.zip,
            number_formats: package.number_formats,
            sheets: package.sheets,
            shared_strings,
            is_1904: package.is_1904,
        })
    }

    /// Converts the raw text of a `<v>`/`<is>` element to a typed value.
    fn to_cell_value(&self, sheet_name: &str, row: usize, col: usize, kind: CellType, raw: &str) -> Result<CellValue, TrimError> {
        let invalid = |message: String| {
            SpreadsheetError::CellValueError(
                self.name.to_owned(),
                sheet_name.to_owned(),
                index_to_reference(row, col),
                message,
            )
        };
        let value = match kind {
            CellType::Empty => CellValue::Empty,
            CellType::SharedString => {
                let index = raw.trim().parse::<usize>()?;
                let text = self
                    .shared_strings
                    .get(index)
                    .ok_or_else(|| invalid(format!("shared string {index} out of range")))?;
                CellValue::Text(text.to_owned())
            }
            CellType::InlineString => CellValue::Text(raw.to_owned()),
            CellType::Boolean => CellValue::Boolean(raw == "1" || raw.eq_ignore_ascii_case("true")),
            CellType::Error => CellValue::Text(to_error_value(raw).to_owned()),
            CellType::IsoDateTime => parse_iso_datetime(raw)
                .map(CellValue::DateTime)
                .unwrap_or_else(|| CellValue::Text(raw.to_owned())),
            CellType::Number => {
                let number = raw.trim().parse::<f64>().map_err(|_| invalid(format!("'{raw}' is not a number")))?;
                CellValue::Number(number)
            }
            CellType::NumberDate | CellType::NumberDateTime | CellType::NumberTime => {
                let serial = raw.trim().parse::<f64>().map_err(|_| invalid(format!("'{raw}' is not a date serial")))?;
                CellValue::from_serial(kind, serial, self.is_1904)
            }
        };
        Ok(value)
    }
}

impl Spreadsheet for XlsxSpreadsheet {
    fn sheet_names(&self) -> Vec<String> {
        self.sheets.iter().map(|(name, _)| name.to_owned()).collect()
    }

    /// Reads one worksheet: its cells (typed through the style table) and its merge regions.
    fn read_sheet(&mut self, sheet_name: &str) -> Result<Sheet, TrimError> {
        let zip_path = self
            .sheets
            .iter()
            .find(|(name, _)| name == sheet_name)
            .map(|(_, path)| path.to_owned())
            .ok_or_else(|| SpreadsheetError::SheetNotFound(self.name.to_owned(), sheet_name.to_owned()))?;

        let mut cells = Vec::<(usize, usize, CellType, String)>::new();
        let mut merges = Vec::<MergeRegion>::new();
        {
            let mut reader = self.zip.required_xml_reader(&zip_path)?;
            let mut row_count = 0usize;
            let mut col_count = 0usize;
            let mut row = 0usize;
            let mut col = 0usize;
            let mut kind = CellType::default();
            let mut value = String::new();
            match_xml_events!(reader => {
                Event::Start(event) if event.name() == TAG_ROW => {
                    row_count = match event.parse_attribute::<usize>("r")? {
                        Some(row) if row == 0 || row > MAX_ROWS => Err(RangeError::InvalidAddress(row.to_string()))?,
                        Some(row) => row,
                        None => row_count + 1,
                    };
                    col_count = 0;
                }
                Event::Start(event) if event.name() == TAG_CELL => {
                    (row, col) = event.attribute("r")?
                        .and_then(|reference| reference_to_index(&reference))
                        .unwrap_or((row_count, col_count + 1));
                    col_count = col;
                    kind = event.attribute("t")?.map(|t| {
                        match t.as_ref() {
                            "inlineStr" | "str" => CellType::InlineString,
                            "s" => CellType::SharedString,
                            "d" => CellType::IsoDateTime,
                            "b" => CellType::Boolean,
                            "e" => CellType::Error,
                            _ => CellType::Number,
                        }
                    }).unwrap_or(CellType::Number);
                    if kind == CellType::Number {
                        if let Some(style) = event.parse_attribute::<usize>("s")? {
                            kind = self.number_formats.get(style).copied().unwrap_or(CellType::Number);
                        }
                    }
                    value.clear();
                }
                Event::Start(event) if event.name() == TAG_INLINE_STRING => {
                    value = reader.read_text(TAG_INLINE_STRING, false)?;
                }
                Event::Start(event) if event.name() == TAG_VALUE => {
                    value = reader.read_text(TAG_VALUE, true)?;
                }
                Event::End(event) if event.name() == TAG_CELL => {
                    if !value.is_empty() {
                        cells.push((row, col, kind, std::mem::take(&mut value)));
                    }
                }
                Event::Start(event) if event.name() == TAG_MERGE_CELL => {
                    if let Some(reference) = event.attribute("ref")? {
                        merges.push(MergeRegion::from(CellRange::try_from(reference.as_ref())?));
                    }
                }
            });
        }

        let mut sheet = Sheet::new(&self.name, sheet_name);
        for (row, col, kind, raw) in cells {
            let value = self.to_cell_value(sheet_name, row, col, kind, &raw)?;
            sheet.push(Cell { row, col, value });
        }
        for region in merges {
            sheet.push_merge(region);
        }
        Ok(sheet)
    }
}

/// Loads the workbook's sheet list and date system.
fn load_workbook(zip: &mut ZipArchive<FileReader>) -> Result<(Vec<(String, String)>, bool), TrimError> {
    let relationships = load_relationships(zip, "xl/_rels/workbook.xml.rels")?;
    let mut reader = zip.required_xml_reader("xl/workbook.xml")?;
    let mut sheets: Vec<(String, String)> = Vec::new();
    let mut is_1904 = false;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHEET => {
            let mut name = None::<Cow<str>>;
            let mut id = None::<Cow<str>>;
            for result in event.attributes() {
                let attribute = result?;
                let key = attribute.key.local_name();
                if key.as_ref() == b"name" {
                    name = Some(attribute.unescape_value()?);
                } else if key.as_ref() == b"id" {
                    id = Some(attribute.unescape_value()?);
                }
            }
            if let Some((name, id)) = name.zip(id) {
                if let Some(path) = relationships.get(id.as_ref()) {
                    sheets.push((name.to_string(), path.to_owned()));
                }
            }
        }
        Event::Start(event) if event.name() == TAG_WORKBOOK_PROPERTIES => {
            is_1904 = event.attribute("date1904")?
                .map(|value| value.eq("1") || value.eq("true"))
                .unwrap_or(false);
        }
    });
    Ok((sheets, is_1904))
}

/// Loads the cell type of every style index from `xl/styles.xml`.
fn load_number_formats(zip: &mut ZipArchive<FileReader>) -> Result<Vec<CellType>, TrimError> {
    let mut reader = match zip.xml_reader("xl/styles.xml")? {
        Some(reader) => reader,
        None => return Ok(Vec::new()),
    };

    let mut custom_formats_context = false;
    let mut custom_formats = HashMap::<String, CellType>::new();
    let mut format_indexes_context = false;
    let mut format_indexes = Vec::<String>::new();

    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_CUSTOM_FORMATS => custom_formats_context = true,
        Event::End(event) if event.name() == TAG_CUSTOM_FORMATS => custom_formats_context = false,
        Event::Start(event) if custom_formats_context && event.name() == TAG_CUSTOM_FORMAT => {
            let id = event.attribute("numFmtId")?;
            let format = event.attribute("formatCode")?;
            if let Some((id, format)) = id.zip(format) {
                custom_formats.insert(id.to_string(), CellType::parse_custom_number_format(&format));
            }
        }
        Event::Start(event) if event.name() == TAG_FORMAT_INDEXES => format_indexes_context = true,
        Event::End(event) if event.name() == TAG_FORMAT_INDEXES => format_indexes_context = false,
        Event::Start(event) if format_indexes_context && event.name() == TAG_FORMAT_INDEX => {
            let id = event.attribute("numFmtId")?;
            format_indexes.push(id.map(|id| id.to_string()).unwrap_or_else(|| "0".to_owned()));
        }
    });

    Ok(excel::load_number_formats(format_indexes, custom_formats))
}

/// Loads the shared string table; workbooks without one get an empty table.
fn load_shared_strings(zip: &mut ZipArchive<FileReader>) -> Result<Vec<String>, TrimError> {
    let mut shared_strings = Vec::<String>::new();
    let mut reader = match zip.xml_reader("xl/sharedStrings.xml")? {
        Some(reader) => reader,
        None => return Ok(shared_strings),
    };
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHARED_STRING_ITEM => {
            shared_strings.push(reader.read_text(TAG_SHARED_STRING_ITEM, false)?);
        }
    });
    Ok(shared_strings)
}

fn parse_iso_datetime(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use std::path::Path;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/></Types>"#;

    /// Writes a minimal workbook; each sheet is (name, sheetData inner xml, mergeCells inner xml).
    pub(crate) fn write_workbook(path: &Path, shared_strings: &[&str], sheets: &[(&str, &str, &str)]) {
        let file = std::fs::File::create(path).unwrap();
        let mut zip = ZipWriter::new(file);
        let options = SimpleFileOptions::default();

        zip.start_file("[Content_Types].xml", options).unwrap();
        zip.write_all(CONTENT_TYPES.as_bytes()).unwrap();

        let mut workbook = String::from(
            r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><workbookPr/><sheets>"#,
        );
        let mut relationships = String::from(
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
        );
        for (index, (name, _, _)) in sheets.iter().enumerate() {
            let id = index + 1;
            workbook.push_str(&format!(r#"<sheet name="{name}" sheetId="{id}" r:id="rId{id}"/>"#));
            relationships.push_str(&format!(
                r#"<Relationship Id="rId{id}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet{id}.xml"/>"#
            ));
        }
        workbook.push_str("</sheets></workbook>");
        relationships.push_str("</Relationships>");

        zip.start_file("xl/workbook.xml", options).unwrap();
        zip.write_all(workbook.as_bytes()).unwrap();
        zip.start_file("xl/_rels/workbook.xml.rels", options).unwrap();
        zip.write_all(relationships.as_bytes()).unwrap();

        let styles = r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><numFmts count="1"><numFmt numFmtId="164" formatCode="yyyy-mm-dd"/></numFmts><cellXfs count="2"><xf numFmtId="0"/><xf numFmtId="164"/></cellXfs></styleSheet>"#;
        zip.start_file("xl/styles.xml", options).unwrap();
        zip.write_all(styles.as_bytes()).unwrap();

        let mut strings = String::from(r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#);
        for string in shared_strings {
            strings.push_str(&format!("<si><t>{string}</t></si>"));
        }
        strings.push_str("</sst>");
        zip.start_file("xl/sharedStrings.xml", options).unwrap();
        zip.write_all(strings.as_bytes()).unwrap();

        for (index, (_, data, merges)) in sheets.iter().enumerate() {
            let mut worksheet = format!(
                r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{data}</sheetData>"#
            );
            if !merges.is_empty() {
                worksheet.push_str(&format!("<mergeCells>{merges}</mergeCells>"));
            }
            worksheet.push_str("</worksheet>");
            zip.start_file(format!("xl/worksheets/sheet{}.xml", index + 1), options).unwrap();
            zip.write_all(worksheet.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn reads_cells_and_merges() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("book.xlsx");
        write_workbook(
            &path,
            &["成本", "H1"],
            &[(
                "公司A（合并）",
                concat!(
                    r#"<row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1" t="s"><v>1</v></c></row>"#,
                    r#"<row r="2"><c r="A2" t="inlineStr"><is><t>R1</t></is></c><c r="B2"><v>10.5</v></c>"#,
                    r#"<c r="C2" t="b"><v>1</v></c><c r="D2" t="e"><v>#N/A</v></c><c r="E2" s="1"><v>45292</v></c>"#,
                    r#"<c r="F2"><f>B2*2</f><v>21</v></c><c r="G2" s="1"/></row>"#,
                ),
                r#"<mergeCell ref="A3:B4"/>"#,
            )],
        );

        let mut spreadsheet = XlsxSpreadsheet::open(path.to_str().unwrap()).unwrap();
        assert_eq!(spreadsheet.sheet_names(), vec!["公司A（合并）".to_owned()]);
        let sheet = spreadsheet.read_sheet("公司A（合并）").unwrap();

        assert_eq!(sheet.get(1, 1), &CellValue::Text("成本".to_owned()));
        assert_eq!(sheet.get(1, 2), &CellValue::Text("H1".to_owned()));
        assert_eq!(sheet.get(2, 1), &CellValue::Text("R1".to_owned()));
        assert_eq!(sheet.get(2, 2), &CellValue::Number(10.5));
        assert_eq!(sheet.get(2, 3), &CellValue::Boolean(true));
        assert_eq!(sheet.get(2, 4), &CellValue::Text("#N/A".to_owned()));
        assert_eq!(sheet.get(2, 5).to_string(), "2024-01-01 00:00:00");
        assert_eq!(sheet.get(2, 6), &CellValue::Number(21.0));
        assert_eq!(sheet.get(2, 7), &CellValue::Empty);
        assert_eq!(sheet.merges(), &[MergeRegion { min_row: 3, max_row: 4, min_col: 1, max_col: 2 }]);
        assert_eq!(sheet.max_row(), 4);
        assert_eq!(sheet.max_col(), 6);
    }

    #[test]
    fn reads_rows_without_references() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("plain.xlsx");
        write_workbook(
            &path,
            &[],
            &[("Sheet1", r#"<row><c><v>1</v></c><c><v>2</v></c></row><row><c><v>3</v></c></row>"#, "")],
        );
        let mut spreadsheet = XlsxSpreadsheet::open(path.to_str().unwrap()).unwrap();
        let sheet = spreadsheet.read_sheet("Sheet1").unwrap();
        assert_eq!(sheet.get(1, 1), &CellValue::Number(1.0));
        assert_eq!(sheet.get(1, 2), &CellValue::Number(2.0));
        assert_eq!(sheet.get(2, 1), &CellValue::Number(3.0));
    }

    #[test]
    fn unknown_sheet_is_reported() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("book.xlsx");
        write_workbook(&path, &[], &[("Sheet1", "", "")]);
        let mut spreadsheet = XlsxSpreadsheet::open(path.to_str().unwrap()).unwrap();
        assert!(matches!(
            spreadsheet.read_sheet("Missing"),
            Err(TrimError::SpreadsheetError(SpreadsheetError::SheetNotFound(_, name))) if name == "Missing"
        ));
    }

    #[test]
    fn huge_date_serials_are_kept_as_numbers() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("dates.xlsx");
        write_workbook(&path, &[], &[("Sheet1", r#"<row r="1"><c r="A1" s="1"><v>1e15</v></c></row>"#, "")]);
        let mut spreadsheet = XlsxSpreadsheet::open(path.to_str().unwrap()).unwrap();
        let sheet = spreadsheet.read_sheet("Sheet1").unwrap();
        assert_eq!(sheet.get(1, 1), &CellValue::Number(1e15));
    }

    #[test]
    fn rows_past_the_worksheet_are_rejected() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("tall.xlsx");
        write_workbook(&path, &[], &[("Sheet1", r#"<row r="1048577"><c><v>1</v></c></row>"#, "")]);
        let mut spreadsheet = XlsxSpreadsheet::open(path.to_str().unwrap()).unwrap();
        assert!(matches!(
            spreadsheet.read_sheet("Sheet1"),
            Err(TrimError::RangeError(RangeError::InvalidAddress(value))) if value == "1048577"
        ));
    }
}
