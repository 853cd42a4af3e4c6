//! Readers turning one delimited file or one worksheet into keyed source rows.

use crate::error::TrimError;
use crate::spreadsheet::cell::format_number;
use crate::spreadsheet::cell::parse_number;
use crate::spreadsheet::merge::resolve;
use crate::spreadsheet::range::ColumnSpan;
use crate::spreadsheet::sheet::Sheet;
use csv::StringRecord;
use std::io::Read;

/// Sheet label recorded for delimited sources
pub const DELIMITED_SHEET: &str = "CSV";

/// One data row of a source: its frozen values and its data values, aligned with the labels.
#[derive(Clone, Debug, PartialEq)]
pub struct SourceRow {
    pub key_parts: Vec<String>,
    /// Numeric text of each data column, empty when absent or not numeric
    pub values: Vec<String>,
}

impl SourceRow {
    pub fn key(&self) -> String {
        self.key_parts.join("_")
    }
}

/// Labels and rows read from one file (delimited) or one sheet (grid).
#[derive(Clone, Debug, PartialEq)]
pub struct SourceTable {
    pub file_name: String,
    pub sheet_name: String,
    pub labels: Vec<String>,
    pub rows: Vec<SourceRow>,
}

impl SourceTable {
    fn empty(file_name: &str, sheet_name: &str) -> Self {
        SourceTable {
            file_name: file_name.to_owned(),
            sheet_name: sheet_name.to_owned(),
            labels: Vec::new(),
            rows: Vec::new(),
        }
    }
}

/// Data columns of a source: every column after the frozen span that is not skipped.
fn data_columns(frozen: &ColumnSpan, skip: Option<&ColumnSpan>, last_col: usize) -> Vec<usize> {
    (frozen.end_col + 1..=last_col)
        .filter(|col| !skip.map(|skip| skip.contains(*col)).unwrap_or(false))
        .collect()
}

/// Reads a delimited source. The first record is the header; every column counts, however many
/// fields a record carries.
pub fn read_delimited_source<R: Read>(
    reader: R,
    file_name: &str,
    frozen: &ColumnSpan,
    skip: Option<&ColumnSpan>,
) -> Result<SourceTable, TrimError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let records = csv_reader.records().collect::<Result<Vec<StringRecord>, _>>()?;
    let Some((header, body)) = records.split_first() else {
        return Ok(SourceTable::empty(file_name, DELIMITED_SHEET));
    };

    let width = records.iter().map(StringRecord::len).max().unwrap_or(0);
    let columns = data_columns(frozen, skip, width);
    let labels = columns
        .iter()
        .map(|col| {
            let label = header.get(col - 1).map(|label| label.trim_start_matches('\u{feff}'));
            match label {
                Some(label) if !label.trim().is_empty() => label.to_owned(),
                _ => format!("Col_{col}"),
            }
        })
        .collect();

    let rows = body
        .iter()
        .filter_map(|record| {
            let key_parts: Vec<String> = frozen
                .columns()
                .map(|col| record.get(col - 1).map(str::trim).unwrap_or_default().to_owned())
                .collect();
            if key_parts.iter().all(String::is_empty) {
                return None;
            }
            let values = columns
                .iter()
                .map(|col| {
                    record
                        .get(col - 1)
                        .filter(|value| parse_number(value).is_some())
                        .map(str::to_owned)
                        .unwrap_or_default()
                })
                .collect();
            Some(SourceRow { key_parts, values })
        })
        .collect();

    Ok(SourceTable {
        file_name: file_name.to_owned(),
        sheet_name: DELIMITED_SHEET.to_owned(),
        labels,
        rows,
    })
}

/// Reads a worksheet source. Labels come from the first used row; data starts `header_rows`
/// rows below it. Only native numbers are kept as data.
pub fn read_grid_source(
    sheet: &Sheet,
    file_name: &str,
    frozen: &ColumnSpan,
    skip: Option<&ColumnSpan>,
    header_rows: usize,
) -> SourceTable {
    let Some(used) = sheet.used_range() else {
        return SourceTable::empty(file_name, &sheet.name);
    };

    let columns = data_columns(frozen, skip, used.end_col);
    let labels = columns
        .iter()
        .map(|col| {
            let label = resolve(sheet, used.start_row, *col, false);
            if label.is_empty() {
                format!("Col_{col}")
            } else {
                label.to_string()
            }
        })
        .collect();

    let rows = (used.start_row + header_rows..=used.end_row)
        .filter_map(|row| {
            let key_parts: Vec<String> = frozen
                .columns()
                .map(|col| resolve(sheet, row, col, true).to_string())
                .collect();
            if key_parts.iter().all(String::is_empty) {
                return None;
            }
            let values = columns
                .iter()
                .map(|col| {
                    resolve(sheet, row, *col, false)
                        .to_number()
                        .map(format_number)
                        .unwrap_or_default()
                })
                .collect();
            Some(SourceRow { key_parts, values })
        })
        .collect();

    SourceTable {
        file_name: file_name.to_owned(),
        sheet_name: sheet.name.to_owned(),
        labels,
        rows,
    }
}
