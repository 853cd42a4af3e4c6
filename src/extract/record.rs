//! Output shaping of extracted sheets: one flat table per sheet, or one pivot row per sheet.

use crate::extract::axis::ExtractedTable;
use crate::extract::enterprise::EnterpriseDirectory;
use crate::spreadsheet::cell::CellValue;
use crate::table::Table;
use regex::Regex;
use std::sync::LazyLock;

/// Label of the leading row header column in flat tables
pub const ROW_HEADER_COLUMN: &str = "row_header";

/// Leading columns of every pivot row, in output order
pub const PIVOT_PREFIX_COLUMNS: [&str; 5] = ["企业简称", "企业ID", "会计期间", "报表类型", "数据集"];

/// Report type tag assumed when a sheet name carries none
const DEFAULT_REPORT_TYPE: &str = "本部";

/// Trailing parenthesised suffix of a sheet name, ASCII or full-width parentheses
static REPORT_TYPE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*?)[（(]([^（）()]*)[）)]$").expect("Hardcode regex pattern"));

/// Caller-supplied values of the pivot prefix columns
#[derive(Clone, Copy, Debug, Default)]
pub struct PivotContext<'a> {
    /// Accounting period (`会计期间`)
    pub period: &'a str,
    /// Dataset name (`数据集`)
    pub dataset: &'a str,
    pub enterprises: Option<&'a EnterpriseDirectory>,
}

/// Builds the flat table of one sheet.
///
/// With row headers a leading `row_header` column is added; the headers repeat cyclically when
/// there are more data rows than headers.
pub fn flat_table(table: &ExtractedTable) -> Table {
    let row_headers = table.row_headers.as_ref().filter(|headers| !headers.is_empty());
    let mut columns = Vec::with_capacity(table.column_headers.len() + 1);
    if row_headers.is_some() {
        columns.push(ROW_HEADER_COLUMN.to_owned());
    }
    columns.extend(table.column_headers.iter().cloned());

    let mut result = Table::new(columns);
    for (index, cells) in table.cells.iter().enumerate() {
        let mut row = Vec::with_capacity(result.columns.len());
        if let Some(headers) = row_headers {
            row.push(CellValue::Text(headers[index % headers.len()].to_owned()));
        }
        row.extend(cells.iter().map(|cell| to_value(*cell)));
        result.push_row(row);
    }
    result
}

/// Collapses one sheet into a single row.
///
/// Every data cell becomes a column labelled `row header|column header` with all whitespace
/// removed from both parts, behind the five prefix columns.
pub fn pivot_row(sheet_name: &str, table: &ExtractedTable, context: &PivotContext) -> Table {
    let (company, report_type) = parse_sheet_name(sheet_name);
    let (short_name, id) = context
        .enterprises
        .map(|enterprises| enterprises.lookup(&company))
        .unwrap_or(("", ""));

    let mut columns: Vec<String> = PIVOT_PREFIX_COLUMNS.iter().map(|column| column.to_string()).collect();
    let mut row: Vec<CellValue> = [short_name, id, context.period, report_type, context.dataset]
        .iter()
        .map(|value| CellValue::Text(value.to_string()))
        .collect();

    for (r, cells) in table.cells.iter().enumerate() {
        let row_header = table
            .row_headers
            .as_ref()
            .and_then(|headers| headers.get(r))
            .map(|header| strip_whitespace(header))
            .unwrap_or_else(|| format!("Row_{r}"));
        for (c, cell) in cells.iter().enumerate() {
            let column_header = table
                .column_headers
                .get(c)
                .map(|header| strip_whitespace(header))
                .unwrap_or_else(|| format!("Col_{c}"));
            columns.push(format!("{row_header}|{column_header}"));
            row.push(to_value(*cell));
        }
    }

    let mut result = Table::new(columns);
    result.push_row(row);
    result
}

/// Splits a sheet name into the company name and the report type code.
///
/// `公司A（合并）` gives `("公司A", "HB")`; a name without suffix is an unconsolidated (`BB`) report.
pub fn parse_sheet_name(sheet_name: &str) -> (String, &'static str) {
    match REPORT_TYPE_PATTERN.captures(sheet_name) {
        Some(captures) => {
            let company = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
            let tag = captures.get(2).map(|m| m.as_str()).unwrap_or_default();
            (company.trim().to_owned(), report_type_code(tag.trim()))
        }
        None => (sheet_name.trim().to_owned(), report_type_code(DEFAULT_REPORT_TYPE)),
    }
}

/// Maps a report type tag to its code; unknown tags count as `BB`.
pub fn report_type_code(tag: &str) -> &'static str {
    match tag {
        "本部" => "BB",
        "管理" => "GL",
        "差额" => "CE",
        "合并" => "HB",
        "小合并" => "XHB",
        "小合并差额" => "XHBCE",
        _ => "BB",
    }
}

/// Removes every whitespace character, full-width space included.
fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

fn to_value(cell: Option<f64>) -> CellValue {
    cell.map(CellValue::Number).unwrap_or(CellValue::Empty)
}
