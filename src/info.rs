use crate::error::TrimError;
use crate::spreadsheet::open_spreadsheet;
use serde::Serialize;
use std::fmt::Display;
use std::fs;
use std::path::Path;

/// Dimensions of one sheet
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SheetInfo {
    pub name: String,
    /// Last used row, 0 for an empty sheet
    pub rows: usize,
    /// Last used column, 0 for an empty sheet
    pub columns: usize,
    /// Used range such as `A1:D5`, empty for an empty sheet
    pub used_range: String,
}

/// Summary of a workbook
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WorkbookInfo {
    /// Absolute path of the workbook
    pub file: String,
    pub file_name: String,
    pub sheet_count: usize,
    pub sheets: Vec<SheetInfo>,
}

impl WorkbookInfo {
    pub fn to_json(&self) -> Result<String, TrimError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Display for WorkbookInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "File: {}", self.file_name)?;
        writeln!(f, "Path: {}", self.file)?;
        writeln!(f, "Sheets: {}", self.sheet_count)?;
        writeln!(f, "{}", "-".repeat(50))?;
        for sheet in &self.sheets {
            writeln!(f, "  Name: {}", sheet.name)?;
            writeln!(f, "  Rows: {}", sheet.rows)?;
            writeln!(f, "  Columns: {}", sheet.columns)?;
            writeln!(f, "  Used range: {}", sheet.used_range)?;
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Reads every sheet of a workbook and summarizes its dimensions.
pub fn workbook_info(file_name: &str) -> Result<WorkbookInfo, TrimError> {
    let mut spreadsheet = open_spreadsheet(file_name)?;
    let mut sheets = Vec::new();
    for sheet_name in spreadsheet.sheet_names() {
        let sheet = spreadsheet.read_sheet(&sheet_name)?;
        sheets.push(SheetInfo {
            name: sheet.name.to_owned(),
            rows: sheet.max_row(),
            columns: sheet.max_col(),
            used_range: sheet.used_range().map(|range| range.to_string()).unwrap_or_default(),
        });
    }

    let path = Path::new(file_name);
    Ok(WorkbookInfo {
        file: fs::canonicalize(path)?.to_string_lossy().into_owned(),
        file_name: path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default(),
        sheet_count: sheets.len(),
        sheets,
    })
}
