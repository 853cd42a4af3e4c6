//! # Spreadsheet Reading
//!
//! Loads Office Open XML workbooks into sparse, 1-based [`Sheet`]s carrying typed cell values and
//! merge regions. Everything above this module works on sheets only.
pub mod cell;
pub mod criteria;
pub(crate) mod excel;
pub mod merge;
pub mod range;
pub mod reference;
pub mod sheet;
pub(crate) mod xlsx;

use crate::error::TrimError;
use crate::spreadsheet::sheet::Sheet;
use crate::spreadsheet::xlsx::XlsxSpreadsheet;
use log::debug;
use std::path::Path;
use thiserror::Error;

/// Errors raised while locating or decoding workbook content
#[derive(Error, Debug)]
pub enum SpreadsheetError {
    #[error("Source file '{0}' not found")]
    SourceNotFound(String),

    #[error("Sheet '{1}' not found in '{0}'")]
    SheetNotFound(String, String),

    #[error("Missing workbook part '{0}'")]
    FileError(String),

    #[error("Spreadsheet '{0}' has no worksheets")]
    SpreadsheetEmptyError(String),

    #[error("Invalid cell value in '{0}' sheet '{1}' at {2}: {3}")]
    CellValueError(String, String, String, String),
}

/// Extensions read as workbooks without a debug notice
const WORKBOOK_EXTENSIONS: [&str; 4] = ["xlsx", "xlsm", "xltx", "xltm"];

/// A workbook that can list and materialize its sheets
pub trait Spreadsheet {
    /// Sheet names in workbook order
    fn sheet_names(&self) -> Vec<String>;

    /// Reads one sheet completely.
    fn read_sheet(&mut self, sheet_name: &str) -> Result<Sheet, TrimError>;
}

/// Opens a workbook. Files with other extensions are still tried as Office Open XML.
pub fn open_spreadsheet(file_name: &str) -> Result<Box<dyn Spreadsheet>, TrimError> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if !WORKBOOK_EXTENSIONS.contains(&extension.as_str()) {
        debug!("Reading '{file_name}' as an Office Open XML workbook");
    }
    Ok(Box::new(XlsxSpreadsheet::open(file_name)?))
}
