//! # Axis Extraction
//!
//! Turns each sheet of a workbook into flat, labelled records using optional column and row
//! header axes, then exports one CSV per sheet or, in pivot mode, one merged CSV per workbook.
pub mod axis;
pub mod enterprise;
pub mod record;

use crate::error::ResultMessage;
use crate::error::TrimError;
use crate::export::CsvExporter;
use crate::extract::axis::extract;
use crate::extract::axis::AxisSpec;
use crate::extract::enterprise::EnterpriseDirectory;
use crate::extract::record::flat_table;
use crate::extract::record::pivot_row;
use crate::extract::record::PivotContext;
use crate::spreadsheet::criteria::Criteria;
use crate::spreadsheet::open_spreadsheet;
use crate::table::Table;
use log::debug;
use log::warn;
use std::path::Path;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Nothing to extract from sheet '{sheet}': empty {region}")]
    EmptyRegion { sheet: String, region: String },
}

/// Options of one `parse` run
#[derive(Clone, Debug, Default)]
pub struct ParseOptions {
    pub axes: AxisSpec,
    /// Collapse every sheet into one row of a single merged table
    pub merge: bool,
    /// Accounting period written in pivot mode
    pub period: Option<String>,
    /// Dataset name written in pivot mode
    pub dataset: Option<String>,
    pub output_dir: PathBuf,
    pub criteria: Criteria,
}

/// Extracts every selected sheet of a workbook and returns the written files.
///
/// Sheets that cannot be read and sheets whose data region is empty are logged and skipped;
/// only failing to open the workbook or to write an output aborts the run. In pivot mode only the merged
/// `<stem>_merged.csv` is written, and only when at least one sheet produced a row.
pub fn parse_workbook(file_name: &str, options: &ParseOptions, enterprises: &EnterpriseDirectory) -> Result<Vec<PathBuf>, TrimError> {
    let mut spreadsheet = open_spreadsheet(file_name)?;
    let exporter = CsvExporter::new(&options.output_dir)?;
    let context = PivotContext {
        period: options.period.as_deref().unwrap_or_default(),
        dataset: options.dataset.as_deref().unwrap_or_default(),
        enterprises: Some(enterprises),
    };

    if options.merge && enterprises.is_empty() {
        debug!("No enterprise directory loaded; short names and ids stay empty");
    }

    let mut output_files = Vec::new();
    let mut pivot_rows = Vec::<Table>::new();
    for sheet_name in spreadsheet.sheet_names() {
        if !options.criteria.accept(&sheet_name) {
            continue;
        }
        let sheet = match spreadsheet.read_sheet(&sheet_name) {
            Ok(sheet) => sheet,
            Err(error) => {
                warn!("Skipping sheet '{sheet_name}' of '{file_name}': {error}");
                continue;
            }
        };
        debug!("Extracting sheet '{}' of '{}'", sheet.name, file_name);

        let table = match extract(&sheet, &options.axes).with_prefix(&format!("Failed to extract sheet '{sheet_name}'")) {
            Ok(table) => table,
            Err(error) if error.is_recoverable() => {
                warn!("{error}");
                continue;
            }
            Err(error) => return Err(error),
        };

        if options.merge {
            pivot_rows.push(pivot_row(&sheet.name, &table, &context));
        } else {
            let path = exporter.export(&flat_table(&table), &format!("{}.csv", sheet.name))?;
            output_files.push(path);
        }
    }

    if options.merge && !pivot_rows.is_empty() {
        let stem = Path::new(file_name)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_name.to_owned());
        let path = exporter.export(&Table::concat(pivot_rows), &format!("{stem}_merged.csv"))?;
        output_files.push(path);
    }
    Ok(output_files)
}
