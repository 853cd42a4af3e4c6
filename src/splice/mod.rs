//! # Splice Join
//!
//! Joins the rows of several sources on the values of their frozen columns. Every source brings
//! its own group of data columns; the output holds one row per distinct key, ordered by key.
pub mod source;

use crate::error::ResultMessage;
use crate::error::TrimError;
use crate::export::CsvExporter;
use crate::helpers::reader::open_source_file;
use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::open_spreadsheet;
use crate::spreadsheet::range::ColumnSpan;
use crate::spreadsheet::reference::index_to_col;
use crate::splice::source::read_delimited_source;
use crate::splice::source::read_grid_source;
use crate::splice::source::SourceTable;
use crate::table::Table;
use log::debug;
use log::warn;
use std::collections::BTreeMap;
use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;

/// Options of one `splice` run
#[derive(Clone, Debug)]
pub struct SpliceOptions {
    /// Identity columns forming the join key
    pub frozen: ColumnSpan,
    /// Columns left out of the output
    pub skip: Option<ColumnSpan>,
    /// Header rows above the data of worksheet sources
    pub header_rows: usize,
    pub output_dir: PathBuf,
    pub output_name: String,
}

impl Default for SpliceOptions {
    fn default() -> Self {
        SpliceOptions {
            frozen: ColumnSpan { start_col: 1, end_col: 1 },
            skip: None,
            header_rows: 1,
            output_dir: PathBuf::from("."),
            output_name: "merged.csv".to_owned(),
        }
    }
}

/// Where a contribution came from
#[derive(Clone, Debug, PartialEq)]
pub struct Provenance {
    pub source_file: String,
    /// Sheet name, or `CSV` for delimited sources
    pub source_sheet: String,
}

#[derive(Clone, Debug)]
struct Contribution {
    values: Vec<String>,
    provenance: Provenance,
}

/// All contributions sharing one key.
#[derive(Clone, Debug)]
pub struct SpliceRecord {
    /// Frozen values of the first row that produced the key
    pub frozen: Vec<String>,
    contributions: HashMap<usize, Contribution>,
}

impl SpliceRecord {
    /// Data values the given source contributed, if any.
    pub fn values(&self, source: usize) -> Option<&[String]> {
        self.contributions.get(&source).map(|contribution| contribution.values.as_slice())
    }

    pub fn provenance(&self, source: usize) -> Option<&Provenance> {
        self.contributions.get(&source).map(|contribution| &contribution.provenance)
    }
}

/// Accumulates sources one at a time and builds the joined table.
#[derive(Clone, Debug)]
pub struct SpliceJoin {
    frozen: ColumnSpan,
    records: BTreeMap<String, SpliceRecord>,
    source_labels: Vec<Vec<String>>,
}

impl SpliceJoin {
    pub fn new(frozen: ColumnSpan) -> Self {
        SpliceJoin {
            frozen,
            records: BTreeMap::new(),
            source_labels: Vec::new(),
        }
    }

    pub fn source_count(&self) -> usize {
        self.source_labels.len()
    }

    pub fn record(&self, key: &str) -> Option<&SpliceRecord> {
        self.records.get(key)
    }

    /// Adds the next source as a new column group. A repeated key inside one source keeps its
    /// last row.
    pub fn add_source(&mut self, source: SourceTable) {
        let index = self.source_labels.len();
        if source.rows.is_empty() {
            warn!("Source '{}' sheet '{}' has no usable rows", source.file_name, source.sheet_name);
        }
        for row in source.rows {
            let key = row.key();
            let record = self.records.entry(key).or_insert_with(|| SpliceRecord {
                frozen: row.key_parts.clone(),
                contributions: HashMap::new(),
            });
            record.contributions.insert(
                index,
                Contribution {
                    values: row.values,
                    provenance: Provenance {
                        source_file: source.file_name.to_owned(),
                        source_sheet: source.sheet_name.to_owned(),
                    },
                },
            );
        }
        self.source_labels.push(source.labels);
    }

    /// Builds the joined table: frozen column letters, then every source's labels in source
    /// order. Keys come out in ascending order; rows without any data value are dropped.
    pub fn finish(self) -> Result<Table, TrimError> {
        let mut columns = self
            .frozen
            .columns()
            .map(index_to_col)
            .collect::<Result<Vec<_>, _>>()?;
        columns.extend(self.source_labels.iter().flatten().cloned());
        let frozen_width = self.frozen.columns().count();

        let mut table = Table::new(columns);
        for record in self.records.values() {
            let mut data = Vec::new();
            for (index, labels) in self.source_labels.iter().enumerate() {
                match record.values(index) {
                    Some(values) => data.extend(values.iter().map(|value| to_value(value))),
                    None => data.extend(labels.iter().map(|_| CellValue::Empty)),
                }
            }
            if data.iter().all(CellValue::is_empty) {
                continue;
            }

            let mut row: Vec<CellValue> = record.frozen.iter().map(|value| to_value(value)).collect();
            row.resize(frozen_width, CellValue::Empty);
            row.extend(data);
            table.push_row(row);
        }
        Ok(table)
    }
}

fn to_value(value: &str) -> CellValue {
    if value.trim().is_empty() {
        CellValue::Empty
    } else {
        CellValue::Text(value.to_owned())
    }
}

fn is_delimited(file_name: &str) -> bool {
    Path::new(file_name)
        .extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| extension.eq_ignore_ascii_case("csv"))
        .unwrap_or(false)
}

/// Splices the given files and writes the joined table; returns the written path.
///
/// `.csv` files are delimited sources; everything else is opened as a workbook and each of its
/// sheets becomes a source of its own.
pub fn splice_files(files: &[String], options: &SpliceOptions) -> Result<PathBuf, TrimError> {
    let mut join = SpliceJoin::new(options.frozen);
    for file_name in files {
        let base_name = Path::new(file_name)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_name.to_owned());
        if is_delimited(file_name) {
            debug!("Reading delimited source '{file_name}'");
            let reader = open_source_file(file_name)?;
            let source = read_delimited_source(reader, &base_name, &options.frozen, options.skip.as_ref())
                .with_prefix(&format!("Failed to read '{file_name}'"))?;
            join.add_source(source);
        } else {
            let mut spreadsheet = open_spreadsheet(file_name)?;
            for sheet_name in spreadsheet.sheet_names() {
                debug!("Reading sheet '{sheet_name}' of '{file_name}'");
                let sheet = spreadsheet
                    .read_sheet(&sheet_name)
                    .with_prefix(&format!("Failed to read sheet '{sheet_name}' of '{file_name}'"))?;
                join.add_source(read_grid_source(
                    &sheet,
                    &base_name,
                    &options.frozen,
                    options.skip.as_ref(),
                    options.header_rows,
                ));
            }
        }
    }
    debug!("Joining {} sources", join.source_count());

    let table = join.finish()?;
    if table.is_empty() {
        warn!("No key in columns {} carries data; writing headers only", options.frozen);
    }
    CsvExporter::new(&options.output_dir)?.export(&table, &options.output_name)
}
