//! # Rusty Trim
//!
//! Reshapes spreadsheet tables with irregular headers into flat CSV records.
//!
//! ## Features
//!
//! - **Axis extraction**: column and row header ranges, multi-row headers merged with `_`,
//!   merged cells resolved to their anchor value
//! - **Numeric payload**: only numeric cells of the data region are carried into the output
//! - **Two output shapes**: one flat table per sheet, or one pivot row per sheet collected into a
//!   single merged table per workbook
//! - **Splice join**: several CSV files or workbooks joined on frozen key columns, each source
//!   contributing its own group of columns
//! - **Workbook summary**: sheet names, dimensions and used ranges as text or JSON
//!
//! Workbooks are read from Office Open XML packages (`.xlsx`, `.xlsm`, `.xltx`, `.xltm`).
pub mod error;
pub mod export;
pub mod extract;
mod helpers;
pub mod info;
pub mod splice;
pub mod spreadsheet;
pub mod table;

pub use crate::error::TrimError;
