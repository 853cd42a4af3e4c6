use crate::spreadsheet::reference::col_to_index;
use crate::spreadsheet::reference::index_to_col;
use crate::spreadsheet::reference::index_to_reference;
use crate::spreadsheet::reference::CellAddress;
use regex::Regex;
use std::fmt::Display;
use std::sync::LazyLock;
use thiserror::Error;

static COLUMN_SPAN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z]+)(?::([A-Za-z]+))?$").expect("Hardcode regex pattern"));

/// Errors related to Excel-style address and range parsing.
#[derive(Error, Debug, PartialEq)]
pub enum RangeError {
    #[error("Invalid address '{0}'")]
    InvalidAddress(String),
}

/// A rectangular block of cells, all bounds 1-based and inclusive.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CellRange {
    pub start_col: usize,
    pub start_row: usize,
    pub end_col: usize,
    pub end_row: usize,
}

impl CellRange {
    /// Builds a range from two corners, normalizing so that start <= end on both axes.
    pub fn new(first: CellAddress, second: CellAddress) -> Self {
        CellRange {
            start_col: first.col.min(second.col),
            start_row: first.row.min(second.row),
            end_col: first.col.max(second.col),
            end_row: first.row.max(second.row),
        }
    }

    /// Returns true if the 1-based (row, col) position lies inside the range.
    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.start_row <= row && row <= self.end_row && self.start_col <= col && col <= self.end_col
    }

    pub fn rows(&self) -> usize {
        self.end_row - self.start_row + 1
    }

    pub fn cols(&self) -> usize {
        self.end_col - self.start_col + 1
    }
}

impl TryFrom<&str> for CellRange {
    type Error = RangeError;

    /// Parses `B1:H2`, or a single address such as `A1` as a 1x1 range.
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.split_once(':') {
            Some((start, end)) => {
                let start = CellAddress::try_from(start).map_err(|_| RangeError::InvalidAddress(value.to_owned()))?;
                let end = CellAddress::try_from(end).map_err(|_| RangeError::InvalidAddress(value.to_owned()))?;
                Ok(CellRange::new(start, end))
            }
            None => {
                let address = CellAddress::try_from(value)?;
                Ok(CellRange::new(address, address))
            }
        }
    }
}

impl Display for CellRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{}",
            index_to_reference(self.start_row, self.start_col),
            index_to_reference(self.end_row, self.end_col)
        )
    }
}

/// A run of whole columns such as `A:E` or `C`, bounds 1-based and inclusive.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ColumnSpan {
    pub start_col: usize,
    pub end_col: usize,
}

impl ColumnSpan {
    pub fn contains(&self, col: usize) -> bool {
        self.start_col <= col && col <= self.end_col
    }

    pub fn columns(&self) -> std::ops::RangeInclusive<usize> {
        self.start_col..=self.end_col
    }
}

impl TryFrom<&str> for ColumnSpan {
    type Error = RangeError;

    /// Parses `A:E` or a single column `A` (case-insensitive).
    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let captures = COLUMN_SPAN_PATTERN
            .captures(value)
            .ok_or_else(|| RangeError::InvalidAddress(value.to_owned()))?;
        let start = col_to_index(&captures[1])?;
        let end = captures
            .get(2)
            .map(|matcher| col_to_index(matcher.as_str()))
            .transpose()?
            .unwrap_or(start);
        Ok(ColumnSpan {
            start_col: start.min(end),
            end_col: start.max(end),
        })
    }
}

impl Display for ColumnSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let start = index_to_col(self.start_col).unwrap_or_default();
        let end = index_to_col(self.end_col).unwrap_or_default();
        write!(f, "{start}:{end}")
    }
}
