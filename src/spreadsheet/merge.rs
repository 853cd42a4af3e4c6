//! Merged-region resolution: every cell inside a merge region reads the value of the region's
//! top-left anchor cell.

use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::range::CellRange;
use crate::spreadsheet::sheet::Sheet;

/// A merged block of cells, bounds 1-based and inclusive. The anchor is (min_row, min_col).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MergeRegion {
    pub min_row: usize,
    pub max_row: usize,
    pub min_col: usize,
    pub max_col: usize,
}

impl MergeRegion {
    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.min_row <= row && row <= self.max_row && self.min_col <= col && col <= self.max_col
    }
}

impl From<CellRange> for MergeRegion {
    fn from(range: CellRange) -> Self {
        MergeRegion {
            min_row: range.start_row,
            max_row: range.end_row,
            min_col: range.start_col,
            max_col: range.end_col,
        }
    }
}

/// Returns the effective value at (row, col): the anchor's value when the position is inside a
/// merge region, the cell's own value otherwise.
///
/// With `trim`, non-empty values come back as their string form without surrounding whitespace.
/// Without it the raw value is returned untouched, so callers can still inspect its native type.
pub fn resolve(sheet: &Sheet, row: usize, col: usize, trim: bool) -> CellValue {
    let (row, col) = sheet
        .merges()
        .iter()
        .find(|region| region.contains(row, col))
        .map(|region| (region.min_row, region.min_col))
        .unwrap_or((row, col));
    let value = sheet.get(row, col);
    if trim && !value.is_empty() {
        CellValue::Text(value.to_trimmed_string())
    } else {
        value.clone()
    }
}
