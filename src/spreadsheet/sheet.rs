use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::merge::MergeRegion;
use crate::spreadsheet::range::CellRange;
use std::collections::HashMap;

/// A stored worksheet cell, coordinates 1-based.
#[derive(Clone, Debug)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
    pub value: CellValue,
}

/// One fully materialized worksheet: sparse cells, merge regions and the used bounds.
#[derive(Clone, Debug)]
pub struct Sheet {
    /// Source file name
    pub file_name: String,
    /// Sheet name
    pub name: String,
    /// All non-empty cells in reading order
    pub(crate) cells: Vec<Cell>,
    /// Index from (row, col) to position in `cells`
    indexes: HashMap<(usize, usize), usize>,
    /// Merge regions declared by the sheet
    pub(crate) merges: Vec<MergeRegion>,
    /// Used bounds, `None` until the first cell or merge region is added
    pub row_lower_bound: Option<usize>,
    pub row_upper_bound: Option<usize>,
    pub col_lower_bound: Option<usize>,
    pub col_upper_bound: Option<usize>,
}

impl Sheet {
    pub fn new(file_name: &str, name: &str) -> Self {
        Self {
            file_name: file_name.to_owned(),
            name: name.to_owned(),
            cells: Vec::new(),
            indexes: HashMap::new(),
            merges: Vec::new(),
            row_lower_bound: None,
            row_upper_bound: None,
            col_lower_bound: None,
            col_upper_bound: None,
        }
    }

    /// Builds a sheet from a dense matrix whose first entry is A1.
    pub fn from_rows(name: &str, rows: Vec<Vec<CellValue>>) -> Self {
        let mut sheet = Sheet::new("", name);
        for (row, values) in rows.into_iter().enumerate() {
            for (col, value) in values.into_iter().enumerate() {
                sheet.push(Cell { row: row + 1, col: col + 1, value });
            }
        }
        sheet
    }

    /// Returns true if the sheet holds no cells and no merge regions.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty() && self.merges.is_empty()
    }

    /// Stores a cell; empty values are dropped so they do not widen the used range.
    /// A later value at the same position replaces the earlier one.
    pub fn push(&mut self, cell: Cell) {
        if cell.value.is_empty() {
            return;
        }
        self.update_bound(cell.row, cell.col);
        match self.indexes.get(&(cell.row, cell.col)) {
            Some(index) => self.cells[*index] = cell,
            None => {
                self.indexes.insert((cell.row, cell.col), self.cells.len());
                self.cells.push(cell);
            }
        }
    }

    /// Declares a merge region; its anchor and far corner both count toward the used range.
    pub fn push_merge(&mut self, region: MergeRegion) {
        self.update_bound(region.min_row, region.min_col);
        self.update_bound(region.max_row, region.max_col);
        self.merges.push(region);
    }

    pub fn merges(&self) -> &[MergeRegion] {
        &self.merges
    }

    fn update_bound(&mut self, row: usize, col: usize) {
        if self.row_lower_bound.map(|lower| row < lower).unwrap_or(true) {
            self.row_lower_bound = Some(row);
        }
        if self.row_upper_bound.map(|upper| upper < row).unwrap_or(true) {
            self.row_upper_bound = Some(row);
        }
        if self.col_lower_bound.map(|lower| col < lower).unwrap_or(true) {
            self.col_lower_bound = Some(col);
        }
        if self.col_upper_bound.map(|upper| upper < col).unwrap_or(true) {
            self.col_upper_bound = Some(col);
        }
    }

    /// Raw value at a 1-based position, `Empty` when nothing is stored there.
    pub fn get(&self, row: usize, col: usize) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.indexes
            .get(&(row, col))
            .map(|index| &self.cells[*index].value)
            .unwrap_or(&EMPTY)
    }

    /// Bounding box of all stored cells and merge regions.
    pub fn used_range(&self) -> Option<CellRange> {
        Some(CellRange {
            start_col: self.col_lower_bound?,
            start_row: self.row_lower_bound?,
            end_col: self.col_upper_bound?,
            end_row: self.row_upper_bound?,
        })
    }

    /// Last used row, 0 for an empty sheet.
    pub fn max_row(&self) -> usize {
        self.row_upper_bound.unwrap_or(0)
    }

    /// Last used column, 0 for an empty sheet.
    pub fn max_col(&self) -> usize {
        self.col_upper_bound.unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn number(value: f64) -> CellValue {
        CellValue::Number(value)
    }

    #[test]
    fn sheet_initial() {
        let sheet = Sheet::new("book.xlsx", "Sheet1");
        assert!(sheet.is_empty());
        assert_eq!(sheet.used_range(), None);
        assert_eq!(sheet.max_row(), 0);
        assert_eq!(sheet.max_col(), 0);
    }

    #[test]
    fn sheet_update() {
        let mut sheet = Sheet::new("", "");
        sheet.push(Cell { row: 2, col: 2, value: number(1.0) });
        sheet.push(Cell { row: 2, col: 4, value: number(2.0) });
        sheet.push(Cell { row: 5, col: 3, value: number(3.0) });
        sheet.push(Cell { row: 9, col: 9, value: CellValue::Empty });

        assert_eq!(sheet.cells.len(), 3);
        assert_eq!(
            sheet.used_range(),
            Some(CellRange { start_col: 2, start_row: 2, end_col: 4, end_row: 5 })
        );
        assert_eq!(sheet.get(5, 3), &number(3.0));
        assert_eq!(sheet.get(1, 1), &CellValue::Empty);
    }

    #[test]
    fn later_value_replaces_earlier() {
        let mut sheet = Sheet::new("", "");
        sheet.push(Cell { row: 1, col: 1, value: number(1.0) });
        sheet.push(Cell { row: 1, col: 1, value: number(7.0) });
        assert_eq!(sheet.cells.len(), 1);
        assert_eq!(sheet.get(1, 1), &number(7.0));
    }

    #[test]
    fn merges_widen_used_range() {
        let mut sheet = Sheet::from_rows("", vec![vec![number(1.0)]]);
        sheet.push_merge(MergeRegion { min_row: 2, max_row: 3, min_col: 1, max_col: 4 });
        assert_eq!(sheet.max_row(), 3);
        assert_eq!(sheet.max_col(), 4);
    }

    #[test]
    fn from_rows_starts_at_a1() {
        let sheet = Sheet::from_rows(
            "S",
            vec![
                vec![CellValue::Empty, CellValue::Text("H1".to_owned())],
                vec![CellValue::Text("R1".to_owned()), number(10.0)],
            ],
        );
        assert_eq!(sheet.name, "S");
        assert_eq!(sheet.get(1, 2), &CellValue::Text("H1".to_owned()));
        assert_eq!(sheet.get(2, 2), &number(10.0));
        assert_eq!(
            sheet.used_range(),
            Some(CellRange { start_col: 1, start_row: 1, end_col: 2, end_row: 2 })
        );
    }
}
