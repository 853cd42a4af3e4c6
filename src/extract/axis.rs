//! Region derivation and header merging for one sheet.

use crate::error::TrimError;
use crate::extract::ExtractError;
use crate::spreadsheet::cell::CellValue;
use crate::spreadsheet::merge::resolve;
use crate::spreadsheet::range::CellRange;
use crate::spreadsheet::reference::index_to_col;
use crate::spreadsheet::sheet::Sheet;

/// Where the header axes of a sheet live; `None` means no header on that axis.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AxisSpec {
    /// Column headers (horizontal axis)
    pub haxis: Option<CellRange>,
    /// Row headers (vertical axis)
    pub vaxis: Option<CellRange>,
}

/// Data rectangle of a sheet, 1-based and inclusive. May be empty (end before start).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DataRegion {
    pub start_row: usize,
    pub end_row: usize,
    pub start_col: usize,
    pub end_col: usize,
}

impl DataRegion {
    pub fn rows(&self) -> usize {
        self.end_row.saturating_add(1).saturating_sub(self.start_row)
    }

    pub fn cols(&self) -> usize {
        self.end_col.saturating_add(1).saturating_sub(self.start_col)
    }

    pub fn is_empty(&self) -> bool {
        self.rows() == 0 || self.cols() == 0
    }
}

/// Header labels plus the numeric payload of one sheet.
#[derive(Clone, Debug, PartialEq)]
pub struct ExtractedTable {
    pub column_headers: Vec<String>,
    pub row_headers: Option<Vec<String>>,
    /// Data cells row by row; non-numeric cells are `None`
    pub cells: Vec<Vec<Option<f64>>>,
}

/// Derives the data region from the axes present.
///
/// With both axes the header ranges span the data directly: rows come from the row axis and
/// columns from the column axis. A lone column axis puts the data below it down to the last used
/// row. A lone row axis puts the data right of it up to the last used column. Without axes the
/// whole used range is data.
pub fn derive_region(sheet: &Sheet, axes: &AxisSpec) -> Result<DataRegion, ExtractError> {
    let region = match (axes.haxis, axes.vaxis) {
        (Some(h), Some(v)) => DataRegion {
            start_row: v.start_row,
            end_row: v.end_row,
            start_col: h.start_col,
            end_col: h.end_col,
        },
        (Some(h), None) => DataRegion {
            start_row: h.end_row + 1,
            end_row: sheet.max_row(),
            start_col: h.start_col,
            end_col: h.end_col,
        },
        (None, Some(v)) => DataRegion {
            start_row: v.start_row,
            end_row: v.end_row,
            start_col: v.end_col + 1,
            end_col: sheet.max_col(),
        },
        (None, None) => {
            let used = sheet.used_range().ok_or_else(|| ExtractError::EmptyRegion {
                sheet: sheet.name.to_owned(),
                region: "used range".to_owned(),
            })?;
            DataRegion {
                start_row: used.start_row,
                end_row: used.end_row,
                start_col: used.start_col,
                end_col: used.end_col,
            }
        }
    };

    if region.is_empty() {
        Err(ExtractError::EmptyRegion {
            sheet: sheet.name.to_owned(),
            region: format!("data region rows {}..{} cols {}..{}", region.start_row, region.end_row, region.start_col, region.end_col),
        })
    } else {
        Ok(region)
    }
}

/// Merged column labels: per column of the axis, the non-empty trimmed values of its rows joined
/// with `_`, or `Col_<col>` when all are empty.
pub fn column_headers(sheet: &Sheet, haxis: &CellRange) -> Vec<String> {
    (haxis.start_col..=haxis.end_col)
        .map(|col| {
            let parts = (haxis.start_row..=haxis.end_row).map(|row| resolve(sheet, row, col, true));
            join_label(parts, || format!("Col_{col}"))
        })
        .collect()
}

/// Merged row labels: per row of the axis, the non-empty trimmed values of its columns joined
/// with `_`, or `Row_<row>` when all are empty.
pub fn row_headers(sheet: &Sheet, vaxis: &CellRange) -> Vec<String> {
    (vaxis.start_row..=vaxis.end_row)
        .map(|row| {
            let parts = (vaxis.start_col..=vaxis.end_col).map(|col| resolve(sheet, row, col, true));
            join_label(parts, || format!("Row_{row}"))
        })
        .collect()
}

fn join_label<I, F>(values: I, fallback: F) -> String
where
    I: Iterator<Item = CellValue>,
    F: FnOnce() -> String,
{
    let parts = values
        .filter(|value| !value.is_empty())
        .map(|value| value.to_string())
        .collect::<Vec<_>>();
    if parts.is_empty() {
        fallback()
    } else {
        parts.join("_")
    }
}

/// Extracts one sheet: derives the data region, merges header labels and keeps only numeric
/// data cells.
pub fn extract(sheet: &Sheet, axes: &AxisSpec) -> Result<ExtractedTable, TrimError> {
    let region = derive_region(sheet, axes)?;

    let cells: Vec<Vec<Option<f64>>> = (region.start_row..=region.end_row)
        .map(|row| {
            (region.start_col..=region.end_col)
                .map(|col| resolve(sheet, row, col, false).to_number())
                .collect()
        })
        .collect();

    let column_headers = match &axes.haxis {
        Some(haxis) => column_headers(sheet, haxis),
        None => (region.start_col..=region.end_col)
            .map(index_to_col)
            .collect::<Result<Vec<_>, _>>()?,
    };
    let row_headers = axes.vaxis.as_ref().map(|vaxis| row_headers(sheet, vaxis));

    Ok(ExtractedTable {
        column_headers,
        row_headers,
        cells,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spreadsheet::merge::MergeRegion;

    fn text(value: &str) -> CellValue {
        CellValue::Text(value.to_owned())
    }

    fn number(value: f64) -> CellValue {
        CellValue::Number(value)
    }

    fn range(reference: &str) -> Option<CellRange> {
        Some(CellRange::try_from(reference).unwrap())
    }

    /// 5 rows x 4 columns, numbers everywhere
    fn grid() -> Sheet {
        let rows: Vec<Vec<CellValue>> = (1..=5)
            .map(|row| (1..=4).map(|col| number((row * 10 + col) as f64)).collect())
            .collect();
        Sheet::from_rows("grid", rows)
    }

    #[test]
    fn region_with_both_axes() {
        let axes = AxisSpec { haxis: range("A1:B1"), vaxis: range("A2:A5") };
        let region = derive_region(&grid(), &axes).unwrap();
        assert_eq!(region, DataRegion { start_row: 2, end_row: 5, start_col: 1, end_col: 2 });
    }

    #[test]
    fn region_with_column_axis_only() {
        let axes = AxisSpec { haxis: range("B1:C2"), vaxis: None };
        let region = derive_region(&grid(), &axes).unwrap();
        assert_eq!(region, DataRegion { start_row: 3, end_row: 5, start_col: 2, end_col: 3 });
    }

    #[test]
    fn region_with_row_axis_only() {
        let axes = AxisSpec { haxis: None, vaxis: range("A2:B4") };
        let region = derive_region(&grid(), &axes).unwrap();
        assert_eq!(region, DataRegion { start_row: 2, end_row: 4, start_col: 3, end_col: 4 });
    }

    #[test]
    fn region_without_axes() {
        let region = derive_region(&grid(), &AxisSpec::default()).unwrap();
        assert_eq!(region, DataRegion { start_row: 1, end_row: 5, start_col: 1, end_col: 4 });
    }

    #[test]
    fn empty_regions_are_reported() {
        let axes = AxisSpec { haxis: range("A5:D5"), vaxis: None };
        assert!(matches!(derive_region(&grid(), &axes), Err(ExtractError::EmptyRegion { .. })));

        let empty = Sheet::new("book.xlsx", "blank");
        assert!(matches!(
            derive_region(&empty, &AxisSpec::default()),
            Err(ExtractError::EmptyRegion { sheet, .. }) if sheet == "blank"
        ));
    }

    #[test]
    fn axes_at_the_worksheet_edge_leave_no_data() {
        let axes = AxisSpec { haxis: range("A1048576:D1048576"), vaxis: None };
        assert!(matches!(derive_region(&grid(), &axes), Err(ExtractError::EmptyRegion { .. })));

        let axes = AxisSpec { haxis: None, vaxis: range("XFD1:XFD5") };
        assert!(matches!(derive_region(&grid(), &axes), Err(ExtractError::EmptyRegion { .. })));
    }

    #[test]
    fn extracts_flat_scenario() {
        let sheet = Sheet::from_rows(
            "S",
            vec![
                vec![CellValue::Empty, text("H1"), text("H2")],
                vec![text("R1"), number(10.0), number(20.0)],
                vec![text("R2"), number(30.0), number(40.0)],
            ],
        );
        let axes = AxisSpec { haxis: range("B1:C1"), vaxis: range("A2:A3") };
        let table = extract(&sheet, &axes).unwrap();
        assert_eq!(table.column_headers, vec!["H1", "H2"]);
        assert_eq!(table.row_headers, Some(vec!["R1".to_owned(), "R2".to_owned()]));
        assert_eq!(table.cells, vec![vec![Some(10.0), Some(20.0)], vec![Some(30.0), Some(40.0)]]);
    }

    #[test]
    fn non_numeric_cells_become_absent() {
        let sheet = Sheet::from_rows(
            "S",
            vec![
                vec![text("H1"), text("H2"), text("H3")],
                vec![number(1.0), text("N/A"), CellValue::Boolean(true)],
            ],
        );
        let axes = AxisSpec { haxis: range("A1:C1"), vaxis: None };
        let table = extract(&sheet, &axes).unwrap();
        assert_eq!(table.cells, vec![vec![Some(1.0), None, None]]);
    }

    #[test]
    fn merges_multi_row_headers() {
        let mut sheet = Sheet::from_rows(
            "S",
            vec![
                vec![text(" 成本 "), CellValue::Empty, CellValue::Empty],
                vec![text("1月"), text("2月"), CellValue::Empty],
                vec![number(1.0), number(2.0), number(3.0)],
            ],
        );
        sheet.push_merge(MergeRegion { min_row: 1, max_row: 1, min_col: 1, max_col: 2 });
        let headers = column_headers(&sheet, &CellRange::try_from("A1:C2").unwrap());
        assert_eq!(headers, vec!["成本_1月", "成本_2月", "Col_3"]);
    }

    #[test]
    fn empty_row_labels_fall_back_to_row_number() {
        let sheet = Sheet::from_rows("S", vec![vec![text("A")], vec![CellValue::Empty], vec![number(0.0)]]);
        let headers = row_headers(&sheet, &CellRange::try_from("A1:A3").unwrap());
        assert_eq!(headers, vec!["A", "Row_2", "0"]);
    }

    #[test]
    fn letters_label_columns_without_column_axis() {
        let axes = AxisSpec { haxis: None, vaxis: range("A2:A3") };
        let table = extract(&grid(), &axes).unwrap();
        assert_eq!(table.column_headers, vec!["B", "C", "D"]);
        assert_eq!(table.cells[0], vec![Some(22.0), Some(23.0), Some(24.0)]);
    }
}
