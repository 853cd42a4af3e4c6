use crate::spreadsheet::cell::CellValue;
use std::collections::HashMap;

/// A flat table: ordered column labels and rows of values. `Empty` marks an absent value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<CellValue>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Table {
            columns,
            rows: Vec::new(),
        }
    }

    /// Appends a row, padding or cutting it to the table width.
    pub fn push_row(&mut self, mut row: Vec<CellValue>) {
        row.resize(self.columns.len(), CellValue::Empty);
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Stacks tables vertically over the union of their columns.
    ///
    /// Columns keep their first-seen order. A label repeated inside one table stays a separate
    /// column: the n-th occurrence of a label lines up with the n-th occurrence in the union.
    /// Cells a table does not have are `Empty`.
    pub fn concat(tables: Vec<Table>) -> Table {
        let mut columns = Vec::<String>::new();
        let mut positions = HashMap::<(String, usize), usize>::new();
        let mut layouts = Vec::<Vec<usize>>::with_capacity(tables.len());
        for table in &tables {
            let mut seen = HashMap::<&str, usize>::new();
            let layout = table
                .columns
                .iter()
                .map(|column| {
                    let occurrence = seen.entry(column.as_str()).or_insert(0);
                    let key = (column.to_owned(), *occurrence);
                    *occurrence += 1;
                    *positions.entry(key).or_insert_with(|| {
                        columns.push(column.to_owned());
                        columns.len() - 1
                    })
                })
                .collect();
            layouts.push(layout);
        }

        let mut result = Table::new(columns);
        for (table, layout) in tables.into_iter().zip(layouts) {
            for row in table.rows {
                let mut values = vec![CellValue::Empty; result.columns.len()];
                for (value, position) in row.into_iter().zip(&layout) {
                    values[*position] = value;
                }
                result.rows.push(values);
            }
        }
        result
    }
}
