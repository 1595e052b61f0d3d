//! A minimal column-oriented table, the in-memory form of a worksheet.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The value of one spreadsheet cell.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl CellValue {
    /// Whether the cell is empty or holds only whitespace.
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Interpret the cell as a non-negative integer.
    ///
    /// Integral floats and numeric strings are accepted.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            CellValue::Int(i) => usize::try_from(*i).ok(),
            CellValue::Float(f) if f.fract() == 0.0 && *f >= 0.0 && *f <= u32::MAX as f64 => {
                Some(*f as usize)
            }
            CellValue::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Int(i) => write!(f, "{}", i),
            CellValue::Float(v) if v.fract() == 0.0 && v.abs() < 1e15 => write!(f, "{}", *v as i64),
            CellValue::Float(v) => write!(f, "{}", v),
            CellValue::Bool(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<usize> for CellValue {
    fn from(value: usize) -> Self {
        CellValue::Int(value as i64)
    }
}

/// A named column of cells (the header is not one of the cells).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub header: String,
    pub cells: Vec<CellValue>,
}

impl Column {
    /// Create a column from a header and its cells.
    pub fn new(header: impl Into<String>, cells: Vec<CellValue>) -> Self {
        Self {
            header: header.into(),
            cells,
        }
    }
}

/// An ordered list of columns, addressable by position or header name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<Column>,
}

impl Table {
    /// Create a table from its columns.
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    /// Build a table from a header row and data rows.
    ///
    /// Short rows are padded with empty cells; cells past the last header
    /// are dropped.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let mut columns: Vec<Column> = headers
            .into_iter()
            .map(|header| Column::new(header, Vec::with_capacity(rows.len())))
            .collect();

        for row in rows {
            let mut cells = row.into_iter();
            for column in columns.iter_mut() {
                column.cells.push(cells.next().unwrap_or_default());
            }
        }

        Self { columns }
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// Number of data rows (the longest column wins).
    pub fn height(&self) -> usize {
        self.columns.iter().map(|c| c.cells.len()).max().unwrap_or(0)
    }

    /// Find a column by exact header name.
    pub fn column(&self, header: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.header == header)
    }

    /// Headers in column order.
    pub fn headers(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.header.as_str()).collect()
    }

    /// The cell at `row` of the column at `col`, empty when out of range.
    pub fn cell(&self, row: usize, col: usize) -> &CellValue {
        static EMPTY: CellValue = CellValue::Empty;
        self.columns
            .get(col)
            .and_then(|c| c.cells.get(row))
            .unwrap_or(&EMPTY)
    }

    /// Iterate rows as vectors of cell references, padded to the table width.
    pub fn rows(&self) -> impl Iterator<Item = Vec<&CellValue>> + '_ {
        (0..self.height()).map(move |row| {
            (0..self.width())
                .map(|col| self.cell(row, col))
                .collect::<Vec<_>>()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows_pads_short_rows() {
        let table = Table::from_rows(
            vec!["A".to_string(), "B".to_string()],
            vec![vec!["x".into()], vec!["y".into(), CellValue::Int(2), "extra".into()]],
        );

        assert_eq!(table.width(), 2);
        assert_eq!(table.height(), 2);
        assert_eq!(table.columns[1].cells, vec![CellValue::Empty, CellValue::Int(2)]);
    }

    #[test]
    fn test_column_lookup_by_name() {
        let table = Table::new(vec![
            Column::new("Slide", vec![]),
            Column::new("ShapeIndex", vec![]),
        ]);
        assert!(table.column("ShapeIndex").is_some());
        assert!(table.column("shapeindex").is_none());
        assert_eq!(table.headers(), vec!["Slide", "ShapeIndex"]);
    }

    #[test]
    fn test_as_index() {
        assert_eq!(CellValue::Int(3).as_index(), Some(3));
        assert_eq!(CellValue::Float(3.0).as_index(), Some(3));
        assert_eq!(CellValue::Float(3.5).as_index(), None);
        assert_eq!(CellValue::Int(-1).as_index(), None);
        assert_eq!(CellValue::from(" 12 ").as_index(), Some(12));
        assert_eq!(CellValue::Empty.as_index(), None);
    }

    #[test]
    fn test_display_integral_float() {
        assert_eq!(CellValue::Float(2.0).to_string(), "2");
        assert_eq!(CellValue::Float(0.5).to_string(), "0.5");
        assert_eq!(CellValue::Empty.to_string(), "");
    }
}
