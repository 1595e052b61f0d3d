//! Worksheet to [`Table`] conversion.

use calamine::{open_workbook_auto, Data, Range, Reader, Xlsx};
use slidetext_core::{CellValue, Error, Result, Table};
use std::io::{Read, Seek};
use std::path::Path;

/// Read the first worksheet of a spreadsheet file.
pub fn read_table(path: &Path) -> Result<Table> {
    let mut workbook = open_workbook_auto(path).map_err(|e| {
        Error::SpreadsheetError(format!("Failed to open {}: {}", path.display(), e))
    })?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| Error::SpreadsheetError(format!("{} has no worksheets", path.display())))?
        .map_err(|e| Error::SpreadsheetError(format!("Failed to read {}: {}", path.display(), e)))?;

    let table = range_to_table(&range);
    log::debug!(
        "Read {} rows x {} columns from {}",
        table.height(),
        table.width(),
        path.display()
    );
    Ok(table)
}

/// Read the first worksheet of an XLSX workbook from a reader.
pub fn read_table_from_reader<R: Read + Seek>(reader: R) -> Result<Table> {
    let mut workbook: Xlsx<R> = Xlsx::new(reader)
        .map_err(|e| Error::SpreadsheetError(format!("Failed to open workbook: {}", e)))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| Error::SpreadsheetError("workbook has no worksheets".to_string()))?
        .map_err(|e| Error::SpreadsheetError(format!("Failed to read worksheet: {}", e)))?;

    Ok(range_to_table(&range))
}

fn range_to_table(range: &Range<Data>) -> Table {
    let mut rows = range.rows();

    let headers: Vec<String> = match rows.next() {
        Some(header_row) => header_row.iter().map(|c| c.to_string()).collect(),
        None => return Table::default(),
    };

    let data: Vec<Vec<CellValue>> = rows
        .map(|row| row.iter().map(cell_value).collect())
        .collect();

    Table::from_rows(headers, data)
}

fn cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) if s.is_empty() => CellValue::Empty,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        other => CellValue::Text(other.to_string()),
    }
}
