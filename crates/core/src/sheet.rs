//! Mapping between row types and tables with the fixed column names.

use crate::address::Address;
use crate::error::{Error, Result};
use crate::model::{ExtractedRow, TranslationRow};
use crate::reinsert::{ReinsertReport, SkipReason, SkippedRow};
use crate::table::{CellValue, Column, Table};

pub const SLIDE: &str = "Slide";
pub const SHAPE_INDEX: &str = "ShapeIndex";
pub const ORIGINAL_TEXT: &str = "OriginalText";
pub const TRANSLATED_TEXT: &str = "TranslatedText";

/// Table with `Slide`, `ShapeIndex` and `OriginalText` columns.
pub fn all_text_table(rows: &[ExtractedRow]) -> Table {
    Table::new(vec![
        Column::new(SLIDE, rows.iter().map(|r| r.slide.into()).collect()),
        Column::new(
            SHAPE_INDEX,
            rows.iter().map(|r| r.address.to_string().into()).collect(),
        ),
        Column::new(
            ORIGINAL_TEXT,
            rows.iter().map(|r| r.original_text.as_str().into()).collect(),
        ),
    ])
}

/// Translation table: the all-text columns plus `TranslatedText`.
pub fn translation_table(rows: &[TranslationRow]) -> Table {
    Table::new(vec![
        Column::new(SLIDE, rows.iter().map(|r| r.slide.into()).collect()),
        Column::new(
            SHAPE_INDEX,
            rows.iter().map(|r| r.address.to_string().into()).collect(),
        ),
        Column::new(
            ORIGINAL_TEXT,
            rows.iter().map(|r| r.source_text.as_str().into()).collect(),
        ),
        Column::new(
            TRANSLATED_TEXT,
            rows.iter().map(|r| r.translated_text.as_str().into()).collect(),
        ),
    ])
}

/// Translation rows read back from a table, each with its row index.
#[derive(Debug, Clone, Default)]
pub struct TranslationInput {
    /// Rows that parsed, paired with their 0-based table row.
    pub rows: Vec<(usize, TranslationRow)>,
    /// Rows with a translation but an unusable slide or address, plus the
    /// count of rows without any translation.
    pub report: ReinsertReport,
}

/// Read translation rows from a table, matching columns by header name.
///
/// `Slide`, `ShapeIndex` and `TranslatedText` are required; other columns
/// are ignored. Rows without a translation are counted as blank and never
/// validated. Rows with a translation whose slide or address cannot be
/// parsed are reported as skipped.
pub fn read_translation_rows(table: &Table) -> Result<TranslationInput> {
    let slide_col = required(table, SLIDE)?;
    let address_col = required(table, SHAPE_INDEX)?;
    let translated_col = required(table, TRANSLATED_TEXT)?;
    let original_col = table.column(ORIGINAL_TEXT);

    let mut input = TranslationInput::default();
    for row in 0..table.height() {
        let translated = cell(translated_col, row);
        if translated.is_blank() {
            input.report.blank += 1;
            continue;
        }

        let slide_cell = cell(slide_col, row);
        let address_text = cell(address_col, row).to_string().trim().to_string();

        let slide = match slide_cell.as_index() {
            Some(slide) if slide > 0 => slide,
            _ => {
                input.report.skip(SkippedRow {
                    row,
                    slide: slide_cell.to_string(),
                    address: address_text,
                    reason: SkipReason::InvalidSlide(slide_cell.to_string()),
                });
                continue;
            }
        };

        let address = match address_text.parse::<Address>() {
            Ok(address) => address,
            Err(err) => {
                input.report.skip(SkippedRow {
                    row,
                    slide: slide.to_string(),
                    address: address_text,
                    reason: err.into(),
                });
                continue;
            }
        };

        input.rows.push((
            row,
            TranslationRow {
                slide,
                address,
                source_text: original_col
                    .map(|c| cell(c, row).to_string())
                    .unwrap_or_default(),
                translated_text: translated.to_string(),
            },
        ));
    }

    Ok(input)
}

fn required<'a>(table: &'a Table, header: &str) -> Result<&'a Column> {
    table.column(header).ok_or_else(|| {
        Error::Schema(format!(
            "missing required column '{}' (found: {})",
            header,
            table.headers().join(", ")
        ))
    })
}

fn cell(column: &Column, row: usize) -> &CellValue {
    static EMPTY: CellValue = CellValue::Empty;
    column.cells.get(row).unwrap_or(&EMPTY)
}
