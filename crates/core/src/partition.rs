//! Derive the translation table from the full extraction.

use crate::model::{ExtractedRow, TranslationRow};

/// Turn extracted rows into translation rows, keeping count and order.
///
/// Rows whose text does not satisfy `predicate` keep their slide and address
/// but get an empty source text, so the translated table can still be lined
/// up with the full extraction row by row.
pub fn filter<P>(rows: &[ExtractedRow], predicate: P) -> Vec<TranslationRow>
where
    P: Fn(&str) -> bool,
{
    rows.iter()
        .map(|row| TranslationRow {
            slide: row.slide,
            address: row.address.clone(),
            source_text: if predicate(&row.original_text) {
                row.original_text.clone()
            } else {
                String::new()
            },
            translated_text: String::new(),
        })
        .collect()
}
