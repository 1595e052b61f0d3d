//! Copy one worksheet column into another worksheet under a new header.

use crate::error::{Error, Result};
use crate::sheet::TRANSLATED_TEXT;
use crate::table::Table;

/// Replaces a target column with a source column and renames it.
///
/// The defaults copy the third source column over the fourth target column
/// and call it `TranslatedText`, turning a translated all-text sheet into a
/// sheet the reinserter can consume.
#[derive(Debug, Clone)]
pub struct ColumnTransplant {
    source_column: usize,
    target_column: usize,
    header: String,
}

impl Default for ColumnTransplant {
    fn default() -> Self {
        Self {
            source_column: 2,
            target_column: 3,
            header: TRANSLATED_TEXT.to_string(),
        }
    }
}

impl ColumnTransplant {
    /// Create a transplant with the default columns and header.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy of `target` with its column replaced.
    ///
    /// Fails with [`Error::Schema`] when either table is too narrow or the
    /// two columns differ in length; nothing is truncated or padded.
    pub fn apply(&self, source: &Table, target: &Table) -> Result<Table> {
        let column = source.columns.get(self.source_column).ok_or_else(|| {
            Error::Schema(format!(
                "source requires at least {} columns, found {}",
                self.source_column + 1,
                source.width()
            ))
        })?;

        if target.width() <= self.target_column {
            return Err(Error::Schema(format!(
                "target requires at least {} columns, found {}",
                self.target_column + 1,
                target.width()
            )));
        }

        let target_rows = target.columns[self.target_column].cells.len();
        if column.cells.len() != target_rows {
            return Err(Error::Schema(format!(
                "source column has {} rows but target column has {}",
                column.cells.len(),
                target_rows
            )));
        }

        let mut result = target.clone();
        let replaced = &mut result.columns[self.target_column];
        *replaced = column.clone();
        replaced.header = self.header.clone();

        log::debug!(
            "Copied column {} ('{}') over column {} as '{}'",
            self.source_column + 1,
            column.header,
            self.target_column + 1,
            self.header
        );

        Ok(result)
    }
}
