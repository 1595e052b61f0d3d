//! Core model and algorithms for moving presentation text through
//! spreadsheets: shape addresses, extraction, partitioning, re-insertion
//! of translations, and the column transplant utility.

pub mod address;
pub mod error;
pub mod extract;
pub mod language;
pub mod model;
pub mod partition;
pub mod reinsert;
pub mod sheet;
pub mod table;
pub mod transplant;

pub use address::{Address, AddressError};
pub use error::{Error, Result};
pub use extract::{Extraction, Extractor};
pub use language::contains_vietnamese;
pub use model::{
    ExtractedRow, Inline, Paragraph, Presentation, PresentationFormat, Shape, Slide, TextFrame,
    TranslationRow,
};
pub use reinsert::{ReinsertReport, Reinserter, SkipReason, SkippedRow};
pub use table::{CellValue, Column, Table};
pub use transplant::ColumnTransplant;
