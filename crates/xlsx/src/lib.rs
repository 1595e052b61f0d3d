//! XLSX reading and writing for slidetext tables.
//!
//! Reading goes through calamine and takes the first worksheet with its
//! first row as headers. Writing produces a minimal single-sheet workbook
//! with inline strings.

pub mod reader;
pub mod writer;

pub use reader::{read_table, read_table_from_reader};
pub use writer::{save_table, table_to_bytes, write_table};
