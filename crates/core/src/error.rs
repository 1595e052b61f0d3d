//! Error types for presentation text extraction and re-insertion.

use crate::address::AddressError;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort a whole operation.
///
/// Per-row problems during re-insertion are not reported through this type;
/// they are collected as [`crate::reinsert::SkippedRow`]s instead.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open, read or write a file.
    #[error("Failed to access file: {0}")]
    IoError(#[from] std::io::Error),

    /// The file format is not supported or could not be detected.
    #[error("Unsupported or unrecognized file format: {0}")]
    UnsupportedFormat(String),

    /// Failed to make sense of the PPTX package structure.
    #[error("PPTX parsing error: {0}")]
    PptxParseError(String),

    /// ZIP archive error.
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing or writing error.
    #[error("XML error: {0}")]
    XmlError(String),

    /// Failed to read or write a spreadsheet.
    #[error("Spreadsheet error: {0}")]
    SpreadsheetError(String),

    /// A table does not have the columns an operation requires.
    #[error("Schema error: {0}")]
    Schema(String),

    /// An address could not be built or resolved.
    #[error("Invalid address: {0}")]
    Address(#[from] AddressError),
}
