//! PPTX (Office Open XML) backend for presentation text extraction and
//! translation write-back.
//!
//! A .pptx file is a ZIP archive of XML parts. Slides are read into a small
//! XML tree, classified into the shape model, and written back with only
//! the text of translated shapes changed.

pub mod document;
pub mod package;
pub mod shapes;
pub mod xml;

pub use document::PptxDocument;
pub use package::Package;
