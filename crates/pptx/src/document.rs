//! A PPTX file opened for extraction and translation write-back.

use crate::package::Package;
use crate::shapes;
use crate::xml::XmlDocument;
use slidetext_core::{
    Error, Extraction, Extractor, Presentation, PresentationFormat, ReinsertReport, Reinserter,
    Result, TranslationRow,
};
use std::collections::HashMap;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;

/// An opened presentation: its package, parsed slides, and shape model.
#[derive(Debug, Clone)]
pub struct PptxDocument {
    package: Package,
    slides: Vec<SlidePart>,
    presentation: Presentation,
}

#[derive(Debug, Clone)]
struct SlidePart {
    path: String,
    xml: XmlDocument,
    modified: bool,
}

impl PptxDocument {
    /// Open a presentation file, rejecting formats other than PPTX.
    pub fn open(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;

        let format = PresentationFormat::from_magic(&bytes)
            .or_else(|| {
                path.extension()
                    .and_then(|e| e.to_str())
                    .and_then(PresentationFormat::from_extension)
            })
            .ok_or_else(|| {
                Error::UnsupportedFormat(format!("could not detect format of {}", path.display()))
            })?;

        if format != PresentationFormat::Pptx {
            return Err(Error::UnsupportedFormat(
                "legacy .ppt files cannot be rewritten; save the deck as .pptx first".to_string(),
            ));
        }

        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown");

        Self::from_reader(Cursor::new(bytes), filename)
    }

    /// Parse a PPTX package from a reader.
    pub fn from_reader<R: Read + Seek>(reader: R, filename: &str) -> Result<Self> {
        let package = Package::from_reader(reader)?;
        let mut presentation = Presentation::new(filename, PresentationFormat::Pptx);
        let mut slides = Vec::new();

        for (idx, path) in package.slide_paths()?.into_iter().enumerate() {
            let part = package.part(&path).ok_or_else(|| {
                Error::PptxParseError(format!("File not found in archive '{}'", path))
            })?;
            let xml = XmlDocument::parse_bytes(&part.data)
                .map_err(|e| Error::PptxParseError(format!("{}: {}", path, e)))?;
            let root = xml
                .root()
                .ok_or_else(|| Error::PptxParseError(format!("{} has no root element", path)))?;

            presentation.add_slide(shapes::read_slide(root, idx + 1));
            log::debug!("Parsed slide {} from {}", idx + 1, path);

            slides.push(SlidePart {
                path,
                xml,
                modified: false,
            });
        }

        Ok(Self {
            package,
            slides,
            presentation,
        })
    }

    /// The shape model of the presentation.
    pub fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    /// Extract rows for every text-bearing shape.
    pub fn extract(&self, extractor: &Extractor) -> Extraction {
        extractor.extract(&self.presentation)
    }

    /// Apply translation rows and write the changed text frames into the slide XML.
    ///
    /// Row-level problems end up in the report. An error is returned only
    /// when an applied shape cannot be found in its slide XML, which means
    /// the package is inconsistent with its own model.
    pub fn apply<'a, I>(&mut self, reinserter: &Reinserter, rows: I) -> Result<ReinsertReport>
    where
        I: IntoIterator<Item = (usize, &'a TranslationRow)>,
    {
        let report = reinserter.apply(&mut self.presentation, rows);

        for applied in &report.applied {
            let slide_idx = applied.slide - 1;
            let model = self
                .presentation
                .slides
                .get(slide_idx)
                .ok_or(slidetext_core::AddressError::SlideOutOfRange {
                    slide: applied.slide,
                    count: self.presentation.slides.len(),
                })?;
            let frame = applied
                .address
                .resolve(&model.shapes)?
                .text_frame()
                .ok_or_else(|| Error::PptxParseError("applied shape has no text".to_string()))?;

            let part = &mut self.slides[slide_idx];
            let tree = part
                .xml
                .root_mut()
                .and_then(shapes::shape_tree_mut)
                .ok_or_else(|| Error::PptxParseError(format!("{} has no shape tree", part.path)))?;
            let sp = shapes::resolve_mut(tree, &applied.address)?;

            shapes::write_text_frame(sp, frame)?;
            part.modified = true;
        }

        log::debug!(
            "Applied {} rows, skipped {}, {} without translation",
            report.applied.len(),
            report.skipped.len(),
            report.blank
        );

        Ok(report)
    }

    /// Serialize the whole package, re-encoding only modified slides.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> Result<W> {
        let mut overrides = HashMap::new();
        for part in self.slides.iter().filter(|p| p.modified) {
            overrides.insert(part.path.clone(), part.xml.to_bytes()?);
        }
        self.package.write_to(writer, &overrides)
    }

    /// Serialize the whole package into memory.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(self.write_to(Cursor::new(Vec::new()))?.into_inner())
    }

    /// Write the package to `path`. Nothing is written if serialization fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }
}
