//! Domain types: the shape tree of a presentation and the rows derived from it.

use crate::address::Address;
use serde::{Deserialize, Serialize};

/// A presentation reduced to what text extraction needs: slides of shapes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Presentation {
    /// Original filename (without path).
    pub filename: String,

    /// Detected format of the source file.
    pub format: PresentationFormat,

    /// Slides in presentation order.
    pub slides: Vec<Slide>,
}

impl Presentation {
    /// Create a new presentation with the given filename and format.
    pub fn new(filename: impl Into<String>, format: PresentationFormat) -> Self {
        Self {
            filename: filename.into(),
            format,
            slides: Vec::new(),
        }
    }

    /// Add a slide to the presentation.
    pub fn add_slide(&mut self, slide: Slide) {
        self.slides.push(slide);
    }

    /// Look up a slide by its 1-based number.
    pub fn slide(&self, number: usize) -> Option<&Slide> {
        number.checked_sub(1).and_then(|idx| self.slides.get(idx))
    }

    /// Mutable lookup of a slide by its 1-based number.
    pub fn slide_mut(&mut self, number: usize) -> Option<&mut Slide> {
        number.checked_sub(1).and_then(|idx| self.slides.get_mut(idx))
    }
}

/// The format of the source presentation file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresentationFormat {
    /// Modern PPTX (Office Open XML).
    Pptx,
    /// Legacy PPT (OLE/CFB binary). Detected only so it can be rejected.
    Ppt,
}

impl PresentationFormat {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "pptx" => Some(Self::Pptx),
            "ppt" => Some(Self::Ppt),
            _ => None,
        }
    }

    /// Detect format from file magic bytes.
    pub fn from_magic(bytes: &[u8]) -> Option<Self> {
        if bytes.len() < 4 {
            return None;
        }

        // PPTX is a ZIP file (PK\x03\x04)
        if bytes.starts_with(&[0x50, 0x4B, 0x03, 0x04]) {
            return Some(Self::Pptx);
        }

        // PPT is an OLE/CFB file (D0 CF 11 E0 A1 B1 1A E1)
        if bytes.len() >= 8
            && bytes.starts_with(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1])
        {
            return Some(Self::Ppt);
        }

        None
    }
}

/// A single slide and its top-level shapes in document order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    /// 1-based slide number.
    pub number: usize,

    /// Top-level shapes in document order.
    pub shapes: Vec<Shape>,
}

impl Slide {
    /// Create an empty slide with the given number.
    pub fn new(number: usize) -> Self {
        Self {
            number,
            shapes: Vec::new(),
        }
    }

    /// Append a top-level shape.
    pub fn add_shape(&mut self, shape: Shape) {
        self.shapes.push(shape);
    }
}

/// A node of the shape tree.
///
/// The kind is decided once by the document adapter when the tree is built.
/// Shapes the adapter cannot classify become [`Shape::Plain`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    /// A leaf that carries a text frame (possibly without any paragraphs).
    Text(TextFrame),
    /// A leaf without text: pictures, connectors, tables, unknown kinds.
    Plain,
    /// A group owning an ordered sequence of child shapes.
    Group(Vec<Shape>),
}

impl Shape {
    /// The text frame of a text leaf.
    pub fn text_frame(&self) -> Option<&TextFrame> {
        match self {
            Shape::Text(frame) => Some(frame),
            _ => None,
        }
    }

    /// Mutable access to the text frame of a text leaf.
    pub fn text_frame_mut(&mut self) -> Option<&mut TextFrame> {
        match self {
            Shape::Text(frame) => Some(frame),
            _ => None,
        }
    }

    /// Children of a group shape.
    pub fn children(&self) -> Option<&[Shape]> {
        match self {
            Shape::Group(children) => Some(children),
            _ => None,
        }
    }
}

/// Ordered paragraphs attached to a text-capable shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TextFrame {
    pub paragraphs: Vec<Paragraph>,
}

impl TextFrame {
    /// Create an empty text frame.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a frame with one single-run paragraph per line.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            paragraphs: lines.into_iter().map(Paragraph::with_text).collect(),
        }
    }

    /// Full text of the frame, paragraphs separated by `\n`.
    pub fn text(&self) -> String {
        self.paragraphs
            .iter()
            .map(Paragraph::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Append a paragraph carrying a single run with `text`.
    pub fn add_paragraph(&mut self, text: impl Into<String>) {
        self.paragraphs.push(Paragraph::with_text(text));
    }
}

/// A paragraph: runs interleaved with line breaks and fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    pub content: Vec<Inline>,
}

/// Inline content of a paragraph, in document order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Inline {
    /// A styled text run.
    Run(String),
    /// A soft line break inside the paragraph.
    Break,
    /// A field (slide number, date, ...) with its current text.
    Field(String),
}

impl Paragraph {
    /// Create an empty paragraph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a paragraph holding one run.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            content: vec![Inline::Run(text.into())],
        }
    }

    /// Visible text of the paragraph. Breaks render as `\n`.
    pub fn text(&self) -> String {
        let mut text = String::new();
        for inline in &self.content {
            match inline {
                Inline::Run(t) | Inline::Field(t) => text.push_str(t),
                Inline::Break => text.push('\n'),
            }
        }
        text
    }

    /// Number of runs (breaks and fields excluded).
    pub fn run_count(&self) -> usize {
        self.runs().count()
    }

    /// Texts of the runs in order.
    pub fn runs(&self) -> impl Iterator<Item = &str> {
        self.content.iter().filter_map(|inline| match inline {
            Inline::Run(t) => Some(t.as_str()),
            _ => None,
        })
    }

    /// Mutable texts of the runs in order.
    pub fn runs_mut(&mut self) -> impl Iterator<Item = &mut String> {
        self.content.iter_mut().filter_map(|inline| match inline {
            Inline::Run(t) => Some(t),
            _ => None,
        })
    }

    /// Append a run at the end of the paragraph.
    pub fn add_run(&mut self, text: impl Into<String>) {
        self.content.push(Inline::Run(text.into()));
    }

    /// Remove all runs, breaks and fields; the paragraph itself stays.
    pub fn clear(&mut self) {
        self.content.clear();
    }
}

/// One row of the all-text table: a text-bearing shape and its text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedRow {
    /// 1-based slide number.
    pub slide: usize,
    /// Position of the shape within the slide's shape tree.
    pub address: Address,
    /// Full text of the shape's text frame.
    pub original_text: String,
}

/// One row of the translation table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationRow {
    /// 1-based slide number.
    pub slide: usize,
    /// Position of the shape within the slide's shape tree.
    pub address: Address,
    /// Text to translate; empty when the language filter did not match.
    pub source_text: String,
    /// Translation filled in externally; empty when missing.
    pub translated_text: String,
}

impl TranslationRow {
    /// Whether the row carries a translation worth applying.
    pub fn has_translation(&self) -> bool {
        !self.translated_text.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_magic() {
        assert_eq!(
            PresentationFormat::from_magic(&[0x50, 0x4B, 0x03, 0x04, 0, 0, 0, 0]),
            Some(PresentationFormat::Pptx)
        );
        assert_eq!(
            PresentationFormat::from_magic(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1]),
            Some(PresentationFormat::Ppt)
        );
        assert_eq!(PresentationFormat::from_magic(b"PK"), None);
        assert_eq!(PresentationFormat::from_magic(b"hello world"), None);
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            PresentationFormat::from_extension("PPTX"),
            Some(PresentationFormat::Pptx)
        );
        assert_eq!(PresentationFormat::from_extension("key"), None);
    }

    #[test]
    fn test_frame_text_joins_paragraphs() {
        let frame = TextFrame::from_lines(["Xin chào", "", "Hello"]);
        assert_eq!(frame.text(), "Xin chào\n\nHello");
    }

    #[test]
    fn test_paragraph_text_includes_breaks_and_fields() {
        let paragraph = Paragraph {
            content: vec![
                Inline::Run("Page ".to_string()),
                Inline::Field("3".to_string()),
                Inline::Break,
                Inline::Run("next".to_string()),
            ],
        };
        assert_eq!(paragraph.text(), "Page 3\nnext");
        assert_eq!(paragraph.run_count(), 2);
    }

    #[test]
    fn test_slide_lookup_is_one_based() {
        let mut presentation = Presentation::new("deck.pptx", PresentationFormat::Pptx);
        presentation.add_slide(Slide::new(1));
        assert!(presentation.slide(0).is_none());
        assert_eq!(presentation.slide(1).map(|s| s.number), Some(1));
        assert!(presentation.slide(2).is_none());
    }
}
