//! Apply translated rows back onto a presentation's shape tree.

use crate::address::{Address, AddressError};
use crate::model::{Inline, Paragraph, Presentation, TextFrame, TranslationRow};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a translation row was not applied.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// The slide cell is not a positive integer.
    #[error("invalid slide number '{0}'")]
    InvalidSlide(String),

    /// The address is malformed or does not resolve to a shape.
    #[error("{0}")]
    Address(String),

    /// The addressed shape has no text frame.
    #[error("shape has no text frame")]
    NoTextFrame,
}

impl From<AddressError> for SkipReason {
    fn from(err: AddressError) -> Self {
        SkipReason::Address(err.to_string())
    }
}

/// A translation row that was left out, with its position in the input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRow {
    /// 0-based index of the row in the translation table.
    pub row: usize,
    /// Slide cell as written.
    pub slide: String,
    /// Address cell as written.
    pub address: String,
    pub reason: SkipReason,
}

/// A shape whose text was replaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedRow {
    /// 0-based index of the row in the translation table.
    pub row: usize,
    pub slide: usize,
    pub address: Address,
}

/// Outcome of one re-insertion pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReinsertReport {
    /// Rows written into the document, in input order.
    pub applied: Vec<AppliedRow>,
    /// Rows that could not be applied.
    pub skipped: Vec<SkippedRow>,
    /// Rows without a translation; these never touch the document.
    pub blank: usize,
}

impl ReinsertReport {
    /// Record a row that was rejected before reaching the document.
    pub fn skip(&mut self, skipped: SkippedRow) {
        log::warn!(
            "Skip: slide {} index '{}': {}",
            skipped.slide,
            skipped.address,
            skipped.reason
        );
        self.skipped.push(skipped);
    }

    /// Fold another report's skips and blanks into this one, keeping row order.
    pub fn merge(&mut self, other: ReinsertReport) {
        self.applied.extend(other.applied);
        self.skipped.extend(other.skipped);
        self.blank += other.blank;
        self.applied.sort_by_key(|a| a.row);
        self.skipped.sort_by_key(|s| s.row);
    }
}

/// Writes translated lines into text frames, paragraph by paragraph.
#[derive(Debug, Clone, Default)]
pub struct Reinserter;

impl Reinserter {
    /// Create a new reinserter.
    pub fn new() -> Self {
        Self
    }

    /// Apply every row with a translation; bad rows are skipped, not fatal.
    ///
    /// `rows` are paired with their index in the source table so skip
    /// diagnostics point at the right spreadsheet row.
    pub fn apply<'a, I>(&self, presentation: &mut Presentation, rows: I) -> ReinsertReport
    where
        I: IntoIterator<Item = (usize, &'a TranslationRow)>,
    {
        rows.into_iter()
            .fold(ReinsertReport::default(), |mut report, (index, row)| {
                if !row.has_translation() {
                    report.blank += 1;
                    return report;
                }

                match self.apply_row(presentation, row) {
                    Ok(()) => report.applied.push(AppliedRow {
                        row: index,
                        slide: row.slide,
                        address: row.address.clone(),
                    }),
                    Err(reason) => report.skip(SkippedRow {
                        row: index,
                        slide: row.slide.to_string(),
                        address: row.address.to_string(),
                        reason,
                    }),
                }
                report
            })
    }

    /// Apply a plain slice of rows, indexing them by position.
    pub fn apply_rows(
        &self,
        presentation: &mut Presentation,
        rows: &[TranslationRow],
    ) -> ReinsertReport {
        self.apply(presentation, rows.iter().enumerate())
    }

    fn apply_row(
        &self,
        presentation: &mut Presentation,
        row: &TranslationRow,
    ) -> Result<(), SkipReason> {
        let count = presentation.slides.len();
        let slide = presentation
            .slide_mut(row.slide)
            .ok_or(AddressError::SlideOutOfRange {
                slide: row.slide,
                count,
            })?;

        let frame = row
            .address
            .resolve_mut(&mut slide.shapes)?
            .text_frame_mut()
            .ok_or(SkipReason::NoTextFrame)?;

        distribute_lines(frame, &row.translated_text);
        Ok(())
    }
}

/// Spread `text` over the frame's paragraphs, one line per paragraph.
///
/// Existing paragraphs keep their first run (and its formatting) and have
/// any further runs blanked; soft breaks are removed, fields are left alone.
/// Missing paragraphs are appended. Paragraphs past the last line are
/// emptied but not removed, so the frame ends up with
/// `max(original paragraphs, lines)` paragraphs.
pub fn distribute_lines(frame: &mut TextFrame, text: &str) {
    let lines: Vec<&str> = text.split('\n').collect();

    for (idx, line) in lines.iter().enumerate() {
        match frame.paragraphs.get_mut(idx) {
            Some(paragraph) => overwrite_paragraph(paragraph, line),
            None => frame.add_paragraph(*line),
        }
    }

    for paragraph in frame.paragraphs.iter_mut().skip(lines.len()) {
        paragraph.clear();
    }
}

fn overwrite_paragraph(paragraph: &mut Paragraph, line: &str) {
    paragraph.content.retain(|inline| *inline != Inline::Break);

    let mut runs = paragraph.runs_mut();
    match runs.next() {
        Some(first) => {
            *first = line.to_string();
            for rest in runs {
                rest.clear();
            }
        }
        None => {
            drop(runs);
            paragraph.add_run(line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PresentationFormat, Shape, Slide};

    fn deck(shapes: Vec<Shape>) -> Presentation {
        let mut presentation = Presentation::new("deck.pptx", PresentationFormat::Pptx);
        let mut slide = Slide::new(1);
        slide.shapes = shapes;
        presentation.add_slide(slide);
        presentation
    }

    fn row(address: &str, translated: &str) -> TranslationRow {
        TranslationRow {
            slide: 1,
            address: address.parse().unwrap(),
            source_text: String::new(),
            translated_text: translated.to_string(),
        }
    }

    fn styled_paragraph(runs: &[&str]) -> Paragraph {
        Paragraph {
            content: runs.iter().map(|r| Inline::Run(r.to_string())).collect(),
        }
    }

    fn frame_at<'a>(presentation: &'a Presentation, address: &str) -> &'a TextFrame {
        crate::address::decode(&presentation.slides[0].shapes, address)
            .unwrap()
            .text_frame()
            .unwrap()
    }

    #[test]
    fn test_first_run_keeps_position_others_blanked() {
        let mut paragraph = styled_paragraph(&["Xin ", "chào", "!"]);
        overwrite_paragraph(&mut paragraph, "Hello");
        assert_eq!(
            paragraph.content,
            vec![
                Inline::Run("Hello".to_string()),
                Inline::Run(String::new()),
                Inline::Run(String::new()),
            ]
        );
    }

    #[test]
    fn test_breaks_are_dropped_fields_kept() {
        let mut paragraph = Paragraph {
            content: vec![
                Inline::Field("4".to_string()),
                Inline::Break,
                Inline::Run("bốn".to_string()),
            ],
        };
        overwrite_paragraph(&mut paragraph, "four");
        assert_eq!(
            paragraph.content,
            vec![Inline::Field("4".to_string()), Inline::Run("four".to_string())]
        );
    }

    #[test]
    fn test_paragraph_without_runs_gets_one() {
        let mut paragraph = Paragraph::new();
        overwrite_paragraph(&mut paragraph, "Hello");
        assert_eq!(paragraph.content, vec![Inline::Run("Hello".to_string())]);
    }

    #[test]
    fn test_more_lines_than_paragraphs() {
        let mut frame = TextFrame::from_lines(["một"]);
        distribute_lines(&mut frame, "one\ntwo\nthree");
        assert_eq!(frame.paragraphs.len(), 3);
        assert_eq!(frame.text(), "one\ntwo\nthree");
    }

    #[test]
    fn test_fewer_lines_than_paragraphs() {
        let mut frame = TextFrame::from_lines(["a", "b", "c", "d"]);
        distribute_lines(&mut frame, "x\ny");
        assert_eq!(frame.paragraphs.len(), 4);
        assert_eq!(frame.text(), "x\ny\n\n");
        assert!(frame.paragraphs[2].content.is_empty());
        assert!(frame.paragraphs[3].content.is_empty());
    }

    #[test]
    fn test_paragraph_count_is_max_of_both() {
        for original in 0..4 {
            for lines in 1..5 {
                let mut frame = TextFrame::from_lines((0..original).map(|i| format!("p{i}")));
                let text = (0..lines).map(|i| format!("l{i}")).collect::<Vec<_>>().join("\n");
                distribute_lines(&mut frame, &text);
                assert_eq!(frame.paragraphs.len(), original.max(lines));
            }
        }
    }

    #[test]
    fn test_blank_translation_is_noop() {
        let original = deck(vec![Shape::Text(TextFrame::from_lines(["Xin chào"]))]);
        let mut presentation = original.clone();

        let rows = vec![row("0", ""), row("0", "   \n\t ")];
        let report = Reinserter::new().apply_rows(&mut presentation, &rows);

        assert_eq!(presentation, original);
        assert_eq!(report.blank, 2);
        assert!(report.applied.is_empty());
        assert!(report.skipped.is_empty());
    }

    #[test]
    fn test_stale_address_is_skipped() {
        let mut presentation = deck(vec![
            Shape::Text(TextFrame::from_lines(["một"])),
            Shape::Group(vec![Shape::Text(TextFrame::from_lines(["hai"]))]),
        ]);

        let rows = vec![
            row("0", "one"),
            row("7", "lost"),
            row("1.0", "two"),
            row("0.3", "not a group"),
        ];
        let report = Reinserter::new().apply_rows(&mut presentation, &rows);

        assert_eq!(report.applied.len(), 2);
        assert_eq!(report.skipped.len(), 2);
        assert_eq!(report.skipped[0].row, 1);
        assert_eq!(report.skipped[1].row, 3);
        assert_eq!(frame_at(&presentation, "0").text(), "one");
        assert_eq!(frame_at(&presentation, "1.0").text(), "two");
    }

    #[test]
    fn test_missing_slide_is_skipped() {
        let mut presentation = deck(vec![Shape::Text(TextFrame::from_lines(["một"]))]);
        let mut bad = row("0", "one");
        bad.slide = 5;

        let report = Reinserter::new().apply_rows(&mut presentation, &[bad]);

        assert_eq!(report.skipped.len(), 1);
        assert_eq!(
            report.skipped[0].reason,
            SkipReason::from(AddressError::SlideOutOfRange { slide: 5, count: 1 })
        );
    }

    #[test]
    fn test_shape_without_text_frame_is_skipped() {
        let mut presentation = deck(vec![Shape::Plain, Shape::Group(vec![])]);
        let rows = vec![row("0", "x"), row("1", "y")];

        let report = Reinserter::new().apply_rows(&mut presentation, &rows);

        assert!(report.applied.is_empty());
        assert!(report
            .skipped
            .iter()
            .all(|s| s.reason == SkipReason::NoTextFrame));
    }

    #[test]
    fn test_merge_keeps_row_order() {
        let mut report = ReinsertReport::default();
        report.skipped.push(SkippedRow {
            row: 4,
            slide: "1".to_string(),
            address: "0".to_string(),
            reason: SkipReason::NoTextFrame,
        });
        let mut early = ReinsertReport::default();
        early.skipped.push(SkippedRow {
            row: 1,
            slide: "x".to_string(),
            address: "0".to_string(),
            reason: SkipReason::InvalidSlide("x".to_string()),
        });
        early.blank = 2;

        report.merge(early);

        assert_eq!(report.skipped[0].row, 1);
        assert_eq!(report.skipped[1].row, 4);
        assert_eq!(report.blank, 2);
    }
}
