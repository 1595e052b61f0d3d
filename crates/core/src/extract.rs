//! Flatten a presentation's shape trees into addressed text rows.

use crate::address::Address;
use crate::language::contains_vietnamese;
use crate::model::{ExtractedRow, Presentation, Shape, TranslationRow};
use crate::partition;
use serde::{Deserialize, Serialize};

/// Rows produced by one extraction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Extraction {
    /// One row per text-bearing shape, in traversal order.
    pub all: Vec<ExtractedRow>,
    /// The same rows with non-matching source text blanked.
    pub filtered: Vec<TranslationRow>,
}

/// Walks slides depth-first and emits a row for every text leaf.
pub struct Extractor {
    filter: Box<dyn Fn(&str) -> bool>,
}

impl Default for Extractor {
    fn default() -> Self {
        Self {
            filter: Box::new(contains_vietnamese),
        }
    }
}

impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor").finish_non_exhaustive()
    }
}

impl Extractor {
    /// Create an extractor that keeps Vietnamese text in the filtered rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different language predicate for the filtered rows.
    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&str) -> bool + 'static,
    {
        self.filter = Box::new(filter);
        self
    }

    /// Extract every text-bearing shape of the presentation.
    pub fn extract(&self, presentation: &Presentation) -> Extraction {
        let all = rows(presentation);
        let filtered = partition::filter(&all, |text| (self.filter)(text));

        log::debug!(
            "Extracted {} rows from {} slides of {}",
            all.len(),
            presentation.slides.len(),
            presentation.filename
        );

        Extraction { all, filtered }
    }
}

/// All text rows of a presentation in traversal order.
///
/// Slides in order; within a slide, shapes in document order with a group's
/// children visited before the group's next sibling.
pub fn rows(presentation: &Presentation) -> Vec<ExtractedRow> {
    let mut rows = Vec::new();
    for slide in &presentation.slides {
        for (idx, shape) in slide.shapes.iter().enumerate() {
            walk(shape, slide.number, Address::top_level(idx), &mut rows);
        }
    }
    rows
}

fn walk(shape: &Shape, slide: usize, address: Address, rows: &mut Vec<ExtractedRow>) {
    match shape {
        Shape::Group(children) => {
            for (idx, child) in children.iter().enumerate() {
                walk(child, slide, address.child(idx), rows);
            }
        }
        Shape::Text(frame) => rows.push(ExtractedRow {
            slide,
            address,
            original_text: frame.text(),
        }),
        Shape::Plain => {}
    }
}
