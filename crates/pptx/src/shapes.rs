//! Mapping between slide XML and the shape tree.
//!
//! Only the children of `p:spTree` and `p:grpSp` that are shapes take part
//! in addressing; group properties, extension lists and alternate content
//! wrappers are skipped so that indices match what a reader of the slide
//! would count as shapes.

use crate::xml::{XmlElement, XmlNode};
use slidetext_core::address::{Address, AddressError};
use slidetext_core::{Error, Inline, Paragraph, Result, Shape, Slide, TextFrame};

const DRAWING_PREFIX: &str = "a";
const DRAWING_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";

/// How an element of a shape container takes part in the shape tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShapeKind {
    Text,
    Plain,
    Group,
}

fn shape_kind(element: &XmlElement) -> Option<ShapeKind> {
    match element.local_name() {
        "sp" => Some(ShapeKind::Text),
        "grpSp" => Some(ShapeKind::Group),
        "pic" | "cxnSp" | "graphicFrame" | "contentPart" => Some(ShapeKind::Plain),
        _ => None,
    }
}

fn shape_elements(container: &XmlElement) -> impl Iterator<Item = &XmlElement> {
    container.elements().filter(|e| shape_kind(e).is_some())
}

fn shape_elements_mut(container: &mut XmlElement) -> impl Iterator<Item = &mut XmlElement> {
    container.elements_mut().filter(|e| shape_kind(e).is_some())
}

/// The `p:spTree` of a slide's root element.
pub fn shape_tree(root: &XmlElement) -> Option<&XmlElement> {
    root.child("cSld").and_then(|c| c.child("spTree"))
}

/// Mutable access to the `p:spTree` of a slide's root element.
pub fn shape_tree_mut(root: &mut XmlElement) -> Option<&mut XmlElement> {
    root.child_mut("cSld").and_then(|c| c.child_mut("spTree"))
}

/// Build the model of one slide from its root element.
pub fn read_slide(root: &XmlElement, number: usize) -> Slide {
    let mut slide = Slide::new(number);
    match shape_tree(root) {
        Some(tree) => slide.shapes = shape_elements(tree).map(read_shape).collect(),
        None => log::warn!("Slide {} has no shape tree", number),
    }
    slide
}

fn read_shape(element: &XmlElement) -> Shape {
    match shape_kind(element) {
        Some(ShapeKind::Group) => Shape::Group(shape_elements(element).map(read_shape).collect()),
        Some(ShapeKind::Text) => Shape::Text(
            element
                .child("txBody")
                .map(read_text_frame)
                .unwrap_or_default(),
        ),
        _ => Shape::Plain,
    }
}

fn read_text_frame(tx_body: &XmlElement) -> TextFrame {
    TextFrame {
        paragraphs: tx_body
            .elements()
            .filter(|e| e.local_name() == "p")
            .map(read_paragraph)
            .collect(),
    }
}

fn read_paragraph(p: &XmlElement) -> Paragraph {
    Paragraph {
        content: p.elements().filter_map(read_inline).collect(),
    }
}

fn read_inline(element: &XmlElement) -> Option<Inline> {
    match element.local_name() {
        "r" => Some(Inline::Run(run_text(element))),
        "br" => Some(Inline::Break),
        "fld" => Some(Inline::Field(run_text(element))),
        _ => None,
    }
}

fn is_inline(element: &XmlElement) -> bool {
    matches!(element.local_name(), "r" | "br" | "fld")
}

fn run_text(run: &XmlElement) -> String {
    run.child("t").map(XmlElement::text).unwrap_or_default()
}

/// Find the shape element at `address` under a slide's `p:spTree`.
pub fn resolve_mut<'a>(
    sp_tree: &'a mut XmlElement,
    address: &Address,
) -> std::result::Result<&'a mut XmlElement, AddressError> {
    let mut current = sp_tree;
    for (depth, &index) in address.segments().iter().enumerate() {
        if depth > 0 && shape_kind(current) != Some(ShapeKind::Group) {
            return Err(AddressError::NotAGroup { depth: depth - 1 });
        }
        let len = shape_elements(current).count();
        current = shape_elements_mut(current)
            .nth(index)
            .ok_or(AddressError::OutOfBounds { depth, index, len })?;
    }
    Ok(current)
}

/// Write the paragraphs of `frame` into the `p:txBody` of shape element `sp`.
///
/// Existing runs, breaks and fields are matched to the model by position,
/// so their properties (`a:rPr`, `a:pPr`) survive; surplus ones are
/// removed and new runs or paragraphs are added without properties.
pub fn write_text_frame(sp: &mut XmlElement, frame: &TextFrame) -> Result<()> {
    if frame.paragraphs.is_empty() && sp.child("txBody").is_none() {
        return Ok(());
    }

    let tx_body = tx_body_mut(sp)?;
    let body_prefix = tx_body
        .elements()
        .next()
        .and_then(XmlElement::prefix)
        .map(str::to_string);
    let prefix = match body_prefix {
        Some(prefix) => prefix,
        None => {
            declare_drawing_namespace(tx_body);
            DRAWING_PREFIX.to_string()
        }
    };

    let mut existing = tx_body
        .elements_mut()
        .filter(|e| e.local_name() == "p")
        .collect::<Vec<_>>()
        .into_iter();

    let mut added = Vec::new();
    for paragraph in &frame.paragraphs {
        match existing.next() {
            Some(p) => write_paragraph(p, paragraph, &prefix),
            None => added.push(new_paragraph(paragraph, &prefix)),
        }
    }
    drop(existing);

    for p in added {
        tx_body.children.push(XmlNode::Element(p));
    }
    Ok(())
}

fn write_paragraph(p: &mut XmlElement, paragraph: &Paragraph, prefix: &str) {
    if !paragraph.content.contains(&Inline::Break) {
        p.children
            .retain(|node| node.as_element().map_or(true, |e| e.local_name() != "br"));
    }

    let mut kept = 0;
    for (element, inline) in p.elements_mut().filter(|e| is_inline(e)).zip(&paragraph.content) {
        match inline {
            Inline::Run(text) | Inline::Field(text) => set_run_text(element, text, prefix),
            Inline::Break => {}
        }
        kept += 1;
    }

    // Drop inline elements the model no longer has.
    let mut seen = 0;
    p.children.retain(|node| match node.as_element() {
        Some(element) if is_inline(element) => {
            seen += 1;
            seen <= kept
        }
        _ => true,
    });

    for inline in paragraph.content.iter().skip(kept) {
        let element = new_inline(inline, prefix);
        let at = p.child_position("endParaRPr").unwrap_or(p.children.len());
        p.children.insert(at, XmlNode::Element(element));
    }
}

fn new_paragraph(paragraph: &Paragraph, prefix: &str) -> XmlElement {
    let mut p = XmlElement::new(format!("{}:p", prefix));
    for inline in &paragraph.content {
        p.children.push(XmlNode::Element(new_inline(inline, prefix)));
    }
    p
}

fn new_inline(inline: &Inline, prefix: &str) -> XmlElement {
    match inline {
        Inline::Run(text) | Inline::Field(text) => {
            let mut run = XmlElement::new(format!("{}:r", prefix));
            set_run_text(&mut run, text, prefix);
            run
        }
        Inline::Break => XmlElement::new(format!("{}:br", prefix)),
    }
}

fn set_run_text(run: &mut XmlElement, text: &str, prefix: &str) {
    match run.child_mut("t") {
        Some(t) => t.set_text(text),
        None => {
            let mut t = XmlElement::new(format!("{}:t", prefix));
            t.set_text(text);
            run.children.push(XmlNode::Element(t));
        }
    }
}

/// Bind the drawing prefix on `tx_body` unless it already is.
fn declare_drawing_namespace(tx_body: &mut XmlElement) {
    let key = format!("xmlns:{}", DRAWING_PREFIX);
    if tx_body.attribute(&key).is_none() {
        tx_body.attributes.push((key, DRAWING_NS.to_string()));
    }
}

/// The shape's `p:txBody`, created before any `p:extLst` when missing.
/// It takes the shape's own prefix, or none when the shape has none.
fn tx_body_mut(sp: &mut XmlElement) -> Result<&mut XmlElement> {
    if sp.child("txBody").is_none() {
        let name = match sp.prefix() {
            Some(prefix) => format!("{}:txBody", prefix),
            None => "txBody".to_string(),
        };
        let mut tx_body = XmlElement::new(name);
        declare_drawing_namespace(&mut tx_body);
        tx_body
            .children
            .push(XmlNode::Element(XmlElement::new(format!("{}:bodyPr", DRAWING_PREFIX))));
        tx_body
            .children
            .push(XmlNode::Element(XmlElement::new(format!("{}:lstStyle", DRAWING_PREFIX))));

        let at = sp.child_position("extLst").unwrap_or(sp.children.len());
        sp.children.insert(at, XmlNode::Element(tx_body));
    }

    sp.child_mut("txBody")
        .ok_or_else(|| Error::PptxParseError("shape lost its text body".to_string()))
}
