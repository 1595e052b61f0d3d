//! A small mutable XML tree on top of quick-xml.
//!
//! Slide parts are read into this tree, edited in place and written back.
//! Markup the tree does not model (declarations, comments, CDATA, processing
//! instructions) is kept as raw events and re-emitted unchanged.

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use slidetext_core::{Error, Result};

/// A parsed XML document: top-level nodes around the root element.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlDocument {
    pub nodes: Vec<XmlNode>,
}

/// One node of the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum XmlNode {
    Element(XmlElement),
    /// Unescaped character data.
    Text(String),
    /// Any other event, passed through verbatim.
    Other(Event<'static>),
}

/// An element with its qualified name, attributes and children.
#[derive(Debug, Clone, PartialEq)]
pub struct XmlElement {
    pub name: String,
    /// Attributes with unescaped values, in document order.
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    pub fn as_element(&self) -> Option<&XmlElement> {
        match self {
            XmlNode::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn as_element_mut(&mut self) -> Option<&mut XmlElement> {
        match self {
            XmlNode::Element(element) => Some(element),
            _ => None,
        }
    }
}

impl XmlDocument {
    /// Parse a document from a string.
    pub fn parse(xml: &str) -> Result<Self> {
        let mut reader = Reader::from_str(xml);
        let mut stack: Vec<XmlElement> = Vec::new();
        let mut nodes = Vec::new();

        loop {
            let event = reader.read_event().map_err(|e| {
                Error::XmlError(format!("at byte {}: {}", reader.buffer_position(), e))
            })?;

            let node = match event {
                Event::Start(ref e) => {
                    stack.push(XmlElement::from_start(e, &reader)?);
                    continue;
                }
                Event::End(_) => {
                    let element = stack
                        .pop()
                        .ok_or_else(|| Error::XmlError("unexpected closing tag".to_string()))?;
                    XmlNode::Element(element)
                }
                Event::Empty(ref e) => XmlNode::Element(XmlElement::from_start(e, &reader)?),
                Event::Text(ref e) => XmlNode::Text(
                    e.unescape()
                        .map_err(|e| Error::XmlError(e.to_string()))?
                        .into_owned(),
                ),
                Event::Eof => break,
                other => XmlNode::Other(other.into_owned()),
            };

            match stack.last_mut() {
                Some(parent) => parent.children.push(node),
                None => nodes.push(node),
            }
        }

        if let Some(open) = stack.last() {
            return Err(Error::XmlError(format!("unclosed element <{}>", open.name)));
        }

        Ok(Self { nodes })
    }

    /// Parse a document from UTF-8 bytes.
    pub fn parse_bytes(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| Error::XmlError(format!("invalid UTF-8: {}", e)))?;
        Self::parse(text.strip_prefix('\u{feff}').unwrap_or(text))
    }

    /// The document element.
    pub fn root(&self) -> Option<&XmlElement> {
        self.nodes.iter().find_map(XmlNode::as_element)
    }

    /// Mutable access to the document element.
    pub fn root_mut(&mut self) -> Option<&mut XmlElement> {
        self.nodes.iter_mut().find_map(XmlNode::as_element_mut)
    }

    /// Serialize the document.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut writer = Writer::new(Vec::new());
        for node in &self.nodes {
            write_node(&mut writer, node)?;
        }
        Ok(writer.into_inner())
    }
}

impl XmlElement {
    /// Create an element without attributes or children.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    fn from_start<R>(start: &BytesStart<'_>, reader: &Reader<R>) -> Result<Self> {
        let mut element = Self::new(String::from_utf8_lossy(start.name().as_ref()));
        for attr in start.attributes() {
            let attr = attr.map_err(|e| Error::XmlError(e.to_string()))?;
            let value = attr
                .decode_and_unescape_value(reader)
                .map_err(|e| Error::XmlError(e.to_string()))?;
            element.attributes.push((
                String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
                value.into_owned(),
            ));
        }
        Ok(element)
    }

    /// Name without its namespace prefix.
    pub fn local_name(&self) -> &str {
        local_name(&self.name)
    }

    /// Namespace prefix of the name, if any.
    pub fn prefix(&self) -> Option<&str> {
        self.name.split_once(':').map(|(prefix, _)| prefix)
    }

    /// Value of the attribute with the given qualified name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Child elements in order.
    pub fn elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(XmlNode::as_element)
    }

    /// Mutable child elements in order.
    pub fn elements_mut(&mut self) -> impl Iterator<Item = &mut XmlElement> {
        self.children.iter_mut().filter_map(XmlNode::as_element_mut)
    }

    /// First child element with the given local name.
    pub fn child(&self, local: &str) -> Option<&XmlElement> {
        self.elements().find(|e| e.local_name() == local)
    }

    /// Mutable first child element with the given local name.
    pub fn child_mut(&mut self, local: &str) -> Option<&mut XmlElement> {
        self.elements_mut().find(|e| e.local_name() == local)
    }

    /// Index into `children` of the first element with the given local name.
    pub fn child_position(&self, local: &str) -> Option<usize> {
        self.children
            .iter()
            .position(|n| n.as_element().is_some_and(|e| e.local_name() == local))
    }

    /// Concatenated text of the direct text children.
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|n| match n {
                XmlNode::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Replace all children with a single text node.
    pub fn set_text(&mut self, text: &str) {
        self.children.clear();
        if !text.is_empty() {
            self.children.push(XmlNode::Text(text.to_string()));
        }
    }
}

/// Extract the local name from a potentially namespaced XML element name.
pub fn local_name(name: &str) -> &str {
    name.split_once(':').map_or(name, |(_, local)| local)
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &XmlNode) -> Result<()> {
    match node {
        XmlNode::Element(element) => {
            let mut start = BytesStart::new(element.name.as_str());
            for (key, value) in &element.attributes {
                start.push_attribute((key.as_str(), value.as_str()));
            }

            if element.children.is_empty() {
                write_event(writer, Event::Empty(start))
            } else {
                write_event(writer, Event::Start(start))?;
                for child in &element.children {
                    write_node(writer, child)?;
                }
                write_event(writer, Event::End(BytesEnd::new(element.name.as_str())))
            }
        }
        XmlNode::Text(text) => write_event(writer, Event::Text(BytesText::new(text))),
        XmlNode::Other(event) => write_event(writer, event.clone()),
    }
}

fn write_event(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| Error::XmlError(format!("failed to write XML: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SLIDE: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main"><!-- note --><p:cSld><p:spTree><p:sp><p:txBody><a:bodyPr/><a:p><a:r><a:rPr lang="vi-VN" b="1"/><a:t>Tom &amp; Jerry</a:t></a:r><a:br/></a:p></p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#;

    #[test]
    fn test_round_trip_is_byte_identical() {
        let doc = XmlDocument::parse(SLIDE).unwrap();
        let bytes = doc.to_bytes().unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), SLIDE);
    }

    #[test]
    fn test_text_is_unescaped() {
        let doc = XmlDocument::parse(SLIDE).unwrap();
        let root = doc.root().unwrap();
        let t = root
            .child("cSld")
            .and_then(|c| c.child("spTree"))
            .and_then(|t| t.child("sp"))
            .and_then(|s| s.child("txBody"))
            .and_then(|b| b.child("p"))
            .and_then(|p| p.child("r"))
            .and_then(|r| r.child("t"))
            .unwrap();
        assert_eq!(t.text(), "Tom & Jerry");
        assert_eq!(t.prefix(), Some("a"));
    }

    #[test]
    fn test_set_text_escapes_on_write() {
        let mut doc = XmlDocument::parse("<a:t>x</a:t>").unwrap();
        doc.root_mut().unwrap().set_text("1 < 2 & 3");
        let bytes = doc.to_bytes().unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), "<a:t>1 &lt; 2 &amp; 3</a:t>");
    }

    #[test]
    fn test_attributes() {
        let doc = XmlDocument::parse(r#"<p:sldId id="256" r:id="rId2"/>"#).unwrap();
        let root = doc.root().unwrap();
        assert_eq!(root.attribute("r:id"), Some("rId2"));
        assert_eq!(root.attribute("id"), Some("256"));
        assert_eq!(root.local_name(), "sldId");
    }

    #[test]
    fn test_escaped_attribute_values() {
        let xml = r#"<p:cNvPr id="2" name="Tom &amp; &quot;Jerry&quot; &lt;1&gt;"/>"#;
        let doc = XmlDocument::parse(xml).unwrap();
        let root = doc.root().unwrap();
        assert_eq!(root.attribute("name"), Some(r#"Tom & "Jerry" <1>"#));

        let reread = XmlDocument::parse_bytes(&doc.to_bytes().unwrap()).unwrap();
        assert_eq!(reread, doc);
    }

    #[test]
    fn test_unclosed_element_is_an_error() {
        assert!(XmlDocument::parse("<a><b></b>").is_err());
    }

    #[test]
    fn test_local_name() {
        assert_eq!(local_name("p:sp"), "sp");
        assert_eq!(local_name("a:t"), "t");
        assert_eq!(local_name("sp"), "sp");
    }
}
