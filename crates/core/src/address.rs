//! Dotted positional addresses of shapes within a slide's shape tree.
//!
//! An address is the list of child indices leading from a slide's top-level
//! shape sequence down to a shape, rendered as `"2.0.5"`. Addresses are only
//! valid against the tree they were taken from: inserting, removing or
//! reordering shapes invalidates them.

use crate::model::Shape;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Why an address could not be built or resolved.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// An address needs at least one segment.
    #[error("address has no segments")]
    Empty,

    /// The text is not a dot-separated list of non-negative integers.
    #[error("malformed address '{input}'")]
    Malformed { input: String },

    /// A segment points past the end of its shape sequence.
    #[error("index {index} at depth {depth} is out of bounds ({len} shapes)")]
    OutOfBounds {
        depth: usize,
        index: usize,
        len: usize,
    },

    /// A non-terminal segment lands on a shape that is not a group.
    #[error("shape at depth {depth} is not a group")]
    NotAGroup { depth: usize },

    /// The 1-based slide number does not exist in the document.
    #[error("slide {slide} does not exist ({count} slides)")]
    SlideOutOfRange { slide: usize, count: usize },
}

/// Position of a shape: a non-empty path of child indices.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address {
    segments: Vec<usize>,
}

impl Address {
    /// Build an address from path segments.
    pub fn new(segments: Vec<usize>) -> Result<Self, AddressError> {
        if segments.is_empty() {
            return Err(AddressError::Empty);
        }
        Ok(Self { segments })
    }

    /// Address of a top-level shape.
    pub fn top_level(index: usize) -> Self {
        Self {
            segments: vec![index],
        }
    }

    /// Address of the `index`-th child of the group at `self`.
    pub fn child(&self, index: usize) -> Self {
        let mut segments = self.segments.clone();
        segments.push(index);
        Self { segments }
    }

    /// The path segments, outermost first.
    pub fn segments(&self) -> &[usize] {
        &self.segments
    }

    /// Find the addressed shape in a slide's top-level shapes.
    pub fn resolve<'a>(&self, shapes: &'a [Shape]) -> Result<&'a Shape, AddressError> {
        let (&first, rest) = self.split();
        let mut current = shapes.get(first).ok_or(AddressError::OutOfBounds {
            depth: 0,
            index: first,
            len: shapes.len(),
        })?;

        for (depth, &index) in rest.iter().enumerate() {
            let children = current
                .children()
                .ok_or(AddressError::NotAGroup { depth })?;
            current = children.get(index).ok_or(AddressError::OutOfBounds {
                depth: depth + 1,
                index,
                len: children.len(),
            })?;
        }

        Ok(current)
    }

    /// Mutable variant of [`Address::resolve`].
    pub fn resolve_mut<'a>(&self, shapes: &'a mut [Shape]) -> Result<&'a mut Shape, AddressError> {
        let (&first, rest) = self.split();
        let len = shapes.len();
        let mut current = shapes.get_mut(first).ok_or(AddressError::OutOfBounds {
            depth: 0,
            index: first,
            len,
        })?;

        for (depth, &index) in rest.iter().enumerate() {
            let children = match current {
                Shape::Group(children) => children,
                _ => return Err(AddressError::NotAGroup { depth }),
            };
            let len = children.len();
            current = children.get_mut(index).ok_or(AddressError::OutOfBounds {
                depth: depth + 1,
                index,
                len,
            })?;
        }

        Ok(current)
    }

    fn split(&self) -> (&usize, &[usize]) {
        // Non-empty by construction.
        self.segments.split_first().unwrap_or((&0, &[]))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(AddressError::Empty);
        }

        let segments = s
            .split('.')
            .map(|segment| {
                if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                segment.parse::<usize>().ok()
            })
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| AddressError::Malformed {
                input: s.to_string(),
            })?;

        Self::new(segments)
    }
}

impl TryFrom<String> for Address {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

/// Encode path segments as an address.
pub fn encode(segments: &[usize]) -> Result<Address, AddressError> {
    Address::new(segments.to_vec())
}

/// Parse a dotted address and resolve it against a slide's top-level shapes.
pub fn decode<'a>(shapes: &'a [Shape], address: &str) -> Result<&'a Shape, AddressError> {
    address.parse::<Address>()?.resolve(shapes)
}

/// Mutable variant of [`decode`].
pub fn decode_mut<'a>(
    shapes: &'a mut [Shape],
    address: &str,
) -> Result<&'a mut Shape, AddressError> {
    address.parse::<Address>()?.resolve_mut(shapes)
}
