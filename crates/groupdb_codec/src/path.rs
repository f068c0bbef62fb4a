//! Entity ancestor paths and their order-preserving encoding.

use crate::error::{CodecError, CodecResult};
use crate::key::PATH_SEPARATOR;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Separates the kind from the identifier inside one path element.
const KIND_END: u8 = 0x02;
/// Tag for numeric identifiers. Sorts before [`NAME_TAG`].
const ID_TAG: u8 = 0x03;
/// Tag for string names.
const NAME_TAG: u8 = 0x04;
/// Smallest byte allowed inside kinds and names.
const MIN_TEXT_BYTE: u8 = 0x03;
/// Width of a zero-padded `u64` in decimal.
const ID_WIDTH: usize = 20;

/// Identifier of one path element.
///
/// Ordering: every id sorts before every name; ids compare numerically and
/// names bytewise.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IdOrName {
    /// Numeric identifier.
    Id(u64),
    /// String name.
    Name(String),
}

impl From<u64> for IdOrName {
    fn from(id: u64) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for IdOrName {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for IdOrName {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl fmt::Display for IdOrName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdOrName::Id(id) => write!(f, "{id}"),
            IdOrName::Name(name) => write!(f, "{name:?}"),
        }
    }
}

/// One `(kind, id_or_name)` step of an ancestor path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PathElement {
    /// Entity kind.
    pub kind: String,
    /// Identifier within the kind.
    pub id_or_name: IdOrName,
}

impl PathElement {
    /// Creates a path element.
    pub fn new(kind: impl Into<String>, id_or_name: impl Into<IdOrName>) -> Self {
        Self {
            kind: kind.into(),
            id_or_name: id_or_name.into(),
        }
    }
}

/// An entity ancestor path, root first.
///
/// The empty path is the root path: it names no entity and encodes to no
/// bytes. The derived ordering compares element by element with ancestors
/// before descendants, which is the order [`encode_path`] preserves.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Path {
    elements: Vec<PathElement>,
}

impl Path {
    /// Creates the empty (root) path.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a path from its elements.
    #[must_use]
    pub fn from_elements(elements: Vec<PathElement>) -> Self {
        Self { elements }
    }

    /// Appends a child element.
    #[must_use]
    pub fn child(mut self, kind: impl Into<String>, id_or_name: impl Into<IdOrName>) -> Self {
        self.elements.push(PathElement::new(kind, id_or_name));
        self
    }

    /// Returns the elements, root first.
    #[must_use]
    pub fn elements(&self) -> &[PathElement] {
        &self.elements
    }

    /// Returns true for the empty path.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.elements.is_empty()
    }

    /// Number of elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Returns true for the empty path.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Returns the path made of the first element only: the entity group.
    #[must_use]
    pub fn entity_group(&self) -> Path {
        Self {
            elements: self.elements.iter().take(1).cloned().collect(),
        }
    }

    /// Returns the parent path, or `None` for the root path.
    #[must_use]
    pub fn parent(&self) -> Option<Path> {
        let (_, ancestors) = self.elements.split_last()?;
        Some(Self {
            elements: ancestors.to_vec(),
        })
    }

    /// Returns true if `self` is `other` or one of its ancestors.
    #[must_use]
    pub fn is_ancestor_of(&self, other: &Path) -> bool {
        other.elements.starts_with(&self.elements)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.elements.is_empty() {
            return write!(f, "/");
        }
        for (i, element) in self.elements.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            write!(f, "{}:{}", element.kind, element.id_or_name)?;
        }
        Ok(())
    }
}

fn check_text(field: &'static str, text: &str) -> CodecResult<()> {
    match text.bytes().find(|b| *b < MIN_TEXT_BYTE) {
        Some(byte) => Err(CodecError::ReservedByte { field, byte }),
        None => Ok(()),
    }
}

/// Encodes a path so that byte order matches path order.
///
/// Each element becomes `kind 0x02 tag payload 0x01`, where the tag is
/// `0x03` followed by the id as 20 zero-padded decimal digits, or `0x04`
/// followed by the UTF-8 name.
///
/// # Errors
///
/// Fails on empty kinds, or on kinds and names holding bytes below `0x03`.
pub fn encode_path(path: &Path) -> CodecResult<Vec<u8>> {
    let mut out = Vec::with_capacity(path.elements.len() * 32);
    for element in &path.elements {
        if element.kind.is_empty() {
            return Err(CodecError::invalid_path("empty kind"));
        }
        check_text("kind", &element.kind)?;
        out.extend_from_slice(element.kind.as_bytes());
        out.push(KIND_END);
        match &element.id_or_name {
            IdOrName::Id(id) => {
                out.push(ID_TAG);
                out.extend_from_slice(format!("{id:0width$}", width = ID_WIDTH).as_bytes());
            }
            IdOrName::Name(name) => {
                check_text("name", name)?;
                out.push(NAME_TAG);
                out.extend_from_slice(name.as_bytes());
            }
        }
        out.push(PATH_SEPARATOR);
    }
    Ok(out)
}

/// Decodes bytes produced by [`encode_path`].
///
/// # Errors
///
/// Fails on any input that [`encode_path`] cannot produce.
pub fn decode_path(bytes: &[u8]) -> CodecResult<Path> {
    let Some((&last, body)) = bytes.split_last() else {
        return Ok(Path::new());
    };
    if last != PATH_SEPARATOR {
        return Err(CodecError::decoding_failed("path does not end with a separator"));
    }

    let mut elements = Vec::new();
    for segment in body.split(|b| *b == PATH_SEPARATOR) {
        elements.push(decode_element(segment)?);
    }
    Ok(Path::from_elements(elements))
}

fn decode_element(segment: &[u8]) -> CodecResult<PathElement> {
    let split = segment
        .iter()
        .position(|b| *b == KIND_END)
        .ok_or_else(|| CodecError::decoding_failed("path element has no kind"))?;
    let (kind, rest) = segment.split_at(split);
    if kind.is_empty() {
        return Err(CodecError::decoding_failed("empty kind"));
    }
    let kind = std::str::from_utf8(kind).map_err(|_| CodecError::InvalidUtf8)?;
    check_text("kind", kind).map_err(|e| CodecError::decoding_failed(e.to_string()))?;

    let id_or_name = match rest.get(2..).zip(rest.get(1)) {
        Some((payload, &ID_TAG)) => {
            if payload.len() != ID_WIDTH || !payload.iter().all(u8::is_ascii_digit) {
                return Err(CodecError::decoding_failed("malformed numeric id"));
            }
            let digits = std::str::from_utf8(payload).map_err(|_| CodecError::InvalidUtf8)?;
            let id = digits
                .parse::<u64>()
                .map_err(|_| CodecError::decoding_failed("numeric id out of range"))?;
            IdOrName::Id(id)
        }
        Some((payload, &NAME_TAG)) => {
            let name = std::str::from_utf8(payload).map_err(|_| CodecError::InvalidUtf8)?;
            check_text("name", name).map_err(|e| CodecError::decoding_failed(e.to_string()))?;
            IdOrName::Name(name.to_string())
        }
        _ => return Err(CodecError::decoding_failed("unknown identifier tag")),
    };

    Ok(PathElement {
        kind: kind.to_string(),
        id_or_name,
    })
}
