//! Error kinds raised while mapping a tree onto a descriptor, and the field path
//! they point at.
use std::fmt;

use serde_json::Value;
use thiserror::Error;

// ------------------------------- Path ------------------------------------ //

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Segment {
    Field(String),
    Index(usize),
    Key(String),
}

/// Location of a node relative to the mapped root, e.g. `orders[2].when`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Path {
    segments: Vec<Segment>,
}

impl Path {
    pub fn root() -> Self { Self::default() }

    pub fn child(&self, segment: Segment) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment);
        Self { segments }
    }

    pub fn field(&self, name: &str) -> Self { self.child(Segment::Field(name.to_owned())) }
    pub fn index(&self, idx: usize) -> Self { self.child(Segment::Index(idx)) }
    pub fn key(&self, key: &str) -> Self { self.child(Segment::Key(key.to_owned())) }

    /// `self` followed by every segment of `rest`.
    pub fn join(&self, rest: &Path) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(rest.segments.iter().cloned());
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] { &self.segments }
    pub fn is_root(&self) -> bool { self.segments.is_empty() }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str(".");
        }
        for (i, seg) in self.segments.iter().enumerate() {
            match seg {
                Segment::Field(name) | Segment::Key(name) => {
                    if i > 0 { f.write_str(".")?; }
                    f.write_str(name)?;
                }
                Segment::Index(idx) => write!(f, "[{idx}]")?,
            }
        }
        Ok(())
    }
}

// ------------------------------ Node kind -------------------------------- //

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind { Null, Bool, Number, String, Sequence, Mapping }

impl NodeKind {
    pub fn of(node: &Value) -> Self {
        match node {
            Value::Null => NodeKind::Null,
            Value::Bool(_) => NodeKind::Bool,
            Value::Number(_) => NodeKind::Number,
            Value::String(_) => NodeKind::String,
            Value::Array(_) => NodeKind::Sequence,
            Value::Object(_) => NodeKind::Mapping,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NodeKind::Null => "null",
            NodeKind::Bool => "boolean",
            NodeKind::Number => "number",
            NodeKind::String => "string",
            NodeKind::Sequence => "sequence",
            NodeKind::Mapping => "mapping",
        })
    }
}

// ------------------------------- Errors ---------------------------------- //

#[derive(Debug, Error)]
pub enum ErrorKind {
    /// The raw payload could not be parsed into a tree.
    #[error("syntax error: {0}")]
    Syntax(#[from] serde_json::Error),

    /// A node's kind disagrees with the kind the target requires.
    #[error("shape mismatch at `{path}`: expected {expected}, found {found}")]
    ShapeMismatch {
        path: Path,
        expected: String,
        found: String,
    },

    /// A leaf could not be parsed into the target scalar type.
    #[error("cannot convert {raw:?} to {target} at `{path}`: {reason}")]
    Conversion {
        path: Path,
        target: String,
        raw: String,
        reason: String,
    },

    /// The declared target shape is not something the engine maps.
    #[error("unsupported shape at `{path}`: {reason}")]
    UnsupportedShape { path: Path, reason: String },
}

impl ErrorKind {
    pub(crate) fn mismatch(path: &Path, expected: impl Into<String>, node: &Value) -> Self {
        ErrorKind::ShapeMismatch {
            path: path.clone(),
            expected: expected.into(),
            found: NodeKind::of(node).to_string(),
        }
    }

    pub(crate) fn conversion(
        path: &Path,
        target: impl Into<String>,
        raw: impl Into<String>,
        reason: impl fmt::Display,
    ) -> Self {
        ErrorKind::Conversion {
            path: path.clone(),
            target: target.into(),
            raw: raw.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn unsupported(path: &Path, reason: impl Into<String>) -> Self {
        ErrorKind::UnsupportedShape { path: path.clone(), reason: reason.into() }
    }

    /// Re-anchor the failure below `prefix`.
    pub fn prefixed(mut self, prefix: &Path) -> Self {
        if let Some(path) = self.path_mut() {
            *path = prefix.join(path);
        }
        self
    }

    fn path_mut(&mut self) -> Option<&mut Path> {
        match self {
            ErrorKind::Syntax(_) => None,
            ErrorKind::ShapeMismatch { path, .. }
            | ErrorKind::Conversion { path, .. }
            | ErrorKind::UnsupportedShape { path, .. } => Some(path),
        }
    }

    /// Field path of the failure, when the kind carries one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            ErrorKind::Syntax(_) => None,
            ErrorKind::ShapeMismatch { path, .. }
            | ErrorKind::Conversion { path, .. }
            | ErrorKind::UnsupportedShape { path, .. } => Some(path),
        }
    }
}

/// Failure of one top-level `deserialize` call.
#[derive(Debug, Error)]
#[error("deserializing {target}: {kind}")]
pub struct Error {
    /// Descriptor of the requested root type.
    pub target: String,
    #[source]
    pub kind: ErrorKind,
}

impl Error {
    pub fn kind(&self) -> &ErrorKind { &self.kind }
    pub fn into_kind(self) -> ErrorKind { self.kind }
    pub fn path(&self) -> Option<&Path> { self.kind.path() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_display() {
        let p = Path::root().field("orders").index(2).field("when");
        assert_eq!(p.to_string(), "orders[2].when");
        assert_eq!(Path::root().to_string(), ".");
        assert_eq!(Path::root().index(0).to_string(), "[0]");
        assert_eq!(Path::root().field("tags").key("a b").to_string(), "tags.a b");
    }

    #[test]
    fn prefixing_keeps_the_tail() {
        let err = ErrorKind::unsupported(&Path::root().index(1), "x").prefixed(&Path::root().field("items"));
        assert_eq!(err.path().map(ToString::to_string).as_deref(), Some("items[1]"));
    }
}
