//! Qualified names and attributes

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A `(space, local)` pair naming an element or attribute.
///
/// After a document is loaded `space` holds the alias registered for the
/// element's namespace, not the prefix text of the source. Two names are
/// equal when both fields are equal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QualifiedName {
    pub space: String,
    pub local: String,
}

impl QualifiedName {
    pub fn new(space: impl Into<String>, local: impl Into<String>) -> Self {
        Self {
            space: space.into(),
            local: local.into(),
        }
    }

    /// Name without a namespace
    pub fn local(local: impl Into<String>) -> Self {
        Self::new(String::new(), local)
    }

    /// Split a raw `prefix:local` tag name.
    ///
    /// A colon in first or last position does not count as a separator.
    pub fn parse(raw: &str) -> Self {
        match raw.find(':') {
            Some(i) if i > 0 && i + 1 < raw.len() => Self::new(&raw[..i], &raw[i + 1..]),
            _ => Self::local(raw),
        }
    }

    /// Returns true if this name matches `(space, local)` exactly
    pub fn matches(&self, space: &str, local: &str) -> bool {
        self.space == space && self.local == local
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.space.is_empty() {
            f.write_str(&self.local)
        } else {
            write!(f, "{}:{}", self.space, self.local)
        }
    }
}

/// An element attribute
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Attribute {
    pub name: QualifiedName,
    pub value: String,
}

impl Attribute {
    pub fn new(name: QualifiedName, value: impl Into<String>) -> Self {
        Self {
            name,
            value: value.into(),
        }
    }
}
