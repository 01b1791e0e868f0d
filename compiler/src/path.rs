use std::fmt;

use serde::Serialize;

/// A fully- or partially-qualified schema name, kept as ordered dot
/// segments instead of a raw string so scope searches and ancestor walks
/// never have to re-split.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypePath {
    segments: Vec<String>,
}

impl TypePath {
    pub fn root() -> TypePath {
        TypePath { segments: Vec::new() }
    }

    /// Splits a dotted name like `"p.Foo.Bar"` into segments. An empty
    /// string produces the empty path.
    pub fn from_dotted(name: &str) -> TypePath {
        if name.is_empty() {
            return TypePath::root();
        }
        TypePath {
            segments: name.split('.').map(|s| s.to_string()).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn push(&mut self, segment: &str) {
        self.segments.push(segment.to_string());
    }

    /// Returns a new path with `segment` appended.
    pub fn child(&self, segment: &str) -> TypePath {
        let mut path = self.clone();
        path.push(segment);
        path
    }

    /// Appends a possibly-dotted token, e.g. joining `p` with `Other.Nested`
    /// yields `p.Other.Nested`.
    pub fn join_dotted(&self, token: &str) -> TypePath {
        let mut path = self.clone();
        for segment in token.split('.') {
            path.push(segment);
        }
        path
    }

    /// The enclosing path, or `None` at a single segment (stripping the last
    /// segment of `"p"` leaves nothing, mirroring the empty-prefix stop
    /// condition of the scope search).
    pub fn parent(&self) -> Option<TypePath> {
        if self.segments.len() <= 1 {
            return None;
        }
        Some(TypePath {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }
}

impl fmt::Display for TypePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_dotted_round_trip() {
        let path = TypePath::from_dotted("p.Foo.Bar");
        assert_eq!(path.len(), 3);
        assert_eq!(path.to_string(), "p.Foo.Bar");
        assert_eq!(TypePath::from_dotted("").to_string(), "");
    }

    #[test]
    fn test_parent_walk() {
        let path = TypePath::from_dotted("p.Other.Nested");
        let parent = path.parent().unwrap();
        assert_eq!(parent.to_string(), "p.Other");
        let grandparent = parent.parent().unwrap();
        assert_eq!(grandparent.to_string(), "p");
        assert!(grandparent.parent().is_none());
    }

    #[test]
    fn test_join_dotted() {
        let pkg = TypePath::from_dotted("p");
        assert_eq!(pkg.join_dotted("Other.Nested").to_string(), "p.Other.Nested");
        assert_eq!(pkg.child("Foo").to_string(), "p.Foo");
    }
}
