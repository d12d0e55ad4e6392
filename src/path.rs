//! Field path parsing and resolution.
//!
//! A field path locates scalar values inside a document tree, e.g.
//! `spec/template/spec/containers[]/image`. A `[]` suffix marks a repeated
//! segment: resolution descends into every element of the sequence found at
//! that field before continuing with the remaining segments.

use serde_yaml::Value;
use std::fmt;

/// One segment of a field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    /// Field name to descend into.
    pub name: String,
    /// Whether the field holds a sequence whose every element is traversed.
    pub repeated: bool,
}

/// A parsed field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    spec: String,
    segments: Vec<PathSegment>,
}

impl FieldPath {
    /// Parse a slash- or dot-delimited path specification.
    ///
    /// Parsing never fails: empty segments are ignored, and a path that
    /// matches nothing in a given document simply resolves to no locations.
    pub fn parse(spec: &str) -> Self {
        let segments = spec
            .split(['/', '.'])
            .filter(|s| !s.is_empty())
            .map(|s| match s.strip_suffix("[]") {
                Some(name) => PathSegment {
                    name: name.to_string(),
                    repeated: true,
                },
                None => PathSegment {
                    name: s.to_string(),
                    repeated: false,
                },
            })
            .collect();
        Self {
            spec: spec.to_string(),
            segments,
        }
    }

    /// Visit every scalar this path designates in `root`, depth-first.
    ///
    /// Missing intermediate fields are not an error; the path yields no
    /// locations for that document. Targets that resolve to a map or a
    /// sequence rather than a leaf scalar are skipped.
    pub fn for_each_scalar(&self, root: &mut Value, f: &mut dyn FnMut(&mut Value)) {
        descend(root, &self.segments, f);
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.spec)
    }
}

fn descend(node: &mut Value, segments: &[PathSegment], f: &mut dyn FnMut(&mut Value)) {
    let Some((segment, rest)) = segments.split_first() else {
        if !matches!(node, Value::Mapping(_) | Value::Sequence(_)) {
            f(node);
        }
        return;
    };
    let Some(child) = node.get_mut(segment.name.as_str()) else {
        return;
    };
    if segment.repeated {
        if let Value::Sequence(items) = child {
            for item in items {
                descend(item, rest, f);
            }
        }
    } else {
        descend(child, rest, f);
    }
}
