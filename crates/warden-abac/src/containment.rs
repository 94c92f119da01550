//! Nested-path containment predicate.
//!
//! Rule matchers use [`contains`] to test structured attributes, e.g. "the
//! subject's `connections.memberOf` list holds a group whose `key` is
//! `group::admin`", without re-implementing traversal.
//!
//! ```
//! use serde_json::json;
//! use warden_abac::containment::contains;
//!
//! let subject = json!({
//!     "connections": {
//!         "memberOf": [{"key": "group::admin", "type": "organization"}]
//!     }
//! });
//!
//! assert!(contains(&subject, ["connections", "memberOf"], &json!({"key": "group::admin"})));
//! assert!(!contains(&subject, ["connections", "ownerOf"], &json!({"key": "group::admin"})));
//! ```

use std::fmt;

use serde_json::Value;

// ============================================================================
// Attribute Path
// ============================================================================

/// One step of an [`AttributePath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// Object key. Also indexes arrays when it parses as an index.
    Key(String),
    /// Array index. Also looks up its decimal key in objects.
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

/// An ordered sequence of keys and indices into an attribute bag.
///
/// A single key or index converts into a one-element path. A key is never
/// split, so `"connections.memberOf"` is one key; use
/// [`AttributePath::from_dotted`] for dot notation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct AttributePath {
    segments: Vec<PathSegment>,
}

impl AttributePath {
    /// Creates an empty path, which resolves to the root value.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parses a dot-separated path such as `"contact.email"`.
    ///
    /// Empty components are skipped, so `""` is the root path.
    pub fn from_dotted(path: &str) -> Self {
        path.split('.')
            .filter(|part| !part.is_empty())
            .map(|part| PathSegment::Key(part.to_string()))
            .collect()
    }

    /// Appends a segment (builder pattern).
    pub fn join(mut self, segment: impl Into<PathSegment>) -> Self {
        self.segments.push(segment.into());
        self
    }

    /// Returns the segments in navigation order.
    pub fn segments(&self) -> &[PathSegment] {
        &self.segments
    }

    /// Returns `true` if the path has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Splits the path into its parent path and final segment.
    pub fn split_last(&self) -> Option<(&[PathSegment], &PathSegment)> {
        self.segments
            .split_last()
            .map(|(last, parent)| (parent, last))
    }

    /// Navigates `value` along this path.
    ///
    /// Returns `None` when a segment is missing or the value at that point
    /// cannot be navigated (a scalar, or an object indexed past its keys).
    pub fn resolve<'v>(&self, value: &'v Value) -> Option<&'v Value> {
        resolve_segments(value, &self.segments)
    }

    /// Mutable counterpart of [`AttributePath::resolve`].
    pub fn resolve_mut<'v>(&self, value: &'v mut Value) -> Option<&'v mut Value> {
        resolve_segments_mut(value, &self.segments)
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

impl From<&str> for PathSegment {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for PathSegment {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for PathSegment {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

impl FromIterator<PathSegment> for AttributePath {
    fn from_iter<I: IntoIterator<Item = PathSegment>>(iter: I) -> Self {
        Self {
            segments: iter.into_iter().collect(),
        }
    }
}

impl From<PathSegment> for AttributePath {
    fn from(segment: PathSegment) -> Self {
        Self {
            segments: vec![segment],
        }
    }
}

impl From<&str> for AttributePath {
    fn from(key: &str) -> Self {
        PathSegment::from(key).into()
    }
}

impl From<String> for AttributePath {
    fn from(key: String) -> Self {
        PathSegment::from(key).into()
    }
}

impl From<usize> for AttributePath {
    fn from(index: usize) -> Self {
        PathSegment::from(index).into()
    }
}

impl From<Vec<PathSegment>> for AttributePath {
    fn from(segments: Vec<PathSegment>) -> Self {
        Self { segments }
    }
}

impl From<&[&str]> for AttributePath {
    fn from(keys: &[&str]) -> Self {
        keys.iter().copied().map(PathSegment::from).collect()
    }
}

impl<const N: usize> From<[&str; N]> for AttributePath {
    fn from(keys: [&str; N]) -> Self {
        keys.into_iter().map(PathSegment::from).collect()
    }
}

impl From<Vec<&str>> for AttributePath {
    fn from(keys: Vec<&str>) -> Self {
        keys.into_iter().map(PathSegment::from).collect()
    }
}

impl From<Vec<String>> for AttributePath {
    fn from(keys: Vec<String>) -> Self {
        keys.into_iter().map(PathSegment::from).collect()
    }
}

impl From<&AttributePath> for AttributePath {
    fn from(path: &AttributePath) -> Self {
        path.clone()
    }
}

// ============================================================================
// Containment
// ============================================================================

/// Capability handle passed to rule matchers.
///
/// Carries only the containment predicate, so matchers never observe the
/// authorizer that invoked them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Containment;

impl Containment {
    /// See [`contains`].
    pub fn contains(&self, object: &Value, path: impl Into<AttributePath>, pattern: &Value) -> bool {
        contains(object, path, pattern)
    }

    /// Resolves `path` inside `object`, or `None` if navigation fails.
    pub fn resolve<'v>(&self, object: &'v Value, path: impl Into<AttributePath>) -> Option<&'v Value> {
        path.into().resolve(object)
    }
}

/// Returns `true` if the value at `path` inside `object` contains `pattern`.
///
/// - An array matches if any element matches.
/// - Any other value is treated as a one-element sequence.
/// - An element matches an object pattern when it is an object holding every
///   key of the pattern with an equal value; otherwise it must equal the
///   pattern.
///
/// Navigation failures (missing keys, out-of-range indices, scalars in the
/// middle of the path) return `false`.
pub fn contains(object: &Value, path: impl Into<AttributePath>, pattern: &Value) -> bool {
    let path = path.into();
    let Some(target) = path.resolve(object) else {
        return false;
    };

    match target {
        Value::Array(elements) => elements.iter().any(|e| element_matches(e, pattern)),
        single => element_matches(single, pattern),
    }
}

/// Partial match for records, equality for everything else.
fn element_matches(element: &Value, pattern: &Value) -> bool {
    match (element, pattern) {
        (Value::Object(fields), Value::Object(wanted)) => wanted
            .iter()
            .all(|(key, value)| fields.get(key) == Some(value)),
        _ => element == pattern,
    }
}

// ============================================================================
// Navigation
// ============================================================================

fn resolve_segments<'v>(mut value: &'v Value, segments: &[PathSegment]) -> Option<&'v Value> {
    for segment in segments {
        value = match (value, segment) {
            (Value::Object(map), PathSegment::Key(key)) => map.get(key)?,
            (Value::Object(map), PathSegment::Index(index)) => map.get(&index.to_string())?,
            (Value::Array(items), PathSegment::Index(index)) => items.get(*index)?,
            (Value::Array(items), PathSegment::Key(key)) => items.get(key.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(value)
}

fn resolve_segments_mut<'v>(
    mut value: &'v mut Value,
    segments: &[PathSegment],
) -> Option<&'v mut Value> {
    for segment in segments {
        value = match (value, segment) {
            (Value::Object(map), PathSegment::Key(key)) => map.get_mut(key)?,
            (Value::Object(map), PathSegment::Index(index)) => map.get_mut(&index.to_string())?,
            (Value::Array(items), PathSegment::Index(index)) => items.get_mut(*index)?,
            (Value::Array(items), PathSegment::Key(key)) => {
                items.get_mut(key.parse::<usize>().ok()?)?
            }
            _ => return None,
        };
    }
    Some(value)
}

// ============================================================================
// Tests
// ============================================================================
