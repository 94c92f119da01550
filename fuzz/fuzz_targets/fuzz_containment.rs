#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use serde_json::{Map, Value};
use warden_abac::{AttributePath, PathSegment, contains};

// ============================================================================
// Arbitrary Implementations
// ============================================================================

/// Fuzzer-friendly JSON value.
///
/// Keys are drawn from a small alphabet so that paths and patterns collide
/// with the generated objects often enough to reach the matching code.
#[derive(Debug, Clone, Arbitrary)]
enum FuzzValue {
    Null,
    Bool(bool),
    Number(i16),
    Str(u8),
    Array(Vec<FuzzValue>),
    Object(Vec<(u8, FuzzValue)>),
}

impl FuzzValue {
    /// Converts to a JSON value, flattening anything deeper than 4 levels.
    fn to_json(&self, depth: u8) -> Value {
        if depth > 4 {
            return Value::Null;
        }

        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => Value::from(*n),
            Self::Str(s) => Value::String(key(*s)),
            Self::Array(items) => items.iter().map(|item| item.to_json(depth + 1)).collect(),
            Self::Object(fields) => {
                let map: Map<String, Value> = fields
                    .iter()
                    .map(|(k, v)| (key(*k), v.to_json(depth + 1)))
                    .collect();
                Value::Object(map)
            }
        }
    }
}

fn key(raw: u8) -> String {
    format!("k{}", raw % 6)
}

#[derive(Debug, Clone, Copy, Arbitrary)]
enum FuzzSegment {
    Key(u8),
    Index(u8),
}

impl From<FuzzSegment> for PathSegment {
    fn from(segment: FuzzSegment) -> Self {
        match segment {
            FuzzSegment::Key(k) => PathSegment::Key(key(k)),
            FuzzSegment::Index(i) => PathSegment::Index(usize::from(i % 4)),
        }
    }
}

fuzz_target!(|input: (FuzzValue, Vec<FuzzSegment>, FuzzValue)| {
    let (object, segments, pattern) = input;

    let object = object.to_json(0);
    let pattern = pattern.to_json(0);
    let path: AttributePath = segments.into_iter().map(PathSegment::from).collect();

    // Must never panic, whatever the shapes
    let found = contains(&object, &path, &pattern);

    validate_containment_invariants(&object, &path, found);
});

/// Validates containment invariants.
///
/// **Invariants checked:**
/// 1. An unresolvable path never contains anything
/// 2. A resolved scalar or record contains itself
/// 3. A resolved array contains each of its elements
/// 4. The empty record pattern is contained iff a record is present
fn validate_containment_invariants(object: &Value, path: &AttributePath, found: bool) {
    let Some(target) = path.resolve(object) else {
        // Invariant 1
        assert!(!found, "Unresolvable path {path} must not contain anything");
        return;
    };

    match target {
        Value::Array(items) => {
            // Invariant 3
            for item in items {
                assert!(
                    contains(object, path, item),
                    "Array at {path} must contain its own element {item}"
                );
            }
        }
        other => {
            // Invariant 2
            assert!(
                contains(object, path, other),
                "Value at {path} must contain itself"
            );
        }
    }

    // Invariant 4
    let has_record = match target {
        Value::Array(items) => items.iter().any(Value::is_object),
        other => other.is_object(),
    };
    assert_eq!(
        contains(object, path, &Value::Object(Map::new())),
        has_record,
        "Empty pattern at {path} must match exactly when a record is present"
    );
}
