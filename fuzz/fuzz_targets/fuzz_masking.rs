#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use serde_json::{Value, json};
use warden_masking::{FieldMask, MaskingError, MaskingPolicy, MaskingStrategy, RedactPattern};

// ============================================================================
// Arbitrary Implementations
// ============================================================================

#[derive(Debug, Clone, Arbitrary)]
enum FuzzPattern {
    Ssn,
    Phone,
    Email,
    CreditCard,
    Custom(String),
}

#[derive(Debug, Clone, Arbitrary)]
enum FuzzStrategy {
    Redact(FuzzPattern),
    Hash,
    Tokenize,
    Truncate(u8),
    KeepLast(u8),
    Null,
    Remove,
}

impl From<FuzzStrategy> for MaskingStrategy {
    fn from(f: FuzzStrategy) -> Self {
        match f {
            FuzzStrategy::Redact(pattern) => MaskingStrategy::Redact(match pattern {
                FuzzPattern::Ssn => RedactPattern::Ssn,
                FuzzPattern::Phone => RedactPattern::Phone,
                FuzzPattern::Email => RedactPattern::Email,
                FuzzPattern::CreditCard => RedactPattern::CreditCard,
                FuzzPattern::Custom(replacement) => RedactPattern::Custom { replacement },
            }),
            FuzzStrategy::Hash => MaskingStrategy::Hash,
            FuzzStrategy::Tokenize => MaskingStrategy::Tokenize,
            FuzzStrategy::Truncate(n) => MaskingStrategy::Truncate {
                max_chars: usize::from(n),
            },
            FuzzStrategy::KeepLast(n) => MaskingStrategy::KeepLast {
                chars: usize::from(n),
            },
            FuzzStrategy::Null => MaskingStrategy::Null,
            FuzzStrategy::Remove => MaskingStrategy::Remove,
        }
    }
}

#[derive(Debug, Clone, Arbitrary)]
enum FuzzField {
    Text(String),
    Number(i64),
    Flag(bool),
}

impl FuzzField {
    fn to_json(&self) -> Value {
        match self {
            Self::Text(s) => Value::String(s.clone()),
            Self::Number(n) => Value::from(*n),
            Self::Flag(b) => Value::Bool(*b),
        }
    }
}

fuzz_target!(|input: (FuzzField, Vec<(FuzzStrategy, bool)>)| {
    let (field, masks) = input;

    let resource = json!({"type": "person", "secret": field.to_json(), "nested": {"secret": field.to_json()}});
    let policy: MaskingPolicy = masks
        .into_iter()
        .map(|(strategy, nested)| {
            let path = if nested { "nested.secret" } else { "secret" };
            FieldMask::new(path, strategy.into())
        })
        .collect();

    // Must never panic: either masks or reports why not
    match policy.apply(&resource) {
        Ok(masked) => validate_masked(&resource, &masked),
        Err(MaskingError::PatternMismatch { .. } | MaskingError::Unsupported { .. }) => {}
        Err(err @ MaskingError::EmptyField) => panic!("Non-empty paths cannot fail with {err}"),
    }
});

/// Validates masking invariants.
///
/// **Invariants checked:**
/// 1. The field masks never touch other fields
/// 2. The input resource is never modified
fn validate_masked(resource: &Value, masked: &Value) {
    // Invariant 1
    assert_eq!(masked["type"], "person");
    let keys = masked.as_object().map_or(0, |map| map.len());
    assert!(keys <= 3, "Masking must not add fields");

    // Invariant 2
    assert_eq!(resource["secret"], resource["nested"]["secret"]);
}
