//! Field masks and masking policies over JSON resources.

use std::borrow::Cow;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;
use warden_abac::{AttributePath, Mapper, PathSegment, RuleError};

use crate::strategy::{MaskingError, MaskingStrategy, Result};

// ---------------------------------------------------------------------------
// FieldMask
// ---------------------------------------------------------------------------

/// Describes how a single resource field should be masked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMask {
    /// Dot-separated path of the field, e.g. `"contact.email"`.
    pub field: String,
    /// The masking strategy to apply.
    pub strategy: MaskingStrategy,
}

impl FieldMask {
    /// Creates a new field mask for the given field path and strategy.
    pub fn new(field: impl Into<String>, strategy: MaskingStrategy) -> Self {
        Self {
            field: field.into(),
            strategy,
        }
    }

    /// Parsed form of [`FieldMask::field`].
    pub fn path(&self) -> AttributePath {
        AttributePath::from_dotted(&self.field)
    }

    /// Masks this field of `resource` in place.
    ///
    /// Returns `false` if the field is absent, in which case `resource` is
    /// left untouched.
    ///
    /// # Errors
    ///
    /// - [`MaskingError::EmptyField`] if the path has no segments.
    /// - [`MaskingError::Unsupported`] for a text strategy on a value that is
    ///   neither a string nor a number.
    /// - [`MaskingError::PatternMismatch`] if a redact pattern does not fit.
    pub fn apply(&self, resource: &mut Value) -> Result<bool> {
        let path = self.path();
        let Some((parent, last)) = path.split_last() else {
            return Err(MaskingError::EmptyField);
        };

        if self.strategy == MaskingStrategy::Remove {
            let parent: AttributePath = parent.to_vec().into();
            return Ok(parent
                .resolve_mut(resource)
                .is_some_and(|container| remove_child(container, last)));
        }

        let Some(value) = path.resolve_mut(resource) else {
            return Ok(false);
        };

        *value = match &self.strategy {
            MaskingStrategy::Null => Value::Null,
            strategy => {
                let text = text_of(value).ok_or_else(|| MaskingError::Unsupported {
                    field: self.field.clone(),
                    kind: kind_of(value),
                    strategy: strategy.name(),
                })?;
                Value::String(strategy.mask_text(&self.field, &text)?)
            }
        };
        Ok(true)
    }
}

fn text_of(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(text) => Some(Cow::Borrowed(text)),
        Value::Number(number) => Some(Cow::Owned(number.to_string())),
        _ => None,
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Removes `segment` from `container`. Array elements after it shift down.
fn remove_child(container: &mut Value, segment: &PathSegment) -> bool {
    match (container, segment) {
        (Value::Object(map), PathSegment::Key(key)) => map.remove(key).is_some(),
        (Value::Object(map), PathSegment::Index(index)) => map.remove(&index.to_string()).is_some(),
        (Value::Array(items), PathSegment::Index(index)) => remove_index(items, *index),
        (Value::Array(items), PathSegment::Key(key)) => key
            .parse::<usize>()
            .is_ok_and(|index| remove_index(items, index)),
        _ => false,
    }
}

fn remove_index(items: &mut Vec<Value>, index: usize) -> bool {
    if index < items.len() {
        items.remove(index);
        true
    } else {
        false
    }
}

// ---------------------------------------------------------------------------
// MaskingPolicy
// ---------------------------------------------------------------------------

/// An ordered collection of field masks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MaskingPolicy {
    masks: Vec<FieldMask>,
}

impl MaskingPolicy {
    /// Creates an empty masking policy.
    pub fn new() -> Self {
        Self { masks: Vec::new() }
    }

    /// Adds a field mask to the policy.
    pub fn with_mask(mut self, mask: FieldMask) -> Self {
        self.masks.push(mask);
        self
    }

    /// Returns all field masks.
    pub fn masks(&self) -> &[FieldMask] {
        &self.masks
    }

    /// Returns `true` if the policy has no masks.
    pub fn is_empty(&self) -> bool {
        self.masks.is_empty()
    }

    /// Returns a masked copy of `resource`.
    ///
    /// Masks apply in order, each seeing the output of the previous one.
    /// Fields absent from the resource are skipped.
    ///
    /// # Errors
    ///
    /// Stops at the first mask that fails; see [`FieldMask::apply`].
    pub fn apply(&self, resource: &Value) -> Result<Value> {
        let mut masked = resource.clone();
        for mask in &self.masks {
            let applied = mask.apply(&mut masked)?;
            trace!(
                field = %mask.field,
                strategy = mask.strategy.name(),
                applied,
                "Field mask evaluated"
            );
        }
        Ok(masked)
    }

    /// Wraps the policy as a rule mapper.
    ///
    /// Masking errors surface as the rule's error, so the decision fails
    /// instead of leaking an unmasked field.
    pub fn into_mapper(self) -> Mapper {
        Arc::new(move |resource: &Value| self.apply(resource).map_err(RuleError::from))
    }
}

impl FromIterator<FieldMask> for MaskingPolicy {
    fn from_iter<I: IntoIterator<Item = FieldMask>>(iter: I) -> Self {
        Self {
            masks: iter.into_iter().collect(),
        }
    }
}

impl From<Vec<FieldMask>> for MaskingPolicy {
    fn from(masks: Vec<FieldMask>) -> Self {
        Self { masks }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::RedactPattern;
    use proptest::prelude::*;
    use serde_json::json;
    use warden_abac::{AccessRequest, AccessRule, Authorizer, Effect, EvaluationError};

    fn person() -> Value {
        json!({
            "type": "person",
            "firstname": "Jonathan",
            "lastname": "Doe",
            "ssn": "123-45-6789",
            "contact": {"email": "john@example.com", "phone": "555-123-4567"},
            "accounts": [{"number": 4_111_111_111_111_111_u64}, {"number": 5_500_000_000_000_004_u64}],
            "verified": true
        })
    }

    #[test]
    fn test_apply_policy_to_resource() {
        let policy = MaskingPolicy::new()
            .with_mask(FieldMask::new("firstname", MaskingStrategy::Truncate { max_chars: 3 }))
            .with_mask(FieldMask::new("ssn", MaskingStrategy::Redact(RedactPattern::Ssn)))
            .with_mask(FieldMask::new(
                "contact.email",
                MaskingStrategy::Redact(RedactPattern::Email),
            ))
            .with_mask(FieldMask::new("contact.phone", MaskingStrategy::Null));

        let original = person();
        let masked = policy.apply(&original).unwrap();

        assert_eq!(masked["firstname"], "Jon...");
        assert_eq!(masked["ssn"], "***-**-6789");
        assert_eq!(masked["contact"]["email"], "j***@example.com");
        assert_eq!(masked["contact"]["phone"], Value::Null);
        // Unmasked fields and the input are untouched
        assert_eq!(masked["lastname"], "Doe");
        assert_eq!(original["ssn"], "123-45-6789");
    }

    #[test]
    fn test_numbers_mask_as_text() {
        let policy = MaskingPolicy::new().with_mask(FieldMask::new(
            "accounts.0.number",
            MaskingStrategy::Redact(RedactPattern::CreditCard),
        ));

        let masked = policy.apply(&person()).unwrap();
        assert_eq!(masked["accounts"][0]["number"], "****-****-****-1111");
        assert_eq!(masked["accounts"][1]["number"], 5_500_000_000_000_004_u64);
    }

    #[test]
    fn test_missing_field_is_skipped() {
        let mask = FieldMask::new("contact.fax", MaskingStrategy::Hash);
        let mut resource = person();

        assert!(!mask.apply(&mut resource).unwrap());
        assert_eq!(resource, person());
    }

    #[test]
    fn test_remove_field() {
        let policy = MaskingPolicy::new()
            .with_mask(FieldMask::new("ssn", MaskingStrategy::Remove))
            .with_mask(FieldMask::new("contact.phone", MaskingStrategy::Remove))
            .with_mask(FieldMask::new("accounts.0", MaskingStrategy::Remove));

        let masked = policy.apply(&person()).unwrap();

        assert!(masked.get("ssn").is_none());
        assert!(masked["contact"].get("phone").is_none());
        assert_eq!(masked["contact"]["email"], "john@example.com");
        assert_eq!(masked["accounts"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_remove_missing_field_is_noop() {
        let mask = FieldMask::new("contact.fax", MaskingStrategy::Remove);
        let mut resource = person();

        assert!(!mask.apply(&mut resource).unwrap());
        assert_eq!(resource, person());
    }

    #[test]
    fn test_null_and_remove_accept_any_value() {
        let policy = MaskingPolicy::new()
            .with_mask(FieldMask::new("verified", MaskingStrategy::Null))
            .with_mask(FieldMask::new("contact", MaskingStrategy::Remove));

        let masked = policy.apply(&person()).unwrap();
        assert_eq!(masked["verified"], Value::Null);
        assert!(masked.get("contact").is_none());
    }

    #[test]
    fn test_text_strategy_on_object_is_unsupported() {
        let policy = MaskingPolicy::new().with_mask(FieldMask::new("contact", MaskingStrategy::Hash));

        let err = policy.apply(&person()).unwrap_err();
        match err {
            MaskingError::Unsupported { field, kind, strategy } => {
                assert_eq!(field, "contact");
                assert_eq!(kind, "an object");
                assert_eq!(strategy, "hash");
            }
            other => panic!("expected Unsupported, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_field_path_rejected() {
        let mask = FieldMask::new("", MaskingStrategy::Null);
        assert!(matches!(mask.apply(&mut person()), Err(MaskingError::EmptyField)));
    }

    #[test]
    fn test_masks_apply_in_order() {
        // The second mask sees the first mask's output
        let policy = MaskingPolicy::new()
            .with_mask(FieldMask::new("ssn", MaskingStrategy::Redact(RedactPattern::Ssn)))
            .with_mask(FieldMask::new("ssn", MaskingStrategy::KeepLast { chars: 7 }));

        let masked = policy.apply(&person()).unwrap();
        assert_eq!(masked["ssn"], "**-6789");
    }

    #[test]
    fn test_masking_policy_from_vec() {
        let policy: MaskingPolicy = vec![
            FieldMask::new("ssn", MaskingStrategy::Hash),
            FieldMask::new("contact.email", MaskingStrategy::Redact(RedactPattern::Email)),
        ]
        .into();

        assert_eq!(policy.masks().len(), 2);
        assert_eq!(policy.masks()[0].field, "ssn");
        assert_eq!(policy.masks()[1].path().to_string(), "contact.email");
        assert!(!policy.is_empty());
        assert!(MaskingPolicy::new().is_empty());
    }

    #[test]
    fn test_mapper_masks_allowed_resource() {
        let policy = MaskingPolicy::new()
            .with_mask(FieldMask::new("ssn", MaskingStrategy::KeepLast { chars: 4 }));
        let authz = Authorizer::new(vec![
            AccessRule::allow()
                .named("masked-read")
                .with_filter(|rt, at| rt == Some("person") && at == Some("read"))
                .with_shared_mapper(policy.into_mapper()),
        ])
        .without_decision_log();

        let request = AccessRequest::new(
            json!({"type": "read"}),
            json!({"type": "person", "firstname": "John", "lastname": "Doe", "ssn": "123456789"}),
        );
        let response = authz.enforce(&request, None).unwrap();

        assert_eq!(response.effect, Effect::Allow);
        assert_eq!(
            response.into_resource().unwrap(),
            json!({"type": "person", "firstname": "John", "lastname": "Doe", "ssn": "6789"})
        );
    }

    #[test]
    fn test_mapper_error_fails_decision() {
        let policy = MaskingPolicy::new()
            .with_mask(FieldMask::new("ssn", MaskingStrategy::Redact(RedactPattern::Ssn)));
        let authz = Authorizer::new(vec![
            AccessRule::allow()
                .named("masked-read")
                .with_shared_mapper(policy.into_mapper()),
        ])
        .without_decision_log();

        let request = AccessRequest::new(
            json!({"type": "read"}),
            json!({"type": "person", "ssn": "12345"}),
        );
        let err = authz.enforce(&request, None).unwrap_err();

        match err {
            EvaluationError::MapperFailed { rule, source, .. } => {
                assert_eq!(rule, "masked-read");
                assert!(source.downcast_ref::<MaskingError>().is_some());
            }
            other => panic!("expected MapperFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_policy_from_toml() {
        let config = r#"
            [[fields]]
            field = "ssn"
            strategy = { keep-last = { chars = 4 } }

            [[fields]]
            field = "contact.email"
            strategy = { redact = "email" }

            [[fields]]
            field = "notes"
            strategy = "remove"
        "#;

        #[derive(Deserialize)]
        struct Wrapper {
            fields: MaskingPolicy,
        }

        let policy = toml::from_str::<Wrapper>(config).unwrap().fields;
        assert_eq!(policy.masks().len(), 3);
        assert_eq!(policy.masks()[0].strategy, MaskingStrategy::KeepLast { chars: 4 });
        assert_eq!(
            policy.masks()[1].strategy,
            MaskingStrategy::Redact(RedactPattern::Email)
        );
        assert_eq!(policy.masks()[2].strategy, MaskingStrategy::Remove);
    }

    proptest! {
        #[test]
        fn prop_keep_last_never_longer(text in ".{0,32}", chars in 0usize..40) {
            let mask = FieldMask::new("value", MaskingStrategy::KeepLast { chars });
            let mut resource = json!({ "value": text.clone() });
            prop_assert!(mask.apply(&mut resource).unwrap());

            let masked = resource["value"].as_str().unwrap();
            prop_assert_eq!(masked.chars().count(), text.chars().count().min(chars));
            prop_assert!(text.ends_with(masked));
        }

        #[test]
        fn prop_tokenize_deterministic(text in ".{0,64}") {
            let policy = MaskingPolicy::new().with_mask(FieldMask::new("v", MaskingStrategy::Tokenize));
            let resource = json!({ "v": text });
            let first = policy.apply(&resource).unwrap();
            let second = policy.apply(&resource).unwrap();

            prop_assert_eq!(&first, &second);
            prop_assert_eq!(first["v"].as_str().unwrap().len(), 20);
        }

        #[test]
        fn prop_absent_field_leaves_resource_unchanged(field in "[a-z]{1,8}") {
            prop_assume!(!["type", "firstname", "lastname", "ssn", "contact", "accounts", "verified"]
                .contains(&field.as_str()));
            let policy = MaskingPolicy::new().with_mask(FieldMask::new(field, MaskingStrategy::Hash));

            prop_assert_eq!(policy.apply(&person()).unwrap(), person());
        }
    }
}
