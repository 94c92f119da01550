//! Access request attributes.
//!
//! A request carries four attribute bags:
//! - **Subject**: who is asking (optional)
//! - **Action**: what they want to do, carries at least a `type`
//! - **Resource**: what they want to do it to, carries at least a `type`
//! - **Environment**: request context such as time or origin (optional)
//!
//! The engine reads only `resource.type` and `action.type`. Everything else
//! is opaque here and interpreted by rule matchers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// Access Request
// ============================================================================

/// A request for access to a resource.
///
/// `action` and `resource` are required: a request without them cannot be
/// built, and deserializing a document that lacks either one fails.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessRequest {
    /// Attributes of the requesting subject, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<Value>,
    /// The action being attempted (e.g. `{"type": "read"}`).
    pub action: Value,
    /// The resource being accessed (e.g. `{"type": "person", ...}`).
    pub resource: Value,
    /// Environment attributes (time, source country, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<Value>,
}

impl AccessRequest {
    /// Creates a request with no subject and no environment.
    pub fn new(action: Value, resource: Value) -> Self {
        Self {
            subject: None,
            action,
            resource,
            environment: None,
        }
    }

    /// Sets the subject attributes.
    pub fn with_subject(mut self, subject: Value) -> Self {
        self.subject = Some(subject);
        self
    }

    /// Sets the environment attributes.
    pub fn with_environment(mut self, environment: Value) -> Self {
        self.environment = Some(environment);
        self
    }

    /// Returns `resource.type`, or `None` if it is absent or not a string.
    pub fn resource_type(&self) -> Option<&str> {
        type_of(&self.resource)
    }

    /// Returns `action.type`, or `None` if it is absent or not a string.
    pub fn action_type(&self) -> Option<&str> {
        type_of(&self.action)
    }
}

fn type_of(value: &Value) -> Option<&str> {
    value.get("type").and_then(Value::as_str)
}

// ============================================================================
// Tests
// ============================================================================
