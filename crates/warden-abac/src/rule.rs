//! Access rules.
//!
//! A rule is a capability record: an [`Effect`] plus three optional
//! callbacks. Absence of a callback means "pass":
//!
//! | Callback  | Absent means                  | Runs                          |
//! |-----------|-------------------------------|-------------------------------|
//! | `filter`  | applicable to every request   | on `(resource.type, action.type)` |
//! | `matcher` | fires once applicable         | on the full request           |
//! | `mapper`  | resource passes through as-is | only when an `Allow` rule fires |
//!
//! So `AccessRule::allow()` allows everything and `AccessRule::deny()` denies
//! everything.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::containment::Containment;
use crate::request::AccessRequest;

// ============================================================================
// Effect
// ============================================================================

/// The effect of a rule: allow or deny access.
///
/// Defaults to `Deny`: access is refused unless a rule allows it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    /// Grant access.
    Allow,
    /// Deny access.
    #[default]
    Deny,
}

impl Effect {
    /// Returns `true` for [`Effect::Allow`].
    pub fn is_allow(self) -> bool {
        matches!(self, Self::Allow)
    }

    /// Returns `true` for [`Effect::Deny`].
    pub fn is_deny(self) -> bool {
        matches!(self, Self::Deny)
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allow => f.write_str("allow"),
            Self::Deny => f.write_str("deny"),
        }
    }
}

// ============================================================================
// Callbacks
// ============================================================================

/// Error returned by a failing matcher or mapper.
pub type RuleError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Applicability check over `(resource_type, action_type)`.
pub type Filter = Arc<dyn Fn(Option<&str>, Option<&str>) -> bool + Send + Sync>;

/// Decides whether an applicable rule fires for a request.
pub type Matcher =
    Arc<dyn Fn(&AccessRequest, &Containment) -> Result<bool, RuleError> + Send + Sync>;

/// Transforms the resource returned by an `Allow` rule.
pub type Mapper = Arc<dyn Fn(&Value) -> Result<Value, RuleError> + Send + Sync>;

// ============================================================================
// AccessRule
// ============================================================================

/// A single rule within a rule chain.
///
/// Chains are plain slices: position is priority, and the first applicable
/// rule whose matcher passes decides. Cloning a rule is cheap (callbacks are
/// reference counted).
#[derive(Clone, Default)]
pub struct AccessRule {
    /// Optional name for decision logs and error messages.
    pub name: Option<String>,
    /// The effect when this rule fires.
    pub effect: Effect,
    /// Applicability check. `None` = always applicable.
    pub filter: Option<Filter>,
    /// Firing check. `None` = always fires.
    pub matcher: Option<Matcher>,
    /// Resource transform for `Allow` decisions. `None` = pass-through.
    pub mapper: Option<Mapper>,
}

impl AccessRule {
    /// Creates an unconditional rule with the given effect.
    pub fn new(effect: Effect) -> Self {
        Self {
            name: None,
            effect,
            filter: None,
            matcher: None,
            mapper: None,
        }
    }

    /// An unconditional `Allow` rule.
    pub fn allow() -> Self {
        Self::new(Effect::Allow)
    }

    /// An unconditional `Deny` rule.
    pub fn deny() -> Self {
        Self::new(Effect::Deny)
    }

    /// Sets the rule name (builder pattern).
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the applicability filter.
    pub fn with_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(Option<&str>, Option<&str>) -> bool + Send + Sync + 'static,
    {
        self.filter = Some(Arc::new(filter));
        self
    }

    /// Sets a fallible matcher.
    pub fn with_matcher<F>(mut self, matcher: F) -> Self
    where
        F: Fn(&AccessRequest, &Containment) -> Result<bool, RuleError> + Send + Sync + 'static,
    {
        self.matcher = Some(Arc::new(matcher));
        self
    }

    /// Sets an infallible matcher.
    pub fn when<F>(self, predicate: F) -> Self
    where
        F: Fn(&AccessRequest, &Containment) -> bool + Send + Sync + 'static,
    {
        self.with_matcher(move |request, containment| Ok(predicate(request, containment)))
    }

    /// Sets a fallible mapper.
    pub fn with_mapper<F>(mut self, mapper: F) -> Self
    where
        F: Fn(&Value) -> Result<Value, RuleError> + Send + Sync + 'static,
    {
        self.mapper = Some(Arc::new(mapper));
        self
    }

    /// Sets a shared mapper, e.g. one built by a masking policy.
    pub fn with_shared_mapper(mut self, mapper: Mapper) -> Self {
        self.mapper = Some(mapper);
        self
    }

    /// Returns `true` if this rule applies to the given types.
    pub fn is_applicable(&self, resource_type: Option<&str>, action_type: Option<&str>) -> bool {
        self.filter
            .as_ref()
            .is_none_or(|filter| filter(resource_type, action_type))
    }

    /// Returns `Ok(true)` if this rule fires for the request.
    pub fn matches(
        &self,
        request: &AccessRequest,
        containment: &Containment,
    ) -> Result<bool, RuleError> {
        match &self.matcher {
            Some(matcher) => matcher(request, containment),
            None => Ok(true),
        }
    }

    /// Label used in logs: the name, or `#<position>` for anonymous rules.
    pub(crate) fn label(&self, position: usize) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("#{position}"),
        }
    }
}

impl fmt::Debug for AccessRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccessRule")
            .field("name", &self.name)
            .field("effect", &self.effect)
            .field("filter", &self.filter.is_some())
            .field("matcher", &self.matcher.is_some())
            .field("mapper", &self.mapper.is_some())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================
