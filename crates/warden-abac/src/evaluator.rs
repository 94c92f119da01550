//! Rule chain evaluation.
//!
//! Evaluates a request against one ordered chain of rules:
//!
//! 1. Keep the rules whose filter accepts `(resource.type, action.type)`.
//! 2. Walk them in chain order; the first rule whose matcher passes wins.
//! 3. If nothing fires, the decision is `Deny` with no matched rule.
//! 4. On `Allow`, the resource is returned, through the winning rule's mapper
//!    when it has one.

use std::borrow::Cow;
use std::fmt;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, trace};

use crate::containment::Containment;
use crate::request::AccessRequest;
use crate::rule::{AccessRule, Effect, RuleError};

// ============================================================================
// Chain Kind
// ============================================================================

/// Which chain a decision or error came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChainKind {
    /// The chain supplied with the request.
    Request,
    /// The authorizer's default chain.
    Default,
}

impl fmt::Display for ChainKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request => f.write_str("request"),
            Self::Default => f.write_str("default"),
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

/// A caller-supplied callback failed during evaluation.
///
/// The failure is never turned into a decision.
#[derive(Debug, Error)]
pub enum EvaluationError {
    /// A rule's matcher returned an error.
    #[error("Matcher of rule '{rule}' in the {chain} chain failed: {source}")]
    MatcherFailed {
        rule: String,
        chain: ChainKind,
        #[source]
        source: RuleError,
    },

    /// A rule's mapper returned an error.
    #[error("Mapper of rule '{rule}' in the {chain} chain failed: {source}")]
    MapperFailed {
        rule: String,
        chain: ChainKind,
        #[source]
        source: RuleError,
    },
}

/// Result type for evaluation.
pub type Result<T> = std::result::Result<T, EvaluationError>;

// ============================================================================
// AccessResponse
// ============================================================================

/// The result of evaluating a request.
///
/// Borrows from the request and from the chain that produced it.
#[derive(Debug, Clone)]
pub struct AccessResponse<'a> {
    /// Whether access is allowed or denied.
    pub effect: Effect,
    /// The rule that fired, or `None` if no rule fired.
    pub matched_rule: Option<&'a AccessRule>,
    /// Position of `matched_rule` in its chain.
    pub matched_position: Option<usize>,
    /// The resource to hand back. Present iff `effect` is `Allow`; borrowed
    /// when the matched rule has no mapper.
    pub resource: Option<Cow<'a, Value>>,
}

impl<'a> AccessResponse<'a> {
    /// A deny with no matched rule.
    pub fn default_deny() -> Self {
        Self {
            effect: Effect::Deny,
            matched_rule: None,
            matched_position: None,
            resource: None,
        }
    }

    /// Returns `true` if access is allowed.
    pub fn is_allowed(&self) -> bool {
        self.effect.is_allow()
    }

    /// Name of the matched rule, if it fired and is named.
    pub fn matched_rule_name(&self) -> Option<&'a str> {
        self.matched_rule.and_then(|rule| rule.name.as_deref())
    }

    /// Label of the matched rule: its name, or `#<position>` when anonymous.
    ///
    /// Same label as [`EvaluationError`] uses for a failing rule.
    pub fn matched_rule_label(&self) -> Option<String> {
        self.matched_rule
            .zip(self.matched_position)
            .map(|(rule, position)| rule.label(position))
    }

    /// Takes ownership of the returned resource, cloning it if borrowed.
    pub fn into_resource(self) -> Option<Value> {
        self.resource.map(Cow::into_owned)
    }
}

// ============================================================================
// Public API
// ============================================================================

/// Evaluates `request` against `chain`.
///
/// An absent or empty chain yields [`AccessResponse::default_deny`].
///
/// # Errors
///
/// Returns [`EvaluationError`] when a matcher of an applicable rule, or the
/// mapper of the winning `Allow` rule, fails. Rules after the winning rule
/// are never consulted.
pub fn evaluate<'a>(
    request: &'a AccessRequest,
    chain: Option<&'a [AccessRule]>,
    kind: ChainKind,
) -> Result<AccessResponse<'a>> {
    let rules = chain.unwrap_or_default();
    if rules.is_empty() {
        trace!(chain = %kind, "Empty rule chain; default deny");
        return Ok(AccessResponse::default_deny());
    }

    let resource_type = request.resource_type();
    let action_type = request.action_type();

    // Filters run over the whole chain before any matcher.
    let applicable: Vec<(usize, &'a AccessRule)> = rules
        .iter()
        .enumerate()
        .filter(|(_, rule)| rule.is_applicable(resource_type, action_type))
        .collect();

    debug!(
        chain = %kind,
        rules = rules.len(),
        applicable = applicable.len(),
        resource_type = ?resource_type,
        action_type = ?action_type,
        "Evaluating rule chain"
    );

    let containment = Containment;
    let mut matched = None;
    for (position, rule) in applicable {
        let fired = rule
            .matches(request, &containment)
            .map_err(|source| EvaluationError::MatcherFailed {
                rule: rule.label(position),
                chain: kind,
                source,
            })?;

        if fired {
            trace!(chain = %kind, rule = %rule.label(position), effect = %rule.effect, "Rule fired");
            matched = Some((position, rule));
            break;
        }
    }

    let Some((position, rule)) = matched else {
        return Ok(AccessResponse::default_deny());
    };

    let resource = match (rule.effect, &rule.mapper) {
        (Effect::Deny, _) => None,
        (Effect::Allow, None) => Some(Cow::Borrowed(&request.resource)),
        (Effect::Allow, Some(mapper)) => {
            let mapped = mapper(&request.resource).map_err(|source| {
                EvaluationError::MapperFailed {
                    rule: rule.label(position),
                    chain: kind,
                    source,
                }
            })?;
            Some(Cow::Owned(mapped))
        }
    };

    Ok(AccessResponse {
        effect: rule.effect,
        matched_rule: Some(rule),
        matched_position: Some(position),
        resource,
    })
}

// ============================================================================
// Tests
// ============================================================================
