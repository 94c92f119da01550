//! Decision enforcement with default-chain fallback.
//!
//! The [`Authorizer`] owns a default rule chain. Every call to
//! [`Authorizer::enforce`] first evaluates the chain supplied with the
//! request; only when that yields `Deny` is the default chain evaluated, and
//! its result replaces the first one entirely.

use serde_json::Value;
use tracing::info;

use crate::containment::{AttributePath, Containment};
use crate::evaluator::{self, AccessResponse, ChainKind, Result};
use crate::request::AccessRequest;
use crate::rule::AccessRule;

/// Name used in decision logs when none is configured.
pub const DEFAULT_AUTHORIZER_NAME: &str = "default";

/// Decision engine holding the process-wide default chain.
///
/// Immutable after construction, so one instance can serve concurrent
/// `enforce` calls.
#[derive(Debug, Clone)]
pub struct Authorizer {
    /// Fallback chain, in priority order.
    default_chain: Vec<AccessRule>,

    /// Label attached to decision log events.
    name: String,

    /// Whether to log each decision.
    decision_log: bool,
}

impl Default for Authorizer {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl Authorizer {
    /// Creates an authorizer with the given default chain.
    ///
    /// An empty chain makes default-deny the baseline.
    pub fn new(default_chain: impl Into<Vec<AccessRule>>) -> Self {
        Self {
            default_chain: default_chain.into(),
            name: DEFAULT_AUTHORIZER_NAME.to_string(),
            decision_log: true,
        }
    }

    /// Sets the name attached to decision log events.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Disables decision logging (for testing and hot paths).
    pub fn without_decision_log(mut self) -> Self {
        self.decision_log = false;
        self
    }

    /// Evaluates `request` against `policy_chain`, falling back to the
    /// default chain when the request chain does not allow.
    ///
    /// - Request chain allows: that response is returned and the default
    ///   chain is never consulted.
    /// - Request chain denies (explicit deny, no match, absent or empty
    ///   chain): the default chain's response is returned, even if it also
    ///   denies.
    ///
    /// # Errors
    ///
    /// Propagates [`EvaluationError`](crate::EvaluationError) from a failing
    /// matcher or mapper. A failure in the request chain stops evaluation
    /// before the default chain runs.
    ///
    /// # Examples
    ///
    /// ```
    /// use serde_json::json;
    /// use warden_abac::{AccessRequest, AccessRule, Authorizer, Effect};
    ///
    /// let authz = Authorizer::new(vec![AccessRule::allow()]).without_decision_log();
    /// let request = AccessRequest::new(json!({"type": "read"}), json!({"type": "person"}));
    ///
    /// // The request chain denies, so the default chain decides.
    /// let chain = [AccessRule::deny()];
    /// let response = authz.enforce(&request, Some(&chain)).unwrap();
    /// assert_eq!(response.effect, Effect::Allow);
    /// ```
    pub fn enforce<'a>(
        &'a self,
        request: &'a AccessRequest,
        policy_chain: Option<&'a [AccessRule]>,
    ) -> Result<AccessResponse<'a>> {
        let response = evaluator::evaluate(request, policy_chain, ChainKind::Request)?;
        if response.is_allowed() {
            self.log_decision(request, &response, ChainKind::Request);
            return Ok(response);
        }

        let response = evaluator::evaluate(request, Some(&self.default_chain), ChainKind::Default)?;
        self.log_decision(request, &response, ChainKind::Default);
        Ok(response)
    }

    /// Returns the containment handle given to matchers.
    pub fn containment(&self) -> Containment {
        Containment
    }

    /// Shorthand for [`contains`](crate::containment::contains).
    pub fn contains(&self, object: &Value, path: impl Into<AttributePath>, pattern: &Value) -> bool {
        self.containment().contains(object, path, pattern)
    }

    /// Returns the default chain.
    pub fn default_chain(&self) -> &[AccessRule] {
        &self.default_chain
    }

    /// Returns the authorizer's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns whether decisions are logged.
    pub fn logs_decisions(&self) -> bool {
        self.decision_log
    }

    fn log_decision(&self, request: &AccessRequest, response: &AccessResponse<'_>, chain: ChainKind) {
        if !self.decision_log {
            return;
        }

        let rule = response
            .matched_rule_label()
            .unwrap_or_else(|| "<none>".to_string());
        let outcome = if response.is_allowed() { "granted" } else { "denied" };

        info!(
            authorizer = %self.name,
            resource_type = ?request.resource_type(),
            action_type = ?request.action_type(),
            rule = %rule,
            chain = %chain,
            effect = %response.effect,
            "Access {outcome}"
        );
    }
}
