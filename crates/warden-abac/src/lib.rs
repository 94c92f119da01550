//! # warden-abac: Attribute-Based Access Control
//!
//! Decides whether a subject may perform an action on a resource, and hands
//! back the resource (possibly transformed) when it may.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  Access Request                              │
//! │  (Subject + Action + Resource + Environment) │
//! └─────────────────┬───────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  Authorizer::enforce                         │
//! │  ├─ Evaluate the request-scoped chain        │
//! │  └─ On deny, evaluate the default chain      │
//! └─────────────────┬───────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  Rule Chain Evaluator                        │
//! │  ├─ Filter by (resource.type, action.type)   │
//! │  ├─ First matching rule wins                 │
//! │  └─ Map the resource on allow                │
//! └─────────────────┬───────────────────────────┘
//!                   │
//!                   ▼
//! ┌─────────────────────────────────────────────┐
//! │  AccessResponse                              │
//! │  - Effect (Allow/Deny)                       │
//! │  - Matched rule                              │
//! │  - Resource (allow only)                     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Examples
//!
//! ```
//! use serde_json::json;
//! use warden_abac::{AccessRequest, AccessRule, Authorizer, Effect};
//!
//! // Baseline: members of group::modeadmin may do anything.
//! let authz = Authorizer::new(vec![
//!     AccessRule::allow()
//!         .named("allow-mode-admin")
//!         .when(|request, attrs| {
//!             request.subject.as_ref().is_some_and(|subject| {
//!                 attrs.contains(
//!                     subject,
//!                     ["connections", "memberOf"],
//!                     &json!({"key": "group::modeadmin"}),
//!                 )
//!             })
//!         }),
//! ])
//! .without_decision_log();
//!
//! let request = AccessRequest::new(json!({"type": "read"}), json!({"type": "person"}))
//!     .with_subject(json!({
//!         "connections": {"memberOf": [{"key": "group::modeadmin", "type": "organization"}]}
//!     }));
//!
//! // No request-scoped chain: the default chain decides.
//! let response = authz.enforce(&request, None)?;
//! assert_eq!(response.effect, Effect::Allow);
//! assert_eq!(response.matched_rule_name(), Some("allow-mode-admin"));
//! # Ok::<(), warden_abac::EvaluationError>(())
//! ```

pub mod authorizer;
pub mod containment;
pub mod evaluator;
pub mod request;
pub mod rule;


// Kani proofs for bounded model checking
#[cfg(any(test, kani))]
mod kani_proofs;

pub use authorizer::Authorizer;
pub use containment::{AttributePath, Containment, PathSegment, contains};
pub use evaluator::{AccessResponse, ChainKind, EvaluationError, evaluate};
pub use request::AccessRequest;
pub use rule::{AccessRule, Effect, Filter, Mapper, Matcher, RuleError};
