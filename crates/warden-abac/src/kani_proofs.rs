//! Kani proofs for rule chain evaluation
//!
//! These proofs verify the decision invariants of the rule-chain engine using
//! bounded model checking.
//!
//! **Proof Count**: 4 proofs (#1-4)
//!
//! Run with: `cargo kani --tests --harness verify_*`

#[cfg(kani)]
use crate::authorizer::Authorizer;
#[cfg(kani)]
use crate::request::AccessRequest;
#[cfg(kani)]
use crate::rule::{AccessRule, Effect};
#[cfg(kani)]
use serde_json::Value;

#[cfg(kani)]
fn any_effect() -> Effect {
    if kani::any() { Effect::Allow } else { Effect::Deny }
}

/// Proof #1: Default deny safety
///
/// **Property**: With no request chain and an empty default chain, every
/// request is denied and no resource is returned.
#[cfg(kani)]
#[kani::proof]
#[kani::unwind(4)]
fn verify_default_deny_safety() {
    let authz = Authorizer::default().without_decision_log();
    let request = AccessRequest::new(Value::Null, Value::Null);

    let response = authz.enforce(&request, None).unwrap();

    // Postcondition: deny, nothing matched, nothing returned
    assert_eq!(response.effect, Effect::Deny);
    assert!(response.matched_rule.is_none());
    assert!(response.resource.is_none());
}

/// Proof #2: First match wins
///
/// **Property**: When two unconditional rules are both applicable, the
/// earlier one decides, whatever the effects.
#[cfg(kani)]
#[kani::proof]
#[kani::unwind(4)]
fn verify_first_match_wins() {
    let first = any_effect();
    let second = any_effect();
    let chain = [AccessRule::new(first), AccessRule::new(second)];
    let request = AccessRequest::new(Value::Null, Value::Null);

    let response = crate::evaluator::evaluate(&request, Some(&chain), crate::ChainKind::Request).unwrap();

    // Postcondition: the effect and the matched rule come from the first rule
    assert_eq!(response.effect, first);
    assert!(core::ptr::eq(response.matched_rule.unwrap(), &chain[0]));
}

/// Proof #3: Resource present iff allowed
///
/// **Property**: The response carries a resource exactly when the effect is
/// `Allow`.
#[cfg(kani)]
#[kani::proof]
#[kani::unwind(4)]
fn verify_resource_iff_allow() {
    let effect = any_effect();
    let chain = [AccessRule::new(effect)];
    let request = AccessRequest::new(Value::Null, Value::Bool(kani::any()));

    let response = crate::evaluator::evaluate(&request, Some(&chain), crate::ChainKind::Request).unwrap();

    assert_eq!(response.resource.is_some(), response.effect == Effect::Allow);
}

/// Proof #4: Fallback replaces a request deny
///
/// **Property**: When the request chain denies, the final effect equals the
/// default chain's effect.
#[cfg(kani)]
#[kani::proof]
#[kani::unwind(4)]
fn verify_fallback_replaces_deny() {
    let baseline = any_effect();
    let authz = Authorizer::new(vec![AccessRule::new(baseline)]).without_decision_log();
    let chain = [AccessRule::deny()];
    let request = AccessRequest::new(Value::Null, Value::Null);

    let response = authz.enforce(&request, Some(&chain)).unwrap();

    assert_eq!(response.effect, baseline);
    assert!(core::ptr::eq(
        response.matched_rule.unwrap(),
        &authz.default_chain()[0]
    ));
}
