#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use serde_json::{Value, json};
use warden_abac::{AccessRequest, AccessResponse, AccessRule, Authorizer, Effect};

const RESOURCE_TYPES: [&str; 3] = ["person", "invoice", "group"];
const ACTION_TYPES: [&str; 3] = ["read", "write", "delete"];

// ============================================================================
// Arbitrary Implementations
// ============================================================================

#[derive(Debug, Clone, Copy, Arbitrary)]
enum FuzzEffect {
    Allow,
    Deny,
}

impl From<FuzzEffect> for Effect {
    fn from(f: FuzzEffect) -> Self {
        match f {
            FuzzEffect::Allow => Effect::Allow,
            FuzzEffect::Deny => Effect::Deny,
        }
    }
}

/// Fuzzer-friendly rule: an optional type filter, a fixed matcher outcome,
/// and an optional tagging mapper.
#[derive(Debug, Clone, Arbitrary)]
struct FuzzRule {
    effect: FuzzEffect,
    resource_type: Option<u8>,
    action_type: Option<u8>,
    fires: bool,
    tags_resource: bool,
}

impl FuzzRule {
    fn to_rule(&self, name: String) -> AccessRule {
        let mut rule = AccessRule::new(self.effect.into()).named(name);

        if self.resource_type.is_some() || self.action_type.is_some() {
            let wanted_rt = self.resource_type.map(|i| RESOURCE_TYPES[usize::from(i) % 3]);
            let wanted_at = self.action_type.map(|i| ACTION_TYPES[usize::from(i) % 3]);
            rule = rule.with_filter(move |rt, at| {
                wanted_rt.is_none_or(|w| rt == Some(w)) && wanted_at.is_none_or(|w| at == Some(w))
            });
        }

        let fires = self.fires;
        rule = rule.when(move |_, _| fires);

        if self.tags_resource {
            rule = rule.with_mapper(|resource| {
                let mut tagged = resource.clone();
                tagged["masked"] = Value::Bool(true);
                Ok(tagged)
            });
        }

        rule
    }

    fn decides(&self, rt: &str, at: &str) -> bool {
        let rt_ok = self
            .resource_type
            .is_none_or(|i| RESOURCE_TYPES[usize::from(i) % 3] == rt);
        let at_ok = self
            .action_type
            .is_none_or(|i| ACTION_TYPES[usize::from(i) % 3] == at);
        rt_ok && at_ok && self.fires
    }
}

#[derive(Debug, Clone, Arbitrary)]
struct FuzzInput {
    request_chain: Option<Vec<FuzzRule>>,
    default_chain: Vec<FuzzRule>,
    resource_type: u8,
    action_type: u8,
}

fuzz_target!(|input: FuzzInput| {
    let rt = RESOURCE_TYPES[usize::from(input.resource_type) % 3];
    let at = ACTION_TYPES[usize::from(input.action_type) % 3];

    let request_rules: Option<Vec<AccessRule>> = input.request_chain.as_ref().map(|chain| {
        chain
            .iter()
            .enumerate()
            .map(|(i, rule)| rule.to_rule(format!("request-{i}")))
            .collect()
    });
    let default_rules: Vec<AccessRule> = input
        .default_chain
        .iter()
        .enumerate()
        .map(|(i, rule)| rule.to_rule(format!("default-{i}")))
        .collect();

    let authz = Authorizer::new(default_rules).without_decision_log();
    let request = AccessRequest::new(json!({"type": at}), json!({"type": rt, "id": 7}));

    // Matchers and mappers here never fail
    let response = authz
        .enforce(&request, request_rules.as_deref())
        .expect("infallible callbacks cannot fail evaluation");

    validate_chain_invariants(&input, rt, at, &request, &response);
});

/// Validates rule chain invariants against a reference model.
///
/// **Invariants checked:**
/// 1. The first deciding rule of the request chain wins if it allows
/// 2. Otherwise the first deciding rule of the default chain decides
/// 3. No deciding rule anywhere means deny with no matched rule
/// 4. A resource is returned iff the effect is Allow
/// 5. The resource is mapped iff the winning rule has a mapper
fn validate_chain_invariants(
    input: &FuzzInput,
    rt: &str,
    at: &str,
    request: &AccessRequest,
    response: &AccessResponse<'_>,
) {
    let first = |chain: &[FuzzRule]| chain.iter().position(|rule| rule.decides(rt, at));

    let request_winner = input
        .request_chain
        .as_deref()
        .and_then(|chain| first(chain).map(|i| (format!("request-{i}"), &chain[i])))
        .filter(|(_, rule)| matches!(rule.effect, FuzzEffect::Allow));
    let expected = request_winner.or_else(|| {
        first(&input.default_chain).map(|i| (format!("default-{i}"), &input.default_chain[i]))
    });

    match expected {
        // Invariants 1 and 2
        Some((name, rule)) => {
            assert_eq!(response.matched_rule_name(), Some(name.as_str()));
            assert_eq!(response.effect, Effect::from(rule.effect));

            if response.is_allowed() {
                // Invariant 5
                let resource = response.resource.as_deref().expect("allow carries a resource");
                assert_eq!(resource["masked"] == Value::Bool(true), rule.tags_resource);
                assert_eq!(resource["id"], request.resource["id"]);
            }
        }
        // Invariant 3
        None => {
            assert_eq!(response.effect, Effect::Deny);
            assert!(response.matched_rule.is_none());
        }
    }

    // Invariant 4
    assert_eq!(response.resource.is_some(), response.is_allowed());
}
