//! Decision engine benchmarks.
//!
//! Measures rule chain evaluation, default-chain fallback, and attribute
//! containment lookups over realistic request shapes.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use serde_json::{Value, json};
use warden_abac::{AccessRequest, AccessRule, Authorizer, ChainKind, contains, evaluate};

fn subject_with_groups(count: usize) -> Value {
    let groups: Vec<Value> = (0..count)
        .map(|i| json!({"key": format!("group::team{i}"), "type": "organization"}))
        .chain(std::iter::once(
            json!({"key": "group::modeadmin", "type": "organization"}),
        ))
        .collect();
    json!({"connections": {"memberOf": groups}})
}

fn person_request(groups: usize) -> AccessRequest {
    AccessRequest::new(
        json!({"type": "read"}),
        json!({"type": "person", "firstname": "John", "lastname": "Doe", "ssn": "123456789"}),
    )
    .with_subject(subject_with_groups(groups))
}

/// A chain of `len` rules where only the last one is applicable.
fn filtered_chain(len: usize) -> Vec<AccessRule> {
    let mut chain: Vec<AccessRule> = (0..len.saturating_sub(1))
        .map(|_| AccessRule::deny().with_filter(|rt, _| rt == Some("invoice")))
        .collect();
    chain.push(AccessRule::allow().with_filter(|rt, _| rt == Some("person")));
    chain
}

// ============================================================================
// Evaluation Benchmarks
// ============================================================================

fn bench_evaluate_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("evaluate_chain");
    let request = person_request(4);

    for len in [1, 8, 64, 256] {
        let chain = filtered_chain(len);
        group.bench_with_input(BenchmarkId::from_parameter(len), &chain, |b, chain| {
            b.iter(|| {
                let response =
                    evaluate(black_box(&request), Some(chain.as_slice()), ChainKind::Request);
                black_box(response.map(|r| r.effect))
            });
        });
    }

    group.finish();
}

fn bench_enforce_fallback(c: &mut Criterion) {
    let mut group = c.benchmark_group("enforce");

    let authz = Authorizer::new(vec![AccessRule::allow().when(|request, attrs| {
        request.subject.as_ref().is_some_and(|subject| {
            attrs.contains(
                subject,
                ["connections", "memberOf"],
                &json!({"key": "group::modeadmin"}),
            )
        })
    })])
    .without_decision_log();
    let request = person_request(16);
    let deny_chain = [AccessRule::deny()];
    let allow_chain = [AccessRule::allow().with_mapper(|resource| {
        let mut masked = resource.clone();
        masked["ssn"] = json!("6789");
        Ok(masked)
    })];

    group.bench_function("request_allow", |b| {
        b.iter(|| {
            let response = authz.enforce(black_box(&request), Some(&allow_chain));
            black_box(response.map(|r| r.effect))
        });
    });

    group.bench_function("fallback_to_default", |b| {
        b.iter(|| {
            let response = authz.enforce(black_box(&request), Some(&deny_chain));
            black_box(response.map(|r| r.effect))
        });
    });

    group.finish();
}

// ============================================================================
// Containment Benchmarks
// ============================================================================

fn bench_contains(c: &mut Criterion) {
    let mut group = c.benchmark_group("contains");
    let pattern = json!({"key": "group::modeadmin"});

    for groups in [1, 16, 256] {
        let subject = subject_with_groups(groups);
        group.bench_with_input(BenchmarkId::from_parameter(groups), &subject, |b, subject| {
            b.iter(|| {
                black_box(contains(
                    black_box(subject),
                    ["connections", "memberOf"],
                    black_box(&pattern),
                ))
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_evaluate_chain,
    bench_enforce_fallback,
    bench_contains
);
criterion_main!(benches);
