/// Integration tests for the probe engine
/// One result per (endpoint, method) pair, request building and classification
mod common;

use chainprobe::capture::CaptureSet;
use chainprobe::catalog::EndpointCatalog;
use chainprobe::engine::ProbeEngine;
use chainprobe::models::{Method, StatusExpectation, TestCase, TRANSPORT_FAILURE};
use chainprobe::resolver::{ParameterResolver, ResolvedParameterSet};
use chainprobe::spec::{EndpointSpec, ParamSpec, SpecStore};
use common::{refused_base_url, reply, spawn_stub};
use serde_json::{json, Value};
use std::thread;
use std::time::Duration;

fn engine(base_url: &str) -> ProbeEngine {
    ProbeEngine::new(base_url, Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn one_result_per_pair_when_connection_is_refused() {
    let base_url = refused_base_url();
    let catalog: EndpointCatalog = vec![
        ("/accounts", vec![Method::GET, Method::POST]),
        ("/accounts/{id}", vec![Method::GET, Method::DELETE]),
        ("/health", vec![Method::HEAD]),
    ]
    .into_iter()
    .collect();

    let results = engine(&base_url)
        .probe_all(&catalog, &ResolvedParameterSet::default(), Some("tok"))
        .await;

    assert_eq!(results.len(), catalog.pair_count());
    assert_eq!(results.len(), 5);
    for result in &results {
        assert_eq!(result.status, TRANSPORT_FAILURE);
        assert!(!result.success);
        assert!(result.label.as_deref().unwrap_or("").starts_with("ERROR"));
    }
    let methods: Vec<&str> = results.iter().map(|r| r.method.as_str()).collect();
    assert_eq!(methods, vec!["GET", "POST", "GET", "DELETE", "HEAD"]);
}

#[tokio::test]
async fn resolved_parameters_shape_the_request() {
    let server = spawn_stub(|_| reply(200, "{}"));

    let mut captures = CaptureSet::new();
    captures.insert("/accounts", json!({"data": [{"id": "acc-1"}]}));
    let mut spec = EndpointSpec::new("/accounts/{account_id}/transfers");
    spec.path_params.insert("account_id".into(), ParamSpec::reference("/accounts", "/data/0/id"));
    spec.query.insert("limit".into(), ParamSpec::literal(5));
    spec.query.insert("note".into(), ParamSpec::literal("a b&c"));
    spec.headers.insert("X-Trace".into(), ParamSpec::literal("trace-1"));
    spec.body.insert("amount".into(), ParamSpec::literal(json!({"value": "10.00"})));
    let store = SpecStore::from_specs(vec![spec]);
    let resolved = ParameterResolver::new(&captures).resolve_all(&store);

    let catalog: EndpointCatalog = vec![("/accounts/{account_id}/transfers", vec![Method::POST])]
        .into_iter()
        .collect();
    let results = engine(&server.base_url).probe_all(&catalog, &resolved, Some("tok")).await;

    assert_eq!(results.len(), 1);
    assert!(results[0].success);
    assert!(results[0].url.contains("/accounts/acc-1/transfers?limit=5&note=a+b%26c"));

    let seen = &server.requests()[0];
    assert_eq!(seen.method, "POST");
    assert_eq!(seen.path(), "/accounts/acc-1/transfers");
    assert_eq!(seen.header("Authorization"), Some("Bearer tok"));
    assert_eq!(seen.header("X-Trace"), Some("trace-1"));
    assert_eq!(seen.header("Content-Type"), Some("application/json"));
    let body: Value = serde_json::from_str(&seen.body).unwrap();
    assert_eq!(body, json!({"amount": {"value": "10.00"}}));
}

#[tokio::test]
async fn no_token_means_no_authorization_header() {
    let server = spawn_stub(|_| reply(200, "{}"));
    let catalog: EndpointCatalog = vec![("/open", vec![Method::GET])].into_iter().collect();

    engine(&server.base_url)
        .probe_all(&catalog, &ResolvedParameterSet::default(), None)
        .await;

    assert_eq!(server.requests()[0].header("Authorization"), None);
    assert_eq!(server.requests()[0].query(), None);
}

#[tokio::test]
async fn success_is_200_to_399() {
    let server = spawn_stub(|req| match req.path() {
        "/ok" => reply(200, "{}"),
        "/moved" => reply(302, ""),
        "/missing" => reply(404, "{}"),
        _ => reply(500, "{}"),
    });
    let catalog: EndpointCatalog = vec![
        ("/ok", vec![Method::GET]),
        ("/moved", vec![Method::GET]),
        ("/missing", vec![Method::GET]),
        ("/boom", vec![Method::GET]),
    ]
    .into_iter()
    .collect();

    let results = engine(&server.base_url)
        .probe_all(&catalog, &ResolvedParameterSet::default(), None)
        .await;

    let outcome: Vec<(i32, bool)> = results.iter().map(|r| (r.status, r.success)).collect();
    assert_eq!(outcome, vec![(200, true), (302, true), (404, false), (500, false)]);
}

#[tokio::test]
async fn test_calls_use_their_own_timeout() {
    let server = spawn_stub(|_| {
        thread::sleep(Duration::from_millis(1500));
        reply(201, r#"{"consent_id":"c-1"}"#)
    });
    let engine = ProbeEngine::new(&server.base_url, Duration::from_secs(1)).unwrap();

    let probe = engine
        .probe("/slow", Method::GET, &Default::default(), None)
        .await;
    assert_eq!(probe.status, TRANSPORT_FAILURE);

    let case = TestCase {
        name: "slow create".to_string(),
        method: Method::POST,
        url: format!("{}/slow", server.base_url),
        headers: Vec::new(),
        body: Some("{}".to_string()),
        expect: StatusExpectation::SUCCESS,
    };
    let response = engine.run_case(&case, Duration::from_secs(5)).await;
    assert_eq!(response.result.status, 201);
    assert!(response.result.success);
}
