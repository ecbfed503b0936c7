/// Integration tests for source execution and dependent parameter resolution
mod common;

use chainprobe::engine::ProbeEngine;
use chainprobe::error::ConfigError;
use chainprobe::resolver::ParameterResolver;
use chainprobe::sources::SourceExecutor;
use chainprobe::spec::SpecStore;
use common::{refused_base_url, reply, spawn_stub};
use serde_json::json;
use std::io::Write;
use std::time::Duration;

fn engine(base_url: &str) -> ProbeEngine {
    ProbeEngine::new(base_url, Duration::from_secs(5)).unwrap()
}

fn specs(doc: &str) -> SpecStore {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(doc.as_bytes()).unwrap();
    SpecStore::load(file.path()).unwrap()
}

#[tokio::test]
async fn sources_feed_dependent_parameters() {
    let server = spawn_stub(|req| match (req.method.as_str(), req.path()) {
        ("POST", "/auth/bank-token") => reply(200, r#"{"access_token":"tok-xyz","token_type":"bearer"}"#),
        ("GET", "/accounts") if req.header("Authorization") == Some("Bearer tok-xyz") => {
            reply(200, r#"{"data":[{"id":"acc-1","currency":"RUB"}]}"#)
        }
        _ => reply(401, r#"{"error":"unauthorized"}"#),
    });
    let store = specs(
        r#"{
            "/auth/bank-token": {
                "method": "POST",
                "source": true,
                "query": { "client_id": { "value": "team1" } }
            },
            "/accounts": { "saveResponse": { "accounts": { "jsonPointer": "/data" } } },
            "/accounts/{account_id}/balances": {
                "pathParams": { "account_id": { "from": "/accounts", "jsonPointer": "/data/0/id" } },
                "headers": { "X-Token-Echo": { "context": "accessToken" } },
                "query": { "currency": { "from": "/accounts", "pointer": "/data/0/currency" } }
            }
        }"#,
    );
    let engine = engine(&server.base_url);

    let captures = SourceExecutor::new(&engine, None).execute_sources(&store).await;

    assert_eq!(captures.len(), 2);
    assert_eq!(captures.context().access_token(), Some("tok-xyz"));
    assert_eq!(server.requests_to("/auth/bank-token")[0].query(), Some("client_id=team1"));

    let resolved = ParameterResolver::new(&captures).resolve_all(&store);
    let flat = resolved.get("/accounts/{account_id}/balances").unwrap().to_namespaced();
    assert_eq!(flat.get("account_id").map(String::as_str), Some("acc-1"));
    assert_eq!(flat.get("query:currency").map(String::as_str), Some("RUB"));
    assert_eq!(flat.get("header:X-Token-Echo").map(String::as_str), Some("tok-xyz"));
}

#[tokio::test]
async fn no_content_is_captured_as_empty_object() {
    let server = spawn_stub(|_| reply(204, ""));
    let store = specs(r#"{ "/ping": { "method": "POST", "source": true } }"#);

    let captures = SourceExecutor::new(&engine(&server.base_url), Some("tok")).execute_sources(&store).await;

    assert_eq!(captures.get("/ping"), Some(&json!({})));
    assert_eq!(server.requests()[0].header("Authorization"), Some("Bearer tok"));
}

#[tokio::test]
async fn malformed_source_is_omitted_and_the_run_continues() {
    let server = spawn_stub(|req| match req.path() {
        "/broken" => reply(200, "<html>not json</html>"),
        _ => reply(200, r#"{"consent_id":"c-42"}"#),
    });
    let store = specs(
        r#"{
            "/broken": { "source": true },
            "/consents": { "source": true },
            "/uses-broken": { "query": { "x": { "from": "/broken", "pointer": "/x" } } }
        }"#,
    );

    let captures = SourceExecutor::new(&engine(&server.base_url), None).execute_sources(&store).await;

    assert!(!captures.contains("/broken"));
    assert!(captures.contains("/consents"));
    assert_eq!(captures.context().resource_id(), Some("c-42"));
    let resolved = ParameterResolver::new(&captures).resolve_all(&store);
    assert!(resolved.get("/uses-broken").unwrap().is_empty());
}

#[tokio::test]
async fn forward_references_stay_absent_and_sources_run_once() {
    let server = spawn_stub(|req| match req.path() {
        "/ids" => reply(200, r#"{"id":"i-1"}"#),
        _ => reply(200, r#"{"ok":true}"#),
    });
    // the first source references the second; at sourcing time only literals resolve
    let store = specs(
        r#"{
            "/items/{id}": {
                "source": true,
                "pathParams": { "id": { "from": "/ids", "pointer": "/id" } }
            },
            "/ids": { "source": true }
        }"#,
    );

    let captures = SourceExecutor::new(&engine(&server.base_url), None).execute_sources(&store).await;

    let paths: Vec<String> = server.requests().iter().map(|r| r.path().to_string()).collect();
    assert_eq!(paths, vec!["/items/%7Bid%7D".to_string(), "/ids".to_string()]);
    assert!(captures.contains("/items/{id}"));
    assert!(captures.contains("/ids"));
}

#[tokio::test]
async fn unreachable_sources_yield_empty_captures() {
    let store = specs(r#"{ "/auth": { "source": true }, "/data": { "source": true } }"#);

    let captures = SourceExecutor::new(&engine(&refused_base_url()), None)
        .execute_sources(&store)
        .await;

    assert!(captures.is_empty());
    assert_eq!(captures.context().access_token(), None);
}

#[test]
fn missing_spec_file_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let result = SpecStore::load(dir.path().join("endpoint-data.json"));
    assert!(matches!(result, Err(ConfigError::Read { .. })));
}
