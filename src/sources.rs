// Source endpoint execution
//
// Two phases: collect every spec marked as a source, then run each once and
// capture its JSON response. Sources only see their own literal parameters;
// references resolve against captures later, in the consumer phase, and are
// never retried.

use crate::auth::{token_preview, AuthStrategy, BearerAuth};
use crate::capture::CaptureSet;
use crate::engine::{build_url, preview, ProbeEngine};
use crate::error::SourceError;
use crate::lifecycle::extract::{extract_identifier, DEFAULT_ID_RULES};
use crate::resolver::ParameterResolver;
use crate::spec::{ContextKey, EndpointSpec, SpecStore};
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use serde_json::{json, Value};

const TOKEN_FIELD: &str = "access_token";

pub struct SourceExecutor<'a> {
    engine: &'a ProbeEngine,
    token: Option<&'a str>,
}

impl<'a> SourceExecutor<'a> {
    pub fn new(engine: &'a ProbeEngine, token: Option<&'a str>) -> Self {
        Self { engine, token }
    }

    pub async fn execute_sources(&self, specs: &SpecStore) -> CaptureSet {
        let plan: Vec<&EndpointSpec> = specs.sources().collect();
        tracing::info!(sources = plan.len(), "executing source endpoints");

        let mut captures = CaptureSet::new();
        for spec in plan {
            if captures.contains(&spec.id) {
                continue;
            }
            let token = captures.context().access_token().or(self.token);
            match self.execute(spec, token).await {
                Ok(response) => {
                    tracing::info!(endpoint = %spec.id, "executed source");
                    tracing::debug!(endpoint = %spec.id, "response: {}", preview(&response.to_string(), 200));
                    publish_well_known(&mut captures, &response);
                    captures.insert(spec.id.clone(), response);
                }
                Err(e) => {
                    tracing::warn!(endpoint = %spec.id, error = %e, "source failed, dependents will omit its values");
                }
            }
        }
        captures
    }

    async fn execute(&self, spec: &EndpointSpec, token: Option<&str>) -> Result<Value, SourceError> {
        // an empty snapshot: only literal parameters resolve at this stage
        let snapshot = CaptureSet::new();
        let params = ParameterResolver::new(&snapshot).resolve_endpoint(spec);

        let url = build_url(&self.engine.base_url, &spec.id, params.path_params(), params.query()).map_err(|e| {
            SourceError::InvalidUrl {
                url: spec.id.clone(),
                reason: e.to_string(),
            }
        })?;
        tracing::debug!(method = %spec.method(), %url, "source request");

        let mut req = self
            .engine
            .client
            .request(spec.method().to_reqwest(), url)
            .timeout(self.engine.probe_timeout)
            .header("Accept", "application/json");
        req = BearerAuth::from_token(token).apply_auth(req);
        for (name, value) in params.headers() {
            req = req.header(name, value);
        }
        if let Some(body) = params.body() {
            req = req.header(CONTENT_TYPE, "application/json").body(body.to_string());
        }

        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        if status == StatusCode::NO_CONTENT || text.trim().is_empty() {
            return Ok(json!({}));
        }
        if !(status.is_success() || status.is_redirection()) {
            tracing::warn!(endpoint = %spec.id, status = status.as_u16(), "source returned an error status, capturing its body anyway");
        }
        serde_json::from_str(&text).map_err(|source| SourceError::Malformed {
            status: status.as_u16(),
            source,
        })
    }
}

/// Mirror well-known fields of a capture into the run context.
fn publish_well_known(captures: &mut CaptureSet, response: &Value) {
    if let Some(token) = response.get(TOKEN_FIELD).and_then(Value::as_str) {
        if captures.context_mut().publish(ContextKey::AccessToken, token.to_string()) {
            tracing::info!(token = %token_preview(token), "captured access token");
        }
    }
    if let Some(id) = extract_identifier(response, DEFAULT_ID_RULES) {
        if captures.context_mut().publish(ContextKey::ResourceId, id.clone()) {
            tracing::info!(resource_id = %id, "captured resource identifier");
        }
    }
}
