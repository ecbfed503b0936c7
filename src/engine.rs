// HTTP engine for chainprobe
// One reqwest client shared by sources, generic probes, the battery and the lifecycle test.
// Calls are awaited one at a time; every call ends in a ProbeResult, never an Err.

use crate::auth::{AuthStrategy, BearerAuth};
use crate::catalog::EndpointCatalog;
use crate::error::{ConfigError, ProbeError};
use crate::models::{Method, ProbeResult, TestCase};
use crate::resolver::{ResolvedParameterSet, ResolvedParams};
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Url};
use std::time::{Duration, Instant};

lazy_static! {
    static ref PLACEHOLDER: Regex = Regex::new(r"\{[^{}/]+\}").unwrap();
}

/// Longest response body shown in debug logs
const PREVIEW_CHARS: usize = 300;

/// Truncate on a char boundary for log output.
pub fn preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// Join base URL and endpoint path, fill `{name}` placeholders, append an encoded query.
pub fn build_url<'a>(
    base_url: &str,
    path: &str,
    path_params: impl IntoIterator<Item = (&'a str, &'a str)>,
    query: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Result<Url, ProbeError> {
    let mut target = if path.starts_with('/') {
        format!("{}{}", base_url.trim_end_matches('/'), path)
    } else {
        format!("{}/{}", base_url.trim_end_matches('/'), path)
    };
    for (name, value) in path_params {
        target = target.replace(&format!("{{{}}}", name), value);
    }
    if PLACEHOLDER.is_match(&target) {
        tracing::debug!(url = %target, "URL still has unresolved placeholders");
    }

    let mut url = Url::parse(&target).map_err(|e| ProbeError::InvalidUrl {
        url: target.clone(),
        reason: e.to_string(),
    })?;
    let query: Vec<(&str, &str)> = query.into_iter().collect();
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }
    Ok(url)
}

/// Status and body of a case run
#[derive(Debug, Clone)]
pub struct CaseResponse {
    pub result: ProbeResult,
    /// None on transport failure
    pub body: Option<String>,
}

pub struct ProbeEngine {
    pub client: Client,
    pub base_url: String,
    pub probe_timeout: Duration,
}

impl ProbeEngine {
    pub fn new(base_url: &str, probe_timeout: Duration) -> Result<Self, ConfigError> {
        Url::parse(base_url).map_err(|e| ConfigError::BaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        // redirects are reported as-is so 3xx shows up in the results;
        // no client-wide timeouts, each call sets its own
        let client = Client::builder()
            .pool_max_idle_per_host(10)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(ConfigError::Client)?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            probe_timeout,
        })
    }

    pub fn url_for(&self, path: &str) -> Result<Url, ProbeError> {
        build_url(&self.base_url, path, [], [])
    }

    /// One request for one (endpoint, method) pair. Success is any status in [200, 399].
    pub async fn probe(
        &self,
        endpoint: &str,
        method: Method,
        params: &ResolvedParams,
        token: Option<&str>,
    ) -> ProbeResult {
        let url = match build_url(&self.base_url, endpoint, params.path_params(), params.query()) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(%method, endpoint, error = %e, "probe skipped");
                return ProbeResult::transport_failure(
                    method.as_str(),
                    format!("{}{}", self.base_url, endpoint),
                    Duration::ZERO,
                    format!("ERROR: {}", e),
                );
            }
        };

        let mut req = self
            .client
            .request(method.to_reqwest(), url.clone())
            .timeout(self.probe_timeout)
            .header("Accept", "application/json");
        req = BearerAuth::from_token(token).apply_auth(req);
        let mut has_content_type = false;
        for (name, value) in params.headers() {
            has_content_type |= name.eq_ignore_ascii_case(CONTENT_TYPE.as_str());
            req = req.header(name, value);
        }
        if let Some(body) = params.body() {
            if !has_content_type {
                req = req.header(CONTENT_TYPE, "application/json");
            }
            req = req.body(body.to_string());
        }

        let start = Instant::now();
        match req.send().await {
            Ok(resp) => {
                let elapsed = start.elapsed();
                let status = i32::from(resp.status().as_u16());
                let success = (200..400).contains(&status);
                tracing::info!(
                    "[{}] {:<70} -> {} ({}, {} ms)",
                    method,
                    url.as_str(),
                    status,
                    if success { "OK" } else { "FAIL" },
                    elapsed.as_millis()
                );
                ProbeResult::new(method.as_str(), url.as_str(), status, elapsed, success)
            }
            Err(e) => {
                let error = ProbeError::from(e);
                tracing::warn!("[{}] {:<70} -> ERROR ({})", method, endpoint, error);
                ProbeResult::transport_failure(method.as_str(), url.as_str(), start.elapsed(), format!("ERROR: {}", error))
            }
        }
    }

    /// Exactly one result per (endpoint, method) pair, in catalog order.
    pub async fn probe_all(
        &self,
        catalog: &EndpointCatalog,
        resolved: &ResolvedParameterSet,
        token: Option<&str>,
    ) -> Vec<ProbeResult> {
        let empty = ResolvedParams::default();
        let mut results = Vec::with_capacity(catalog.pair_count());
        for entry in catalog.entries() {
            let params = resolved.get(&entry.path).unwrap_or(&empty);
            for method in &entry.methods {
                results.push(self.probe(&entry.path, *method, params, token).await);
            }
        }
        results
    }

    /// Send a rendered test case and classify it against its expectation.
    pub async fn run_case(&self, case: &TestCase, timeout: Duration) -> CaseResponse {
        let start = Instant::now();
        match self.send_case(case, timeout).await {
            Ok((status, body)) => {
                let elapsed = start.elapsed();
                let status = i32::from(status);
                let pass = case.expect.matches(status);
                tracing::info!(
                    "[{}] {} -> {} ({}, {} ms)",
                    if pass { "OK" } else { "FAIL" },
                    case.name,
                    status,
                    if pass { "expected" } else { "unexpected" },
                    elapsed.as_millis()
                );
                tracing::debug!(case = %case.name, expect = %case.expect, "resp: {}", preview(&body, PREVIEW_CHARS));
                CaseResponse {
                    result: ProbeResult::new(case.method.as_str(), &case.url, status, elapsed, pass).with_label(&case.name),
                    body: Some(body),
                }
            }
            Err(e) => {
                tracing::warn!("[ERR] {} -> {}", case.name, e);
                CaseResponse {
                    result: ProbeResult::transport_failure(
                        case.method.as_str(),
                        &case.url,
                        start.elapsed(),
                        format!("{} ERROR: {}", case.name, e),
                    ),
                    body: None,
                }
            }
        }
    }

    async fn send_case(&self, case: &TestCase, timeout: Duration) -> Result<(u16, String), ProbeError> {
        let url = Url::parse(&case.url).map_err(|e| ProbeError::InvalidUrl {
            url: case.url.clone(),
            reason: e.to_string(),
        })?;
        let mut req = self.client.request(case.method.to_reqwest(), url).timeout(timeout);
        for (name, value) in &case.headers {
            req = req.header(name.as_str(), value.as_str());
        }
        if let Some(body) = case.body.as_deref().filter(|b| !b.trim().is_empty()) {
            req = req.body(body.to_string());
        }
        let resp = req.send().await?;
        let status = resp.status().as_u16();
        let body = resp.text().await?;
        Ok((status, body))
    }
}
