// Broken authentication probe
// GET every catalog path without credentials; a 200 means the endpoint is open

use crate::engine::ProbeEngine;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrokenAuthFinding {
    pub endpoint: String,
    pub method: String,
    pub status: u16,
    pub severity: String,
    pub description: String,
}

impl fmt::Display for BrokenAuthFinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[BrokenAuth] {} {} -> {} ({}) {}",
            self.method, self.endpoint, self.status, self.severity, self.description
        )
    }
}

pub struct BrokenAuthCheck<'a> {
    engine: &'a ProbeEngine,
}

impl<'a> BrokenAuthCheck<'a> {
    pub fn new(engine: &'a ProbeEngine) -> Self {
        Self { engine }
    }

    pub async fn run<'p>(&self, endpoints: impl IntoIterator<Item = &'p str>) -> Vec<BrokenAuthFinding> {
        let mut findings = Vec::new();
        for endpoint in endpoints {
            let url = match self.engine.url_for(endpoint) {
                Ok(url) => url,
                Err(e) => {
                    tracing::warn!(endpoint, error = %e, "broken-auth check skipped");
                    continue;
                }
            };
            let resp = self
                .engine
                .client
                .get(url)
                .timeout(self.engine.probe_timeout)
                .send()
                .await;
            match resp {
                Ok(resp) if resp.status() == reqwest::StatusCode::OK => {
                    let finding = BrokenAuthFinding {
                        endpoint: endpoint.to_string(),
                        method: "GET".to_string(),
                        status: 200,
                        severity: "HIGH".to_string(),
                        description: "endpoint reachable without authorization".to_string(),
                    };
                    tracing::warn!("{}", finding);
                    findings.push(finding);
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(endpoint, error = %e, "broken-auth check failed"),
            }
        }
        findings
    }
}
