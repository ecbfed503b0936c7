// Scan orchestration
//
// Fixed order, one call at a time:
//   sources -> parameter resolution -> broken-auth -> generic probes -> battery -> lifecycle
//
// Nothing after engine construction can fail the run; every problem ends up
// in the ScanReport.

use crate::broken_auth::{BrokenAuthCheck, BrokenAuthFinding};
use crate::catalog::EndpointCatalog;
use crate::config::ScanConfig;
use crate::engine::ProbeEngine;
use crate::error::ConfigError;
use crate::lifecycle::runner::{LifecycleOutcome, LifecycleTestRunner};
use crate::models::ProbeResult;
use crate::resolver::ParameterResolver;
use crate::sources::SourceExecutor;
use crate::spec::SpecStore;
use chrono::{DateTime, Local};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub probes: Vec<ProbeResult>,
    pub battery: Vec<ProbeResult>,
    pub lifecycle: Option<LifecycleOutcome>,
    pub broken_auth: Vec<BrokenAuthFinding>,
}

impl ScanReport {
    /// Generic probes, battery cases and lifecycle steps, in that order
    pub fn all_results(&self) -> impl Iterator<Item = &ProbeResult> {
        let lifecycle = self.lifecycle.iter().flat_map(|l| l.results.iter());
        self.probes.iter().chain(self.battery.iter()).chain(lifecycle)
    }

    pub fn passed(&self) -> usize {
        self.all_results().filter(|r| r.success).count()
    }

    pub fn failed(&self) -> usize {
        self.all_results().filter(|r| !r.success).count()
    }

    pub fn total(&self) -> usize {
        self.all_results().count()
    }
}

pub struct Scanner {
    config: ScanConfig,
    engine: ProbeEngine,
}

impl Scanner {
    /// Fails only on an unusable base URL or HTTP client setup.
    pub fn new(config: ScanConfig) -> Result<Self, ConfigError> {
        let engine = ProbeEngine::new(&config.base_url, config.probe_timeout)?;
        Ok(Self { config, engine })
    }

    pub fn engine(&self) -> &ProbeEngine {
        &self.engine
    }

    pub async fn run(&self, catalog: &EndpointCatalog, specs: &SpecStore) -> ScanReport {
        let started_at = Local::now();

        let captures = SourceExecutor::new(&self.engine, self.config.token.as_deref())
            .execute_sources(specs)
            .await;
        let resolved = ParameterResolver::new(&captures).resolve_all(specs);
        tracing::info!(captured = captures.len(), resolved = resolved.len(), "parameters resolved");

        // a token captured from a source is fresher than the configured one
        let token = captures.context().access_token().or(self.config.token.as_deref());

        let broken_auth = if self.config.run_broken_auth {
            BrokenAuthCheck::new(&self.engine).run(catalog.paths()).await
        } else {
            Vec::new()
        };

        tracing::info!(pairs = catalog.pair_count(), "probing endpoints");
        let probes = self.engine.probe_all(catalog, &resolved, token).await;

        let mut battery = Vec::new();
        let mut lifecycle = None;
        if let Some(target) = &self.config.lifecycle {
            let runner = LifecycleTestRunner::new(&self.engine, target, token, self.config.test_timeout);
            if self.config.run_battery {
                battery = runner.run_battery().await;
            }
            if self.config.run_lifecycle {
                lifecycle = Some(runner.run_lifecycle().await);
            }
        }

        ScanReport {
            started_at,
            finished_at: Local::now(),
            probes,
            battery,
            lifecycle,
            broken_auth,
        }
    }
}
