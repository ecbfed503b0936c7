// Battery and lifecycle runner
//
// Phase A sends every battery case once, in order. Phase B creates one
// resource, extracts its identifier, then reads it, deletes it and checks it
// is gone. Only the identifier gates the later steps: a failed read does not
// stop the delete, a failed delete does not stop the final read.

use crate::config::LifecycleTarget;
use crate::engine::{build_url, ProbeEngine};
use crate::lifecycle::battery::{default_battery, BodyTemplate, CaseTemplate};
use crate::lifecycle::extract::{extract_identifier_from_body, IdRule, DEFAULT_ID_RULES};
use crate::models::{Method, ProbeResult, StatusExpectation, TestCase};
use serde::Serialize;
use std::time::Duration;

const LIFECYCLE_BODY: &str = r#"{
  "client_id":"{tenant}-1",
  "permissions":["ReadAccountsDetail","ReadBalances"],
  "reason":"lifecycle test",
  "requesting_bank":"{tenant}",
  "requesting_bank_name":"Lifecycle Test"
}"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LifecycleStep {
    Create,
    GetAfterCreate,
    Delete,
    GetAfterDelete,
}

impl LifecycleStep {
    pub fn label(&self) -> &'static str {
        match self {
            LifecycleStep::Create => "Lifecycle: create",
            LifecycleStep::GetAfterCreate => "Lifecycle: get-after-create",
            LifecycleStep::Delete => "Lifecycle: delete",
            LifecycleStep::GetAfterDelete => "Lifecycle: get-after-delete",
        }
    }

    pub fn method(&self) -> Method {
        match self {
            LifecycleStep::Create => Method::POST,
            LifecycleStep::GetAfterCreate | LifecycleStep::GetAfterDelete => Method::GET,
            LifecycleStep::Delete => Method::DELETE,
        }
    }

    pub fn expectation(&self) -> StatusExpectation {
        match self {
            LifecycleStep::Create => StatusExpectation::SUCCESS,
            LifecycleStep::GetAfterCreate => StatusExpectation::SUCCESS_OR_REDIRECT,
            // 204 is inside 2xx
            LifecycleStep::Delete => StatusExpectation::SUCCESS,
            LifecycleStep::GetAfterDelete => StatusExpectation::one_of(&[404, 410]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "resource_id", rename_all = "kebab-case")]
pub enum LifecycleState {
    NotStarted,
    Created(String),
    Fetched,
    Deleted,
    VerifiedDeleted,
}

#[derive(Debug, Clone, Serialize)]
pub struct LifecycleOutcome {
    /// Furthest state reached by a passing step
    pub state: LifecycleState,
    pub resource_id: Option<String>,
    /// Steps that ran and did not meet their expectation
    pub failed_steps: Vec<LifecycleStep>,
    pub results: Vec<ProbeResult>,
}

impl LifecycleOutcome {
    fn new() -> Self {
        Self {
            state: LifecycleState::NotStarted,
            resource_id: None,
            failed_steps: Vec::new(),
            results: Vec::new(),
        }
    }

    /// True when no identifier was obtained and only the create step ran
    pub fn skipped(&self) -> bool {
        self.resource_id.is_none()
    }

    fn record(&mut self, step: LifecycleStep, result: ProbeResult) {
        if result.success {
            match step {
                LifecycleStep::Create => {}
                LifecycleStep::GetAfterCreate => self.state = LifecycleState::Fetched,
                LifecycleStep::Delete => self.state = LifecycleState::Deleted,
                LifecycleStep::GetAfterDelete => self.state = LifecycleState::VerifiedDeleted,
            }
        } else {
            self.failed_steps.push(step);
        }
        self.results.push(result);
    }
}

pub struct LifecycleTestRunner<'a> {
    engine: &'a ProbeEngine,
    target: &'a LifecycleTarget,
    token: String,
    timeout: Duration,
    battery: Vec<CaseTemplate>,
    id_rules: &'a [IdRule],
}

impl<'a> LifecycleTestRunner<'a> {
    pub fn new(engine: &'a ProbeEngine, target: &'a LifecycleTarget, token: Option<&str>, timeout: Duration) -> Self {
        Self {
            engine,
            target,
            token: token.unwrap_or_default().to_string(),
            timeout,
            battery: default_battery(),
            id_rules: DEFAULT_ID_RULES,
        }
    }

    pub fn with_battery(mut self, battery: Vec<CaseTemplate>) -> Self {
        self.battery = battery;
        self
    }

    pub fn with_id_rules(mut self, rules: &'a [IdRule]) -> Self {
        self.id_rules = rules;
        self
    }

    fn create_url(&self) -> String {
        format!("{}{}", self.engine.base_url, self.target.create_path)
    }

    fn item_url(&self, id: &str) -> String {
        build_url(&self.engine.base_url, &self.target.item_path, [("id", id)], [])
            .map(|url| url.to_string())
            .unwrap_or_else(|_| format!("{}{}", self.engine.base_url, self.target.item_path_for(id)))
    }

    /// Phase A. One result per case, labelled with the case name.
    pub async fn run_battery(&self) -> Vec<ProbeResult> {
        tracing::info!(cases = self.battery.len(), target = %self.target.create_path, "running adversarial battery");
        let url = self.create_url();
        let mut results = Vec::with_capacity(self.battery.len());
        for template in &self.battery {
            let case = template.render(self.target, &url, &self.token);
            results.push(self.engine.run_case(&case, self.timeout).await.result);
        }
        results
    }

    /// Phase B. Skipped after the create step if no identifier can be extracted.
    pub async fn run_lifecycle(&self) -> LifecycleOutcome {
        tracing::info!("running lifecycle test (create -> get -> delete -> get)");
        let mut outcome = LifecycleOutcome::new();

        let create = self.engine.run_case(&self.create_case(), self.timeout).await;
        let created = create.result.success;
        outcome.record(LifecycleStep::Create, create.result);
        if !created {
            tracing::warn!("lifecycle skipped: create did not succeed");
            return outcome;
        }

        let Some(id) = create
            .body
            .as_deref()
            .and_then(|body| extract_identifier_from_body(body, self.id_rules))
        else {
            tracing::warn!("lifecycle skipped: no identifier in create response");
            return outcome;
        };
        tracing::info!(resource_id = %id, "created lifecycle resource");
        outcome.state = LifecycleState::Created(id.clone());
        outcome.resource_id = Some(id.clone());

        for step in [LifecycleStep::GetAfterCreate, LifecycleStep::Delete, LifecycleStep::GetAfterDelete] {
            let case = self.item_case(step, &id);
            let response = self.engine.run_case(&case, self.timeout).await;
            outcome.record(step, response.result);
        }

        if !outcome.failed_steps.is_empty() {
            tracing::warn!(failed = ?outcome.failed_steps, "lifecycle finished with failures");
        }
        outcome
    }

    fn create_case(&self) -> TestCase {
        let step = LifecycleStep::Create;
        TestCase {
            name: step.label().to_string(),
            method: step.method(),
            url: self.create_url(),
            headers: vec![
                ("Authorization".to_string(), format!("Bearer {}", self.token)),
                (self.target.tenant_header.clone(), self.target.tenant_id.clone()),
                ("Content-Type".to_string(), "application/json".to_string()),
            ],
            body: Some(BodyTemplate::Json(LIFECYCLE_BODY).render(&self.target.tenant_id)),
            expect: step.expectation(),
        }
    }

    fn item_case(&self, step: LifecycleStep, id: &str) -> TestCase {
        TestCase {
            name: step.label().to_string(),
            method: step.method(),
            url: self.item_url(id),
            headers: vec![
                ("Authorization".to_string(), format!("Bearer {}", self.token)),
                (self.target.tenant_header.clone(), self.target.tenant_id.clone()),
            ],
            body: None,
            expect: step.expectation(),
        }
    }
}
