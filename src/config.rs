// Run configuration for chainprobe
// Filled from CLI flags by main.rs; defaults match the consent API used in practice

use std::time::Duration;

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_TEST_TIMEOUT: Duration = Duration::from_secs(8);
pub const DEFAULT_CREATE_PATH: &str = "/account-consents/request";
pub const DEFAULT_ITEM_PATH: &str = "/account-consents/{id}";
pub const DEFAULT_TENANT_HEADER: &str = "X-Requesting-Bank";

/// The stateful endpoint the battery and the lifecycle test run against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleTarget {
    /// Create endpoint, POSTed to by the battery and the lifecycle
    pub create_path: String,
    /// Item endpoint; `{id}` is replaced by the extracted identifier
    pub item_path: String,
    pub tenant_header: String,
    /// Tenant identifier, also used to derive the client id in request bodies
    pub tenant_id: String,
}

impl LifecycleTarget {
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self {
            create_path: DEFAULT_CREATE_PATH.to_string(),
            item_path: DEFAULT_ITEM_PATH.to_string(),
            tenant_header: DEFAULT_TENANT_HEADER.to_string(),
            tenant_id: tenant_id.into(),
        }
    }

    pub fn item_path_for(&self, id: &str) -> String {
        self.item_path.replace("{id}", id)
    }
}

#[derive(Debug, Clone)]
pub struct ScanConfig {
    pub base_url: String,
    /// Bearer token supplied up front; a token captured from a source wins over it
    pub token: Option<String>,
    /// Sources and generic probes
    pub probe_timeout: Duration,
    /// Battery and lifecycle calls
    pub test_timeout: Duration,
    /// None disables both the battery and the lifecycle test
    pub lifecycle: Option<LifecycleTarget>,
    pub run_battery: bool,
    pub run_lifecycle: bool,
    pub run_broken_auth: bool,
}

impl ScanConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            test_timeout: DEFAULT_TEST_TIMEOUT,
            lifecycle: None,
            run_battery: true,
            run_lifecycle: true,
            run_broken_auth: true,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.token = if token.is_empty() { None } else { Some(token) };
        self
    }

    pub fn with_lifecycle(mut self, target: LifecycleTarget) -> Self {
        self.lifecycle = Some(target);
        self
    }
}
