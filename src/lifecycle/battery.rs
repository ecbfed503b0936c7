// Adversarial battery
//
// Negative-path cases against the create endpoint, declared as data. A case
// renders into a concrete TestCase for a LifecycleTarget and a token; adding a
// case means adding a record to default_battery(), not touching the runner.

use crate::config::LifecycleTarget;
use crate::models::{Method, StatusExpectation, TestCase};

/// How the Authorization header is sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthHeader {
    /// `Bearer <token>`
    Bearer,
    Missing,
    /// Sent verbatim
    Fixed(&'static str),
    /// `<scheme> <token>`
    Scheme(&'static str),
}

/// How the tenant header is sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantHeader {
    Valid,
    Missing,
    /// Tenant id with a suffix appended
    Suffixed(&'static str),
}

/// Request body; `{tenant}` is replaced with the tenant id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyTemplate {
    Json(&'static str),
    /// Create request carrying `count` bogus permissions plus one real one
    OversizedPermissions(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaseTemplate {
    pub name: &'static str,
    pub method: Method,
    pub auth: AuthHeader,
    pub tenant: TenantHeader,
    pub content_type: &'static str,
    pub accept_json: bool,
    pub body: BodyTemplate,
    pub expect: StatusExpectation,
}

const JSON: &str = "application/json";

const CREATE_BODY: &str = r#"{
  "client_id":"{tenant}-1",
  "permissions":["ReadAccountsDetail","ReadBalances"],
  "reason":"Test consent creation",
  "requesting_bank":"{tenant}",
  "requesting_bank_name":"Test App"
}"#;

const MINIMAL_BODY: &str = r#"{"client_id":"{tenant}-1"}"#;

/// The default battery, in execution order
pub fn default_battery() -> Vec<CaseTemplate> {
    vec![
        CaseTemplate {
            name: "Happy path (create consent)",
            method: Method::POST,
            auth: AuthHeader::Bearer,
            tenant: TenantHeader::Valid,
            content_type: JSON,
            accept_json: true,
            body: BodyTemplate::Json(CREATE_BODY),
            expect: StatusExpectation::SUCCESS,
        },
        CaseTemplate {
            name: "Missing Authorization",
            method: Method::POST,
            auth: AuthHeader::Missing,
            tenant: TenantHeader::Valid,
            content_type: JSON,
            accept_json: false,
            body: BodyTemplate::Json("{}"),
            expect: StatusExpectation::CLIENT_ERROR,
        },
        CaseTemplate {
            name: "Invalid token",
            method: Method::POST,
            auth: AuthHeader::Fixed("Bearer invalid.token.here"),
            tenant: TenantHeader::Valid,
            content_type: JSON,
            accept_json: false,
            body: BodyTemplate::Json("{}"),
            expect: StatusExpectation::CLIENT_ERROR,
        },
        CaseTemplate {
            name: "SQL Injection Simulation",
            method: Method::POST,
            auth: AuthHeader::Bearer,
            tenant: TenantHeader::Valid,
            content_type: JSON,
            accept_json: false,
            body: BodyTemplate::Json(
                r#"{
      "client_id":"teamX' OR '1'='1",
      "permissions":["ReadAccountsDetail"],
      "requesting_bank":"{tenant}"
    }"#,
            ),
            expect: StatusExpectation::CLIENT_ERROR,
        },
        CaseTemplate {
            name: "XSS Injection (reason)",
            method: Method::POST,
            auth: AuthHeader::Bearer,
            tenant: TenantHeader::Valid,
            content_type: JSON,
            accept_json: false,
            body: BodyTemplate::Json(
                r#"{
      "client_id":"{tenant}-1",
      "permissions":["ReadAccountsDetail"],
      "reason":"<script>alert(1)</script>",
      "requesting_bank":"{tenant}",
      "requesting_bank_name":"XSS Test"
    }"#,
            ),
            expect: StatusExpectation::CLIENT_ERROR,
        },
        CaseTemplate {
            name: "Missing tenant header",
            method: Method::POST,
            auth: AuthHeader::Bearer,
            tenant: TenantHeader::Missing,
            content_type: JSON,
            accept_json: false,
            body: BodyTemplate::Json(MINIMAL_BODY),
            expect: StatusExpectation::CLIENT_ERROR,
        },
        CaseTemplate {
            name: "Wrong tenant header (client suffix)",
            method: Method::POST,
            auth: AuthHeader::Bearer,
            tenant: TenantHeader::Suffixed("-1"),
            content_type: JSON,
            accept_json: false,
            body: BodyTemplate::Json(
                r#"{
      "client_id":"{tenant}-1",
      "permissions":["ReadAccountsDetail"],
      "requesting_bank":"{tenant}",
      "requesting_bank_name":"Bad"
    }"#,
            ),
            expect: StatusExpectation::CLIENT_ERROR,
        },
        CaseTemplate {
            name: "Wrong Authorization scheme (BearerX)",
            method: Method::POST,
            auth: AuthHeader::Scheme("BearerX"),
            tenant: TenantHeader::Valid,
            content_type: JSON,
            accept_json: false,
            body: BodyTemplate::Json(MINIMAL_BODY),
            expect: StatusExpectation::CLIENT_ERROR,
        },
        CaseTemplate {
            name: "Wrong Content-Type",
            method: Method::POST,
            auth: AuthHeader::Bearer,
            tenant: TenantHeader::Valid,
            content_type: "text/plain",
            accept_json: false,
            body: BodyTemplate::Json(MINIMAL_BODY),
            expect: StatusExpectation::CLIENT_ERROR,
        },
        CaseTemplate {
            name: "Large permissions list (fuzz)",
            method: Method::POST,
            auth: AuthHeader::Bearer,
            tenant: TenantHeader::Valid,
            content_type: JSON,
            accept_json: false,
            body: BodyTemplate::OversizedPermissions(100),
            expect: StatusExpectation::CLIENT_ERROR,
        },
    ]
}

impl BodyTemplate {
    pub fn render(&self, tenant_id: &str) -> String {
        match self {
            BodyTemplate::Json(template) => template.replace("{tenant}", tenant_id),
            BodyTemplate::OversizedPermissions(count) => {
                let mut permissions: Vec<String> = (0..*count).map(|i| format!("p{}", i)).collect();
                permissions.push("ReadAccountsDetail".to_string());
                serde_json::json!({
                    "client_id": format!("{}-1", tenant_id),
                    "permissions": permissions,
                })
                .to_string()
            }
        }
    }
}

impl CaseTemplate {
    /// `url` is the absolute create URL.
    pub fn render(&self, target: &LifecycleTarget, url: &str, token: &str) -> TestCase {
        let mut headers = Vec::new();
        match self.auth {
            AuthHeader::Bearer => headers.push(("Authorization".to_string(), format!("Bearer {}", token))),
            AuthHeader::Missing => {}
            AuthHeader::Fixed(value) => headers.push(("Authorization".to_string(), value.to_string())),
            AuthHeader::Scheme(scheme) => headers.push(("Authorization".to_string(), format!("{} {}", scheme, token))),
        }
        match self.tenant {
            TenantHeader::Valid => headers.push((target.tenant_header.clone(), target.tenant_id.clone())),
            TenantHeader::Missing => {}
            TenantHeader::Suffixed(suffix) => {
                headers.push((target.tenant_header.clone(), format!("{}{}", target.tenant_id, suffix)))
            }
        }
        headers.push(("Content-Type".to_string(), self.content_type.to_string()));
        if self.accept_json {
            headers.push(("Accept".to_string(), JSON.to_string()));
        }

        TestCase {
            name: self.name.to_string(),
            method: self.method,
            url: url.to_string(),
            headers,
            body: Some(self.body.render(&target.tenant_id)),
            expect: self.expect.clone(),
        }
    }
}
