// Core data models for chainprobe
// Methods, probe results, test cases and status expectations

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Status recorded when a call never produced an HTTP status
pub const TRANSPORT_FAILURE: i32 = -1;

/// Supported HTTP methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Method {
    GET,
    POST,
    PUT,
    DELETE,
    PATCH,
    OPTIONS,
    HEAD,
    TRACE,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::PATCH => "PATCH",
            Method::OPTIONS => "OPTIONS",
            Method::HEAD => "HEAD",
            Method::TRACE => "TRACE",
        }
    }

    pub fn to_reqwest(self) -> reqwest::Method {
        match self {
            Method::GET => reqwest::Method::GET,
            Method::POST => reqwest::Method::POST,
            Method::PUT => reqwest::Method::PUT,
            Method::DELETE => reqwest::Method::DELETE,
            Method::PATCH => reqwest::Method::PATCH,
            Method::OPTIONS => reqwest::Method::OPTIONS,
            Method::HEAD => reqwest::Method::HEAD,
            Method::TRACE => reqwest::Method::TRACE,
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = String;

    /// Case-insensitive, so OpenAPI's lowercase path item keys parse directly
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Method::GET),
            "POST" => Ok(Method::POST),
            "PUT" => Ok(Method::PUT),
            "DELETE" => Ok(Method::DELETE),
            "PATCH" => Ok(Method::PATCH),
            "OPTIONS" => Ok(Method::OPTIONS),
            "HEAD" => Ok(Method::HEAD),
            "TRACE" => Ok(Method::TRACE),
            other => Err(format!("unsupported HTTP method: {}", other)),
        }
    }
}

impl TryFrom<String> for Method {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Method> for String {
    fn from(method: Method) -> Self {
        method.as_str().to_string()
    }
}

/// Accepted status codes for a test case or lifecycle step
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StatusExpectation {
    /// Closed interval, both ends inclusive
    Within { min: u16, max: u16 },
    OneOf { codes: Vec<u16> },
}

impl StatusExpectation {
    pub const SUCCESS: StatusExpectation = StatusExpectation::Within { min: 200, max: 299 };
    pub const SUCCESS_OR_REDIRECT: StatusExpectation = StatusExpectation::Within { min: 200, max: 399 };
    pub const CLIENT_ERROR: StatusExpectation = StatusExpectation::Within { min: 400, max: 499 };

    pub fn within(min: u16, max: u16) -> Self {
        StatusExpectation::Within { min, max }
    }

    pub fn one_of(codes: &[u16]) -> Self {
        StatusExpectation::OneOf { codes: codes.to_vec() }
    }

    /// The transport failure sentinel never matches.
    pub fn matches(&self, status: i32) -> bool {
        let Ok(status) = u16::try_from(status) else {
            return false;
        };
        match self {
            StatusExpectation::Within { min, max } => (*min..=*max).contains(&status),
            StatusExpectation::OneOf { codes } => codes.contains(&status),
        }
    }
}

impl fmt::Display for StatusExpectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusExpectation::Within { min, max } => write!(f, "[{}, {}]", min, max),
            StatusExpectation::OneOf { codes } => {
                let codes: Vec<String> = codes.iter().map(|c| c.to_string()).collect();
                write!(f, "one of {}", codes.join("/"))
            }
        }
    }
}

/// A fully rendered request with its expected outcome
#[derive(Debug, Clone, Serialize)]
pub struct TestCase {
    pub name: String,
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub expect: StatusExpectation,
}

/// Outcome of a single HTTP call, whatever produced it
#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    pub method: String,
    pub url: String,
    /// HTTP status, or [`TRANSPORT_FAILURE`]
    pub status: i32,
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
    pub success: bool,
    pub label: Option<String>,
}

impl ProbeResult {
    pub fn new(method: impl Into<String>, url: impl Into<String>, status: i32, elapsed: Duration, success: bool) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            status,
            elapsed,
            success,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Result for a call that failed before any status was read
    pub fn transport_failure(method: impl Into<String>, url: impl Into<String>, elapsed: Duration, label: impl Into<String>) -> Self {
        Self::new(method, url, TRANSPORT_FAILURE, elapsed, false).with_label(label)
    }

    pub fn is_transport_failure(&self) -> bool {
        self.status == TRANSPORT_FAILURE
    }
}

fn serialize_millis<S: serde::Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
}
