// Error taxonomy for chainprobe
//
// Only ConfigError crosses the run boundary. SourceError and ProbeError are
// caught where they happen and end up as log lines or failed ProbeResults.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal: the run cannot start.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{path}: expected a JSON object at the top level")]
    NotAnObject { path: PathBuf },
    #[error("{path}: invalid entry for endpoint {endpoint}: {source}")]
    InvalidEntry {
        path: PathBuf,
        endpoint: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("{path}: no 'paths' section")]
    MissingPaths { path: PathBuf },
    #[error("invalid base URL {url}: {reason}")]
    BaseUrl { url: String, reason: String },
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

/// A source endpoint could not be captured. The run continues without it.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("response is not JSON (status {status}): {source}")]
    Malformed {
        status: u16,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// A single probe, battery case or lifecycle call failed before a status was read.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("{0}")]
    Transport(#[from] reqwest::Error),
}
