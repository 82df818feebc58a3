//! Per-attempt failure taxonomy.
//!
//! Every variant is recovered by the pipeline; the `Display` text is what ends
//! up in the `attempts` list of a 503 response, so keep it short.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Connection, DNS, or TLS failure before a status line arrived.
    #[error("network error: {0}")]
    NetworkFailure(String),

    /// The attempt's deadline elapsed; the in-flight request was dropped.
    #[error("timeout")]
    Timeout,

    /// Upstream or relay answered with a non-2xx status.
    #[error("HTTP error! status: {0}")]
    HttpStatus(u16),

    /// Body (or relay envelope) was not valid JSON.
    #[error("invalid JSON: {0}")]
    ParseFailure(String),

    /// Parsed fine but `online_user` is missing.
    #[error("invalid shape")]
    ShapeInvalid,
}

impl FetchError {
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::NetworkFailure(_) => "network",
            FetchError::Timeout => "timeout",
            FetchError::HttpStatus(_) => "http_status",
            FetchError::ParseFailure(_) => "parse",
            FetchError::ShapeInvalid => "shape",
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, FetchError::Timeout)
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            return FetchError::Timeout;
        }
        if let Some(status) = e.status() {
            return FetchError::HttpStatus(status.as_u16());
        }
        if e.is_decode() {
            return FetchError::ParseFailure(e.to_string());
        }
        FetchError::NetworkFailure(e.to_string())
    }
}

impl From<serde_json::Error> for FetchError {
    fn from(e: serde_json::Error) -> Self {
        FetchError::ParseFailure(e.to_string())
    }
}
