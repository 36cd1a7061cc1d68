//! Shared HTTP plumbing: a timeout-bounded client and the failure taxonomy
//! every check converts into issues.

use std::time::Duration;

/// Connection establishment budget, separate from the full-request budget.
const CONNECT_TIMEOUT_SECS: u64 = 5;

/// Build a client with a hard per-request deadline. Every external call the
/// pipeline makes goes through one of these; there is no retry layer.
pub fn client(timeout_secs: u64) -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!("falling back to default HTTP client: {e}");
            reqwest::Client::new()
        })
}

/// How a single API call failed. Checks map these onto issues; nothing
/// here escapes as an unhandled error.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Transport(String),
    #[error("HTTP {status}")]
    Status { status: u16, detail: String },
    /// The service answered 200 but rejected the request in-band
    /// (e.g. the bot platform's `ok: false` envelope).
    #[error("{0}")]
    Rejected(String),
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Response body for status failures, when the service sent one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Status { detail, .. } if !detail.is_empty() => Some(detail),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Malformed(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}
