use thiserror::Error;

/// The primary error type for all fallible operations in this crate.
#[derive(Debug, Error)]
pub enum VhError {
    /// A request did not complete within its wall-clock budget.
    #[error("request timed out after {timeout_ms}ms: {url}")]
    Timeout {
        /// The URL that timed out.
        url: String,
        /// The budget that was exceeded, in milliseconds.
        timeout_ms: u64,
    },

    /// A transport-level failure with no response at all.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The upstream returned a terminal, unsuccessful HTTP status.
    #[error("unexpected response status: {status} at {url}")]
    Status {
        /// The HTTP status code.
        status: u16,
        /// The URL that returned the error.
        url: String,
    },

    /// A response body could not be decoded as JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The data received was in an unexpected shape or missing a required field.
    #[error("data format unexpected or missing field: {0}")]
    Data(String),

    /// A provided URL could not be parsed.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The supplied username fails the Minecraft username format check.
    #[error("invalid username: {0:?}")]
    InvalidUsername(String),
}

impl VhError {
    /// Whether this error was caused by a timeout (directly or via transport).
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Http(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// The upstream status code, when one was observed.
    pub fn upstream_status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
