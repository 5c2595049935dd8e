//! Transport faults and the user-facing failure taxonomy.

use serde::Serialize;
use thiserror::Error;

/// Failure of a remote catalog call, as surfaced by the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportFault {
    /// Connectivity was known to be absent; no request was sent
    #[error("no internet connection")]
    Offline,

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("http {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for TransportFault {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportFault::Timeout(e.to_string())
        } else if e.is_connect() {
            TransportFault::Connect(e.to_string())
        } else if e.is_decode() {
            TransportFault::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            TransportFault::Status {
                status: status.as_u16(),
                body: e.to_string(),
            }
        } else {
            TransportFault::Other(e.to_string())
        }
    }
}

/// User-facing failure category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    NoConnectivity,
    Timeout,
    Generic,
}

impl ErrorCategory {
    /// Whether the error screen offers a retry. Every category does: a first
    /// load that failed for any reason can be attempted again.
    pub fn is_retryable(self) -> bool {
        match self {
            ErrorCategory::NoConnectivity | ErrorCategory::Timeout | ErrorCategory::Generic => true,
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::NoConnectivity => write!(f, "no-connectivity"),
            ErrorCategory::Timeout => write!(f, "timeout"),
            ErrorCategory::Generic => write!(f, "generic"),
        }
    }
}

/// A classified fault, ready to be shown
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub category: ErrorCategory,
    pub retryable: bool,
    pub message: String,
}

impl Failure {
    pub fn is_network_error(&self) -> bool {
        self.category == ErrorCategory::NoConnectivity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_category_is_retryable() {
        for category in [
            ErrorCategory::NoConnectivity,
            ErrorCategory::Timeout,
            ErrorCategory::Generic,
        ] {
            assert!(category.is_retryable(), "{category}");
        }
    }

    #[test]
    fn test_display_carries_detail() {
        assert_eq!(
            TransportFault::Status {
                status: 502,
                body: "bad gateway".into()
            }
            .to_string(),
            "http 502: bad gateway"
        );
        assert_eq!(TransportFault::Other("boom".into()).to_string(), "boom");
    }
}
