//! Maps transport faults to user-facing failure categories.
//!
//! Connectivity loss dominates: if the probe reports offline when the fault
//! is classified, the answer is `NoConnectivity` whatever the fault says.
//! After that the typed fault kind decides. Only faults without a telling
//! kind (`Status`, `Decode`, `Other`) fall through to a substring heuristic
//! over the message, which depends on the wording of the HTTP stack and is
//! kept as a last resort.

use std::sync::Arc;

use crate::connectivity::ConnectivityProbe;
use crate::constants::{keywords, messages};
use crate::error::{ErrorCategory, Failure, TransportFault};

#[derive(Clone)]
pub struct ErrorClassifier {
    probe: Arc<dyn ConnectivityProbe>,
}

impl ErrorClassifier {
    pub fn new(probe: Arc<dyn ConnectivityProbe>) -> Self {
        Self { probe }
    }

    pub fn classify(&self, fault: &TransportFault) -> ErrorCategory {
        if !self.probe.is_available() {
            return ErrorCategory::NoConnectivity;
        }
        match fault {
            TransportFault::Offline | TransportFault::Connect(_) => ErrorCategory::NoConnectivity,
            TransportFault::Timeout(_) => ErrorCategory::Timeout,
            TransportFault::Status { status: 408 | 504, .. } => ErrorCategory::Timeout,
            other => classify_message(&other.to_string()),
        }
    }

    /// Classify and attach the message and retry hint shown to the user
    pub fn failure(&self, fault: &TransportFault) -> Failure {
        let category = self.classify(fault);
        Failure {
            category,
            retryable: category.is_retryable(),
            message: user_message(category, fault),
        }
    }

    /// Failure reported when a call is skipped because the probe says offline
    pub fn offline(&self) -> Failure {
        self.failure(&TransportFault::Offline)
    }
}

/// Text heuristic over a fault message (case-insensitive)
pub fn classify_message(message: &str) -> ErrorCategory {
    let lower = message.to_lowercase();
    if keywords::TIMEOUT.iter().any(|k| lower.contains(k)) {
        ErrorCategory::Timeout
    } else if keywords::NO_CONNECTIVITY.iter().any(|k| lower.contains(k)) {
        ErrorCategory::NoConnectivity
    } else {
        ErrorCategory::Generic
    }
}

pub fn user_message(category: ErrorCategory, fault: &TransportFault) -> String {
    match category {
        ErrorCategory::NoConnectivity => messages::NO_INTERNET.to_string(),
        ErrorCategory::Timeout => messages::TIMEOUT.to_string(),
        ErrorCategory::Generic => {
            let text = fault.to_string();
            if text.trim().is_empty() {
                messages::UNKNOWN_ERROR.to_string()
            } else {
                text
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::StaticProbe;

    fn classifier(online: bool) -> ErrorClassifier {
        ErrorClassifier::new(Arc::new(StaticProbe::new(online)))
    }

    #[test]
    fn test_offline_dominates_fault_text() {
        let c = classifier(false);
        assert_eq!(
            c.classify(&TransportFault::Timeout("deadline".into())),
            ErrorCategory::NoConnectivity
        );
        assert_eq!(
            c.classify(&TransportFault::Other("boom".into())),
            ErrorCategory::NoConnectivity
        );
    }

    #[test]
    fn test_typed_kinds() {
        let c = classifier(true);
        assert_eq!(c.classify(&TransportFault::Offline), ErrorCategory::NoConnectivity);
        assert_eq!(
            c.classify(&TransportFault::Connect("refused".into())),
            ErrorCategory::NoConnectivity
        );
        assert_eq!(
            c.classify(&TransportFault::Timeout("x".into())),
            ErrorCategory::Timeout
        );
        assert_eq!(
            c.classify(&TransportFault::Status {
                status: 504,
                body: String::new()
            }),
            ErrorCategory::Timeout
        );
        assert_eq!(
            c.classify(&TransportFault::Status {
                status: 500,
                body: "internal".into()
            }),
            ErrorCategory::Generic
        );
    }

    #[test]
    fn test_message_heuristic_is_case_insensitive() {
        let c = classifier(true);
        assert_eq!(
            c.classify(&TransportFault::Other("Socket TIMEOUT after 10s".into())),
            ErrorCategory::Timeout
        );
        assert_eq!(
            c.classify(&TransportFault::Other("operation timed out".into())),
            ErrorCategory::Timeout
        );
        assert_eq!(
            c.classify(&TransportFault::Other("Network is unreachable".into())),
            ErrorCategory::NoConnectivity
        );
        assert_eq!(
            c.classify(&TransportFault::Other("No Internet".into())),
            ErrorCategory::NoConnectivity
        );
        assert_eq!(
            c.classify(&TransportFault::Other("unexpected token".into())),
            ErrorCategory::Generic
        );
    }

    #[test]
    fn test_failure_messages() {
        let c = classifier(true);
        let f = c.failure(&TransportFault::Timeout("x".into()));
        assert_eq!(f.message, messages::TIMEOUT);
        assert!(f.retryable);

        let f = c.failure(&TransportFault::Status {
            status: 404,
            body: "not found".into(),
        });
        assert_eq!(f.category, ErrorCategory::Generic);
        assert_eq!(f.message, "http 404: not found");
        assert!(f.retryable);

        let f = c.failure(&TransportFault::Other("  ".into()));
        assert_eq!(f.message, messages::UNKNOWN_ERROR);

        let f = c.offline();
        assert_eq!(f.category, ErrorCategory::NoConnectivity);
        assert_eq!(f.message, messages::NO_INTERNET);
        assert!(f.retryable);
        assert!(f.is_network_error());
    }
}
