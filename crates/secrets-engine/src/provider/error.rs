//! Provider error type

use thiserror::Error;

/// Error codes meaning the deleted user or key is already gone
const TARGET_NOT_FOUND_CODES: [&str; 2] = ["USERNAME_NOT_FOUND", "API_KEY_NOT_FOUND"];

/// Failure reported by the remote provider
///
/// `message` is passed through to callers verbatim.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message} (HTTP {status})")]
pub struct ProviderError {
    /// HTTP-like status code; `0` when no response was received
    pub status: u16,
    /// Provider-specific error code, e.g. `USERNAME_NOT_FOUND`
    pub error_code: Option<String>,
    /// Human-readable message from the provider
    pub message: String,
}

impl ProviderError {
    /// Create an error without a provider error code
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            error_code: None,
            message: message.into(),
        }
    }

    /// Attach the provider's error code (builder pattern)
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.error_code = Some(code.into());
        self
    }

    /// The target object does not exist
    ///
    /// A missing project or organization is not a missing target: the error
    /// code, when present, must name the user or the key.
    pub fn is_not_found(&self) -> bool {
        match self.error_code.as_deref() {
            Some(code) => TARGET_NOT_FOUND_CODES.contains(&code),
            None => self.status == 404,
        }
    }

    /// The request may have been applied remotely despite the failure
    ///
    /// No response arrived (status `0`) or a gateway timed out waiting on the
    /// provider.
    pub fn is_outcome_unknown(&self) -> bool {
        self.status == 0 || self.status == 504
    }

    /// The failure may succeed when retried later
    pub fn is_transient(&self) -> bool {
        self.status == 0 || self.status == 429 || self.status >= 500
    }
}
