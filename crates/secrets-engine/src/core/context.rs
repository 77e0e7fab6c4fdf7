//! Lifecycle request context
//!
//! Carries tracing metadata and the caller's cancellation signal into every
//! coordinator call.

use chrono::{DateTime, Utc};
use std::future::Future;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::EngineError;
use crate::provider::ProviderError;

/// Request context for lifecycle operations
///
/// # Examples
///
/// ```
/// use atlas_secrets_engine::core::LeaseContext;
/// use tokio_util::sync::CancellationToken;
///
/// let token = CancellationToken::new();
/// let ctx = LeaseContext::new().with_cancellation(token.clone());
/// assert!(!ctx.is_cancelled());
/// token.cancel();
/// assert!(ctx.is_cancelled());
/// ```
#[derive(Debug, Clone)]
pub struct LeaseContext {
    /// Trace ID for distributed tracing
    pub trace_id: Uuid,

    /// Timestamp of the request
    pub timestamp: DateTime<Utc>,

    cancel: Option<CancellationToken>,
}

impl LeaseContext {
    /// Create a context with a fresh trace ID and no cancellation
    pub fn new() -> Self {
        Self {
            trace_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            cancel: None,
        }
    }

    /// Set trace ID (builder pattern)
    pub fn with_trace_id(mut self, trace_id: Uuid) -> Self {
        self.trace_id = trace_id;
        self
    }

    /// Abort in-flight provider calls when `token` fires (builder pattern)
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Whether the caller has cancelled this request
    pub fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }

    /// Run one provider call, racing it against cancellation
    ///
    /// A dropped call future aborts the in-flight request.
    pub(crate) async fn call<T, F>(&self, operation: &'static str, call: F) -> Result<T, EngineError>
    where
        F: Future<Output = Result<T, ProviderError>>,
    {
        let outcome = match &self.cancel {
            Some(token) => {
                tokio::select! {
                    biased;
                    () = token.cancelled() => {
                        return Err(EngineError::Cancelled { operation, orphan: None });
                    }
                    outcome = call => outcome,
                }
            }
            None => call.await,
        };
        outcome.map_err(|source| EngineError::provider(operation, source))
    }
}

impl Default for LeaseContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_context_with_trace_id() {
        let trace = Uuid::new_v4();
        let ctx = LeaseContext::new().with_trace_id(trace);
        assert_eq!(ctx.trace_id, trace);
        assert!(!ctx.is_cancelled());
    }

    #[tokio::test]
    async fn test_call_maps_provider_error() {
        let ctx = LeaseContext::new();
        let result: Result<(), _> = ctx
            .call("delete_api_key", async { Err(ProviderError::new(500, "down")) })
            .await;
        assert!(matches!(
            result,
            Err(EngineError::Provider {
                operation: "delete_api_key",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_cancelled_call_is_aborted() {
        let token = CancellationToken::new();
        let ctx = LeaseContext::new().with_cancellation(token.clone());
        token.cancel();

        let result: Result<(), _> = ctx
            .call("create_database_user", async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(())
            })
            .await;
        assert!(matches!(
            result,
            Err(EngineError::Cancelled {
                operation: "create_database_user",
                orphan: None
            })
        ));
    }
}
