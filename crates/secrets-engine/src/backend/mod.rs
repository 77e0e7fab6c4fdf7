//! Logical-path request surface for the secrets host
//!
//! | Path            | Operations            |
//! |-----------------|-----------------------|
//! | `config/root`   | read, write, delete   |
//! | `roles/`        | list                  |
//! | `roles/{name}`  | read, write, delete   |
//! | `creds/{name}`  | read                  |
//!
//! Lease renewal and revocation arrive as separate events carrying the
//! [`LeaseHandle`] returned by a `creds/{name}` read.
//!
//! Writes and deletes answer with no payload. Reads of missing entries also
//! answer with no payload.

mod path;

pub use path::Operation;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use std::time::Duration;
use tracing::debug;

use self::path::Route;
use crate::config::AccessKeysRequest;
use crate::coordinator::LifecycleCoordinator;
use crate::core::{EngineError, LeaseContext, ValidationError, ttl::flexible_option};
use crate::lease::{LeaseHandle, LeaseMetadata, RevokeOutcome};
use crate::role::RoleRequest;

/// Payload returned by read-style operations and lease events
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response {
    /// Response body
    pub data: Map<String, Value>,
    /// Lease wrapping an issued credential
    pub lease: Option<LeaseHandle>,
    /// Non-fatal notices for the operator
    pub warnings: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct CredsRequest {
    #[serde(default, deserialize_with = "flexible_option::deserialize")]
    ttl: Option<Duration>,
}

/// Secrets engine as mounted by the host
#[derive(Clone)]
pub struct SecretsBackend {
    coordinator: LifecycleCoordinator,
}

impl SecretsBackend {
    /// Serve requests through `coordinator`
    pub fn new(coordinator: LifecycleCoordinator) -> Self {
        Self { coordinator }
    }

    /// Underlying coordinator
    pub fn coordinator(&self) -> &LifecycleCoordinator {
        &self.coordinator
    }

    /// Handle one logical-path request
    ///
    /// `data` is the request body for writes; reads of `creds/{name}` accept
    /// an optional `{"ttl": ...}` body.
    ///
    /// # Errors
    ///
    /// [`ValidationError::UnsupportedOperation`] for unknown paths, plus any
    /// error of the operation behind the path.
    pub async fn handle(
        &self,
        operation: Operation,
        path: &str,
        data: Option<Value>,
        ctx: &LeaseContext,
    ) -> Result<Option<Response>, EngineError> {
        debug!(%operation, path = %path, trace_id = %ctx.trace_id, "Handling request");

        match Route::parse(operation, path)? {
            Route::ConfigRoot => self.config_root(operation, data).await,
            Route::Roles => {
                let keys = self.coordinator.roles().list().await?;
                Ok(Some(Response {
                    data: object(json!({ "keys": keys })),
                    ..Response::default()
                }))
            }
            Route::Role(name) => self.role(operation, name, data).await,
            Route::Creds(name) => {
                let request: CredsRequest = decode(data)?;
                let issued = self.coordinator.issue(name, request.ttl, ctx).await?;
                Ok(Some(Response {
                    data: issued.secret.to_response(),
                    lease: Some(LeaseHandle::new(issued.metadata, issued.lease_ttl)),
                    warnings: Vec::new(),
                }))
            }
        }
    }

    /// Handle a lease renewal event
    ///
    /// Returns the same lease with its new TTL. Renewal that fell back to the
    /// bounds recorded at issuance reports why in `warnings`.
    pub async fn renew(
        &self,
        lease: &LeaseHandle,
        increment: Duration,
        ctx: &LeaseContext,
    ) -> Result<Response, EngineError> {
        let outcome = self
            .coordinator
            .renew(&lease.metadata, None, lease.ttl, increment, ctx)
            .await?;
        Ok(Response {
            data: Map::new(),
            lease: Some(lease.renewed(outcome.ttl)),
            warnings: outcome
                .warning
                .map(|warning| warning.to_string())
                .into_iter()
                .collect(),
        })
    }

    /// Handle a lease revocation event
    pub async fn revoke(
        &self,
        lease: &LeaseHandle,
        ctx: &LeaseContext,
    ) -> Result<RevokeOutcome, EngineError> {
        self.revoke_metadata(&lease.metadata, ctx).await
    }

    /// Revoke a credential known only by its metadata
    ///
    /// Used for orphans reported through [`EngineError::orphaned_lease`],
    /// which never received a [`LeaseHandle`].
    pub async fn revoke_metadata(
        &self,
        metadata: &LeaseMetadata,
        ctx: &LeaseContext,
    ) -> Result<RevokeOutcome, EngineError> {
        self.coordinator.revoke(metadata, ctx).await
    }

    async fn config_root(
        &self,
        operation: Operation,
        data: Option<Value>,
    ) -> Result<Option<Response>, EngineError> {
        let store = self.coordinator.access_keys();
        match operation {
            Operation::Write => {
                store.put(decode::<AccessKeysRequest>(data)?).await?;
                Ok(None)
            }
            Operation::Delete => {
                store.delete().await?;
                Ok(None)
            }
            _ => Ok(store.get().await?.map(|keys| Response {
                data: object(json!({ "public_key": keys.public_key })),
                ..Response::default()
            })),
        }
    }

    async fn role(
        &self,
        operation: Operation,
        name: &str,
        data: Option<Value>,
    ) -> Result<Option<Response>, EngineError> {
        let roles = self.coordinator.roles();
        match operation {
            Operation::Write => {
                roles.put(name, decode::<RoleRequest>(data)?).await?;
                Ok(None)
            }
            Operation::Delete => {
                roles.delete(name).await?;
                Ok(None)
            }
            _ => Ok(roles.get(name).await?.map(|role| Response {
                data: role.to_response(),
                ..Response::default()
            })),
        }
    }
}

fn decode<T>(data: Option<Value>) -> Result<T, ValidationError>
where
    T: DeserializeOwned,
{
    serde_json::from_value(data.unwrap_or_else(|| json!({})))
        .map_err(|e| ValidationError::Malformed(e.to_string()))
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockProviderClient;
    use crate::storage::MemoryStorage;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    fn backend() -> SecretsBackend {
        let coordinator = LifecycleCoordinator::builder()
            .storage(Arc::new(MemoryStorage::new()))
            .provider(Arc::new(MockProviderClient::new()))
            .build()
            .unwrap();
        SecretsBackend::new(coordinator)
    }

    #[tokio::test]
    async fn test_config_read_hides_private_key() {
        let backend = backend();
        let ctx = LeaseContext::new();

        let written = backend
            .handle(
                Operation::Write,
                "config/root",
                Some(json!({ "public_key": "pub", "private_key": "priv" })),
                &ctx,
            )
            .await
            .unwrap();
        assert_eq!(written, None);

        let read = backend
            .handle(Operation::Read, "config/root", None, &ctx)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(read.data, object(json!({ "public_key": "pub" })));
    }

    #[tokio::test]
    async fn test_config_write_rejects_unknown_fields() {
        let err = backend()
            .handle(
                Operation::Write,
                "config/root",
                Some(json!({ "public_key": "pub", "private_key": "priv", "region": "eu" })),
                &LeaseContext::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            EngineError::Validation(ValidationError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_role_write_read_list_delete() {
        let backend = backend();
        let ctx = LeaseContext::new();
        let body = json!({
            "credential_type": "org_programmatic_api_key",
            "organization_id": "O",
            "programmatic_key_roles": "ORG_MEMBER",
            "ttl": "30m",
        });

        for name in ["b-role", "a-role"] {
            let response = backend
                .handle(Operation::Write, &format!("roles/{name}"), Some(body.clone()), &ctx)
                .await
                .unwrap();
            assert_eq!(response, None);
        }

        let listed = backend
            .handle(Operation::List, "roles/", None, &ctx)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(listed.data["keys"], json!(["a-role", "b-role"]));

        let read = backend
            .handle(Operation::Read, "roles/a-role", None, &ctx)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(read.data["ttl"], json!(1800));
        assert_eq!(read.data["programmatic_key_roles"], json!(["ORG_MEMBER"]));

        backend
            .handle(Operation::Delete, "roles/a-role", None, &ctx)
            .await
            .unwrap();
        let missing = backend
            .handle(Operation::Read, "roles/a-role", None, &ctx)
            .await
            .unwrap();
        assert_eq!(missing, None);
    }

    #[tokio::test]
    async fn test_unknown_path() {
        let err = backend()
            .handle(Operation::Read, "static/thing", None, &LeaseContext::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("static/thing"));
    }
}
