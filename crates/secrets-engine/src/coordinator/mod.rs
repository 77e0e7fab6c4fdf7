//! Lifecycle coordinator: the host's entry point for issue, renew and revoke
//!
//! The coordinator loads the access keys and role for each call, dispatches
//! to the credential strategy for the role's kind, and applies TTL policy.
//! It holds no per-lease state; every call is independent.

mod builder;

pub use builder::{LifecycleCoordinatorBuilder, No};

use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::config::{ConfigStore, EngineConfig};
use crate::core::{EngineError, LeaseContext};
use crate::lease::{IssuedCredential, LeaseMetadata, RenewOutcome, RevokeOutcome};
use crate::provider::ProviderClient;
use crate::role::RoleStore;
use crate::strategy::{self, StrategyContext};

/// Issues, renews and revokes dynamic credentials
#[derive(Clone)]
pub struct LifecycleCoordinator {
    roles: RoleStore,
    access_keys: ConfigStore,
    provider: Arc<dyn ProviderClient>,
    config: Arc<EngineConfig>,
}

impl LifecycleCoordinator {
    /// Start building a coordinator
    pub fn builder() -> LifecycleCoordinatorBuilder<No, No> {
        LifecycleCoordinatorBuilder::new()
    }

    /// Role store backing this coordinator
    pub fn roles(&self) -> &RoleStore {
        &self.roles
    }

    /// Access key store backing this coordinator
    pub fn access_keys(&self) -> &ConfigStore {
        &self.access_keys
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Issue a credential from role `role_name`
    ///
    /// `requested_ttl` of `None` or zero means the role default. The granted
    /// TTL never exceeds the role's maximum.
    ///
    /// # Errors
    ///
    /// - [`EngineError::ConfigMissing`] when no access keys are stored
    /// - [`EngineError::RoleNotFound`] when the role does not exist
    /// - [`EngineError::Provider`] when a provider call fails; check
    ///   [`EngineError::orphaned_lease`] for a key left behind
    #[tracing::instrument(skip(self, ctx), fields(trace_id = %ctx.trace_id))]
    pub async fn issue(
        &self,
        role_name: &str,
        requested_ttl: Option<Duration>,
        ctx: &LeaseContext,
    ) -> Result<IssuedCredential, EngineError> {
        let keys = self.access_keys.require().await?;
        let role = self.roles.require(role_name).await?;

        let cx = StrategyContext {
            keys: &keys,
            provider: self.provider.as_ref(),
            config: &self.config,
            lease: ctx,
        };
        match strategy::create(&cx, &role, requested_ttl).await {
            Ok(issued) => {
                info!(
                    role = %role.name,
                    credential_type = %role.credential_type(),
                    lease_ttl_secs = issued.lease_ttl.as_secs(),
                    "Credential issued"
                );
                Ok(issued)
            }
            Err(err) => {
                error!(
                    role = %role.name,
                    credential_type = %role.credential_type(),
                    orphaned = err.orphaned_lease().is_some(),
                    error = %err,
                    "Credential issuance failed"
                );
                Err(err)
            }
        }
    }

    /// Extend a lease
    ///
    /// Does not contact the provider. The role is looked up by `role_hint`,
    /// falling back to the role recorded in `metadata`. When the role is gone
    /// the TTL bounds recorded at issuance apply and the outcome carries a
    /// warning.
    ///
    /// # Errors
    ///
    /// [`EngineError::Policy`] when no TTL bounds can be determined.
    #[tracing::instrument(
        skip(self, metadata, ctx),
        fields(trace_id = %ctx.trace_id, role = %metadata.role_name())
    )]
    pub async fn renew(
        &self,
        metadata: &LeaseMetadata,
        role_hint: Option<&str>,
        current_ttl: Duration,
        extension: Duration,
        ctx: &LeaseContext,
    ) -> Result<RenewOutcome, EngineError> {
        let name = role_hint.unwrap_or(metadata.role_name());
        let role = match self.roles.get(name).await {
            Ok(role) => role,
            Err(err) => {
                warn!(role = %name, error = %err, "Role lookup failed during renewal");
                None
            }
        };

        let outcome = strategy::renew(
            metadata,
            role.as_ref(),
            current_ttl,
            extension,
            &self.config.system_defaults(),
        )?;

        info!(
            credential_type = %metadata.credential_type(),
            ttl_secs = outcome.ttl.as_secs(),
            fallback = outcome.warning.is_some(),
            "Lease renewed"
        );
        Ok(outcome)
    }

    /// Delete the remote credential behind a lease
    ///
    /// Safe to retry: a credential that is already gone yields
    /// [`RevokeOutcome::AlreadyAbsent`].
    #[tracing::instrument(
        skip(self, metadata, ctx),
        fields(trace_id = %ctx.trace_id, role = %metadata.role_name())
    )]
    pub async fn revoke(
        &self,
        metadata: &LeaseMetadata,
        ctx: &LeaseContext,
    ) -> Result<RevokeOutcome, EngineError> {
        let keys = self.access_keys.require().await?;
        let cx = StrategyContext {
            keys: &keys,
            provider: self.provider.as_ref(),
            config: &self.config,
            lease: ctx,
        };

        match strategy::delete(&cx, metadata).await {
            Ok(outcome) => {
                info!(
                    credential_type = %metadata.credential_type(),
                    remote_id = %metadata.remote_id(),
                    outcome = ?outcome,
                    "Lease revoked"
                );
                Ok(outcome)
            }
            Err(err) => {
                error!(
                    credential_type = %metadata.credential_type(),
                    remote_id = %metadata.remote_id(),
                    error = %err,
                    "Lease revocation failed"
                );
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AccessKeysRequest;
    use crate::core::SecretString;
    use crate::provider::MockProviderClient;
    use crate::role::RoleRequest;
    use crate::storage::MemoryStorage;
    use serde_json::json;

    async fn coordinator(provider: MockProviderClient) -> LifecycleCoordinator {
        let coordinator = LifecycleCoordinator::builder()
            .storage(Arc::new(MemoryStorage::new()))
            .provider(Arc::new(provider))
            .build()
            .unwrap();
        coordinator
            .access_keys()
            .put(AccessKeysRequest {
                public_key: Some("public".into()),
                private_key: Some(SecretString::new("private")),
            })
            .await
            .unwrap();
        coordinator
    }

    fn strict_provider() -> MockProviderClient {
        let mut provider = MockProviderClient::new();
        provider.expect_create_database_user().never();
        provider.expect_create_org_api_key().never();
        provider.expect_get_project().never();
        provider.expect_assign_api_key_to_project().never();
        provider
    }

    #[tokio::test]
    async fn test_rejected_role_never_reaches_provider() {
        let coordinator = coordinator(strict_provider()).await;

        let request: RoleRequest = serde_json::from_value(json!({
            "credential_type": "database_user",
            "project_id": "P",
            "roles": [{ "databaseName": "admin", "roleName": "atlasAdmin" }],
        }))
        .unwrap();
        let err = coordinator
            .roles()
            .put("test-credential", request)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));

        let err = coordinator
            .issue("test-credential", None, &LeaseContext::new())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::RoleNotFound { .. }));
    }

    #[tokio::test]
    async fn test_issue_without_access_keys() {
        let coordinator = LifecycleCoordinator::builder()
            .storage(Arc::new(MemoryStorage::new()))
            .provider(Arc::new(strict_provider()))
            .build()
            .unwrap();

        let err = coordinator
            .issue("anything", None, &LeaseContext::new())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::ConfigMissing));
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let result = LifecycleCoordinator::builder()
            .storage(Arc::new(MemoryStorage::new()))
            .provider(Arc::new(MockProviderClient::new()))
            .config(EngineConfig {
                password_length: 4,
                ..EngineConfig::default()
            })
            .build();
        assert!(result.is_err());
    }
}
