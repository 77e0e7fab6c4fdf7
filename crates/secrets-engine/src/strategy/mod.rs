//! Per-kind credential strategies
//!
//! Each credential kind implements create, renew and delete. Dispatch is an
//! exhaustive match over [`CredentialKind`] and [`LeaseMetadata`], so a new
//! kind does not compile until every operation handles it.

mod database_user;
mod generate;
mod programmatic_key;

use std::time::Duration;
use tracing::warn;

use crate::config::{AccessKeys, EngineConfig};
use crate::core::{EngineError, LeaseContext, PolicyError, SystemDefaults};
use crate::lease::{IssuedCredential, LeaseMetadata, RenewOutcome, RevokeOutcome};
use crate::provider::ProviderClient;
use crate::role::{CredentialKind, Role};

/// Everything a strategy needs to talk to the provider for one request
pub(crate) struct StrategyContext<'a> {
    pub(crate) keys: &'a AccessKeys,
    pub(crate) provider: &'a dyn ProviderClient,
    pub(crate) config: &'a EngineConfig,
    pub(crate) lease: &'a LeaseContext,
}

/// Mint a credential for `role`
pub(crate) async fn create(
    cx: &StrategyContext<'_>,
    role: &Role,
    requested_ttl: Option<Duration>,
) -> Result<IssuedCredential, EngineError> {
    let lease_ttl = role
        .bounds
        .grant(requested_ttl, &cx.config.system_defaults());

    let (secret, metadata) = match &role.kind {
        CredentialKind::DatabaseUser(fields) => database_user::create(cx, role, fields).await?,
        CredentialKind::OrgProgrammaticApiKey(fields) => {
            programmatic_key::create_org(cx, role, fields).await?
        }
        CredentialKind::ProjectProgrammaticApiKey(fields) => {
            programmatic_key::create_project(cx, role, fields).await?
        }
    };

    Ok(IssuedCredential {
        secret,
        metadata,
        lease_ttl,
    })
}

/// Compute a renewed TTL without contacting the provider
///
/// `role` is the current definition of the lease's role, if it still exists.
/// When it is gone or has changed kind, the bounds recorded in `metadata`
/// are used and the reason is returned as a warning.
pub(crate) fn renew(
    metadata: &LeaseMetadata,
    role: Option<&Role>,
    current: Duration,
    extension: Duration,
    defaults: &SystemDefaults,
) -> Result<RenewOutcome, PolicyError> {
    let name = role.map_or(metadata.role_name(), |role| role.name.as_str());

    let warning = match role {
        Some(role) if role.credential_type() == metadata.credential_type() => {
            return Ok(RenewOutcome {
                ttl: role.bounds.renew(current, extension, defaults),
                warning: None,
            });
        }
        Some(role) => PolicyError::KindMismatch {
            name: name.to_string(),
            expected: metadata.credential_type(),
            found: role.credential_type(),
        },
        None => PolicyError::RoleMissing {
            name: name.to_string(),
        },
    };

    let bounds = metadata.bounds().ok_or_else(|| PolicyError::BoundsUnknown {
        name: name.to_string(),
    })?;
    warn!(role = %name, reason = %warning, "Renewing with recorded TTL bounds");

    Ok(RenewOutcome {
        ttl: bounds.renew(current, extension, defaults),
        warning: Some(warning),
    })
}

/// Delete the remote object described by `metadata`
///
/// A remote object that is already gone counts as success.
pub(crate) async fn delete(
    cx: &StrategyContext<'_>,
    metadata: &LeaseMetadata,
) -> Result<RevokeOutcome, EngineError> {
    let result = match metadata {
        LeaseMetadata::DatabaseUser {
            username,
            project_id,
            database_name,
            ..
        } => database_user::delete(cx, project_id, database_name, username).await,
        LeaseMetadata::OrgProgrammaticKey {
            key_id,
            organization_id,
            ..
        }
        | LeaseMetadata::ProjectProgrammaticKey {
            key_id,
            organization_id,
            ..
        } => programmatic_key::delete(cx, organization_id, key_id).await,
    };

    match result {
        Ok(()) => Ok(RevokeOutcome::Deleted),
        Err(EngineError::Provider { source, .. }) if source.is_not_found() => {
            warn!(
                role = %metadata.role_name(),
                credential_type = %metadata.credential_type(),
                remote_id = %metadata.remote_id(),
                "Remote credential already absent"
            );
            Ok(RevokeOutcome::AlreadyAbsent)
        }
        Err(err) => Err(err),
    }
}
