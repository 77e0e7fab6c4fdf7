//! Programmatic API key credentials, organization and project scoped
//!
//! Project keys are created in two phases. Phase 1 creates the key in the
//! organization and records its lease metadata; phase 2 assigns it to the
//! project. A phase 2 failure returns the phase 1 metadata as an orphan so
//! the host can revoke the key.

use chrono::Utc;
use tracing::{debug, error, info};

use super::StrategyContext;
use crate::core::EngineError;
use crate::lease::{LeaseMetadata, SecretPayload};
use crate::provider::{ApiKey, ApiKeyRequest};
use crate::role::{OrgApiKeyRole, ProjectApiKeyRole, Role};

pub(super) async fn create_org(
    cx: &StrategyContext<'_>,
    role: &Role,
    fields: &OrgApiKeyRole,
) -> Result<(SecretPayload, LeaseMetadata), EngineError> {
    let request = ApiKeyRequest {
        description: description(cx, role, fields.description.as_deref()),
        roles: fields.key_roles.iter().cloned().collect(),
        ip_addresses: fields.ip_addresses.iter().cloned().collect(),
        cidr_blocks: fields.cidr_blocks.iter().cloned().collect(),
    };

    let key = create_key(cx, role, &fields.organization_id, &request).await?;
    let metadata = LeaseMetadata::OrgProgrammaticKey {
        role_name: role.name.clone(),
        key_id: key.id.clone(),
        organization_id: fields.organization_id.clone(),
        bounds: Some(role.bounds),
    };

    info!(
        role = %role.name,
        organization_id = %fields.organization_id,
        key_id = %key.id,
        "Organization API key created"
    );
    Ok((payload(key), metadata))
}

pub(super) async fn create_project(
    cx: &StrategyContext<'_>,
    role: &Role,
    fields: &ProjectApiKeyRole,
) -> Result<(SecretPayload, LeaseMetadata), EngineError> {
    let organization_id = match &fields.organization_id {
        Some(organization_id) => organization_id.clone(),
        None => {
            let project = cx
                .lease
                .call(
                    "get_project",
                    cx.provider.get_project(cx.keys, &fields.project_id),
                )
                .await?;
            debug!(
                project_id = %fields.project_id,
                organization_id = %project.organization_id,
                "Resolved project organization"
            );
            project.organization_id
        }
    };

    let roles: Vec<String> = fields.key_roles.iter().cloned().collect();
    let request = ApiKeyRequest {
        description: description(cx, role, fields.description.as_deref()),
        roles: roles.clone(),
        ip_addresses: Vec::new(),
        cidr_blocks: Vec::new(),
    };

    // Phase 1
    let key = create_key(cx, role, &organization_id, &request).await?;
    let metadata = LeaseMetadata::ProjectProgrammaticKey {
        role_name: role.name.clone(),
        key_id: key.id.clone(),
        organization_id,
        project_id: fields.project_id.clone(),
        bounds: Some(role.bounds),
    };

    // Phase 2
    let assigned = cx
        .lease
        .call(
            "assign_api_key_to_project",
            cx.provider
                .assign_api_key_to_project(cx.keys, &fields.project_id, &key.id, &roles),
        )
        .await;
    if let Err(err) = assigned {
        error!(
            role = %role.name,
            project_id = %fields.project_id,
            key_id = %key.id,
            error = %err,
            "Project assignment failed; API key left for revocation"
        );
        return Err(err.with_orphan(metadata));
    }

    info!(
        role = %role.name,
        project_id = %fields.project_id,
        key_id = %key.id,
        "Project API key created"
    );
    Ok((payload(key), metadata))
}

pub(super) async fn delete(
    cx: &StrategyContext<'_>,
    organization_id: &str,
    key_id: &str,
) -> Result<(), EngineError> {
    cx.lease
        .call(
            "delete_api_key",
            cx.provider.delete_api_key(cx.keys, organization_id, key_id),
        )
        .await
}

async fn create_key(
    cx: &StrategyContext<'_>,
    role: &Role,
    organization_id: &str,
    request: &ApiKeyRequest,
) -> Result<ApiKey, EngineError> {
    debug!(
        role = %role.name,
        organization_id = %organization_id,
        roles = ?request.roles,
        "Creating API key"
    );
    cx.lease
        .call(
            "create_org_api_key",
            cx.provider.create_org_api_key(cx.keys, organization_id, request),
        )
        .await
}

fn description(cx: &StrategyContext<'_>, role: &Role, configured: Option<&str>) -> String {
    configured.map_or_else(
        || {
            format!(
                "{}-{}-{}",
                cx.config.username_prefix,
                role.name,
                Utc::now().timestamp()
            )
        },
        str::to_string,
    )
}

fn payload(key: ApiKey) -> SecretPayload {
    SecretPayload::ProgrammaticKey {
        public_key: key.public_key,
        private_key: key.private_key,
    }
}
