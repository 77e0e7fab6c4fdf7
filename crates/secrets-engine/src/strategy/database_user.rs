//! Database user credentials

use tracing::{debug, info};

use super::{StrategyContext, generate};
use crate::core::EngineError;
use crate::lease::{LeaseMetadata, SecretPayload};
use crate::provider::DatabaseUserRequest;
use crate::role::{DatabaseUserRole, Role};

pub(super) async fn create(
    cx: &StrategyContext<'_>,
    role: &Role,
    fields: &DatabaseUserRole,
) -> Result<(SecretPayload, LeaseMetadata), EngineError> {
    let username = generate::username(&cx.config.username_prefix, &role.name);
    let password = generate::password(cx.config.password_length);

    // Known before the call, so a create with an unknown outcome can still be cleaned up
    let metadata = LeaseMetadata::DatabaseUser {
        role_name: role.name.clone(),
        username: username.clone(),
        project_id: fields.project_id.clone(),
        database_name: fields.database_name.clone(),
        bounds: Some(role.bounds),
    };

    let request = DatabaseUserRequest {
        project_id: fields.project_id.clone(),
        database_name: fields.database_name.clone(),
        username,
        password: password.clone(),
        roles: fields.roles.clone(),
    };
    debug!(
        role = %role.name,
        project_id = %request.project_id,
        username = %request.username,
        "Creating database user"
    );

    let user = cx
        .lease
        .call(
            "create_database_user",
            cx.provider.create_database_user(cx.keys, &request),
        )
        .await
        .map_err(|err| {
            let outcome_unknown = match &err {
                EngineError::Cancelled { .. } => true,
                EngineError::Provider { source, .. } => source.is_outcome_unknown(),
                _ => false,
            };
            if outcome_unknown {
                err.with_orphan(metadata.clone())
            } else {
                err
            }
        })?;

    info!(
        role = %role.name,
        project_id = %user.project_id,
        username = %user.username,
        "Database user created"
    );

    Ok((
        SecretPayload::DatabaseUser {
            username: user.username,
            password,
        },
        metadata,
    ))
}

pub(super) async fn delete(
    cx: &StrategyContext<'_>,
    project_id: &str,
    database_name: &str,
    username: &str,
) -> Result<(), EngineError> {
    cx.lease
        .call(
            "delete_database_user",
            cx.provider
                .delete_database_user(cx.keys, project_id, database_name, username),
        )
        .await
}
