//! Role persistence

use std::sync::Arc;
use tracing::{debug, info};

use super::{Role, RoleRequest, validate_role_name};
use crate::core::{EngineError, ValidationError};
use crate::storage::{self, Storage};

const ROLE_PREFIX: &str = "role/";

fn role_key(name: &str) -> String {
    format!("{ROLE_PREFIX}{name}")
}

/// Role CRUD over host storage
#[derive(Clone)]
pub struct RoleStore {
    storage: Arc<dyn Storage>,
}

impl RoleStore {
    /// Create a store over host storage
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Validate `request` and store it as role `name`
    ///
    /// Replacing a role keeps its credential kind; a write that changes the
    /// kind is rejected.
    pub async fn put(&self, name: &str, request: RoleRequest) -> Result<Role, EngineError> {
        let role = request.validate(name)?;

        if let Some(existing) = self.get(name).await?
            && existing.credential_type() != role.credential_type()
        {
            return Err(ValidationError::KindChange {
                name: name.to_string(),
                from: existing.credential_type(),
                to: role.credential_type(),
            }
            .into());
        }

        storage::put_json(self.storage.as_ref(), &role_key(name), &role).await?;
        info!(
            role = %name,
            credential_type = %role.credential_type(),
            "Role stored"
        );
        Ok(role)
    }

    /// Load role `name`
    pub async fn get(&self, name: &str) -> Result<Option<Role>, EngineError> {
        validate_role_name(name)?;
        let role = storage::get_json::<Role>(self.storage.as_ref(), &role_key(name)).await?;
        debug!(role = %name, found = role.is_some(), "Loaded role");
        Ok(role)
    }

    /// Load role `name` or fail with [`EngineError::RoleNotFound`]
    pub async fn require(&self, name: &str) -> Result<Role, EngineError> {
        self.get(name).await?.ok_or_else(|| EngineError::RoleNotFound {
            name: name.to_string(),
        })
    }

    /// Delete role `name`; deleting a missing role succeeds
    ///
    /// Leases already issued from the role stay renewable and revocable.
    pub async fn delete(&self, name: &str) -> Result<(), EngineError> {
        validate_role_name(name)?;
        self.storage.delete(&role_key(name)).await?;
        info!(role = %name, "Role deleted");
        Ok(())
    }

    /// Sorted role names
    pub async fn list(&self) -> Result<Vec<String>, EngineError> {
        Ok(self.storage.list(ROLE_PREFIX).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::CredentialType;
    use crate::storage::MemoryStorage;
    use serde_json::json;

    fn store() -> RoleStore {
        RoleStore::new(Arc::new(MemoryStorage::new()))
    }

    fn db_request() -> RoleRequest {
        serde_json::from_value(json!({
            "credential_type": "database_user",
            "project_id": "P",
            "database_name": "admin",
            "roles": [{ "databaseName": "admin", "roleName": "readWrite" }],
        }))
        .unwrap()
    }

    fn org_request() -> RoleRequest {
        serde_json::from_value(json!({
            "credential_type": "org_programmatic_api_key",
            "organization_id": "O",
            "programmatic_key_roles": ["ORG_MEMBER"],
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let roles = store();
        roles.put("app", db_request()).await.unwrap();

        let role = roles.require("app").await.unwrap();
        assert_eq!(role.credential_type(), CredentialType::DatabaseUser);

        roles.delete("app").await.unwrap();
        assert!(matches!(
            roles.require("app").await,
            Err(EngineError::RoleNotFound { name }) if name == "app"
        ));
    }

    #[tokio::test]
    async fn test_invalid_role_is_not_stored() {
        let roles = store();
        let mut request = db_request();
        request.database_name = None;

        assert!(matches!(
            roles.put("app", request).await,
            Err(EngineError::Validation(_))
        ));
        assert!(roles.get("app").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_kind_cannot_change() {
        let roles = store();
        roles.put("app", db_request()).await.unwrap();

        let err = roles.put("app", org_request()).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::Validation(ValidationError::KindChange {
                from: CredentialType::DatabaseUser,
                to: CredentialType::OrgProgrammaticApiKey,
                ..
            })
        ));

        // same kind may be overwritten
        let mut request = db_request();
        request.ttl = Some(std::time::Duration::from_secs(60));
        let role = roles.put("app", request).await.unwrap();
        assert_eq!(role.bounds.ttl, Some(std::time::Duration::from_secs(60)));
    }

    #[tokio::test]
    async fn test_list_sorted() {
        let roles = store();
        roles.put("zeta", org_request()).await.unwrap();
        roles.put("alpha", db_request()).await.unwrap();
        assert_eq!(roles.list().await.unwrap(), vec!["alpha", "zeta"]);
    }
}
