//! Test utilities
//!
//! [`InMemoryProvider`] is a fake remote provider that keeps database users
//! and API keys in memory, with failure injection and call counters.
//! Enabled by the `test-util` feature.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use uuid::Uuid;

use crate::config::AccessKeys;
use crate::core::SecretString;
use crate::provider::{
    ApiKey, ApiKeyRequest, DatabaseUser, DatabaseUserRequest, Project, ProviderClient,
    ProviderError,
};
use crate::role::DatabaseRoleGrant;

/// Provider operation, for failure injection and call counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderOperation {
    /// `create_database_user`
    CreateDatabaseUser,
    /// `delete_database_user`
    DeleteDatabaseUser,
    /// `create_org_api_key`
    CreateOrgApiKey,
    /// `assign_api_key_to_project`
    AssignApiKeyToProject,
    /// `get_project`
    GetProject,
    /// `delete_api_key`
    DeleteApiKey,
}

/// A stored API key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKeyRecord {
    /// Owning organization
    pub organization_id: String,
    /// Public half
    pub public_key: String,
    /// Organization roles
    pub roles: BTreeSet<String>,
    /// Project assignments with their roles
    pub projects: BTreeMap<String, BTreeSet<String>>,
    /// Access list entries, addresses and ranges
    pub access_list: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct UserKey {
    project_id: String,
    database_name: String,
    username: String,
}

/// In-memory fake of the remote provider
///
/// # Examples
///
/// ```
/// use atlas_secrets_engine::provider::ProviderError;
/// use atlas_secrets_engine::testing::{InMemoryProvider, ProviderOperation};
///
/// let provider = InMemoryProvider::new().with_project("P", "O");
/// provider.fail_next(
///     ProviderOperation::AssignApiKeyToProject,
///     ProviderError::new(500, "Unexpected error"),
/// );
/// assert_eq!(provider.call_count(ProviderOperation::AssignApiKeyToProject), 0);
/// ```
#[derive(Clone, Default)]
pub struct InMemoryProvider {
    database_users: Arc<DashMap<UserKey, Vec<DatabaseRoleGrant>>>,
    api_keys: Arc<DashMap<String, ApiKeyRecord>>,
    projects: Arc<DashMap<String, String>>,
    failures: Arc<DashMap<ProviderOperation, ProviderError>>,
    calls: Arc<DashMap<ProviderOperation, u32>>,
    next_key: Arc<AtomicU64>,
    required_keys: Option<String>,
    delay: Option<Duration>,
}

impl InMemoryProvider {
    /// Create an empty provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a project and its owning organization
    pub fn with_project(self, project_id: &str, organization_id: &str) -> Self {
        self.projects
            .insert(project_id.to_string(), organization_id.to_string());
        self
    }

    /// Reject calls made with any other access key (HTTP 401)
    pub fn with_access_keys(mut self, keys: &AccessKeys) -> Self {
        self.required_keys = Some(keys.public_key.clone());
        self
    }

    /// Set artificial delay for every call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Make the next call of `operation` fail with `error`
    pub fn fail_next(&self, operation: ProviderOperation, error: ProviderError) {
        self.failures.insert(operation, error);
    }

    /// Number of calls of `operation`, including failed ones
    pub fn call_count(&self, operation: ProviderOperation) -> u32 {
        self.calls.get(&operation).map_or(0, |count| *count)
    }

    /// Total number of calls
    pub fn total_calls(&self) -> u32 {
        self.calls.iter().map(|entry| *entry.value()).sum()
    }

    /// Granted roles of a database user, if it exists
    pub fn database_user(
        &self,
        project_id: &str,
        database_name: &str,
        username: &str,
    ) -> Option<Vec<DatabaseRoleGrant>> {
        self.database_users
            .get(&UserKey {
                project_id: project_id.to_string(),
                database_name: database_name.to_string(),
                username: username.to_string(),
            })
            .map(|entry| entry.value().clone())
    }

    /// Number of live database users
    pub fn database_user_count(&self) -> usize {
        self.database_users.len()
    }

    /// A stored API key, if it exists
    pub fn api_key(&self, key_id: &str) -> Option<ApiKeyRecord> {
        self.api_keys.get(key_id).map(|entry| entry.value().clone())
    }

    /// Number of live API keys
    pub fn api_key_count(&self) -> usize {
        self.api_keys.len()
    }

    async fn enter(
        &self,
        operation: ProviderOperation,
        keys: &AccessKeys,
    ) -> Result<(), ProviderError> {
        *self.calls.entry(operation).or_insert(0) += 1;

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some((_, error)) = self.failures.remove(&operation) {
            return Err(error);
        }

        if let Some(required) = &self.required_keys
            && required != &keys.public_key
        {
            return Err(ProviderError::new(401, "You are not authorized for this resource.")
                .with_code("UNAUTHORIZED"));
        }
        Ok(())
    }
}

#[async_trait]
impl ProviderClient for InMemoryProvider {
    async fn create_database_user(
        &self,
        keys: &AccessKeys,
        request: &DatabaseUserRequest,
    ) -> Result<DatabaseUser, ProviderError> {
        self.enter(ProviderOperation::CreateDatabaseUser, keys).await?;

        let key = UserKey {
            project_id: request.project_id.clone(),
            database_name: request.database_name.clone(),
            username: request.username.clone(),
        };
        if self.database_users.contains_key(&key) {
            return Err(ProviderError::new(
                409,
                format!("A user with username {} already exists.", request.username),
            )
            .with_code("USER_ALREADY_EXISTS"));
        }
        self.database_users.insert(key, request.roles.clone());

        Ok(DatabaseUser {
            username: request.username.clone(),
            project_id: request.project_id.clone(),
            database_name: request.database_name.clone(),
        })
    }

    async fn delete_database_user(
        &self,
        keys: &AccessKeys,
        project_id: &str,
        database_name: &str,
        username: &str,
    ) -> Result<(), ProviderError> {
        self.enter(ProviderOperation::DeleteDatabaseUser, keys).await?;

        let key = UserKey {
            project_id: project_id.to_string(),
            database_name: database_name.to_string(),
            username: username.to_string(),
        };
        match self.database_users.remove(&key) {
            Some(_) => Ok(()),
            None => Err(ProviderError::new(
                404,
                format!("No user with username {username} exists."),
            )
            .with_code("USERNAME_NOT_FOUND")),
        }
    }

    async fn create_org_api_key(
        &self,
        keys: &AccessKeys,
        organization_id: &str,
        request: &ApiKeyRequest,
    ) -> Result<ApiKey, ProviderError> {
        self.enter(ProviderOperation::CreateOrgApiKey, keys).await?;

        let serial = self.next_key.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("{serial:024x}");
        let public_key = format!("pk{serial:06}");
        let private_key = Uuid::new_v4().to_string();

        self.api_keys.insert(
            id.clone(),
            ApiKeyRecord {
                organization_id: organization_id.to_string(),
                public_key: public_key.clone(),
                roles: request.roles.iter().cloned().collect(),
                projects: BTreeMap::new(),
                access_list: request
                    .ip_addresses
                    .iter()
                    .chain(&request.cidr_blocks)
                    .cloned()
                    .collect(),
            },
        );

        Ok(ApiKey {
            id,
            public_key,
            private_key: SecretString::new(private_key),
        })
    }

    async fn assign_api_key_to_project(
        &self,
        keys: &AccessKeys,
        project_id: &str,
        key_id: &str,
        roles: &[String],
    ) -> Result<(), ProviderError> {
        self.enter(ProviderOperation::AssignApiKeyToProject, keys)
            .await?;

        let mut record = self.api_keys.get_mut(key_id).ok_or_else(|| key_not_found(key_id))?;
        record
            .projects
            .insert(project_id.to_string(), roles.iter().cloned().collect());
        Ok(())
    }

    async fn get_project(
        &self,
        keys: &AccessKeys,
        project_id: &str,
    ) -> Result<Project, ProviderError> {
        self.enter(ProviderOperation::GetProject, keys).await?;

        self.projects
            .get(project_id)
            .map(|organization_id| Project {
                id: project_id.to_string(),
                organization_id: organization_id.value().clone(),
            })
            .ok_or_else(|| {
                ProviderError::new(404, format!("No group with ID {project_id} exists."))
                    .with_code("GROUP_NOT_FOUND")
            })
    }

    async fn delete_api_key(
        &self,
        keys: &AccessKeys,
        organization_id: &str,
        key_id: &str,
    ) -> Result<(), ProviderError> {
        self.enter(ProviderOperation::DeleteApiKey, keys).await?;

        self.api_keys
            .remove_if(key_id, |_, record| record.organization_id == organization_id)
            .map(|_| ())
            .ok_or_else(|| key_not_found(key_id))
    }
}

fn key_not_found(key_id: &str) -> ProviderError {
    ProviderError::new(404, format!("No API key with ID {key_id} exists."))
        .with_code("API_KEY_NOT_FOUND")
}
