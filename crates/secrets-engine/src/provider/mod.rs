//! Remote credential provider boundary
//!
//! [`ProviderClient`] is the opaque RPC capability the engine mints and
//! deletes credentials through. Hosts supply the transport; each method is a
//! single call returning a typed value or a [`ProviderError`].

mod error;
mod types;

pub use error::ProviderError;
pub use types::{ApiKey, ApiKeyRequest, DatabaseUser, DatabaseUserRequest, Project};

use async_trait::async_trait;

use crate::config::AccessKeys;

/// Remote provider operations
///
/// Implementations must not retry internally; the host owns retry policy.
/// Deleting an object that does not exist should fail with a
/// [`ProviderError`] for which [`ProviderError::is_not_found`] holds.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Create a database user in a project
    async fn create_database_user(
        &self,
        keys: &AccessKeys,
        request: &DatabaseUserRequest,
    ) -> Result<DatabaseUser, ProviderError>;

    /// Delete a database user
    async fn delete_database_user(
        &self,
        keys: &AccessKeys,
        project_id: &str,
        database_name: &str,
        username: &str,
    ) -> Result<(), ProviderError>;

    /// Create an organization API key
    async fn create_org_api_key(
        &self,
        keys: &AccessKeys,
        organization_id: &str,
        request: &ApiKeyRequest,
    ) -> Result<ApiKey, ProviderError>;

    /// Assign an existing organization API key to a project
    async fn assign_api_key_to_project(
        &self,
        keys: &AccessKeys,
        project_id: &str,
        key_id: &str,
        roles: &[String],
    ) -> Result<(), ProviderError>;

    /// Look up a project, including its owning organization
    async fn get_project(&self, keys: &AccessKeys, project_id: &str)
    -> Result<Project, ProviderError>;

    /// Delete an organization API key, removing all project assignments
    async fn delete_api_key(
        &self,
        keys: &AccessKeys,
        organization_id: &str,
        key_id: &str,
    ) -> Result<(), ProviderError>;
}
