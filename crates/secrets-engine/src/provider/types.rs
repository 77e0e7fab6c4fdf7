//! Provider request and response values

use crate::core::SecretString;
use crate::role::DatabaseRoleGrant;

/// Parameters for creating a database user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseUserRequest {
    /// Project owning the cluster
    pub project_id: String,
    /// Authentication database
    pub database_name: String,
    /// Generated username
    pub username: String,
    /// Generated password
    pub password: SecretString,
    /// Granted database roles
    pub roles: Vec<DatabaseRoleGrant>,
}

/// A database user as created by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseUser {
    /// Username
    pub username: String,
    /// Owning project
    pub project_id: String,
    /// Authentication database
    pub database_name: String,
}

/// Parameters for creating an API key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKeyRequest {
    /// Description shown in the provider console
    pub description: String,
    /// Roles granted to the key
    pub roles: Vec<String>,
    /// Single addresses allowed to use the key
    pub ip_addresses: Vec<String>,
    /// Address ranges allowed to use the key
    pub cidr_blocks: Vec<String>,
}

/// An API key as created by the provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiKey {
    /// Provider-assigned identifier, used for deletion
    pub id: String,
    /// Public half of the key pair
    pub public_key: String,
    /// Private half of the key pair, only returned at creation
    pub private_key: SecretString,
}

/// A provider project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    /// Project identifier
    pub id: String,
    /// Owning organization
    pub organization_id: String,
}
