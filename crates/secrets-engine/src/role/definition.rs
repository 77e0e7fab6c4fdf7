//! Validated role definitions

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::core::{LeaseBounds, ValidationError};

/// Credential kind discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialType {
    /// Database user scoped to one project
    DatabaseUser,
    /// Organization-level programmatic API key
    OrgProgrammaticApiKey,
    /// Programmatic API key assigned to one project
    ProjectProgrammaticApiKey,
}

impl CredentialType {
    /// Wire name used in role writes and lease metadata
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DatabaseUser => "database_user",
            Self::OrgProgrammaticApiKey => "org_programmatic_api_key",
            Self::ProjectProgrammaticApiKey => "project_programmatic_api_key",
        }
    }
}

impl fmt::Display for CredentialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CredentialType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "database_user" => Ok(Self::DatabaseUser),
            "org_programmatic_api_key" => Ok(Self::OrgProgrammaticApiKey),
            "project_programmatic_api_key" => Ok(Self::ProjectProgrammaticApiKey),
            other => Err(ValidationError::UnknownCredentialType(other.to_string())),
        }
    }
}

/// A database role granted to a generated database user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct DatabaseRoleGrant {
    /// Database the role applies to
    pub database_name: String,
    /// Role name, e.g. `readWrite` or `atlasAdmin`
    pub role_name: String,
    /// Optional collection restriction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_name: Option<String>,
}

impl DatabaseRoleGrant {
    /// Create a database-wide grant
    pub fn new(database_name: impl Into<String>, role_name: impl Into<String>) -> Self {
        Self {
            database_name: database_name.into(),
            role_name: role_name.into(),
            collection_name: None,
        }
    }
}

/// Fields of a database user role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseUserRole {
    /// Project owning the cluster
    pub project_id: String,
    /// Authentication database of the generated user
    pub database_name: String,
    /// Roles granted to the generated user
    pub roles: Vec<DatabaseRoleGrant>,
}

/// Fields of an organization API key role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgApiKeyRole {
    /// Organization that owns generated keys
    pub organization_id: String,
    /// Organization roles granted to generated keys
    pub key_roles: BTreeSet<String>,
    /// Single addresses allowed to use generated keys
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub ip_addresses: BTreeSet<String>,
    /// Address ranges allowed to use generated keys
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub cidr_blocks: BTreeSet<String>,
    /// Description attached to generated keys
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Fields of a project API key role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectApiKeyRole {
    /// Project generated keys are assigned to
    pub project_id: String,
    /// Organization owning the project; resolved from the provider when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    /// Project roles granted to generated keys
    pub key_roles: BTreeSet<String>,
    /// Description attached to generated keys
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Kind-specific role fields
///
/// Exactly one kind's field set exists per role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "credential_type", rename_all = "snake_case")]
pub enum CredentialKind {
    /// Mint database users
    DatabaseUser(DatabaseUserRole),
    /// Mint organization API keys
    OrgProgrammaticApiKey(OrgApiKeyRole),
    /// Mint API keys assigned to a project
    ProjectProgrammaticApiKey(ProjectApiKeyRole),
}

impl CredentialKind {
    /// Discriminant of this kind
    pub fn credential_type(&self) -> CredentialType {
        match self {
            Self::DatabaseUser(_) => CredentialType::DatabaseUser,
            Self::OrgProgrammaticApiKey(_) => CredentialType::OrgProgrammaticApiKey,
            Self::ProjectProgrammaticApiKey(_) => CredentialType::ProjectProgrammaticApiKey,
        }
    }
}

/// Named recipe for minting credentials
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Unique role name
    pub name: String,
    /// Kind and its fields
    pub kind: CredentialKind,
    /// TTL bounds; unset values fall back to system defaults
    #[serde(default)]
    pub bounds: LeaseBounds,
}

impl Role {
    /// Discriminant of this role's kind
    pub fn credential_type(&self) -> CredentialType {
        self.kind.credential_type()
    }

    /// Flat view returned by role reads
    ///
    /// Uses the same field names operators write. Roles hold no secrets.
    pub fn to_response(&self) -> Map<String, Value> {
        let mut data = Map::new();
        data.insert("credential_type".into(), json!(self.credential_type()));
        match &self.kind {
            CredentialKind::DatabaseUser(db) => {
                data.insert("project_id".into(), json!(db.project_id));
                data.insert("database_name".into(), json!(db.database_name));
                data.insert("roles".into(), json!(db.roles));
            }
            CredentialKind::OrgProgrammaticApiKey(key) => {
                data.insert("organization_id".into(), json!(key.organization_id));
                data.insert("programmatic_key_roles".into(), json!(key.key_roles));
                data.insert("ip_addresses".into(), json!(key.ip_addresses));
                data.insert("cidr_blocks".into(), json!(key.cidr_blocks));
                if let Some(description) = &key.description {
                    data.insert("description".into(), json!(description));
                }
            }
            CredentialKind::ProjectProgrammaticApiKey(key) => {
                data.insert("project_id".into(), json!(key.project_id));
                if let Some(organization_id) = &key.organization_id {
                    data.insert("organization_id".into(), json!(organization_id));
                }
                data.insert("programmatic_key_roles".into(), json!(key.key_roles));
                if let Some(description) = &key.description {
                    data.insert("description".into(), json!(description));
                }
            }
        }
        data.insert(
            "ttl".into(),
            json!(self.bounds.ttl.map_or(0, |ttl| ttl.as_secs())),
        );
        data.insert(
            "max_ttl".into(),
            json!(self.bounds.max_ttl.map_or(0, |ttl| ttl.as_secs())),
        );
        data
    }
}

/// Check that a role name is usable as a storage key segment
pub fn validate_role_name(name: &str) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::EmptyRoleName);
    }
    let reason = if name.len() > 128 {
        Some("must be at most 128 characters")
    } else if name.contains('/') {
        Some("must not contain '/'")
    } else if name.chars().any(|c| c.is_whitespace() || c.is_control()) {
        Some("must not contain whitespace or control characters")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(ValidationError::InvalidRoleName {
            name: name.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}
