//! Issuance results and the lease metadata hosts round-trip
//!
//! [`LeaseMetadata`] is the only state the engine needs to renew or revoke a
//! credential. Hosts persist it verbatim (usually inside a [`LeaseHandle`])
//! and hand it back unchanged; it never requires a lookup to be deletable.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use std::time::Duration;
use uuid::Uuid;

pub use crate::core::LeaseBounds;
use crate::core::{PolicyError, SecretString, ttl};
use crate::role::CredentialType;

/// Identifiers needed to renew and delete an issued credential
///
/// One shape per credential kind, tagged with `credential_type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "credential_type")]
pub enum LeaseMetadata {
    /// A generated database user
    #[serde(rename = "database_user")]
    DatabaseUser {
        /// Role the credential was issued from
        role_name: String,
        /// Generated username
        username: String,
        /// Project owning the user
        project_id: String,
        /// Authentication database of the user
        database_name: String,
        /// Role TTL bounds at issuance
        #[serde(default)]
        bounds: Option<LeaseBounds>,
    },

    /// A generated organization API key
    #[serde(rename = "org_programmatic_api_key")]
    OrgProgrammaticKey {
        /// Role the credential was issued from
        role_name: String,
        /// Provider-assigned key ID
        key_id: String,
        /// Organization owning the key
        organization_id: String,
        /// Role TTL bounds at issuance
        #[serde(default)]
        bounds: Option<LeaseBounds>,
    },

    /// A generated API key assigned to a project
    #[serde(rename = "project_programmatic_api_key")]
    ProjectProgrammaticKey {
        /// Role the credential was issued from
        role_name: String,
        /// Provider-assigned key ID
        key_id: String,
        /// Organization owning the key
        organization_id: String,
        /// Project the key is (or was to be) assigned to
        project_id: String,
        /// Role TTL bounds at issuance
        #[serde(default)]
        bounds: Option<LeaseBounds>,
    },
}

impl LeaseMetadata {
    /// Kind of the issued credential
    pub fn credential_type(&self) -> CredentialType {
        match self {
            Self::DatabaseUser { .. } => CredentialType::DatabaseUser,
            Self::OrgProgrammaticKey { .. } => CredentialType::OrgProgrammaticApiKey,
            Self::ProjectProgrammaticKey { .. } => CredentialType::ProjectProgrammaticApiKey,
        }
    }

    /// Role the credential was issued from
    pub fn role_name(&self) -> &str {
        match self {
            Self::DatabaseUser { role_name, .. }
            | Self::OrgProgrammaticKey { role_name, .. }
            | Self::ProjectProgrammaticKey { role_name, .. } => role_name,
        }
    }

    /// Provider identifier of the remote object (username or key ID)
    pub fn remote_id(&self) -> &str {
        match self {
            Self::DatabaseUser { username, .. } => username,
            Self::OrgProgrammaticKey { key_id, .. } | Self::ProjectProgrammaticKey { key_id, .. } => {
                key_id
            }
        }
    }

    /// TTL bounds recorded at issuance
    pub fn bounds(&self) -> Option<LeaseBounds> {
        match self {
            Self::DatabaseUser { bounds, .. }
            | Self::OrgProgrammaticKey { bounds, .. }
            | Self::ProjectProgrammaticKey { bounds, .. } => *bounds,
        }
    }
}

/// Secret material shown to the requester once, at issuance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretPayload {
    /// Database login
    DatabaseUser {
        /// Generated username
        username: String,
        /// Generated password
        password: SecretString,
    },
    /// API key pair
    ProgrammaticKey {
        /// Public half
        public_key: String,
        /// Private half
        private_key: SecretString,
    },
}

impl SecretPayload {
    /// Response body for the requester, with secrets in plaintext
    pub fn to_response(&self) -> Map<String, Value> {
        let mut data = Map::new();
        match self {
            Self::DatabaseUser { username, password } => {
                data.insert("username".into(), json!(username));
                password.expose_secret(|value| data.insert("password".into(), json!(value)));
            }
            Self::ProgrammaticKey {
                public_key,
                private_key,
            } => {
                data.insert("public_key".into(), json!(public_key));
                private_key.expose_secret(|value| data.insert("private_key".into(), json!(value)));
            }
        }
        data
    }
}

/// Result of a successful issuance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCredential {
    /// Secret material for the requester
    pub secret: SecretPayload,
    /// Identifiers for later renew/revoke
    pub metadata: LeaseMetadata,
    /// TTL actually granted
    pub lease_ttl: Duration,
}

/// Opaque lease record the host persists and replays on renew/revoke
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseHandle {
    /// Stable lease identity, unchanged by renewals
    pub lease_id: Uuid,
    /// Identifiers of the remote credential
    pub metadata: LeaseMetadata,
    /// Current TTL
    #[serde(with = "ttl::secs")]
    pub ttl: Duration,
    /// Issuance time
    pub issued_at: DateTime<Utc>,
}

impl LeaseHandle {
    /// Wrap freshly issued metadata
    pub fn new(metadata: LeaseMetadata, ttl: Duration) -> Self {
        Self {
            lease_id: Uuid::new_v4(),
            metadata,
            ttl,
            issued_at: Utc::now(),
        }
    }

    /// Same lease with a new TTL
    pub fn renewed(&self, ttl: Duration) -> Self {
        Self {
            ttl,
            ..self.clone()
        }
    }
}

/// Result of a renewal
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenewOutcome {
    /// New lease TTL
    pub ttl: Duration,
    /// Set when renewal fell back to the bounds recorded at issuance
    pub warning: Option<PolicyError>,
}

/// Result of a successful revocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevokeOutcome {
    /// The remote object was deleted by this call
    Deleted,
    /// The remote object was already gone
    AlreadyAbsent,
}
