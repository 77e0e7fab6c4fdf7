//! Error types for credential lifecycle operations
//!
//! This module defines the engine's error taxonomy:
//! - [`EngineError`]: Top-level error returned by every lifecycle operation
//! - [`ValidationError`]: Malformed or incomplete role/config input, rejected before any remote call
//! - [`PolicyError`]: TTL or role-state inconsistencies found during renewal
//! - [`StorageError`]: Failures of the host's durable key/value storage
//!
//! Provider failures are described by [`ProviderError`](crate::provider::ProviderError)
//! and surface through [`EngineError::Provider`].
//!
//! # Error Conversion Examples
//!
//! ```
//! use atlas_secrets_engine::core::{EngineError, ValidationError};
//!
//! let err: EngineError = ValidationError::EmptyRoleName.into();
//! assert!(err.to_string().contains("empty"));
//! assert!(!err.is_retryable());
//! ```

use std::time::Duration;

use thiserror::Error;

use crate::lease::LeaseMetadata;
use crate::provider::ProviderError;
use crate::role::CredentialType;

/// Top-level engine error
#[derive(Debug, Error)]
pub enum EngineError {
    /// Input rejected before reaching the remote provider
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// The requested role does not exist
    #[error("Role '{name}' not found")]
    RoleNotFound {
        /// Role name that was looked up
        name: String,
    },

    /// No access keys have been written to `config/root`
    #[error("Access keys are not configured; write config/root before requesting credentials")]
    ConfigMissing,

    /// Remote provider call failed
    ///
    /// When the failure happened after a remote object was already created,
    /// `orphan` carries the metadata needed to revoke it.
    #[error("Provider call '{operation}' failed: {source}")]
    Provider {
        /// Provider operation that failed
        operation: &'static str,
        /// Error reported by the provider
        #[source]
        source: ProviderError,
        /// Handle for a remote object left behind by a partial failure
        orphan: Option<Box<LeaseMetadata>>,
    },

    /// Lease policy could not be applied
    #[error("Lease policy error: {0}")]
    Policy(#[from] PolicyError),

    /// Durable storage failed
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// The caller cancelled the operation while a remote call was in flight
    #[error("Operation '{operation}' was cancelled; remote completion status is unknown")]
    Cancelled {
        /// Provider operation that was aborted
        operation: &'static str,
        /// Handle for a remote object created before the cancellation
        orphan: Option<Box<LeaseMetadata>>,
    },
}

impl EngineError {
    /// Wrap a provider error that left nothing behind remotely
    pub fn provider(operation: &'static str, source: ProviderError) -> Self {
        Self::Provider {
            operation,
            source,
            orphan: None,
        }
    }

    /// Attach the handle of a remote object created before this failure
    ///
    /// Only provider and cancellation errors can carry an orphan; other
    /// variants are returned unchanged.
    pub fn with_orphan(self, metadata: LeaseMetadata) -> Self {
        match self {
            Self::Provider {
                operation, source, ..
            } => Self::Provider {
                operation,
                source,
                orphan: Some(Box::new(metadata)),
            },
            Self::Cancelled { operation, .. } => Self::Cancelled {
                operation,
                orphan: Some(Box::new(metadata)),
            },
            other => other,
        }
    }

    /// Metadata of a remote object orphaned by a partial failure
    ///
    /// Hosts pass this to a revoke call to clean up the object.
    pub fn orphaned_lease(&self) -> Option<&LeaseMetadata> {
        match self {
            Self::Provider {
                orphan: Some(metadata),
                ..
            }
            | Self::Cancelled {
                orphan: Some(metadata),
                ..
            } => Some(metadata),
            _ => None,
        }
    }

    /// Whether the host may retry the same request later
    ///
    /// The engine never retries internally.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Provider { source, .. } => source.is_transient(),
            Self::Storage(source) => source.is_transient(),
            Self::Cancelled { .. } => true,
            Self::Validation(_)
            | Self::RoleNotFound { .. }
            | Self::ConfigMissing
            | Self::Policy(_) => false,
        }
    }
}

/// Validation errors
///
/// Produced while parsing role or config writes. Never retried automatically.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Role name cannot be empty
    #[error("Role name cannot be empty")]
    EmptyRoleName,

    /// Role name is not usable as a storage key
    #[error("Invalid role name '{name}': {reason}")]
    InvalidRoleName {
        /// The rejected name
        name: String,
        /// Reason for rejection
        reason: String,
    },

    /// `credential_type` was not supplied
    #[error("credential_type is required")]
    MissingCredentialType,

    /// `credential_type` names no known kind
    #[error("Unknown credential_type '{0}'")]
    UnknownCredentialType(String),

    /// A field required by the credential kind is absent
    #[error("{kind} roles require '{field}'")]
    MissingField {
        /// Kind being configured
        kind: CredentialType,
        /// Missing field
        field: &'static str,
    },

    /// A field belonging to another credential kind was supplied
    #[error("'{field}' is not valid for {kind} roles")]
    UnexpectedField {
        /// Kind being configured
        kind: CredentialType,
        /// Rejected field
        field: &'static str,
    },

    /// A field is present but its value is malformed
    #[error("Invalid value for '{field}': {reason}")]
    InvalidField {
        /// Offending field
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// `ttl` is larger than `max_ttl`
    #[error("ttl ({}s) cannot be greater than max_ttl ({}s)", ttl.as_secs(), max_ttl.as_secs())]
    TtlExceedsMax {
        /// Requested default TTL
        ttl: Duration,
        /// Requested maximum TTL
        max_ttl: Duration,
    },

    /// An existing role cannot change its credential kind
    #[error("Role '{name}' is a {from} role and cannot be changed to {to}")]
    KindChange {
        /// Role name
        name: String,
        /// Stored kind
        from: CredentialType,
        /// Requested kind
        to: CredentialType,
    },

    /// Request body could not be decoded
    #[error("Malformed request: {0}")]
    Malformed(String),

    /// No handler exists for this operation on this path
    #[error("Unsupported operation '{operation}' on path '{path}'")]
    UnsupportedOperation {
        /// Requested operation
        operation: String,
        /// Requested path
        path: String,
    },
}

impl ValidationError {
    /// Shorthand for [`ValidationError::InvalidField`]
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}

/// Renewal policy errors
///
/// Most of these are non-fatal: renewal proceeds with the bounds recorded at
/// issuance and the error is reported as a warning.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// The role was deleted after the lease was issued
    #[error("Role '{name}' no longer exists; using TTL bounds recorded at issuance")]
    RoleMissing {
        /// Role name from the lease
        name: String,
    },

    /// The role was recreated with another credential kind
    #[error("Role '{name}' is now a {found} role but the lease is {expected}; using TTL bounds recorded at issuance")]
    KindMismatch {
        /// Role name from the lease
        name: String,
        /// Kind recorded in the lease
        expected: CredentialType,
        /// Kind of the current role
        found: CredentialType,
    },

    /// Neither the role nor the lease carries TTL bounds
    #[error("Cannot determine TTL bounds for lease of role '{name}'")]
    BoundsUnknown {
        /// Role name from the lease
        name: String,
    },
}

/// Durable storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backend failed to serve the request
    #[error("Storage backend failed for '{key}': {reason}")]
    Backend {
        /// Storage key
        key: String,
        /// Backend-supplied reason
        reason: String,
    },

    /// Stored entry could not be decoded
    #[error("Stored entry '{key}' is corrupt: {source}")]
    Corrupt {
        /// Storage key
        key: String,
        /// Decode error
        #[source]
        source: serde_json::Error,
    },

    /// Entry could not be encoded for storage
    #[error("Failed to encode entry '{key}': {source}")]
    Encode {
        /// Storage key
        key: String,
        /// Encode error
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    /// Shorthand for [`StorageError::Backend`]
    pub fn backend(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Backend {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Whether retrying the storage call may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Backend { .. })
    }
}

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;
