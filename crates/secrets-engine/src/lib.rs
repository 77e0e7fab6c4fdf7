//! Atlas Secrets Engine - dynamic credential lifecycle for MongoDB Atlas
//!
//! Issues short-lived, remotely backed credentials from declarative roles,
//! renews them up to a bounded lifetime and deletes the remote object when
//! the lease ends.
//!
//! # Features
//!
//! - **Three credential kinds** - database users, organization API keys,
//!   project API keys
//! - **Self-describing leases** - every lease carries the identifiers needed
//!   to delete it, so revocation never depends on the role still existing
//! - **Idempotent revocation** - deleting an already-absent credential succeeds
//! - **Bounded renewal** - renewed TTLs never exceed the role's `max_ttl`
//! - **Compensating handles** - a project key whose assignment failed is
//!   returned as an orphan the host can revoke
//!
//! The host supplies durable [`Storage`](storage::Storage) and a
//! [`ProviderClient`](provider::ProviderClient); it owns routing, lease timers
//! and retries.
//!
//! # Example
//!
//! ```
//! use atlas_secrets_engine::prelude::*;
//! use atlas_secrets_engine::testing::InMemoryProvider;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), EngineError> {
//! let coordinator = LifecycleCoordinator::builder()
//!     .storage(Arc::new(MemoryStorage::new()))
//!     .provider(Arc::new(InMemoryProvider::new()))
//!     .build()
//!     .expect("default config is valid");
//! let backend = SecretsBackend::new(coordinator);
//! let ctx = LeaseContext::new();
//!
//! backend
//!     .handle(
//!         Operation::Write,
//!         "config/root",
//!         Some(json!({ "public_key": "pub", "private_key": "priv" })),
//!         &ctx,
//!     )
//!     .await?;
//! backend
//!     .handle(
//!         Operation::Write,
//!         "roles/app",
//!         Some(json!({
//!             "credential_type": "database_user",
//!             "project_id": "5cf5a45a9ccf6400e60981b6",
//!             "database_name": "admin",
//!             "roles": [{ "databaseName": "admin", "roleName": "readWrite" }],
//!         })),
//!         &ctx,
//!     )
//!     .await?;
//!
//! let creds = backend
//!     .handle(Operation::Read, "creds/app", None, &ctx)
//!     .await?
//!     .expect("creds reads return a payload");
//! assert!(creds.data.contains_key("password"));
//!
//! let lease = creds.lease.expect("creds reads return a lease");
//! assert_eq!(backend.revoke(&lease, &ctx).await?, RevokeOutcome::Deleted);
//! # Ok(())
//! # }
//! ```
#![forbid(unsafe_code)]
#![warn(missing_docs)]

/// Logical-path request surface
pub mod backend;
/// Provider access keys and engine settings
pub mod config;
/// Issue, renew and revoke entry point
pub mod coordinator;
/// Core types, errors, and TTL policy
pub mod core;
/// Lease metadata and issuance results
pub mod lease;
/// Remote provider boundary
pub mod provider;
/// Role definitions and their store
pub mod role;
/// Durable storage contract
pub mod storage;
mod strategy;
/// Fake provider for tests
#[cfg(any(test, feature = "test-util"))]
pub mod testing;

// ── Root re-exports ─────────────────────────────────────────────────────────

pub use crate::backend::{Operation, Response, SecretsBackend};
pub use crate::coordinator::LifecycleCoordinator;
pub use crate::core::{EngineError, LeaseContext, PolicyError, ValidationError};
pub use crate::lease::{LeaseHandle, LeaseMetadata};

/// Commonly used types and traits
pub mod prelude {
    // Core types
    pub use crate::core::{
        EngineError, LeaseBounds, LeaseContext, PolicyError, SecretString, StorageError,
        SystemDefaults, ValidationError,
    };

    // Stores and configuration
    pub use crate::config::{AccessKeys, AccessKeysRequest, ConfigStore, EngineConfig};
    pub use crate::role::{CredentialKind, CredentialType, Role, RoleRequest, RoleStore};
    pub use crate::storage::{MemoryStorage, Storage};

    // Provider boundary
    pub use crate::provider::{ProviderClient, ProviderError};

    // Lifecycle
    pub use crate::coordinator::{LifecycleCoordinator, LifecycleCoordinatorBuilder};
    pub use crate::lease::{
        IssuedCredential, LeaseHandle, LeaseMetadata, RenewOutcome, RevokeOutcome, SecretPayload,
    };

    // Host surface
    pub use crate::backend::{Operation, Response, SecretsBackend};
}
