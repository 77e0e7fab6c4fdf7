//! Shared helpers for integration tests

#![allow(dead_code)]

use atlas_secrets_engine::prelude::*;
use atlas_secrets_engine::testing::InMemoryProvider;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

pub const PROJECT_ID: &str = "5cf5a45a9ccf6400e60981b6";
pub const ORGANIZATION_ID: &str = "5b23ff2f96e82130d0aaec13";

/// Install a test-friendly tracing subscriber once per test binary
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}

/// Backend over in-memory storage and an in-memory provider
pub struct Harness {
    pub backend: SecretsBackend,
    pub provider: InMemoryProvider,
    pub ctx: LeaseContext,
}

impl Harness {
    /// Harness with access keys already written
    pub async fn configured() -> Self {
        Self::configured_with(EngineConfig::default(), InMemoryProvider::new()).await
    }

    /// Harness with custom settings and provider, access keys already written
    pub async fn configured_with(config: EngineConfig, provider: InMemoryProvider) -> Self {
        let harness = Self::unconfigured_with(config, provider);
        harness
            .write("config/root", json!({ "public_key": "pub", "private_key": "priv" }))
            .await
            .unwrap();
        harness
    }

    /// Harness without access keys
    pub fn unconfigured_with(config: EngineConfig, provider: InMemoryProvider) -> Self {
        init_tracing();
        let coordinator = LifecycleCoordinator::builder()
            .storage(Arc::new(MemoryStorage::new()))
            .provider(Arc::new(provider.clone()))
            .config(config)
            .build()
            .unwrap();
        Self {
            backend: SecretsBackend::new(coordinator),
            provider,
            ctx: LeaseContext::new(),
        }
    }

    pub fn coordinator(&self) -> &LifecycleCoordinator {
        self.backend.coordinator()
    }

    pub async fn write(&self, path: &str, body: Value) -> Result<Option<Response>, EngineError> {
        self.backend
            .handle(Operation::Write, path, Some(body), &self.ctx)
            .await
    }

    pub async fn read(&self, path: &str) -> Result<Option<Response>, EngineError> {
        self.backend
            .handle(Operation::Read, path, None, &self.ctx)
            .await
    }

    pub async fn delete(&self, path: &str) -> Result<Option<Response>, EngineError> {
        self.backend
            .handle(Operation::Delete, path, None, &self.ctx)
            .await
    }
}

pub fn database_user_role() -> Value {
    json!({
        "credential_type": "database_user",
        "project_id": PROJECT_ID,
        "database_name": "admin",
        "roles": r#"[{"databaseName":"admin","roleName":"atlasAdmin"}]"#,
    })
}

pub fn org_key_role() -> Value {
    json!({
        "credential_type": "org_programmatic_api_key",
        "organization_id": ORGANIZATION_ID,
        "programmatic_key_roles": ["ORG_MEMBER"],
    })
}

pub fn project_key_role() -> Value {
    json!({
        "credential_type": "project_programmatic_api_key",
        "project_id": PROJECT_ID,
        "programmatic_key_roles": ["GROUP_READ_ONLY"],
    })
}

/// Merge `extra` fields into a role body
pub fn with(mut body: Value, extra: Value) -> Value {
    if let (Some(body), Value::Object(extra)) = (body.as_object_mut(), extra) {
        body.extend(extra);
    }
    body
}
