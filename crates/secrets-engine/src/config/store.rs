//! Single-slot store for the provider account's access keys

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

use crate::core::{EngineError, SecretString, ValidationError, secret::plaintext};
use crate::storage::{self, Storage};

const CONFIG_KEY: &str = "config/root";

/// Access keys of the remote provider account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessKeys {
    /// Public half of the API key pair
    pub public_key: String,
    /// Private half of the API key pair
    #[serde(with = "plaintext")]
    pub private_key: SecretString,
}

impl AccessKeys {
    /// Create a key pair
    pub fn new(public_key: impl Into<String>, private_key: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            private_key: SecretString::new(private_key),
        }
    }
}

/// Operator input for `config/root` writes
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccessKeysRequest {
    /// Public half of the API key pair
    pub public_key: Option<String>,
    /// Private half of the API key pair
    pub private_key: Option<SecretString>,
}

impl AccessKeysRequest {
    /// Check that both halves are present and non-blank
    pub fn validate(self) -> Result<AccessKeys, ValidationError> {
        let public_key = self
            .public_key
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
            .ok_or_else(|| ValidationError::invalid("public_key", "a non-empty value is required"))?;
        let private_key = self
            .private_key
            .filter(|key| !key.is_blank())
            .ok_or_else(|| ValidationError::invalid("private_key", "a non-empty value is required"))?;
        Ok(AccessKeys {
            public_key,
            private_key,
        })
    }
}

/// Process-wide access key slot backed by host storage
///
/// Exactly one key pair exists at a time; the last write wins.
#[derive(Clone)]
pub struct ConfigStore {
    storage: Arc<dyn Storage>,
}

impl ConfigStore {
    /// Create a store over host storage
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Validate and replace the stored key pair
    pub async fn put(&self, request: AccessKeysRequest) -> Result<(), EngineError> {
        let keys = request.validate()?;
        storage::put_json(self.storage.as_ref(), CONFIG_KEY, &keys).await?;
        info!(public_key = %keys.public_key, "Provider access keys updated");
        Ok(())
    }

    /// Load the key pair, if configured
    pub async fn get(&self) -> Result<Option<AccessKeys>, EngineError> {
        let keys = storage::get_json(self.storage.as_ref(), CONFIG_KEY).await?;
        debug!(configured = keys.is_some(), "Loaded provider access keys");
        Ok(keys)
    }

    /// Load the key pair or fail with [`EngineError::ConfigMissing`]
    pub async fn require(&self) -> Result<AccessKeys, EngineError> {
        self.get().await?.ok_or(EngineError::ConfigMissing)
    }

    /// Remove the key pair
    pub async fn delete(&self) -> Result<(), EngineError> {
        self.storage.delete(CONFIG_KEY).await?;
        info!("Provider access keys removed");
        Ok(())
    }
}
