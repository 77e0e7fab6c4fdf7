//! Typestate builder for [`LifecycleCoordinator`]

use std::sync::Arc;

use super::LifecycleCoordinator;
use crate::config::{ConfigError, ConfigStore, EngineConfig};
use crate::provider::ProviderClient;
use crate::role::RoleStore;
use crate::storage::Storage;

// Type-level marker for an unset required part
#[doc(hidden)]
pub struct No;

/// Builder for [`LifecycleCoordinator`]
///
/// Storage and provider are required and checked at compile time; the
/// engine configuration defaults to [`EngineConfig::default`].
///
/// # Examples
///
/// ```
/// use atlas_secrets_engine::prelude::*;
/// use atlas_secrets_engine::testing::InMemoryProvider;
/// use std::sync::Arc;
///
/// let coordinator = LifecycleCoordinator::builder()
///     .storage(Arc::new(MemoryStorage::new()))
///     .provider(Arc::new(InMemoryProvider::new()))
///     .build()
///     .unwrap();
/// assert_eq!(coordinator.config().password_length, 32);
/// ```
pub struct LifecycleCoordinatorBuilder<S, P> {
    storage: S,
    provider: P,
    config: EngineConfig,
}

impl LifecycleCoordinatorBuilder<No, No> {
    /// Create new builder instance
    pub fn new() -> Self {
        Self {
            storage: No,
            provider: No,
            config: EngineConfig::default(),
        }
    }
}

impl Default for LifecycleCoordinatorBuilder<No, No> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> LifecycleCoordinatorBuilder<No, P> {
    /// Set host storage (required)
    pub fn storage(
        self,
        storage: Arc<dyn Storage>,
    ) -> LifecycleCoordinatorBuilder<Arc<dyn Storage>, P> {
        LifecycleCoordinatorBuilder {
            storage,
            provider: self.provider,
            config: self.config,
        }
    }
}

impl<S> LifecycleCoordinatorBuilder<S, No> {
    /// Set the remote provider client (required)
    pub fn provider(
        self,
        provider: Arc<dyn ProviderClient>,
    ) -> LifecycleCoordinatorBuilder<S, Arc<dyn ProviderClient>> {
        LifecycleCoordinatorBuilder {
            storage: self.storage,
            provider,
            config: self.config,
        }
    }
}

impl<S, P> LifecycleCoordinatorBuilder<S, P> {
    /// Set engine configuration (optional)
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }
}

impl LifecycleCoordinatorBuilder<Arc<dyn Storage>, Arc<dyn ProviderClient>> {
    /// Validate the configuration and build the coordinator
    pub fn build(self) -> Result<LifecycleCoordinator, ConfigError> {
        self.config.validate()?;

        Ok(LifecycleCoordinator {
            roles: RoleStore::new(Arc::clone(&self.storage)),
            access_keys: ConfigStore::new(self.storage),
            provider: self.provider,
            config: Arc::new(self.config),
        })
    }
}
