//! Provider access keys and engine settings

mod engine;
mod store;

pub use engine::{ConfigError, EngineConfig};
pub use store::{AccessKeys, AccessKeysRequest, ConfigStore};
