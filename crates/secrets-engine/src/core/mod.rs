//! Core types for the credential lifecycle engine

mod context;
mod error;
pub mod secret;
pub mod ttl;

pub use context::LeaseContext;
pub use error::{EngineError, PolicyError, Result, StorageError, ValidationError};
pub use secret::SecretString;
pub use ttl::{LeaseBounds, SystemDefaults};
