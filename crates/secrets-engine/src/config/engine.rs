//! Engine-wide settings supplied by the host

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::core::SystemDefaults;

/// Configuration error types
#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Invalid configuration value
    #[error("Invalid configuration: {field}: {reason}")]
    InvalidValue {
        /// Offending setting
        field: &'static str,
        /// What is wrong and how to fix it
        reason: String,
    },
}

/// Host-wide engine settings
///
/// Durations accept humantime strings (`"1h"`, `"30m"`).
///
/// # Examples
///
/// ```
/// use atlas_secrets_engine::config::EngineConfig;
///
/// let config: EngineConfig =
///     serde_json::from_str(r#"{ "default_lease_ttl": "30m" }"#).unwrap();
/// config.validate().unwrap();
/// assert_eq!(config.default_lease_ttl.as_secs(), 1800);
/// assert_eq!(config.password_length, 32);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// TTL for leases whose role sets none
    #[serde(with = "humantime_serde")]
    pub default_lease_ttl: Duration,

    /// Lease lifetime cap for roles that set no `max_ttl`
    #[serde(with = "humantime_serde")]
    pub max_lease_ttl: Duration,

    /// Prefix of generated database usernames
    pub username_prefix: String,

    /// Length of generated database passwords
    pub password_length: usize,
}

impl EngineConfig {
    /// Shortest accepted generated password
    pub const MIN_PASSWORD_LENGTH: usize = 16;
    /// Longest accepted generated password
    pub const MAX_PASSWORD_LENGTH: usize = 128;

    /// Validate settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_lease_ttl.is_zero() {
            return Err(ConfigError::InvalidValue {
                field: "max_lease_ttl",
                reason: "must be greater than zero".into(),
            });
        }
        if self.default_lease_ttl.is_zero() || self.default_lease_ttl > self.max_lease_ttl {
            return Err(ConfigError::InvalidValue {
                field: "default_lease_ttl",
                reason: format!(
                    "must be between 1s and max_lease_ttl ({}s)",
                    self.max_lease_ttl.as_secs()
                ),
            });
        }
        if !(Self::MIN_PASSWORD_LENGTH..=Self::MAX_PASSWORD_LENGTH).contains(&self.password_length)
        {
            return Err(ConfigError::InvalidValue {
                field: "password_length",
                reason: format!(
                    "must be between {} and {}",
                    Self::MIN_PASSWORD_LENGTH,
                    Self::MAX_PASSWORD_LENGTH
                ),
            });
        }
        let prefix_ok = !self.username_prefix.is_empty()
            && self.username_prefix.len() <= 16
            && self
                .username_prefix
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !prefix_ok {
            return Err(ConfigError::InvalidValue {
                field: "username_prefix",
                reason: "must be 1-16 characters of [A-Za-z0-9_-]".into(),
            });
        }
        Ok(())
    }

    /// TTL defaults used by the lease policy
    pub fn system_defaults(&self) -> SystemDefaults {
        SystemDefaults::new(self.default_lease_ttl, self.max_lease_ttl)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_lease_ttl: Duration::from_secs(60 * 60),
            max_lease_ttl: Duration::from_secs(24 * 60 * 60),
            username_prefix: "v".into(),
            password_length: 32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_default_is_valid() {
        EngineConfig::default().validate().unwrap();
    }

    #[rstest]
    #[case::zero_max(EngineConfig { max_lease_ttl: Duration::ZERO, ..EngineConfig::default() }, "max_lease_ttl")]
    #[case::default_above_max(EngineConfig { default_lease_ttl: Duration::from_secs(90_000), ..EngineConfig::default() }, "default_lease_ttl")]
    #[case::short_password(EngineConfig { password_length: 8, ..EngineConfig::default() }, "password_length")]
    #[case::bad_prefix(EngineConfig { username_prefix: "has space".into(), ..EngineConfig::default() }, "username_prefix")]
    #[case::empty_prefix(EngineConfig { username_prefix: String::new(), ..EngineConfig::default() }, "username_prefix")]
    fn test_invalid_settings(#[case] config: EngineConfig, #[case] field: &str) {
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains(field), "{err}");
    }

    #[test]
    fn test_humantime_round_trip() {
        let config = EngineConfig {
            max_lease_ttl: Duration::from_secs(7200),
            ..EngineConfig::default()
        };
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["max_lease_ttl"], "2h");
        let back: EngineConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back, config);
    }
}
