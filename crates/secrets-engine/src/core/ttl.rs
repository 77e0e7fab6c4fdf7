//! Lease TTL policy
//!
//! Roles may leave `ttl`/`max_ttl` unset, in which case the host-wide
//! [`SystemDefaults`] apply. A role's own `max_ttl` takes precedence over the
//! system maximum. Granted and renewed TTLs never exceed the effective maximum.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Host-wide lease defaults
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SystemDefaults {
    /// TTL applied when neither the request nor the role sets one
    pub default_ttl: Duration,
    /// Upper bound applied when the role sets no `max_ttl`
    pub max_ttl: Duration,
}

impl SystemDefaults {
    /// Create defaults, clamping `default_ttl` to `max_ttl`
    pub fn new(default_ttl: Duration, max_ttl: Duration) -> Self {
        Self {
            default_ttl: default_ttl.min(max_ttl),
            max_ttl,
        }
    }
}

/// TTL bounds configured on a role
///
/// Recorded into every lease at issuance so renewal can proceed after the
/// role is deleted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaseBounds {
    /// Default TTL for new leases
    #[serde(default, with = "secs_option", skip_serializing_if = "Option::is_none")]
    pub ttl: Option<Duration>,
    /// Maximum lifetime, across renewals
    #[serde(default, with = "secs_option", skip_serializing_if = "Option::is_none")]
    pub max_ttl: Option<Duration>,
}

impl LeaseBounds {
    /// Create bounds from optional role settings
    pub fn new(ttl: Option<Duration>, max_ttl: Option<Duration>) -> Self {
        Self { ttl, max_ttl }
    }

    /// Maximum lifetime after falling back to the system maximum
    pub fn effective_max_ttl(&self, defaults: &SystemDefaults) -> Duration {
        self.max_ttl.unwrap_or(defaults.max_ttl)
    }

    /// Default TTL after fallback, never above the effective maximum
    pub fn effective_ttl(&self, defaults: &SystemDefaults) -> Duration {
        self.ttl
            .unwrap_or(defaults.default_ttl)
            .min(self.effective_max_ttl(defaults))
    }

    /// TTL granted to a new lease
    ///
    /// `min(requested, ttl, max_ttl)`. A missing or zero request means "use
    /// the role default".
    pub fn grant(&self, requested: Option<Duration>, defaults: &SystemDefaults) -> Duration {
        let ttl = self.effective_ttl(defaults);
        match requested {
            Some(requested) if !requested.is_zero() => requested.min(ttl),
            _ => ttl,
        }
    }

    /// TTL after renewing a lease
    ///
    /// `min(current + extension, max_ttl)`
    pub fn renew(
        &self,
        current: Duration,
        extension: Duration,
        defaults: &SystemDefaults,
    ) -> Duration {
        current
            .saturating_add(extension)
            .min(self.effective_max_ttl(defaults))
    }
}

/// Serde adapter storing an optional [`Duration`] as whole seconds
pub mod secs_option {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    /// Serialize as `u64` seconds
    pub fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(duration) => serializer.serialize_some(&duration.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialize from `u64` seconds
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_secs))
    }
}

/// Serde adapter storing a [`Duration`] as whole seconds
pub mod secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    /// Serialize as `u64` seconds
    pub fn serialize<S>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(value.as_secs())
    }

    /// Deserialize from `u64` seconds
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

/// Operator-facing duration input: integer seconds or a humantime string
/// such as `"90m"`
pub mod flexible_option {
    use serde::de::value::{Error as ValueError, StrDeserializer};
    use serde::{Deserialize, Deserializer, de::Error};
    use std::time::Duration;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Secs(u64),
        Text(String),
    }

    /// Deserialize from seconds or humantime text
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Raw>::deserialize(deserializer)? {
            None => Ok(None),
            Some(Raw::Secs(secs)) => Ok(Some(Duration::from_secs(secs))),
            Some(Raw::Text(text)) => {
                let trimmed = text.trim();
                if let Ok(secs) = trimmed.parse::<u64>() {
                    return Ok(Some(Duration::from_secs(secs)));
                }
                humantime_serde::deserialize::<Duration, _>(StrDeserializer::<ValueError>::new(
                    trimmed,
                ))
                .map(Some)
                .map_err(|e| D::Error::custom(format!("invalid duration '{trimmed}': {e}")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn defaults() -> SystemDefaults {
        SystemDefaults::new(Duration::from_secs(3600), Duration::from_secs(3600))
    }

    fn secs(n: u64) -> Duration {
        Duration::from_secs(n)
    }

    #[rstest]
    #[case::no_role_bounds(LeaseBounds::default(), None, 3600)]
    #[case::role_ttl(LeaseBounds::new(Some(secs(2000)), Some(secs(4000))), None, 2000)]
    #[case::request_below_ttl(LeaseBounds::new(Some(secs(2000)), None), Some(secs(60)), 60)]
    #[case::request_above_ttl(LeaseBounds::new(Some(secs(2000)), None), Some(secs(9000)), 2000)]
    #[case::zero_request_uses_default(LeaseBounds::new(Some(secs(2000)), None), Some(secs(0)), 2000)]
    #[case::ttl_above_role_max(LeaseBounds::new(Some(secs(500)), Some(secs(300))), None, 300)]
    #[case::ttl_above_system_max(LeaseBounds::new(Some(secs(7200)), None), None, 3600)]
    fn test_grant(
        #[case] bounds: LeaseBounds,
        #[case] requested: Option<Duration>,
        #[case] expected: u64,
    ) {
        assert_eq!(bounds.grant(requested, &defaults()), secs(expected));
    }

    #[test]
    fn test_renew_clamps_to_role_max_not_system_max() {
        let bounds = LeaseBounds::new(Some(secs(2000)), Some(secs(4000)));
        assert_eq!(bounds.renew(secs(2000), secs(5000), &defaults()), secs(4000));
    }

    #[test]
    fn test_renew_falls_back_to_system_max() {
        let bounds = LeaseBounds::default();
        assert_eq!(bounds.renew(secs(3000), secs(2000), &defaults()), secs(3600));
        assert_eq!(bounds.renew(secs(600), secs(600), &defaults()), secs(1200));
    }

    #[test]
    fn test_repeated_renewals_never_exceed_max() {
        let bounds = LeaseBounds::new(None, Some(secs(4000)));
        let mut ttl = bounds.grant(None, &defaults());
        for _ in 0..10 {
            ttl = bounds.renew(ttl, secs(1500), &defaults());
            assert!(ttl <= secs(4000));
        }
        assert_eq!(ttl, secs(4000));
    }

    #[test]
    fn test_bounds_serialize_as_seconds() {
        let bounds = LeaseBounds::new(Some(secs(2000)), None);
        let json = serde_json::to_value(bounds).unwrap();
        assert_eq!(json, serde_json::json!({ "ttl": 2000 }));
        let back: LeaseBounds = serde_json::from_value(json).unwrap();
        assert_eq!(back, bounds);
    }

    #[derive(Deserialize)]
    struct Input {
        #[serde(default, deserialize_with = "flexible_option::deserialize")]
        ttl: Option<Duration>,
    }

    #[rstest]
    #[case(r#"{"ttl": 2000}"#, Some(2000))]
    #[case(r#"{"ttl": "2000"}"#, Some(2000))]
    #[case(r#"{"ttl": "1h"}"#, Some(3600))]
    #[case(r#"{"ttl": null}"#, None)]
    #[case(r#"{}"#, None)]
    fn test_flexible_duration_input(#[case] json: &str, #[case] expected: Option<u64>) {
        let input: Input = serde_json::from_str(json).unwrap();
        assert_eq!(input.ttl, expected.map(secs));
    }

    #[test]
    fn test_flexible_duration_rejects_garbage() {
        assert!(serde_json::from_str::<Input>(r#"{"ttl": "soon"}"#).is_err());
    }
}
