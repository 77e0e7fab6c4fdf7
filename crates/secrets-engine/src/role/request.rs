//! Operator input for role writes

use serde::{Deserialize, Deserializer};
use std::collections::BTreeSet;
use std::net::IpAddr;
use std::time::Duration;

use super::definition::{
    CredentialKind, CredentialType, DatabaseRoleGrant, DatabaseUserRole, OrgApiKeyRole,
    ProjectApiKeyRole, Role, validate_role_name,
};
use crate::core::{LeaseBounds, ValidationError, ttl::flexible_option};

/// Raw `roles/{name}` write body
///
/// Every field is optional here; [`RoleRequest::validate`] enforces which
/// fields each credential kind requires and rejects fields from other kinds.
///
/// # Examples
///
/// ```
/// use atlas_secrets_engine::role::{CredentialType, RoleRequest};
///
/// let request: RoleRequest = serde_json::from_value(serde_json::json!({
///     "credential_type": "database_user",
///     "project_id": "5cf5a45a9ccf6400e60981b6",
///     "database_name": "admin",
///     "roles": r#"[{"databaseName":"admin","roleName":"atlasAdmin"}]"#,
///     "ttl": 2000,
///     "max_ttl": "4000s"
/// }))
/// .unwrap();
///
/// let role = request.validate("test-credential").unwrap();
/// assert_eq!(role.credential_type(), CredentialType::DatabaseUser);
/// assert_eq!(role.bounds.max_ttl.unwrap().as_secs(), 4000);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoleRequest {
    /// `database_user`, `org_programmatic_api_key` or `project_programmatic_api_key`
    pub credential_type: Option<String>,
    /// Project scope (database users, project keys)
    pub project_id: Option<String>,
    /// Authentication database (database users)
    pub database_name: Option<String>,
    /// Granted database roles, as an array or a JSON-encoded string (database users)
    #[serde(default, deserialize_with = "grants")]
    pub roles: Option<Vec<DatabaseRoleGrant>>,
    /// Organization scope (org keys; optional for project keys)
    pub organization_id: Option<String>,
    /// Roles granted to generated API keys, as an array or comma-separated string
    #[serde(default, deserialize_with = "string_list")]
    pub programmatic_key_roles: Option<Vec<String>>,
    /// Allowed source addresses (org keys)
    #[serde(default, deserialize_with = "string_list")]
    pub ip_addresses: Option<Vec<String>>,
    /// Allowed source ranges (org keys)
    #[serde(default, deserialize_with = "string_list")]
    pub cidr_blocks: Option<Vec<String>>,
    /// Description attached to generated API keys
    pub description: Option<String>,
    /// Default lease TTL, seconds or humantime text
    #[serde(default, deserialize_with = "flexible_option::deserialize")]
    pub ttl: Option<Duration>,
    /// Maximum lease lifetime, seconds or humantime text
    #[serde(default, deserialize_with = "flexible_option::deserialize")]
    pub max_ttl: Option<Duration>,
}

impl RoleRequest {
    /// Validate into a [`Role`] named `name`
    pub fn validate(self, name: &str) -> Result<Role, ValidationError> {
        validate_role_name(name)?;

        let kind: CredentialType = self
            .credential_type
            .as_deref()
            .filter(|value| !value.trim().is_empty())
            .ok_or(ValidationError::MissingCredentialType)?
            .parse()?;

        let bounds = LeaseBounds::new(
            whole_secs("ttl", self.ttl)?,
            whole_secs("max_ttl", self.max_ttl)?,
        );
        if let (Some(ttl), Some(max_ttl)) = (bounds.ttl, bounds.max_ttl)
            && ttl > max_ttl
        {
            return Err(ValidationError::TtlExceedsMax { ttl, max_ttl });
        }

        let kind = match kind {
            CredentialType::DatabaseUser => self.database_user(kind)?,
            CredentialType::OrgProgrammaticApiKey => self.org_api_key(kind)?,
            CredentialType::ProjectProgrammaticApiKey => self.project_api_key(kind)?,
        };

        Ok(Role {
            name: name.to_string(),
            kind,
            bounds,
        })
    }

    fn database_user(self, kind: CredentialType) -> Result<CredentialKind, ValidationError> {
        reject(kind, "organization_id", self.organization_id.is_some())?;
        reject(kind, "programmatic_key_roles", self.programmatic_key_roles.is_some())?;
        reject(kind, "ip_addresses", self.ip_addresses.is_some())?;
        reject(kind, "cidr_blocks", self.cidr_blocks.is_some())?;
        reject(kind, "description", self.description.is_some())?;

        let project_id = required(kind, "project_id", self.project_id)?;
        let database_name = required(kind, "database_name", self.database_name)?;
        let roles = self
            .roles
            .filter(|roles| !roles.is_empty())
            .ok_or(ValidationError::MissingField {
                kind,
                field: "roles",
            })?;
        for grant in &roles {
            if grant.database_name.trim().is_empty() || grant.role_name.trim().is_empty() {
                return Err(ValidationError::invalid(
                    "roles",
                    "every entry needs a non-empty databaseName and roleName",
                ));
            }
        }

        Ok(CredentialKind::DatabaseUser(DatabaseUserRole {
            project_id,
            database_name,
            roles,
        }))
    }

    fn org_api_key(self, kind: CredentialType) -> Result<CredentialKind, ValidationError> {
        reject(kind, "project_id", self.project_id.is_some())?;
        reject(kind, "database_name", self.database_name.is_some())?;
        reject(kind, "roles", self.roles.is_some())?;

        let organization_id = required(kind, "organization_id", self.organization_id)?;
        let key_roles = key_roles(kind, self.programmatic_key_roles)?;
        let ip_addresses = self
            .ip_addresses
            .unwrap_or_default()
            .into_iter()
            .map(|address| parse_ip(&address))
            .collect::<Result<BTreeSet<_>, _>>()?;
        let cidr_blocks = self
            .cidr_blocks
            .unwrap_or_default()
            .into_iter()
            .map(|block| parse_cidr(&block))
            .collect::<Result<BTreeSet<_>, _>>()?;

        Ok(CredentialKind::OrgProgrammaticApiKey(OrgApiKeyRole {
            organization_id,
            key_roles,
            ip_addresses,
            cidr_blocks,
            description: trimmed(self.description),
        }))
    }

    fn project_api_key(self, kind: CredentialType) -> Result<CredentialKind, ValidationError> {
        reject(kind, "database_name", self.database_name.is_some())?;
        reject(kind, "roles", self.roles.is_some())?;
        reject(kind, "ip_addresses", self.ip_addresses.is_some())?;
        reject(kind, "cidr_blocks", self.cidr_blocks.is_some())?;

        let project_id = required(kind, "project_id", self.project_id)?;
        let key_roles = key_roles(kind, self.programmatic_key_roles)?;

        Ok(CredentialKind::ProjectProgrammaticApiKey(ProjectApiKeyRole {
            project_id,
            organization_id: trimmed(self.organization_id),
            key_roles,
            description: trimmed(self.description),
        }))
    }
}

/// Zero means unset. Bounds are stored as whole seconds, so fractions are rejected.
fn whole_secs(
    field: &'static str,
    value: Option<Duration>,
) -> Result<Option<Duration>, ValidationError> {
    match value {
        Some(duration) if duration.subsec_nanos() != 0 => Err(ValidationError::invalid(
            field,
            format!("{duration:?} is not a whole number of seconds"),
        )),
        Some(duration) if duration.is_zero() => Ok(None),
        other => Ok(other),
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn reject(kind: CredentialType, field: &'static str, present: bool) -> Result<(), ValidationError> {
    if present {
        return Err(ValidationError::UnexpectedField { kind, field });
    }
    Ok(())
}

fn required(
    kind: CredentialType,
    field: &'static str,
    value: Option<String>,
) -> Result<String, ValidationError> {
    trimmed(value).ok_or(ValidationError::MissingField { kind, field })
}

fn key_roles(
    kind: CredentialType,
    roles: Option<Vec<String>>,
) -> Result<BTreeSet<String>, ValidationError> {
    let roles: BTreeSet<String> = roles
        .unwrap_or_default()
        .into_iter()
        .map(|role| role.trim().to_string())
        .filter(|role| !role.is_empty())
        .collect();
    if roles.is_empty() {
        return Err(ValidationError::MissingField {
            kind,
            field: "programmatic_key_roles",
        });
    }
    Ok(roles)
}

fn parse_ip(value: &str) -> Result<String, ValidationError> {
    value
        .trim()
        .parse::<IpAddr>()
        .map(|ip| ip.to_string())
        .map_err(|_| ValidationError::invalid("ip_addresses", format!("'{value}' is not an IP address")))
}

fn parse_cidr(value: &str) -> Result<String, ValidationError> {
    let invalid = || ValidationError::invalid("cidr_blocks", format!("'{value}' is not a CIDR block"));
    let (address, prefix) = value.trim().split_once('/').ok_or_else(invalid)?;
    let address: IpAddr = address.parse().map_err(|_| invalid())?;
    let prefix: u8 = prefix.parse().map_err(|_| invalid())?;
    let width = if address.is_ipv4() { 32 } else { 128 };
    if prefix > width {
        return Err(invalid());
    }
    Ok(format!("{address}/{prefix}"))
}

/// Accept grants as a JSON array or as a string holding a JSON array
fn grants<'de, D>(deserializer: D) -> Result<Option<Vec<DatabaseRoleGrant>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        List(Vec<DatabaseRoleGrant>),
        Encoded(String),
    }

    match Option::<Raw>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Raw::List(list)) => Ok(Some(list)),
        Some(Raw::Encoded(text)) if text.trim().is_empty() => Ok(None),
        Some(Raw::Encoded(text)) => serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| serde::de::Error::custom(format!("roles: {e}"))),
    }
}

/// Accept a string array or a comma-separated string
fn string_list<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        List(Vec<String>),
        Joined(String),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        None => None,
        Some(Raw::List(list)) => Some(list),
        Some(Raw::Joined(joined)) => Some(
            joined
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect(),
        ),
    })
}
