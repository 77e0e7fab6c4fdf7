//! Role definitions and their store

mod definition;
mod request;
mod store;

pub use definition::{
    CredentialKind, CredentialType, DatabaseRoleGrant, DatabaseUserRole, OrgApiKeyRole,
    ProjectApiKeyRole, Role, validate_role_name,
};
pub use request::RoleRequest;
pub use store::RoleStore;
