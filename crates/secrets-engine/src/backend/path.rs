//! Logical path routing

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::ValidationError;

/// Logical operation requested by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Read a path
    Read,
    /// Create or replace a path
    Write,
    /// Remove a path
    Delete,
    /// List children of a path
    List,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Read => "read",
            Self::Write => "write",
            Self::Delete => "delete",
            Self::List => "list",
        };
        f.write_str(name)
    }
}

/// Resolved path
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Route<'a> {
    ConfigRoot,
    Roles,
    Role(&'a str),
    Creds(&'a str),
}

impl<'a> Route<'a> {
    pub(crate) fn parse(operation: Operation, path: &'a str) -> Result<Self, ValidationError> {
        let trimmed = path.trim_matches('/');
        let route = match trimmed.split_once('/') {
            None if trimmed == "roles" => Some(Route::Roles),
            Some(("config", "root")) => Some(Route::ConfigRoot),
            Some(("roles", name)) => segment(name).map(Route::Role),
            Some(("creds", name)) => segment(name).map(Route::Creds),
            _ => None,
        };

        let supported = match route {
            Some(Route::ConfigRoot | Route::Role(_)) => matches!(
                operation,
                Operation::Read | Operation::Write | Operation::Delete
            ),
            Some(Route::Roles) => operation == Operation::List,
            Some(Route::Creds(_)) => operation == Operation::Read,
            None => false,
        };
        route
            .filter(|_| supported)
            .ok_or_else(|| unsupported(operation, path))
    }
}

fn segment(name: &str) -> Option<&str> {
    (!name.is_empty() && !name.contains('/')).then_some(name)
}

fn unsupported(operation: Operation, path: &str) -> ValidationError {
    ValidationError::UnsupportedOperation {
        operation: operation.to_string(),
        path: path.to_string(),
    }
}
