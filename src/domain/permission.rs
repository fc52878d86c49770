//! Membership permission levels

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::str::FromStr;
use thiserror::Error;

use super::DomainError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermissionError {
    #[error("invalid permission '{0}', must be one of user, admin, owner")]
    InvalidPermission(String),
}

impl From<PermissionError> for DomainError {
    fn from(err: PermissionError) -> Self {
        DomainError::validation("perm", err.to_string())
    }
}

/// Permission of a user within a group or team, ordered `User < Admin < Owner`
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub enum Permission {
    #[default]
    User,
    Admin,
    Owner,
}

impl Permission {
    pub const ALL: [Permission; 3] = [Permission::User, Permission::Admin, Permission::Owner];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
            Self::Owner => "owner",
        }
    }

    pub fn compare(a: Permission, b: Permission) -> Ordering {
        a.cmp(&b)
    }

    /// Parse an optional textual value; absent values are left to the caller
    pub fn parse(value: Option<&str>) -> Result<Option<Permission>, PermissionError> {
        value.map(|v| v.parse::<Permission>()).transpose()
    }

    pub fn is_at_least(&self, other: Permission) -> bool {
        *self >= other
    }
}

impl FromStr for Permission {
    type Err = PermissionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            "owner" => Ok(Self::Owner),
            other => Err(PermissionError::InvalidPermission(other.to_string())),
        }
    }
}

impl TryFrom<String> for Permission {
    type Error = PermissionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Permission> for String {
    fn from(perm: Permission) -> Self {
        perm.as_str().to_string()
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
