//! User repository trait

use async_trait::async_trait;
use std::fmt::Debug;

use super::entity::{User, UserId};
use crate::domain::list::{ListParams, Page, SortKey};
use crate::domain::DomainError;

/// Unique user attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserField {
    Slug,
    Username,
    Email,
}

impl UserField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Slug => "slug",
            Self::Username => "username",
            Self::Email => "email",
        }
    }
}

/// Sort columns accepted when listing users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserSort {
    #[default]
    Username,
    Email,
    Fullname,
    Admin,
    Active,
}

impl SortKey for UserSort {
    fn from_param(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "username" => Some(Self::Username),
            "email" => Some(Self::Email),
            "fullname" => Some(Self::Fullname),
            "admin" => Some(Self::Admin),
            "active" => Some(Self::Active),
            _ => None,
        }
    }
}

impl UserSort {
    pub fn column(&self) -> &'static str {
        match self {
            Self::Username => "username",
            Self::Email => "email",
            Self::Fullname => "fullname",
            Self::Admin => "admin",
            Self::Active => "active",
        }
    }

    pub fn compare(&self, a: &User, b: &User) -> std::cmp::Ordering {
        match self {
            Self::Username => a.username().cmp(b.username()),
            Self::Email => a.email().cmp(b.email()),
            Self::Fullname => a.fullname().cmp(b.fullname()),
            Self::Admin => a.is_admin().cmp(&b.is_admin()),
            Self::Active => a.is_active().cmp(&b.is_active()),
        }
    }
}

/// Repository trait for user storage
#[async_trait]
pub trait UserRepository: Send + Sync + Debug {
    /// Get a user by their ID
    async fn get(&self, id: &UserId) -> Result<Option<User>, DomainError>;

    /// Find a user by id, slug or username
    async fn find(&self, reference: &str) -> Result<Option<User>, DomainError>;

    /// Get a user by their username (for login)
    async fn get_by_username(&self, username: &str) -> Result<Option<User>, DomainError>;

    /// List users matching the search, sorted and paginated
    async fn list(&self, params: &ListParams) -> Result<Page<User>, DomainError>;

    /// Create a new user
    async fn create(&self, user: User) -> Result<User, DomainError>;

    /// Update an existing user
    async fn update(&self, user: &User) -> Result<User, DomainError>;

    /// Delete a user together with all of its memberships
    async fn delete(&self, id: &UserId) -> Result<bool, DomainError>;

    /// Whether `value` is already used for `field` by a user other than `except`
    async fn is_taken(
        &self,
        field: UserField,
        value: &str,
        except: Option<&UserId>,
    ) -> Result<bool, DomainError>;

    /// Count all users
    async fn count(&self) -> Result<usize, DomainError>;
}
