//! User entity and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validation::{
    validate_email, validate_fullname, validate_slug, validate_username, UserValidationError,
};
use crate::domain::slug::slugify;
use crate::domain::validation::{Validate, ValidationErrors};

/// System generated user identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(String);

impl UserId {
    /// Wrap an existing identifier
    pub fn new(id: impl Into<String>) -> Result<Self, UserValidationError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(UserValidationError::Blank);
        }
        Ok(Self(id))
    }

    /// Generate a fresh identifier
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<UserId> for String {
    fn from(id: UserId) -> Self {
        id.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    id: UserId,
    slug: String,
    username: String,
    email: String,
    fullname: String,
    /// Argon2 password hash - never exposed in serialization
    #[serde(skip_serializing, default)]
    password_hash: String,
    active: bool,
    admin: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new active, non-admin user with a slug derived from the username
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        let username = username.into();
        let now = Utc::now();

        Self {
            id: UserId::generate(),
            slug: slugify(&username),
            username,
            email: email.into(),
            fullname: String::new(),
            password_hash: password_hash.into(),
            active: true,
            admin: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_id(mut self, id: UserId) -> Self {
        self.id = id;
        self
    }

    pub fn with_fullname(mut self, fullname: impl Into<String>) -> Self {
        self.fullname = fullname.into();
        self
    }

    pub fn with_flags(mut self, active: bool, admin: bool) -> Self {
        self.active = active;
        self.admin = admin;
        self
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = slug.into();
        self
    }

    /// Restore persisted timestamps
    pub fn with_timestamps(mut self, created_at: DateTime<Utc>, updated_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self.updated_at = updated_at;
        self
    }

    // Getters

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn slug(&self) -> &str {
        &self.slug
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn fullname(&self) -> &str {
        &self.fullname
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn is_admin(&self) -> bool {
        self.admin
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    /// Whether `reference` names this user by id, slug or username
    pub fn is_referenced_by(&self, reference: &str) -> bool {
        self.id.as_str() == reference || self.slug == reference || self.username == reference
    }

    // Mutators

    pub fn set_username(&mut self, username: impl Into<String>) {
        self.username = username.into();
        self.touch();
    }

    pub fn set_slug(&mut self, slug: impl Into<String>) {
        self.slug = slug.into();
        self.touch();
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
        self.touch();
    }

    pub fn set_fullname(&mut self, fullname: impl Into<String>) {
        self.fullname = fullname.into();
        self.touch();
    }

    pub fn set_password_hash(&mut self, password_hash: impl Into<String>) {
        self.password_hash = password_hash.into();
        self.touch();
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
        self.touch();
    }

    pub fn set_admin(&mut self, admin: bool) {
        self.admin = admin;
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

impl Validate for User {
    fn validate(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        errors.check("username", validate_username(&self.username));
        errors.check("slug", validate_slug(&self.slug));
        errors.check("email", validate_email(&self.email));
        errors.check("fullname", validate_fullname(&self.fullname));
        errors
    }
}
