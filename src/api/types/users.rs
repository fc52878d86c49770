//! User and profile payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::domain::User;
use crate::infrastructure::user::{CreateUserRequest, UpdateUserRequest};

const GRAVATAR_BASE: &str = "https://www.gravatar.com/avatar";

/// Gravatar URL for an email: identicon fallback, 64px, rating g
pub fn gravatar_url(email: &str) -> String {
    let digest = Sha256::digest(email.trim().to_lowercase().as_bytes());
    format!("{}/{}?d=identicon&s=64&r=g", GRAVATAR_BASE, hex::encode(digest))
}

#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: String,
    pub slug: String,
    pub username: String,
    pub email: String,
    pub fullname: String,
    pub profile: String,
    pub active: bool,
    pub admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id().to_string(),
            slug: user.slug().to_string(),
            username: user.username().to_string(),
            email: user.email().to_string(),
            fullname: user.fullname().to_string(),
            profile: gravatar_url(user.email()),
            active: user.is_active(),
            admin: user.is_admin(),
            created_at: user.created_at(),
            updated_at: user.updated_at(),
        }
    }
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self::from(&user)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserBody {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub email: String,
    pub fullname: Option<String>,
    pub slug: Option<String>,
    /// Defaults to `true`
    pub active: Option<bool>,
    #[serde(default)]
    pub admin: bool,
}

impl From<CreateUserBody> for CreateUserRequest {
    fn from(body: CreateUserBody) -> Self {
        Self {
            username: body.username,
            password: body.password,
            email: body.email,
            fullname: body.fullname,
            slug: body.slug,
            active: body.active.unwrap_or(true),
            admin: body.admin,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserBody {
    pub username: Option<String>,
    pub slug: Option<String>,
    pub email: Option<String>,
    pub fullname: Option<String>,
    pub password: Option<String>,
    pub active: Option<bool>,
    pub admin: Option<bool>,
}

impl From<UpdateUserBody> for UpdateUserRequest {
    fn from(body: UpdateUserBody) -> Self {
        Self {
            username: body.username,
            slug: body.slug,
            email: body.email,
            fullname: body.fullname,
            password: body.password,
            active: body.active,
            admin: body.admin,
        }
    }
}

/// Self-service update; flags are not accepted here
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileBody {
    pub username: Option<String>,
    pub email: Option<String>,
    pub fullname: Option<String>,
    pub password: Option<String>,
}

impl From<UpdateProfileBody> for UpdateUserRequest {
    fn from(body: UpdateProfileBody) -> Self {
        UpdateUserRequest {
            username: body.username,
            email: body.email,
            fullname: body.fullname,
            password: body.password,
            ..Default::default()
        }
        .for_profile()
    }
}
