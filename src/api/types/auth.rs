//! Login and token payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct LoginBody {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Answer of `/auth/verify` for a still valid token
#[derive(Debug, Clone, Serialize)]
pub struct VerifyResponse {
    pub username: String,
    pub created_at: DateTime<Utc>,
}
