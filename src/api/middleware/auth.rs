//! Principal extractors
//!
//! A principal is resolved from either
//! - `Authorization: Bearer <token>` signed by the [`TokenService`](crate::infrastructure::auth::TokenService)
//! - `Authorization: Basic <base64(username:password)>`

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use base64::{engine::general_purpose::STANDARD, Engine};
use tracing::debug;

use crate::api::state::AppState;
use crate::api::types::ApiError;
use crate::domain::{DomainError, ErrorKind, User, UserId};

/// Credentials carried by the Authorization header
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    Bearer(String),
    Basic { username: String, password: String },
}

/// Any authenticated and active user
#[derive(Debug, Clone)]
pub struct RequirePrincipal(pub User);

/// An authenticated user with the admin flag
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub User);

impl FromRequestParts<AppState> for RequirePrincipal {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = match extract_credentials(&parts.headers)? {
            Credentials::Bearer(token) => principal_from_token(state, &token).await?,
            Credentials::Basic { username, password } => {
                debug!(username = %username, "Authenticating with basic credentials");
                state.users.authenticate(&username, &password).await?
            }
        };

        Ok(RequirePrincipal(user))
    }
}

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequirePrincipal(user) = RequirePrincipal::from_request_parts(parts, state).await?;

        if !user.is_admin() {
            debug!(user_id = %user.id(), "Rejected non-admin principal");
            return Err(ApiError::forbidden("Only admins can access this resource"));
        }

        Ok(RequireAdmin(user))
    }
}

async fn principal_from_token(state: &AppState, token: &str) -> Result<User, ApiError> {
    let claims = state.tokens.verify(token).map_err(DomainError::from)?;

    let id = UserId::new(claims.sub).map_err(|_| ApiError::unauthorized("Invalid token subject"))?;
    let user = state.users.get(&id).await.map_err(|err| match err.kind() {
        ErrorKind::NotFound => ApiError::unauthorized("Token subject no longer exists"),
        _ => ApiError::from(err),
    })?;

    if !user.is_active() {
        return Err(ApiError::unauthorized("User account is inactive"));
    }

    Ok(user)
}

/// Parse the Authorization header into bearer or basic credentials
pub fn extract_credentials(headers: &HeaderMap) -> Result<Credentials, ApiError> {
    let Some(value) = headers.get(header::AUTHORIZATION) else {
        return Err(ApiError::unauthorized(
            "Authentication required. Provide 'Authorization: Bearer <token>'",
        ));
    };

    let value = value
        .to_str()
        .map_err(|_| ApiError::bad_request("Invalid Authorization header encoding"))?;

    if let Some(token) = value.strip_prefix("Bearer ") {
        let token = token.trim();
        if token.is_empty() {
            return Err(ApiError::unauthorized("Empty bearer token"));
        }
        return Ok(Credentials::Bearer(token.to_string()));
    }

    if let Some(encoded) = value.strip_prefix("Basic ") {
        let decoded = STANDARD
            .decode(encoded.trim())
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
            .ok_or_else(|| ApiError::unauthorized("Malformed basic credentials"))?;

        let (username, password) = decoded
            .split_once(':')
            .ok_or_else(|| ApiError::unauthorized("Malformed basic credentials"))?;

        return Ok(Credentials::Basic {
            username: username.to_string(),
            password: password.to_string(),
        });
    }

    Err(ApiError::unauthorized("Unsupported authorization scheme"))
}
