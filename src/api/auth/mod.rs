//! Authentication endpoints
//!
//! Login trades credentials for a session token, refresh renews it for the
//! current principal and verify echoes who the token belongs to.

use axum::{
    extract::State,
    routing::{get, post},
    Router,
};
use tracing::{debug, info};

use crate::api::middleware::RequirePrincipal;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, LoginBody, VerifyResponse};
use crate::domain::DomainError;
use crate::infrastructure::auth::IssuedToken;

pub fn create_auth_router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/refresh", get(refresh))
        .route("/verify", get(verify))
}

/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginBody>,
) -> Result<Json<IssuedToken>, ApiError> {
    debug!(username = %body.username, "Login attempt");

    let user = state
        .users
        .authenticate(&body.username, &body.password)
        .await?;

    let token = state
        .tokens
        .issue_session(user.id().as_str())
        .map_err(DomainError::from)?;

    info!(user_id = %user.id(), "User logged in");
    Ok(Json(token))
}

/// GET /auth/refresh
pub async fn refresh(
    State(state): State<AppState>,
    RequirePrincipal(user): RequirePrincipal,
) -> Result<Json<IssuedToken>, ApiError> {
    let token = state
        .tokens
        .issue_session(user.id().as_str())
        .map_err(DomainError::from)?;

    debug!(user_id = %user.id(), "Refreshed session token");
    Ok(Json(token))
}

/// GET /auth/verify
pub async fn verify(RequirePrincipal(user): RequirePrincipal) -> Json<VerifyResponse> {
    Json(VerifyResponse {
        username: user.username().to_string(),
        created_at: user.created_at(),
    })
}
