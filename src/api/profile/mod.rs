//! Self-service endpoints of the current principal

use axum::{extract::State, routing::get, Router};
use tracing::info;

use crate::api::middleware::RequirePrincipal;
use crate::api::state::AppState;
use crate::api::types::{ApiError, Json, UpdateProfileBody, UserResponse};
use crate::domain::DomainError;
use crate::infrastructure::auth::IssuedToken;
use crate::infrastructure::user::UpdateUserRequest;

pub fn create_profile_router() -> Router<AppState> {
    Router::new()
        .route("/self", get(show_profile).put(update_profile))
        .route("/token", get(profile_token))
}

/// GET /profile/self
pub async fn show_profile(RequirePrincipal(user): RequirePrincipal) -> Json<UserResponse> {
    Json(UserResponse::from(&user))
}

/// PUT /profile/self
///
/// Admin and active flags are ignored even when sent.
pub async fn update_profile(
    State(state): State<AppState>,
    RequirePrincipal(user): RequirePrincipal,
    Json(body): Json<UpdateProfileBody>,
) -> Result<Json<UserResponse>, ApiError> {
    let updated = state
        .users
        .update(user.id().as_str(), UpdateUserRequest::from(body))
        .await?;

    info!(user_id = %updated.id(), "Updated own profile");
    Ok(Json(UserResponse::from(&updated)))
}

/// GET /profile/token
///
/// Personal access token without expiry.
pub async fn profile_token(
    State(state): State<AppState>,
    RequirePrincipal(user): RequirePrincipal,
) -> Result<Json<IssuedToken>, ApiError> {
    let token = state
        .tokens
        .issue_unlimited(user.id().as_str())
        .map_err(DomainError::from)?;

    info!(user_id = %user.id(), "Issued personal access token");
    Ok(Json(token))
}
