//! User management endpoints, admin only
//!
//! Besides CRUD this mounts the user side of memberships at
//! `/users/{id}/groups` and `/users/{id}/teams`.

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Router,
};
use tracing::debug;

use crate::api::middleware::RequireAdmin;
use crate::api::state::{AppState, KindServices};
use crate::api::types::{
    ApiError, CreateUserBody, Json, ListQuery, ListResponse, MemberResponse, Notification,
    UpdateUserBody, UserMemberBody, UserResponse,
};
use crate::domain::{GroupKind, ListParams, TeamKind};
use crate::infrastructure::user::{CreateUserRequest, UpdateUserRequest};

pub fn create_users_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route(
            "/{id}",
            get(show_user).put(update_user).delete(delete_user),
        )
        .route("/{id}/groups", memberships::<GroupKind>())
        .route("/{id}/teams", memberships::<TeamKind>())
}

fn memberships<K: KindServices>() -> axum::routing::MethodRouter<AppState> {
    get(list_user_memberships::<K>)
        .post(attach_user::<K>)
        .put(permit_user::<K>)
        .delete(drop_user::<K>)
}

/// GET /users
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse<UserResponse>>, ApiError> {
    let params = ListParams::from(query);
    let page = state.users.list(&params).await?;

    Ok(Json(ListResponse::new(
        "users",
        page.map(UserResponse::from),
        &params,
    )))
}

/// POST /users
pub async fn create_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(body): Json<CreateUserBody>,
) -> Result<Json<UserResponse>, ApiError> {
    debug!(admin_id = %admin.id(), username = %body.username, "Admin creating user");

    let user = state.users.create(CreateUserRequest::from(body)).await?;
    Ok(Json(UserResponse::from(&user)))
}

/// GET /users/{id}
pub async fn show_user(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state.users.find(&id).await?;
    Ok(Json(UserResponse::from(&user)))
}

/// PUT /users/{id}
pub async fn update_user(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<String>,
    Json(body): Json<UpdateUserBody>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = state
        .users
        .update(&id, UpdateUserRequest::from(body))
        .await?;

    Ok(Json(UserResponse::from(&user)))
}

/// DELETE /users/{id}
pub async fn delete_user(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Notification, ApiError> {
    state.users.delete(&id).await?;
    Ok(Notification::success("Successfully deleted user"))
}

/// GET /users/{id}/{kind}
pub async fn list_user_memberships<K: KindServices>(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse<MemberResponse<K>>>, ApiError> {
    let params = ListParams::from(query);
    let page = K::members(&state).list_for_user(&id, &params).await?;

    Ok(Json(ListResponse::new(
        K::PLURAL,
        page.map(MemberResponse::from),
        &params,
    )))
}

/// POST /users/{id}/{kind}
pub async fn attach_user<K: KindServices>(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<String>,
    Json(body): Json<UserMemberBody>,
) -> Result<Notification, ApiError> {
    K::members(&state)
        .attach(&id, &body.container, body.perm.as_deref())
        .await?;

    Ok(Notification::success(format!(
        "Successfully attached {} to user",
        K::NAME
    )))
}

/// PUT /users/{id}/{kind}
pub async fn permit_user<K: KindServices>(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<String>,
    Json(body): Json<UserMemberBody>,
) -> Result<Notification, ApiError> {
    K::members(&state)
        .permit(&id, &body.container, body.perm.as_deref())
        .await?;

    Ok(Notification::success(format!(
        "Successfully updated {} permission",
        K::NAME
    )))
}

/// DELETE /users/{id}/{kind}
pub async fn drop_user<K: KindServices>(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<String>,
    Json(body): Json<UserMemberBody>,
) -> Result<Notification, ApiError> {
    K::members(&state).drop(&id, &body.container).await?;

    Ok(Notification::success(format!(
        "Successfully dropped {} from user",
        K::NAME
    )))
}
