//! Group and team endpoints, one generic router per container kind

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Router,
};
use tracing::debug;

use crate::api::middleware::RequireAdmin;
use crate::api::state::{AppState, KindServices};
use crate::api::types::{
    ApiError, ContainerMemberBody, ContainerResponse, CreateContainerBody, Json, ListQuery,
    ListResponse, MemberResponse, Notification, UpdateContainerBody,
};
use crate::domain::ListParams;
use crate::infrastructure::container::{CreateContainerRequest, UpdateContainerRequest};

/// Router mounted at `/groups` or `/teams`
pub fn create_container_router<K: KindServices>() -> Router<AppState> {
    Router::new()
        .route("/", get(list_containers::<K>).post(create_container::<K>))
        .route(
            "/{id}",
            get(show_container::<K>)
                .put(update_container::<K>)
                .delete(delete_container::<K>),
        )
        .route(
            "/{id}/users",
            get(list_members::<K>)
                .post(attach_member::<K>)
                .put(permit_member::<K>)
                .delete(drop_member::<K>),
        )
}

pub async fn list_containers<K: KindServices>(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse<ContainerResponse>>, ApiError> {
    let params = ListParams::from(query);
    let page = K::containers(&state).list(&params).await?;

    Ok(Json(ListResponse::new(
        K::PLURAL,
        page.map(ContainerResponse::from),
        &params,
    )))
}

/// The creating admin becomes owner of the new container
pub async fn create_container<K: KindServices>(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(body): Json<CreateContainerBody>,
) -> Result<Json<ContainerResponse>, ApiError> {
    debug!(kind = K::NAME, name = %body.name, "Creating container");

    let container = K::containers(&state)
        .create(CreateContainerRequest::from(body), Some(admin.id()))
        .await?;

    Ok(Json(ContainerResponse::from(&container)))
}

pub async fn show_container<K: KindServices>(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<ContainerResponse>, ApiError> {
    let container = K::containers(&state).find(&id).await?;
    Ok(Json(ContainerResponse::from(&container)))
}

pub async fn update_container<K: KindServices>(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<String>,
    Json(body): Json<UpdateContainerBody>,
) -> Result<Json<ContainerResponse>, ApiError> {
    let container = K::containers(&state)
        .update(&id, UpdateContainerRequest::from(body))
        .await?;

    Ok(Json(ContainerResponse::from(&container)))
}

pub async fn delete_container<K: KindServices>(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Notification, ApiError> {
    K::containers(&state).delete(&id).await?;
    Ok(Notification::success(format!("Successfully deleted {}", K::NAME)))
}

/// GET /{kind}/{id}/users
pub async fn list_members<K: KindServices>(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListResponse<MemberResponse<K>>>, ApiError> {
    let params = ListParams::from(query);
    let page = K::members(&state).list_members(&id, &params).await?;

    Ok(Json(ListResponse::new(
        "users",
        page.map(MemberResponse::from),
        &params,
    )))
}

/// POST /{kind}/{id}/users
pub async fn attach_member<K: KindServices>(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<String>,
    Json(body): Json<ContainerMemberBody>,
) -> Result<Notification, ApiError> {
    K::members(&state)
        .attach(&body.user, &id, body.perm.as_deref())
        .await?;

    Ok(Notification::success(format!(
        "Successfully attached user to {}",
        K::NAME
    )))
}

/// PUT /{kind}/{id}/users
pub async fn permit_member<K: KindServices>(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<String>,
    Json(body): Json<ContainerMemberBody>,
) -> Result<Notification, ApiError> {
    K::members(&state)
        .permit(&body.user, &id, body.perm.as_deref())
        .await?;

    Ok(Notification::success(format!(
        "Successfully updated {} permission",
        K::NAME
    )))
}

/// DELETE /{kind}/{id}/users
pub async fn drop_member<K: KindServices>(
    State(state): State<AppState>,
    RequireAdmin(_): RequireAdmin,
    Path(id): Path<String>,
    Json(body): Json<ContainerMemberBody>,
) -> Result<Notification, ApiError> {
    K::members(&state).drop(&body.user, &id).await?;

    Ok(Notification::success(format!(
        "Successfully dropped user from {}",
        K::NAME
    )))
}
