use std::time::Duration;

use axum::{
    extract::State,
    http::{header, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use super::containers::create_container_router;
use super::health;
use super::middleware::{logging_middleware, metrics_middleware};
use super::state::AppState;
use super::types::ApiError;
use super::{auth, profile, users};
use crate::domain::{GroupKind, TeamKind};

/// Create the full router with application state
///
/// Storage calls run inside the request future and are dropped with it
/// when `request_timeout` elapses.
pub fn create_router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/ready", get(health::ready_check))
        .route("/live", get(health::live_check))
        .route("/metrics", get(metrics_handler))
        .nest("/auth", auth::create_auth_router())
        .nest("/profile", profile::create_profile_router())
        .nest("/users", users::create_users_router())
        .nest("/groups", create_container_router::<GroupKind>())
        .nest("/teams", create_container_router::<TeamKind>())
        .with_state(state)
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(logging_middleware))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
}

/// Prometheus text exposition
async fn metrics_handler(State(state): State<AppState>) -> Response {
    match &state.metrics {
        Some(metrics) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            metrics.render(),
        )
            .into_response(),
        None => ApiError::not_found("Metrics are disabled").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use base64::{engine::general_purpose::STANDARD, Engine};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::infrastructure::auth::TokenService;
    use crate::infrastructure::observability::PrometheusMetrics;
    use crate::infrastructure::storage::Repositories;
    use crate::infrastructure::user::MockPasswordHasher;

    const ADMIN_PASSWORD: &str = "admin-password";

    fn hasher() -> MockPasswordHasher {
        let mut hasher = MockPasswordHasher::new();
        hasher
            .expect_hash()
            .returning(|password| Ok(format!("hashed:{}", password)));
        hasher
            .expect_verify()
            .returning(|password, hash| hash == format!("hashed:{}", password));
        hasher
    }

    async fn app() -> Router {
        let state = AppState::new(
            Repositories::in_memory(),
            Arc::new(hasher()),
            TokenService::new("router-secret", Duration::from_secs(3600)),
        );
        state
            .users
            .ensure_admin("admin", ADMIN_PASSWORD, "admin@example.com")
            .await
            .unwrap();

        create_router(state, Duration::from_secs(30))
    }

    async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let body = match body {
            Some(body) => {
                builder = builder.header("content-type", "application/json");
                Body::from(body.to_string())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        (status, value)
    }

    async fn login(app: &Router, username: &str, password: &str) -> String {
        let (status, body) = send(
            app,
            "POST",
            "/auth/login",
            None,
            Some(json!({"username": username, "password": password})),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "login failed: {}", body);
        body["token"].as_str().unwrap().to_string()
    }

    async fn create_user(app: &Router, token: &str, username: &str) {
        let (status, body) = send(
            app,
            "POST",
            "/users",
            Some(token),
            Some(json!({
                "username": username,
                "password": "supersecret",
                "email": format!("{}@example.com", username),
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "create user failed: {}", body);
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        let app = app().await;

        let (status, body) = send(&app, "GET", "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");

        let (status, body) = send(&app, "GET", "/ready", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["checks"][0]["name"], "storage");

        let (status, _) = send(&app, "GET", "/live", None, None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_request_id_is_propagated() {
        let app = app().await;
        let response = app
            .oneshot(Request::builder().uri("/live").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert!(response.headers().contains_key("x-request-id"));
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let (status, body) = send(&app().await, "GET", "/metrics", None, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], 404);

        let state = AppState::new(
            Repositories::in_memory(),
            Arc::new(hasher()),
            TokenService::new("router-secret", Duration::from_secs(3600)),
        )
        .with_metrics(Some(PrometheusMetrics::detached()));
        let app = create_router(state, Duration::from_secs(30));

        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_authentication_required() {
        let app = app().await;

        let (status, body) = send(&app, "GET", "/profile/self", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["status"], 401);

        let (status, _) = send(&app, "GET", "/users", Some("not.a.token"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(
            &app,
            "POST",
            "/auth/login",
            None,
            Some(json!({"username": "admin", "password": "wrong"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_basic_credentials() {
        let app = app().await;
        let credentials = STANDARD.encode(format!("admin:{}", ADMIN_PASSWORD));

        let request = Request::builder()
            .uri("/auth/verify")
            .header("authorization", format!("Basic {}", credentials))
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["username"], "admin");
    }

    #[tokio::test]
    async fn test_token_endpoints() {
        let app = app().await;
        let token = login(&app, "admin", ADMIN_PASSWORD).await;

        let (status, body) = send(&app, "GET", "/auth/refresh", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["expires_at"].is_string());

        let (status, body) = send(&app, "GET", "/profile/token", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.get("expires_at").is_none());

        let personal = body["token"].as_str().unwrap();
        let (status, body) = send(&app, "GET", "/auth/verify", Some(personal), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["username"], "admin");
    }

    #[tokio::test]
    async fn test_profile_update_cannot_escalate() {
        let app = app().await;
        let admin = login(&app, "admin", ADMIN_PASSWORD).await;
        create_user(&app, &admin, "jdoe").await;
        let token = login(&app, "jdoe", "supersecret").await;

        let (status, body) = send(
            &app,
            "PUT",
            "/profile/self",
            Some(&token),
            Some(json!({"fullname": "John Doe", "admin": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["fullname"], "John Doe");
        assert_eq!(body["admin"], false);

        let (status, body) = send(&app, "GET", "/users", Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["status"], 403);
    }

    #[tokio::test]
    async fn test_user_validation_and_decoding() {
        let app = app().await;
        let token = login(&app, "admin", ADMIN_PASSWORD).await;

        let (status, body) = send(
            &app,
            "POST",
            "/users",
            Some(&token),
            Some(json!({"username": "x", "password": "short", "email": "nope"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let fields: Vec<_> = body["errors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["field"].as_str().unwrap().to_string())
            .collect();
        assert!(fields.contains(&"username".to_string()));
        assert!(fields.contains(&"email".to_string()));
        assert!(fields.contains(&"password".to_string()));

        create_user(&app, &token, "jdoe").await;
        let (status, body) = send(
            &app,
            "POST",
            "/users",
            Some(&token),
            Some(json!({"username": "jdoe", "password": "supersecret", "email": "other@example.com"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["errors"][0]["field"], "username");

        let request = Request::builder()
            .method("POST")
            .uri("/users")
            .header("authorization", format!("Bearer {}", token))
            .header("content-type", "application/json")
            .body(Body::from("{broken"))
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, "GET", "/users/nobody", Some(&token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_membership_scenario() {
        let app = app().await;
        let token = login(&app, "admin", ADMIN_PASSWORD).await;
        create_user(&app, &token, "jdoe").await;

        let (status, body) = send(
            &app,
            "POST",
            "/groups",
            Some(&token),
            Some(json!({"name": "Developers"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["slug"], "developers");

        let attach = json!({"user": "jdoe"});
        let (status, body) = send(
            &app,
            "POST",
            "/groups/developers/users",
            Some(&token),
            Some(attach.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Successfully attached user to group");

        let (status, body) = send(
            &app,
            "POST",
            "/groups/developers/users",
            Some(&token),
            Some(attach.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::PRECONDITION_FAILED);
        assert_eq!(body["status"], 412);

        let (status, _) = send(
            &app,
            "PUT",
            "/groups/developers/users",
            Some(&token),
            Some(json!({"user": "jdoe", "perm": "owner"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, "GET", "/users/jdoe/groups", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);
        assert_eq!(body["groups"][0]["perm"], "owner");
        assert_eq!(body["groups"][0]["group"]["slug"], "developers");

        // The creating admin is already an owner
        let (status, body) = send(
            &app,
            "GET",
            "/groups/developers/users?sort=username",
            Some(&token),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 2);
        assert_eq!(body["limit"], 100);
        assert_eq!(body["users"][0]["user"]["username"], "admin");

        let (status, _) = send(
            &app,
            "DELETE",
            "/groups/developers/users",
            Some(&token),
            Some(attach.clone()),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(
            &app,
            "DELETE",
            "/groups/developers/users",
            Some(&token),
            Some(attach),
        )
        .await;
        assert_eq!(status, StatusCode::PRECONDITION_FAILED);
    }

    #[tokio::test]
    async fn test_user_side_team_membership() {
        let app = app().await;
        let token = login(&app, "admin", ADMIN_PASSWORD).await;
        create_user(&app, &token, "jdoe").await;

        let (status, _) = send(
            &app,
            "POST",
            "/teams",
            Some(&token),
            Some(json!({"name": "Platform"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(
            &app,
            "POST",
            "/users/jdoe/teams",
            Some(&token),
            Some(json!({"team": "platform", "perm": "superuser"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["errors"][0]["field"], "perm");

        let (status, body) = send(
            &app,
            "POST",
            "/users/jdoe/teams",
            Some(&token),
            Some(json!({"team": "platform", "perm": "admin"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Successfully attached team to user");

        let (status, body) = send(
            &app,
            "POST",
            "/users/jdoe/teams",
            Some(&token),
            Some(json!({"team": "platform", "perm": "superuser"})),
        )
        .await;
        assert_eq!(status, StatusCode::PRECONDITION_FAILED);
        assert!(body.get("errors").is_none());

        let (status, _) = send(
            &app,
            "POST",
            "/users/jdoe/teams",
            Some(&token),
            Some(json!({"team": "missing"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        // Teams and groups are separate namespaces
        let (status, body) = send(&app, "GET", "/users/jdoe/groups", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 0);

        let (status, _) = send(&app, "DELETE", "/users/jdoe", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, "GET", "/teams/platform/users", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], 1);
    }
}
