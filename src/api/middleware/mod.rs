//! API middleware components

pub mod auth;
pub mod logging;
pub mod metrics;

use axum::{body::Body, extract::MatchedPath, http::Request};

pub use auth::{extract_credentials, Credentials, RequireAdmin, RequirePrincipal};
pub use logging::logging_middleware;
pub use metrics::metrics_middleware;

/// Route pattern of the request, the raw path when no route matched
fn matched_path(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string())
}
