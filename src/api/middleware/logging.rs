//! Request logging with credential redaction

use std::time::Instant;

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use tracing::{info, warn};

use super::matched_path;

const REDACTED: &str = "[REDACTED]";

/// Log each request and its outcome
///
/// Runs inside the span opened by `TraceLayer`, so no span is created here.
pub async fn logging_middleware(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = matched_path(&request);
    let request_id = extract_request_id(&request);
    let headers = redact_headers(&request);

    info!(
        method = %method,
        path = %path,
        request_id = %request_id,
        headers = %headers,
        "Incoming request"
    );

    let response = next.run(request).await;
    let status = response.status();
    let duration_ms = start.elapsed().as_millis();

    if status.is_server_error() {
        warn!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            duration_ms = %duration_ms,
            request_id = %request_id,
            "Request failed"
        );
    } else {
        info!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            duration_ms = %duration_ms,
            request_id = %request_id,
            "Request completed"
        );
    }

    response
}

/// Set by `SetRequestIdLayer` before this middleware runs
fn extract_request_id(request: &Request<Body>) -> String {
    request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string()
}

fn redact_headers(request: &Request<Body>) -> String {
    request
        .headers()
        .iter()
        .filter(|(name, _)| should_log_header(name.as_str()))
        .map(|(name, value)| {
            let value = if is_sensitive_header(name.as_str()) {
                REDACTED
            } else {
                value.to_str().unwrap_or("[invalid]")
            };
            format!("{}={}", name.as_str(), value)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn is_sensitive_header(name: &str) -> bool {
    matches!(
        name,
        "authorization" | "proxy-authorization" | "cookie" | "set-cookie" | "x-auth-token"
    )
}

fn should_log_header(name: &str) -> bool {
    matches!(
        name,
        "content-type"
            | "content-length"
            | "accept"
            | "user-agent"
            | "x-request-id"
            | "x-forwarded-for"
            | "x-real-ip"
            | "authorization"
            | "cookie"
    )
}
