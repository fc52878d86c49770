//! Health check endpoints for Kubernetes probes

use std::time::Instant;

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};

use super::state::AppState;
use crate::api::types::Json;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checks: Option<Vec<HealthCheck>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: HealthStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

/// Returns 200 while the process is serving
pub async fn health_check() -> impl IntoResponse {
    let response = HealthResponse {
        status: HealthStatus::Healthy,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: None,
        latency_ms: None,
    };

    (StatusCode::OK, Json(response))
}

/// Readiness: the principal store must answer
pub async fn ready_check(State(state): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();
    let storage = check_storage(&state).await;
    let status = storage.status;

    let response = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: Some(vec![storage]),
        latency_ms: Some(start.elapsed().as_millis() as u64),
    };

    let status_code = match status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };

    (status_code, Json(response))
}

pub async fn live_check() -> impl IntoResponse {
    StatusCode::OK
}

async fn check_storage(state: &AppState) -> HealthCheck {
    let start = Instant::now();

    let (status, message) = match state.users.count().await {
        Ok(_) => (HealthStatus::Healthy, None),
        Err(e) => {
            tracing::warn!(error = %e, "Storage readiness probe failed");
            (HealthStatus::Unhealthy, Some(e.to_string()))
        }
    };

    HealthCheck {
        name: "storage".to_string(),
        status,
        message,
        latency_ms: Some(start.elapsed().as_millis() as u64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_status_serialization() {
        assert_eq!(
            serde_json::to_string(&HealthStatus::Healthy).unwrap(),
            "\"healthy\""
        );
        assert_eq!(
            serde_json::to_string(&HealthStatus::Unhealthy).unwrap(),
            "\"unhealthy\""
        );
    }

    #[test]
    fn test_health_response_serialization() {
        let response = HealthResponse {
            status: HealthStatus::Healthy,
            version: "1.0.0".to_string(),
            checks: None,
            latency_ms: None,
        };

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"status\":\"healthy\""));
        assert!(json.contains("\"version\":\"1.0.0\""));
        assert!(!json.contains("checks"));
    }

    #[test]
    fn test_health_response_parses_checks() {
        let json = r#"{
            "status": "unhealthy",
            "version": "0.1.0",
            "checks": [{"name": "storage", "status": "unhealthy", "message": "Connection refused"}]
        }"#;

        let response: HealthResponse = serde_json::from_str(json).unwrap();
        let checks = response.checks.unwrap();
        assert_eq!(response.status, HealthStatus::Unhealthy);
        assert_eq!(checks[0].message.as_deref(), Some("Connection refused"));
    }
}
