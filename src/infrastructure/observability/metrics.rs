//! Prometheus metrics infrastructure

use std::sync::Arc;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;
use regex::Regex;

static UUID_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}").unwrap()
});

const MAX_PATH_LABEL: usize = 50;

/// Prometheus metrics handle for serving metrics endpoint
#[derive(Clone)]
pub struct PrometheusMetrics {
    handle: Arc<PrometheusHandle>,
}

impl std::fmt::Debug for PrometheusMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrometheusMetrics").finish_non_exhaustive()
    }
}

impl PrometheusMetrics {
    pub fn new(handle: PrometheusHandle) -> Self {
        Self {
            handle: Arc::new(handle),
        }
    }

    /// Recorder-less handle, rendering nothing until a recorder is installed
    pub fn detached() -> Self {
        Self::new(PrometheusBuilder::new().build_recorder().handle())
    }

    /// Get the metrics as a string for the /metrics endpoint
    pub fn render(&self) -> String {
        self.handle.render()
    }
}

/// Install the global Prometheus recorder
pub fn init_metrics(enabled: bool) -> Option<PrometheusMetrics> {
    if !enabled {
        tracing::info!("Prometheus metrics disabled");
        return None;
    }

    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            gauge!("identity_info", "version" => env!("CARGO_PKG_VERSION")).set(1.0);
            tracing::info!("Prometheus metrics initialized");
            Some(PrometheusMetrics::new(handle))
        }
        Err(e) => {
            tracing::error!("Failed to initialize Prometheus metrics: {}", e);
            None
        }
    }
}

/// Record an HTTP request metric
pub fn record_http_request(method: &str, path: &str, status: u16, duration: Duration) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!("http_requests_total", &labels).increment(1);
    histogram!("http_request_duration_seconds", &labels).record(duration.as_secs_f64());

    if status >= 500 {
        counter!("http_server_errors_total", &labels).increment(1);
    }
}

/// Record an attach, permit or drop outcome
pub fn record_membership_operation(kind: &'static str, action: &'static str, success: bool) {
    let outcome = if success { "success" } else { "error" };
    counter!(
        "membership_operations_total",
        "kind" => kind,
        "action" => action,
        "outcome" => outcome
    )
    .increment(1);
}

/// Bound label cardinality for paths no route matched
fn sanitize_path(path: &str) -> String {
    let path = UUID_SEGMENT.replace_all(path, "{id}");

    if path.len() > MAX_PATH_LABEL {
        let cut = (0..=MAX_PATH_LABEL)
            .rev()
            .find(|i| path.is_char_boundary(*i))
            .unwrap_or(0);
        path[..cut].to_string()
    } else {
        path.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_path_replaces_uuid() {
        let path = "/users/550e8400-e29b-41d4-a716-446655440000/groups";
        assert_eq!(sanitize_path(path), "/users/{id}/groups");
    }

    #[test]
    fn test_sanitize_path_keeps_route_patterns() {
        assert_eq!(sanitize_path("/groups/{group_id}/users"), "/groups/{group_id}/users");
        assert_eq!(sanitize_path("/health"), "/health");
    }

    #[test]
    fn test_sanitize_path_truncates_long_paths() {
        let path = "/very/long/path/that/exceeds/the/maximum/allowed/length/for/metrics";
        assert!(sanitize_path(path).len() <= MAX_PATH_LABEL);
    }

    #[test]
    fn test_detached_handle_renders() {
        let metrics = PrometheusMetrics::detached();
        assert!(metrics.render().is_empty());
    }
}
