//! Observability infrastructure - Metrics

mod metrics;

pub use metrics::{
    init_metrics, record_http_request, record_membership_operation, PrometheusMetrics,
};
