//! Health command - probes `/health` of a running server

use std::time::Duration;

use anyhow::{bail, Context};
use clap::Args;

use crate::api::health::{HealthResponse, HealthStatus};

#[derive(Debug, Args)]
pub struct HealthArgs {
    /// Health endpoint to query
    #[arg(long, default_value = "http://127.0.0.1:8080/health")]
    pub url: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 5)]
    pub timeout: u64,
}

/// Exits non-zero when the server is unreachable or reports unhealthy
pub async fn run(args: HealthArgs) -> anyhow::Result<()> {
    let health = probe(&args.url, Duration::from_secs(args.timeout)).await?;
    println!("{} (version {})", args.url, health.version);
    Ok(())
}

async fn probe(url: &str, timeout: Duration) -> anyhow::Result<HealthResponse> {
    let client = reqwest::Client::builder().timeout(timeout).build()?;

    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("failed to reach {}", url))?;

    let status = response.status();
    if !status.is_success() {
        bail!("{} answered with status {}", url, status);
    }

    let health: HealthResponse = response
        .json()
        .await
        .with_context(|| format!("{} returned an unexpected body", url))?;

    if health.status != HealthStatus::Healthy {
        bail!("{} reports status {:?}", url, health.status);
    }

    Ok(health)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TIMEOUT: Duration = Duration::from_secs(2);

    #[tokio::test]
    async fn test_probe_healthy() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": "healthy", "version": "0.1.0"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let health = probe(&format!("{}/health", server.uri()), TIMEOUT)
            .await
            .unwrap();
        assert_eq!(health.version, "0.1.0");
    }

    #[tokio::test]
    async fn test_probe_unhealthy_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"status": "unhealthy", "version": "0.1.0"})),
            )
            .mount(&server)
            .await;

        let err = probe(&format!("{}/health", server.uri()), TIMEOUT)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Unhealthy"));
    }

    #[tokio::test]
    async fn test_probe_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = probe(&format!("{}/health", server.uri()), TIMEOUT)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_probe_unreachable() {
        let err = probe("http://127.0.0.1:1/health", TIMEOUT).await.unwrap_err();
        assert!(err.to_string().contains("failed to reach"));
    }
}
