//! PMP Identity API
//!
//! Users, groups and teams, the memberships binding users to groups and
//! teams with a permission level, and the signed bearer tokens that
//! authenticate every request.

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use rand::Rng;
use tracing::{info, warn};

use api::state::AppState;
use infrastructure::auth::TokenService;
use infrastructure::observability::init_metrics;
use infrastructure::storage::{Repositories, StorageConfig};
use infrastructure::user::Argon2Hasher;

/// Wire storage, services and the initial admin from configuration
pub async fn create_app_state(config: &AppConfig) -> anyhow::Result<AppState> {
    let storage = StorageConfig::from_url(&config.database.url, config.database.max_connections);
    let repositories = Repositories::create(&storage).await?;

    let tokens = TokenService::new(token_secret(config), config.token.session_ttl());
    let state = AppState::new(repositories, Arc::new(Argon2Hasher::new()), tokens)
        .with_metrics(init_metrics(config.metrics.enabled));

    if config.admin.create {
        let admin = state
            .users
            .ensure_admin(
                &config.admin.username,
                &config.admin.password,
                &config.admin.email,
            )
            .await?;
        info!(user_id = %admin.id(), username = %admin.username(), "Initial admin ready");
    }

    Ok(state)
}

fn token_secret(config: &AppConfig) -> String {
    if !config.token.secret.is_empty() {
        return config.token.secret.clone();
    }

    warn!(
        "No token secret configured. Generating random secret. \
        Tokens will NOT survive restarts. Set APP__TOKEN__SECRET for persistent tokens."
    );
    generate_random_secret()
}

fn generate_random_secret() -> String {
    use rand::distributions::Alphanumeric;

    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_secret_wins() {
        let mut config = AppConfig::default();
        config.token.secret = "s3cr3t".to_string();
        assert_eq!(token_secret(&config), "s3cr3t");
    }

    #[test]
    fn test_random_secret_when_missing() {
        let config = AppConfig::default();
        let first = token_secret(&config);

        assert_eq!(first.len(), 64);
        assert_ne!(first, token_secret(&config));
    }

    #[tokio::test]
    async fn test_create_app_state_in_memory() {
        let mut config = AppConfig::default();
        config.metrics.enabled = false;
        config.admin.password = "bootstrap-password".to_string();

        let state = create_app_state(&config).await.unwrap();
        let admin = state.users.find("admin").await.unwrap();

        assert!(admin.is_admin());
        assert!(admin.is_active());
        assert!(state.metrics.is_none());
    }
}
