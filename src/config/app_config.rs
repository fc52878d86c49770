use std::time::Duration;

use serde::Deserialize;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub database: DatabaseConfig,
    pub token: TokenConfig,
    pub admin: AdminConfig,
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Per-request deadline; storage calls are cancelled with the request
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// An empty `url` selects the in-memory store
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Signing secret, used as raw bytes
    pub secret: String,
    /// Session token lifetime; 0 means sessions never expire
    pub session_expire_secs: u64,
}

/// Initial admin account ensured at startup
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    pub create: bool,
    pub username: String,
    pub password: String,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    pub enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            request_timeout_secs: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: 10,
        }
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            session_expire_secs: 3600,
        }
    }
}

impl TokenConfig {
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_expire_secs)
    }
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            create: true,
            username: "admin".to_string(),
            password: "admin-password".to_string(),
            email: "admin@localhost".to_string(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl ServerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::builder()?.build()?.try_deserialize()
    }

    /// Default files and `APP__`-prefixed environment variables, e.g. `APP__TOKEN__SECRET`
    fn builder() -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError>
    {
        Ok(config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            ))
    }
}
