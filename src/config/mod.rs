//! Application configuration

mod app_config;

pub use app_config::{
    AdminConfig, AppConfig, DatabaseConfig, LogFormat, LoggingConfig, MetricsConfig,
    ServerConfig, TokenConfig,
};
