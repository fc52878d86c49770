//! tracing-subscriber setup

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::{LogFormat, LoggingConfig};

/// `RUST_LOG` wins over the configured level
fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber; a second call is ignored
pub fn init_logging(config: &LoggingConfig) {
    let filter = build_filter(&config.level);

    let installed = match config.format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().pretty().with_target(true))
            .try_init(),
    };

    if installed.is_ok() {
        tracing::info!(level = %config.level, format = ?config.format, "Logging initialized");
    }
}
