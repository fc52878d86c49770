//! PostgreSQL storage implementation with connection pooling

mod containers;
mod memberships;
mod users;

pub use containers::PostgresContainerRepository;
pub use memberships::PostgresMembershipRepository;
pub use users::PostgresUserRepository;

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::domain::DomainError;

/// PostgreSQL storage configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of connections to maintain
    pub min_connections: u32,
    /// Connection timeout in seconds
    pub connect_timeout_secs: u64,
    /// Idle timeout in seconds
    pub idle_timeout_secs: u64,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/pmp_identity".to_string(),
            max_connections: 10,
            min_connections: 1,
            connect_timeout_secs: 30,
            idle_timeout_secs: 600,
        }
    }
}

impl PostgresConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }
}

/// Open a connection pool for `config`
pub async fn connect(config: &PostgresConfig) -> Result<PgPool, DomainError> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(std::time::Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(std::time::Duration::from_secs(config.idle_timeout_secs))
        .connect(&config.url)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to connect to PostgreSQL: {}", e)))
}

/// Constraint classes the repositories translate into domain errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Violation {
    /// Unique constraint on the named column
    Unique(String),
    /// Primary key of the table
    PrimaryKey,
    /// Foreign key; `subject` is set when it points at `users`
    Reference { subject: bool },
}

/// Classify a constraint violation raised by the database
pub(crate) fn violation(err: &sqlx::Error) -> Option<Violation> {
    let db = err.as_database_error()?;
    classify(
        db.constraint().unwrap_or_default(),
        db.is_unique_violation(),
        db.is_foreign_key_violation(),
    )
}

/// Classify by the default Postgres constraint names:
/// `<table>_<column>_key`, `<table>_pkey` and `<table>_<column>_fkey`
fn classify(constraint: &str, is_unique: bool, is_foreign_key: bool) -> Option<Violation> {
    if is_unique {
        if constraint.ends_with("_pkey") {
            return Some(Violation::PrimaryKey);
        }
        let column = constraint
            .strip_suffix("_key")
            .and_then(|rest| rest.rsplit('_').next())
            .unwrap_or_default();
        return Some(Violation::Unique(column.to_string()));
    }

    if is_foreign_key {
        return Some(Violation::Reference {
            subject: constraint.ends_with("_user_id_fkey"),
        });
    }

    None
}

/// `LIMIT` and `OFFSET` values, saturating at `i64::MAX`
pub(crate) fn sql_count(value: usize) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

/// Escape LIKE wildcards and wrap in `%`
pub(crate) fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

pub(crate) fn storage_error(action: &str, err: sqlx::Error) -> DomainError {
    DomainError::storage(format!("Failed to {}: {}", action, err))
}
