//! Database migrations infrastructure

use sqlx::postgres::PgPool;
use tracing::info;

use crate::domain::DomainError;

/// PostgreSQL migrator tracking applied versions in a `_migrations` table
#[derive(Debug)]
pub struct PostgresMigrator {
    pool: PgPool,
}

impl PostgresMigrator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the migrations table if it doesn't exist
    async fn ensure_migrations_table(&self) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version BIGINT PRIMARY KEY,
                description TEXT NOT NULL,
                installed_on TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| DomainError::storage(format!("Failed to create migrations table: {}", e)))?;

        Ok(())
    }

    async fn is_applied(&self, version: i64) -> Result<bool, DomainError> {
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM _migrations WHERE version = $1)")
            .bind(version)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to check migration status: {}", e)))
    }

    /// Runs a single migration and records it in one transaction
    pub async fn run_migration(&self, migration: &Migration) -> Result<bool, DomainError> {
        self.ensure_migrations_table().await?;

        if self.is_applied(migration.version).await? {
            return Ok(false);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to begin migration: {}", e)))?;

        sqlx::raw_sql(migration.up)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::storage(format!(
                    "Failed to run migration {}: {}",
                    migration.version, e
                ))
            })?;

        sqlx::query("INSERT INTO _migrations (version, description) VALUES ($1, $2)")
            .bind(migration.version)
            .bind(migration.description)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::storage(format!(
                    "Failed to record migration {}: {}",
                    migration.version, e
                ))
            })?;

        tx.commit()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to commit migration: {}", e)))?;

        Ok(true)
    }

    /// Reverts a single migration
    pub async fn revert_migration(&self, migration: &Migration) -> Result<bool, DomainError> {
        self.ensure_migrations_table().await?;

        if !self.is_applied(migration.version).await? {
            return Ok(false);
        }

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to begin revert: {}", e)))?;

        sqlx::raw_sql(migration.down)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::storage(format!(
                    "Failed to revert migration {}: {}",
                    migration.version, e
                ))
            })?;

        sqlx::query("DELETE FROM _migrations WHERE version = $1")
            .bind(migration.version)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                DomainError::storage(format!(
                    "Failed to remove migration record {}: {}",
                    migration.version, e
                ))
            })?;

        tx.commit()
            .await
            .map_err(|e| DomainError::storage(format!("Failed to commit revert: {}", e)))?;

        Ok(true)
    }

    /// Returns the latest applied migration version
    pub async fn current_version(&self) -> Result<Option<i64>, DomainError> {
        self.ensure_migrations_table().await?;

        sqlx::query_scalar("SELECT MAX(version) FROM _migrations")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DomainError::storage(format!("Failed to get migration version: {}", e)))
    }
}

/// Represents a database migration
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub version: i64,
    pub description: &'static str,
    /// SQL to run when applying the migration
    pub up: &'static str,
    /// SQL to run when reverting the migration
    pub down: &'static str,
}

/// Identity schema, in application order
pub fn identity_migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: 1,
            description: "Create users table",
            up: r#"
            CREATE TABLE IF NOT EXISTS users (
                id VARCHAR(36) PRIMARY KEY,
                slug VARCHAR(255) NOT NULL,
                username VARCHAR(255) NOT NULL,
                email VARCHAR(255) NOT NULL,
                fullname VARCHAR(255) NOT NULL DEFAULT '',
                password_hash VARCHAR(255) NOT NULL,
                active BOOLEAN NOT NULL DEFAULT FALSE,
                admin BOOLEAN NOT NULL DEFAULT FALSE,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                CONSTRAINT users_slug_key UNIQUE (slug),
                CONSTRAINT users_username_key UNIQUE (username),
                CONSTRAINT users_email_key UNIQUE (email)
            );
            "#,
            down: "DROP TABLE IF EXISTS users;",
        },
        Migration {
            version: 2,
            description: "Create groups table",
            up: r#"
            CREATE TABLE IF NOT EXISTS groups (
                id VARCHAR(36) PRIMARY KEY,
                slug VARCHAR(255) NOT NULL,
                name VARCHAR(255) NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                CONSTRAINT groups_slug_key UNIQUE (slug),
                CONSTRAINT groups_name_key UNIQUE (name)
            );
            "#,
            down: "DROP TABLE IF EXISTS groups;",
        },
        Migration {
            version: 3,
            description: "Create teams table",
            up: r#"
            CREATE TABLE IF NOT EXISTS teams (
                id VARCHAR(36) PRIMARY KEY,
                slug VARCHAR(255) NOT NULL,
                name VARCHAR(255) NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                CONSTRAINT teams_slug_key UNIQUE (slug),
                CONSTRAINT teams_name_key UNIQUE (name)
            );
            "#,
            down: "DROP TABLE IF EXISTS teams;",
        },
        Migration {
            version: 4,
            description: "Create user_groups table",
            up: r#"
            CREATE TABLE IF NOT EXISTS user_groups (
                user_id VARCHAR(36) NOT NULL,
                group_id VARCHAR(36) NOT NULL,
                perm VARCHAR(32) NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                CONSTRAINT user_groups_pkey PRIMARY KEY (user_id, group_id),
                CONSTRAINT user_groups_user_id_fkey FOREIGN KEY (user_id)
                    REFERENCES users (id) ON DELETE CASCADE,
                CONSTRAINT user_groups_group_id_fkey FOREIGN KEY (group_id)
                    REFERENCES groups (id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_user_groups_group_id ON user_groups(group_id);
            "#,
            down: "DROP TABLE IF EXISTS user_groups;",
        },
        Migration {
            version: 5,
            description: "Create user_teams table",
            up: r#"
            CREATE TABLE IF NOT EXISTS user_teams (
                user_id VARCHAR(36) NOT NULL,
                team_id VARCHAR(36) NOT NULL,
                perm VARCHAR(32) NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
                CONSTRAINT user_teams_pkey PRIMARY KEY (user_id, team_id),
                CONSTRAINT user_teams_user_id_fkey FOREIGN KEY (user_id)
                    REFERENCES users (id) ON DELETE CASCADE,
                CONSTRAINT user_teams_team_id_fkey FOREIGN KEY (team_id)
                    REFERENCES teams (id) ON DELETE CASCADE
            );
            CREATE INDEX IF NOT EXISTS idx_user_teams_team_id ON user_teams(team_id);
            "#,
            down: "DROP TABLE IF EXISTS user_teams;",
        },
    ]
}

/// Runs all pending identity migrations
pub async fn run_migrations(pool: &PgPool) -> Result<(), DomainError> {
    let migrator = PostgresMigrator::new(pool.clone());

    for migration in identity_migrations() {
        if migrator.run_migration(&migration).await? {
            info!(version = migration.version, description = migration.description, "Applied migration");
        }
    }

    Ok(())
}
