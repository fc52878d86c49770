//! Storage factory for runtime storage selection

use std::sync::Arc;

use tracing::info;

use crate::domain::container::{ContainerRepository, GroupKind, TeamKind};
use crate::domain::membership::MembershipRepository;
use crate::domain::user::UserRepository;
use crate::domain::DomainError;

use super::in_memory::InMemoryDatabase;
use super::migrations::run_migrations;
use super::postgres::{
    connect, PostgresConfig, PostgresContainerRepository, PostgresMembershipRepository,
    PostgresUserRepository,
};

/// Storage configuration
#[derive(Debug, Clone)]
pub enum StorageConfig {
    /// In-memory storage (for testing/development)
    InMemory,
    /// PostgreSQL storage
    Postgres(PostgresConfig),
}

impl StorageConfig {
    /// In-memory for an empty URL, PostgreSQL otherwise
    pub fn from_url(url: &str, max_connections: u32) -> Self {
        if url.trim().is_empty() {
            Self::InMemory
        } else {
            Self::Postgres(PostgresConfig::new(url).with_max_connections(max_connections))
        }
    }
}

/// Every repository the services need, backed by one store
#[derive(Debug, Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub groups: Arc<dyn ContainerRepository<GroupKind>>,
    pub teams: Arc<dyn ContainerRepository<TeamKind>>,
    pub group_members: Arc<dyn MembershipRepository<GroupKind>>,
    pub team_members: Arc<dyn MembershipRepository<TeamKind>>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self::from_database(&InMemoryDatabase::new())
    }

    pub fn from_database(db: &InMemoryDatabase) -> Self {
        Self {
            users: Arc::new(db.users()),
            groups: Arc::new(db.containers::<GroupKind>()),
            teams: Arc::new(db.containers::<TeamKind>()),
            group_members: Arc::new(db.memberships::<GroupKind>()),
            team_members: Arc::new(db.memberships::<TeamKind>()),
        }
    }

    /// Connect to the configured store, running migrations for PostgreSQL
    pub async fn create(config: &StorageConfig) -> Result<Self, DomainError> {
        match config {
            StorageConfig::InMemory => {
                info!("Using in-memory storage");
                Ok(Self::in_memory())
            }
            StorageConfig::Postgres(pg) => {
                let pool = connect(pg).await?;
                run_migrations(&pool).await?;
                info!("Using PostgreSQL storage");

                Ok(Self {
                    users: Arc::new(PostgresUserRepository::new(pool.clone())),
                    groups: Arc::new(PostgresContainerRepository::<GroupKind>::new(pool.clone())),
                    teams: Arc::new(PostgresContainerRepository::<TeamKind>::new(pool.clone())),
                    group_members: Arc::new(PostgresMembershipRepository::<GroupKind>::new(
                        pool.clone(),
                    )),
                    team_members: Arc::new(PostgresMembershipRepository::<TeamKind>::new(pool)),
                })
            }
        }
    }
}
