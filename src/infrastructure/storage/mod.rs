//! Storage infrastructure - Storage implementations

mod factory;
mod in_memory;
pub mod migrations;
mod postgres;

pub use factory::{Repositories, StorageConfig};
pub use in_memory::{
    InMemoryContainerRepository, InMemoryDatabase, InMemoryMembershipRepository,
    InMemoryUserRepository, StoredKind,
};
pub use migrations::{run_migrations, Migration, PostgresMigrator};
pub use postgres::{
    PostgresConfig, PostgresContainerRepository, PostgresMembershipRepository,
    PostgresUserRepository,
};
