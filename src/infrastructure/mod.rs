//! Infrastructure layer - storage, services and runtime plumbing

pub mod auth;
pub mod container;
pub mod logging;
pub mod membership;
pub mod observability;
pub mod storage;
pub mod user;
