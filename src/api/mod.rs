//! API layer - HTTP endpoints and middleware

pub mod auth;
pub mod containers;
pub mod health;
pub mod middleware;
pub mod profile;
pub mod router;
pub mod state;
pub mod types;
pub mod users;

pub use middleware::{RequireAdmin, RequirePrincipal};
pub use router::create_router;
pub use state::AppState;
