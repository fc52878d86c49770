//! User infrastructure module
//!
//! Password hashing with Argon2 and the user service.

mod password;
mod service;

#[cfg(test)]
pub use password::MockPasswordHasher;
pub use password::{Argon2Hasher, PasswordHasher};
pub use service::{CreateUserRequest, UpdateUserRequest, UserService};
