//! User domain
//!
//! This module provides domain types and traits for user accounts,
//! including the user entity, validation, and repository traits.

mod entity;
mod repository;
mod validation;

pub use entity::{User, UserId};
pub use repository::{UserField, UserRepository, UserSort};
pub use validation::{
    validate_email, validate_fullname, validate_password, validate_slug, validate_username,
    UserValidationError,
};
