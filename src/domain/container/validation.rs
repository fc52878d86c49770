//! Container validation utilities

use thiserror::Error;

use crate::domain::slug::is_slug;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ContainerValidationError {
    #[error("cannot be blank")]
    Blank,

    #[error("the length must be between {0} and {1}")]
    Length(usize, usize),

    #[error("must only contain lowercase letters, digits and hyphens")]
    InvalidSlug,

    #[error("is already taken")]
    Taken,
}

const MIN_LENGTH: usize = 3;
const MAX_LENGTH: usize = 255;

/// Validate a container name
///
/// Rules:
/// - Cannot be blank
/// - Between 3 and 255 characters
pub fn validate_name(name: &str) -> Result<(), ContainerValidationError> {
    if name.trim().is_empty() {
        return Err(ContainerValidationError::Blank);
    }

    let len = name.chars().count();
    if !(MIN_LENGTH..=MAX_LENGTH).contains(&len) {
        return Err(ContainerValidationError::Length(MIN_LENGTH, MAX_LENGTH));
    }

    Ok(())
}

/// Validate a container slug, same length rules as the name
pub fn validate_slug(slug: &str) -> Result<(), ContainerValidationError> {
    validate_name(slug)?;

    if !is_slug(slug) {
        return Err(ContainerValidationError::InvalidSlug);
    }

    Ok(())
}
