//! User validation utilities

use thiserror::Error;
use validator::ValidateEmail;

use crate::domain::slug::is_slug;

/// Errors that can occur during user validation
#[derive(Debug, Error, Clone, PartialEq)]
pub enum UserValidationError {
    #[error("cannot be blank")]
    Blank,

    #[error("the length must be between {0} and {1}")]
    Length(usize, usize),

    #[error("must be a valid email address")]
    InvalidEmail,

    #[error("must only contain lowercase letters, digits and hyphens")]
    InvalidSlug,

    #[error("the length must be no more than {0}")]
    TooLong(usize),

    #[error("must be at least {0} characters long")]
    PasswordTooShort(usize),

    #[error("is already taken")]
    Taken,
}

const MIN_LENGTH: usize = 3;
const MAX_LENGTH: usize = 255;
const MIN_PASSWORD_LENGTH: usize = 8;
const MAX_PASSWORD_LENGTH: usize = 128;

fn validate_length(value: &str) -> Result<(), UserValidationError> {
    if value.trim().is_empty() {
        return Err(UserValidationError::Blank);
    }

    let len = value.chars().count();
    if !(MIN_LENGTH..=MAX_LENGTH).contains(&len) {
        return Err(UserValidationError::Length(MIN_LENGTH, MAX_LENGTH));
    }

    Ok(())
}

/// Validate a username
///
/// Rules:
/// - Cannot be blank
/// - Between 3 and 255 characters
pub fn validate_username(username: &str) -> Result<(), UserValidationError> {
    validate_length(username)
}

/// Validate a user slug, same length rules as the username
pub fn validate_slug(slug: &str) -> Result<(), UserValidationError> {
    validate_length(slug)?;

    if !is_slug(slug) {
        return Err(UserValidationError::InvalidSlug);
    }

    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), UserValidationError> {
    if email.trim().is_empty() {
        return Err(UserValidationError::Blank);
    }

    if !email.validate_email() {
        return Err(UserValidationError::InvalidEmail);
    }

    Ok(())
}

/// Fullname is optional but bounded
pub fn validate_fullname(fullname: &str) -> Result<(), UserValidationError> {
    if fullname.chars().count() > MAX_LENGTH {
        return Err(UserValidationError::TooLong(MAX_LENGTH));
    }

    Ok(())
}

/// Validate a plaintext password
///
/// Rules:
/// - Minimum 8 characters
/// - Maximum 128 characters
pub fn validate_password(password: &str) -> Result<(), UserValidationError> {
    if password.is_empty() {
        return Err(UserValidationError::Blank);
    }

    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(UserValidationError::PasswordTooShort(MIN_PASSWORD_LENGTH));
    }

    if password.len() > MAX_PASSWORD_LENGTH {
        return Err(UserValidationError::TooLong(MAX_PASSWORD_LENGTH));
    }

    Ok(())
}
