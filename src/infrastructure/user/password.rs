//! Password hashing utilities using Argon2

use argon2::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher as Argon2PasswordHasher, PasswordVerifier,
        SaltString,
    },
    Argon2,
};
use std::fmt::Debug;

use crate::domain::DomainError;

/// One-way password hashing collaborator
#[cfg_attr(test, mockall::automock)]
pub trait PasswordHasher: Send + Sync + Debug {
    /// Hash a password
    fn hash(&self, password: &str) -> Result<String, DomainError>;

    /// Verify a password against a hash
    fn verify(&self, password: &str, hash: &str) -> bool;
}

/// Argon2-based password hasher
#[derive(Debug, Clone, Default)]
pub struct Argon2Hasher;

impl Argon2Hasher {
    pub fn new() -> Self {
        Self
    }
}

impl PasswordHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> Result<String, DomainError> {
        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| DomainError::internal(format!("Failed to hash password: {}", e)))
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        let Ok(parsed_hash) = PasswordHash::new(hash) else {
            return false;
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = Argon2Hasher::new();
        let hash = hasher.hash("correct horse").unwrap();

        assert!(hasher.verify("correct horse", &hash));
        assert!(!hasher.verify("battery staple", &hash));
    }

    #[test]
    fn test_hash_is_salted() {
        let hasher = Argon2Hasher::new();

        let first = hasher.hash("correct horse").unwrap();
        let second = hasher.hash("correct horse").unwrap();

        assert_ne!(first, second);
        assert!(hasher.verify("correct horse", &second));
    }

    #[test]
    fn test_verify_rejects_malformed_hash() {
        let hasher = Argon2Hasher::new();

        assert!(!hasher.verify("password", "not-a-phc-string"));
        assert!(!hasher.verify("password", ""));
    }
}
