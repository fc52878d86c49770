//! Field-level validation errors

use serde::{Deserialize, Serialize};

/// A single failed rule on a named field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Ordered collection of field errors; empty means valid
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<FieldError>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: impl Into<String>, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Record the error of a failed check under `field`
    pub fn check<E: std::fmt::Display>(&mut self, field: &str, result: Result<(), E>) {
        if let Err(err) = result {
            self.add(field, err.to_string());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldError> {
        self.0.iter()
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    /// `Ok(())` when empty, otherwise a validation [`DomainError`](super::DomainError)
    pub fn into_result(self) -> Result<(), super::DomainError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(super::DomainError::Validation(self))
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", error.field, error.message)?;
        }
        Ok(())
    }
}

impl IntoIterator for ValidationErrors {
    type Item = FieldError;
    type IntoIter = std::vec::IntoIter<FieldError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

/// Records that can check themselves before being written
pub trait Validate {
    fn validate(&self) -> ValidationErrors;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_errors_keep_insertion_order() {
        let mut errors = ValidationErrors::new();
        errors.add("username", "is required");
        errors.add("email", "is not a valid email");

        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["username", "email"]);
        assert_eq!(
            errors.to_string(),
            "username: is required; email: is not a valid email"
        );
    }

    #[test]
    fn test_empty_errors_are_ok() {
        assert!(ValidationErrors::new().into_result().is_ok());
    }

    #[test]
    fn test_check_collects_failures() {
        let mut errors = ValidationErrors::new();
        errors.check::<&str>("name", Ok(()));
        errors.check("slug", Err("is too short"));

        assert_eq!(errors.len(), 1);
        assert!(errors.has_field("slug"));
        assert!(!errors.has_field("name"));
    }

    #[test]
    fn test_serializes_as_list() {
        let errors = ValidationErrors::single("perm", "invalid permission");
        let json = serde_json::to_value(&errors).unwrap();
        assert_eq!(
            json,
            serde_json::json!([{"field": "perm", "message": "invalid permission"}])
        );
    }
}
