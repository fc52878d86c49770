use thiserror::Error;

use super::validation::ValidationErrors;

/// Discriminant of a [`DomainError`], matched exhaustively at the HTTP boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Precondition,
    Validation,
    Unauthorized,
    Forbidden,
    Expired,
    InvalidSignature,
    Internal,
}

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Failed to find user '{id}'")]
    SubjectNotFound { id: String },

    #[error("Failed to find {kind} '{id}'")]
    ContainerNotFound { kind: &'static str, id: String },

    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("User is already assigned to this {kind}")]
    AlreadyAssigned { kind: &'static str },

    #[error("User is not assigned to this {kind}")]
    NotAssigned { kind: &'static str },

    #[error("Conflict: {message}")]
    Conflict { message: String },

    #[error("Validation error: {0}")]
    Validation(ValidationErrors),

    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Forbidden: {message}")]
    Forbidden { message: String },

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token signature is invalid")]
    InvalidSignature,

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },
}

impl DomainError {
    pub fn subject_not_found(id: impl Into<String>) -> Self {
        Self::SubjectNotFound { id: id.into() }
    }

    pub fn container_not_found(kind: &'static str, id: impl Into<String>) -> Self {
        Self::ContainerNotFound {
            kind,
            id: id.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn already_assigned(kind: &'static str) -> Self {
        Self::AlreadyAssigned { kind }
    }

    pub fn not_assigned(kind: &'static str) -> Self {
        Self::NotAssigned { kind }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::Conflict {
            message: message.into(),
        }
    }

    /// Validation failure on a single field
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation(ValidationErrors::single(field, message))
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden {
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::SubjectNotFound { .. } | Self::ContainerNotFound { .. } | Self::NotFound { .. } => {
                ErrorKind::NotFound
            }
            Self::AlreadyAssigned { .. } | Self::Conflict { .. } => ErrorKind::Conflict,
            Self::NotAssigned { .. } => ErrorKind::Precondition,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::TokenExpired => ErrorKind::Expired,
            Self::InvalidSignature => ErrorKind::InvalidSignature,
            Self::Configuration { .. } | Self::Internal { .. } | Self::Storage { .. } => {
                ErrorKind::Internal
            }
        }
    }
}

impl From<ValidationErrors> for DomainError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let error = DomainError::container_not_found("group", "g1");
        assert_eq!(error.to_string(), "Failed to find group 'g1'");
        assert_eq!(error.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_validation_error() {
        let error = DomainError::validation("perm", "invalid permission");
        assert_eq!(error.to_string(), "Validation error: perm: invalid permission");
        assert_eq!(error.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_membership_error_kinds() {
        assert_eq!(
            DomainError::already_assigned("team").kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            DomainError::not_assigned("team").kind(),
            ErrorKind::Precondition
        );
        assert_eq!(
            DomainError::not_assigned("team").to_string(),
            "User is not assigned to this team"
        );
    }

    #[test]
    fn test_infrastructure_errors_are_internal() {
        assert_eq!(DomainError::storage("boom").kind(), ErrorKind::Internal);
        assert_eq!(DomainError::internal("boom").kind(), ErrorKind::Internal);
        assert_eq!(DomainError::configuration("boom").kind(), ErrorKind::Internal);
    }
}
