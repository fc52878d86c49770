//! Notification payloads and the HTTP error type

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::domain::validation::FieldError;
use crate::domain::{DomainError, ErrorKind};

/// Body of every failure and of message-only successes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub message: String,
    pub status: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

impl Notification {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: status.as_u16(),
            errors: None,
        }
    }

    /// 200 notification for mutations that return no record
    pub fn success(message: impl Into<String>) -> Self {
        Self::new(StatusCode::OK, message)
    }
}

impl IntoResponse for Notification {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::OK);
        (status, Json(self)).into_response()
    }
}

/// API error with status code
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub notification: Notification,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            notification: Notification::new(status, message),
        }
    }

    pub fn with_errors(mut self, errors: Vec<FieldError>) -> Self {
        self.notification.errors = Some(errors);
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        Self::new(StatusCode::PRECONDITION_FAILED, message)
    }

    pub fn unprocessable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNPROCESSABLE_ENTITY, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.notification)).into_response()
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err.kind() {
            ErrorKind::NotFound => Self::not_found(err.to_string()),
            ErrorKind::Conflict | ErrorKind::Precondition => Self::precondition(err.to_string()),
            ErrorKind::Validation => match err {
                DomainError::Validation(errors) => Self::unprocessable("Failed to validate request")
                    .with_errors(errors.into_iter().collect()),
                other => Self::unprocessable(other.to_string()),
            },
            ErrorKind::Unauthorized | ErrorKind::Expired | ErrorKind::InvalidSignature => {
                Self::unauthorized(err.to_string())
            }
            ErrorKind::Forbidden => Self::forbidden(err.to_string()),
            ErrorKind::Internal => {
                error!(error = %err, "Request failed with internal error");
                Self::internal("Internal server error")
            }
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.status, self.notification.message)
    }
}

impl std::error::Error for ApiError {}
