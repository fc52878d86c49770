//! JSON extractor whose rejections are notification payloads

use axum::{
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json as AxumJson,
};
use serde::de::DeserializeOwned;

use super::error::Notification;

/// Wrapper around `axum::Json` that rejects undecodable bodies with a 400 notification
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> std::ops::Deref for Json<T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> std::ops::DerefMut for Json<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

#[derive(Debug)]
pub struct JsonRejection {
    message: String,
}

impl IntoResponse for JsonRejection {
    fn into_response(self) -> Response {
        Notification::new(StatusCode::BAD_REQUEST, self.message).into_response()
    }
}

impl<S, T> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = JsonRejection;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match AxumJson::<T>::from_request(req, state).await {
            Ok(AxumJson(value)) => Ok(Json(value)),
            Err(rejection) => Err(JsonRejection {
                message: format_rejection_message(&rejection),
            }),
        }
    }
}

fn format_rejection_message(rejection: &axum::extract::rejection::JsonRejection) -> String {
    use axum::extract::rejection::JsonRejection::*;

    match rejection {
        JsonDataError(err) => format!("Failed to decode request: {}", err.body_text()),
        JsonSyntaxError(err) => format!("Failed to decode request: {}", err.body_text()),
        MissingJsonContentType(_) => {
            "Failed to decode request: expected 'application/json' content type".to_string()
        }
        BytesRejection(err) => format!("Failed to read request body: {}", err.body_text()),
        _ => "Failed to decode request".to_string(),
    }
}

impl<T> IntoResponse for Json<T>
where
    T: serde::Serialize,
{
    fn into_response(self) -> Response {
        AxumJson(self.0).into_response()
    }
}

impl<T> From<T> for Json<T> {
    fn from(value: T) -> Self {
        Json(value)
    }
}
