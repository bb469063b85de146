use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::game::GameError;

/// Structured API error that serializes to JSON.
#[derive(Debug)]
pub enum ApiError {
    SessionNotFound(u32),
    InvalidRequest(String),
    InvalidMode(String),
    DuplicatePlayer(String),
    UnknownCategory(String),
    InvalidTransition(String),
    Unavailable(String),
    InternalError(String),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorDetail {
    code: String,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::SessionNotFound(code) => (
                StatusCode::NOT_FOUND,
                "SESSION_NOT_FOUND",
                format!("Session not found: {code}"),
            ),
            ApiError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST", msg),
            ApiError::InvalidMode(msg) => (StatusCode::BAD_REQUEST, "INVALID_MODE", msg),
            ApiError::DuplicatePlayer(name) => (
                StatusCode::BAD_REQUEST,
                "DUPLICATE_PLAYER",
                format!("Player already in session: {name}"),
            ),
            ApiError::UnknownCategory(name) => (
                StatusCode::BAD_REQUEST,
                "UNKNOWN_CATEGORY",
                format!("Unknown category: {name}"),
            ),
            ApiError::InvalidTransition(msg) => {
                (StatusCode::BAD_REQUEST, "INVALID_TRANSITION", msg)
            }
            ApiError::Unavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "UNAVAILABLE", msg)
            }
            ApiError::InternalError(msg) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", msg)
            }
        };

        let body = ErrorResponse {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<GameError> for ApiError {
    fn from(err: GameError) -> Self {
        match &err {
            GameError::NotFound(code) => ApiError::SessionNotFound(*code),
            GameError::InvalidInput(msg) => ApiError::InvalidRequest(msg.clone()),
            GameError::InvalidMode { .. } => ApiError::InvalidMode(err.to_string()),
            GameError::DuplicatePlayer(name) => ApiError::DuplicatePlayer(name.clone()),
            GameError::UnknownCategory(name) => ApiError::UnknownCategory(name.clone()),
            GameError::InvalidTransition { .. } => ApiError::InvalidTransition(err.to_string()),
            GameError::CodeSpaceExhausted(_) => ApiError::Unavailable(err.to_string()),
            GameError::Storage(_) => ApiError::InternalError(err.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}
