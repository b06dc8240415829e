use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::{error, warn};

use chirpy_crypto::password::PasswordError;
use chirpy_db::StoreError;
use chirpy_types::api::ErrorResponse;

use crate::session::SessionError;

/// Handler error, rendered as `{ "error": "..." }` with a matching status.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Responding with {}: {}", status, self);
        } else {
            warn!("Responding with {}: {}", status, self);
        }

        // Internal details stay in the log.
        let message = match &self {
            Self::Internal(_) => "Something went wrong".to_string(),
            other => other.to_string(),
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(what) => Self::NotFound(format!("{what} does not exist")),
            StoreError::Expired => Self::Unauthorized(e.to_string()),
            StoreError::Validation(msg) => Self::BadRequest(msg),
            StoreError::Conflict(_) => Self::Conflict(e.to_string()),
            StoreError::Poisoned | StoreError::Io(_) | StoreError::Json(_) => {
                Self::Internal(e.to_string())
            }
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::Configuration | SessionError::Signing(_) => Self::Internal(e.to_string()),
            SessionError::InvalidToken(_)
            | SessionError::Expired
            | SessionError::MalformedSubject(_) => Self::Unauthorized(e.to_string()),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(e: PasswordError) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        Self::BadRequest(e.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(e: PathRejection) -> Self {
        Self::BadRequest(e.body_text())
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Internal(format!("spawn_blocking join error: {e}"))
    }
}
