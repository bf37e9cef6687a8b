//! Error taxonomy for the sports stream routing service.
//!
//! One top-level `AppError` with `#[from]` conversions for the two
//! external error sources (`sqlx`, `reqwest`), plus a variant per
//! recognised error code. `AppError` implements axum's `IntoResponse`,
//! producing the `{"error": "<code>", "message": "<human>"}` envelope.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{resource} not found: {id}")]
    NotFound { resource: String, id: String },

    #[error("invalid json: {message}")]
    InvalidJson { message: String },

    #[error("missing parameter: {param}")]
    MissingParam { param: String },

    #[error("validation error: {message}")]
    Validation { message: String },

    #[error("invalid source type: {message}")]
    InvalidSourceType { message: String },

    #[error("playlist unreachable: {url}")]
    M3uUnreachable { url: String },

    #[error("playlist is not a valid M3U document")]
    NotM3u,

    #[error("no stream available for event {event_id}")]
    NoStreamAvailable { event_id: String },

    #[error("streaming not supported for this resource")]
    StreamingUnsupported,

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("internal error: {message}")]
    Internal { message: String },
}

impl AppError {
    pub fn not_found<R: Into<String>, I: Into<String>>(resource: R, id: I) -> Self {
        Self::NotFound {
            resource: resource.into(),
            id: id.into(),
        }
    }

    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// The error code surfaced to clients in the JSON error envelope.
    fn code(&self) -> &'static str {
        match self {
            AppError::Database(_) => "db_error",
            AppError::Http(_) => "db_error",
            AppError::NotFound { .. } => "not_found",
            AppError::InvalidJson { .. } => "invalid_json",
            AppError::MissingParam { .. } => "missing_param",
            AppError::Validation { .. } => "invalid_json",
            AppError::InvalidSourceType { .. } => "invalid_source_type",
            AppError::M3uUnreachable { .. } => "m3u_unreachable",
            AppError::NotM3u => "m3u_unreachable",
            AppError::NoStreamAvailable { .. } => "no_stream_available",
            AppError::StreamingUnsupported => "streaming_unsupported",
            AppError::MethodNotAllowed => "method_not_allowed",
            AppError::Internal { .. } => "db_error",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::InvalidJson { .. }
            | AppError::MissingParam { .. }
            | AppError::Validation { .. }
            | AppError::InvalidSourceType { .. }
            | AppError::M3uUnreachable { .. }
            | AppError::NotM3u => StatusCode::BAD_REQUEST,
            AppError::NoStreamAvailable { .. } => StatusCode::NOT_FOUND,
            AppError::StreamingUnsupported => StatusCode::BAD_REQUEST,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::Database(_) | AppError::Http(_) | AppError::Internal { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorEnvelope {
    error: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        if matches!(self, AppError::Database(_) | AppError::Http(_)) {
            tracing::error!("request failed: {}", self);
        }
        let status = self.status();
        let body = ErrorEnvelope {
            error: self.code(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        match error.downcast::<sqlx::Error>() {
            Ok(sqlx_error) => AppError::Database(sqlx_error),
            Err(error) => AppError::Internal {
                message: error.to_string(),
            },
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
