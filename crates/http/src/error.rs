//! Error handling for the catalog HTTP layer

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use uuid::{Timestamp, Uuid};

/// Body returned for not-found and bad-request errors
#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: String,
}

/// Body returned for internal errors
#[derive(Debug, Serialize)]
pub struct InternalErrorBody {
    pub message: String,
    pub error: String,
}

/// Application error types that map to HTTP responses
#[derive(Error, Debug)]
pub enum AppError {
    /// Field name to message, one entry per failing field
    #[error("validation failed on {} field(s)", .0.len())]
    Validation(BTreeMap<String, String>),

    #[error("not found: {message}")]
    NotFound { message: String },

    #[error("bad request: {message}")]
    BadRequest { message: String },

    #[error("{message}: {source}")]
    Internal {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl AppError {
    /// Create a validation error
    pub fn validation(errors: BTreeMap<String, String>) -> Self {
        Self::Validation(errors)
    }

    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a bad request error
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Create an internal error carrying a caller-facing summary and the cause
    pub fn internal(message: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::Internal {
            message: message.into(),
            source: source.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::BadRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        match self {
            AppError::Validation(errors) => {
                tracing::warn!(
                    status_code = %status.as_u16(),
                    fields = ?errors.keys().collect::<Vec<_>>(),
                    "validation failed"
                );
                (status, Json(json!(errors))).into_response()
            }
            AppError::NotFound { message } | AppError::BadRequest { message } => {
                tracing::warn!(status_code = %status.as_u16(), %message, "request rejected");
                (status, Json(MessageBody { message })).into_response()
            }
            AppError::Internal { message, source } => {
                let error_id = Uuid::new_v7(Timestamp::now(uuid::NoContext));
                tracing::error!(
                    error_id = %error_id,
                    status_code = %status.as_u16(),
                    error = ?source,
                    "{}", message
                );
                let body = InternalErrorBody {
                    message,
                    error: format!("{:#}", source),
                };
                (status, Json(body)).into_response()
            }
        }
    }
}
