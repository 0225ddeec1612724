use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::NotConfigured;
use serde::Serialize;

use crate::gallery::GalleryError;
use crate::titles::TitleError;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `TOKEN_MISSING`,
    /// `TOKEN_INVALID`, `INVALID_CREDENTIALS`, `PROHIBITED_ACTION`, `NOT_FOUND`,
    /// `USERNAME_TAKEN`, `CONFIGURATION_ERROR`, `BACKEND_ERROR`, `STORAGE_ERROR`, `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Collection title must be 1-256 characters")]
    pub message: String,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    TokenMissing,
    TokenInvalid,
    InvalidCredentials,
    /// The request is understood but refused by policy.
    Prohibited(String),
    NotFound(String),
    UsernameTaken(String),
    /// A backend this operation needs was never configured.
    Configuration(String),
    /// A remote store or service failed.
    Backend(String),
    /// Object storage refused an explicit blob request.
    Storage(String),
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    code: "VALIDATION_ERROR",
                    message: msg,
                },
            ),
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_MISSING",
                    message: "Authentication required".into(),
                },
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "TOKEN_INVALID",
                    message: "Invalid or expired token".into(),
                },
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    code: "INVALID_CREDENTIALS",
                    message: "Invalid username or password".into(),
                },
            ),
            AppError::Prohibited(msg) => (
                StatusCode::FORBIDDEN,
                ErrorBody {
                    code: "PROHIBITED_ACTION",
                    message: msg,
                },
            ),
            AppError::NotFound(msg) => (
                StatusCode::NOT_FOUND,
                ErrorBody {
                    code: "NOT_FOUND",
                    message: msg,
                },
            ),
            AppError::UsernameTaken(msg) => (
                StatusCode::CONFLICT,
                ErrorBody {
                    code: "USERNAME_TAKEN",
                    message: msg,
                },
            ),
            AppError::Configuration(msg) => {
                tracing::error!("Configuration error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "CONFIGURATION_ERROR",
                        message: msg,
                    },
                )
            }
            AppError::Backend(msg) => {
                tracing::error!("Backend error: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    ErrorBody {
                        code: "BACKEND_ERROR",
                        message: msg,
                    },
                )
            }
            AppError::Storage(msg) => {
                tracing::error!("Storage error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "STORAGE_ERROR",
                        message: msg,
                    },
                )
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        code: "INTERNAL_ERROR",
                        message: "An unexpected error occurred".into(),
                    },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<GalleryError> for AppError {
    fn from(err: GalleryError) -> Self {
        match err {
            GalleryError::Validation(msg) => AppError::Validation(msg),
            GalleryError::NotFound(_) => AppError::NotFound(err.to_string()),
            GalleryError::DuplicateName(msg) => AppError::UsernameTaken(msg),
            GalleryError::Prohibited(msg) => AppError::Prohibited(msg),
            GalleryError::CredentialMismatch(msg) => AppError::Validation(msg),
            GalleryError::Configuration(msg) => AppError::Configuration(msg),
            GalleryError::Store(_) | GalleryError::Storage(_) => AppError::Backend(err.to_string()),
            GalleryError::Internal(detail) => AppError::Internal(detail),
        }
    }
}

impl From<NotConfigured> for AppError {
    fn from(err: NotConfigured) -> Self {
        AppError::Configuration(err.0)
    }
}

impl From<TitleError> for AppError {
    fn from(err: TitleError) -> Self {
        match err {
            TitleError::InvalidInput(msg) => AppError::Validation(msg),
            other => AppError::Backend(other.to_string()),
        }
    }
}
