use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Request body for creating an account.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegisterRequest {
    /// Unique username (1-32 chars: letters, digits, `_`, `-`). Stored lowercase.
    #[schema(example = "alice")]
    pub name: String,
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

/// Request body for logging in.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    /// Username, matched case-insensitively.
    #[schema(example = "alice")]
    pub name: String,
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::Validation("Username must not be empty".into()));
    }
    if payload.password.is_empty() {
        return Err(AppError::Validation("Password must not be empty".into()));
    }
    Ok(())
}

/// Successful login response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    /// Bearer token, valid until `expires_at` or logout.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
    #[schema(example = "alice")]
    pub name: String,
    pub expires_at: DateTime<Utc>,
}

/// Request body for changing the caller's password.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct ChangePasswordRequest {
    #[schema(example = "old-secret")]
    pub current_password: String,
    #[schema(example = "new-secret")]
    pub new_password: String,
}
