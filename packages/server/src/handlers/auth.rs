use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use tracing::{info, instrument};

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::gallery::User;
use crate::models::auth::{
    ChangePasswordRequest, LoginRequest, LoginResponse, RegisterRequest, validate_login_request,
};
use crate::state::AppState;
use crate::utils::jwt;

#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Auth",
    operation_id = "register",
    summary = "Create an account",
    description = "Creates a user with an argon2-hashed password. Names are stored lowercase and must be unique ignoring case.",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Name already taken (USERNAME_TAKEN)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(name = %payload.name))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = state
        .directory
        .add_user(&payload.name, &payload.password)
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Auth",
    operation_id = "login",
    summary = "Log in",
    description = "Checks the credentials and opens a session. Unknown users and wrong passwords get the same response.",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Invalid credentials (INVALID_CREDENTIALS)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload), fields(name = %payload.name))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    validate_login_request(&payload)?;

    let user = state
        .directory
        .validate_user(&payload.name, &payload.password)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let session = state.sessions.open(&user.id, &user.name);
    let token = jwt::sign(&state.config.auth.jwt_secret, &session)
        .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))?;

    info!(user = %user.name, "Logged in");
    Ok(Json(LoginResponse {
        token,
        name: user.name,
        expires_at: session.expires_at,
    }))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "Auth",
    operation_id = "logout",
    summary = "Log out",
    description = "Ends the session behind the presented token. The token stops working immediately.",
    responses(
        (status = 204, description = "Logged out"),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user = %auth_user.username))]
pub async fn logout(State(state): State<AppState>, auth_user: AuthUser) -> StatusCode {
    state.sessions.close(&auth_user.session_id);
    StatusCode::NO_CONTENT
}

#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "Auth",
    operation_id = "me",
    summary = "Current user",
    responses(
        (status = 200, description = "The authenticated user", body = User),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(auth_user), fields(user = %auth_user.username))]
pub async fn me(auth_user: AuthUser) -> Json<User> {
    Json(User {
        id: auth_user.user_id,
        name: auth_user.username,
    })
}

#[utoipa::path(
    put,
    path = "/auth/password",
    tag = "Auth",
    operation_id = "changePassword",
    summary = "Change password",
    description = "Replaces the caller's password after checking the current one. Accounts without a stored hash cannot change it.",
    request_body = ChangePasswordRequest,
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "Wrong current password or invalid input (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user = %auth_user.username))]
pub async fn change_password(
    State(state): State<AppState>,
    auth_user: AuthUser,
    AppJson(payload): AppJson<ChangePasswordRequest>,
) -> Result<StatusCode, AppError> {
    state
        .directory
        .change_password(
            &auth_user.username,
            &payload.current_password,
            &payload.new_password,
        )
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
