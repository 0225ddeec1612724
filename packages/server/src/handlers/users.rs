use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::gallery::User;
use crate::models::gallery::DeleteUserResponse;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    operation_id = "listUsers",
    summary = "List users",
    description = "All accounts by name. Credentials are never included.",
    responses(
        (status = 200, description = "Users", body = Vec<User>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 502, description = "Document store failure (BACKEND_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, _auth_user))]
pub async fn list_users(
    State(state): State<AppState>,
    _auth_user: AuthUser,
) -> Result<Json<Vec<User>>, AppError> {
    Ok(Json(state.directory.list_users().await?))
}

#[utoipa::path(
    delete,
    path = "/users/{name}",
    tag = "Users",
    operation_id = "deleteUser",
    summary = "Delete a user and everything they own",
    description = "Deletes the user's collections, photos, variants and blobs, then the user. \
        The protected account is refused. Blob cleanup failures are reported as warnings. \
        Deleting yourself ends your session.",
    params(("name" = String, Path, description = "Username, case-insensitive")),
    responses(
        (status = 200, description = "User deleted", body = DeleteUserResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Protected account (PROHIBITED_ACTION)", body = ErrorBody),
        (status = 404, description = "User not found (NOT_FOUND)", body = ErrorBody),
        (status = 502, description = "Document store failure (BACKEND_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(by = %auth_user.username))]
pub async fn delete_user(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(name): Path<String>,
) -> Result<Json<DeleteUserResponse>, AppError> {
    let report = state
        .cascade
        .delete_user(&name, &auth_user.username)
        .await?;
    Ok(Json(DeleteUserResponse {
        name: name.trim().to_lowercase(),
        report,
        session_ended: auth_user.username.eq_ignore_ascii_case(name.trim()),
    }))
}
