use axum::{Json, extract::State};
use tracing::{info, instrument};

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::upload::{GenerateTitleRequest, GenerateTitleResponse};
use crate::state::AppState;
use crate::titles::PhotoDataUri;

#[utoipa::path(
    post,
    path = "/titles",
    tag = "Titles",
    operation_id = "generateTitle",
    summary = "Suggest a title for a photo",
    description = "Asks the configured vision model for a short title of at most five words.",
    request_body = GenerateTitleRequest,
    responses(
        (status = 200, description = "Suggested title", body = GenerateTitleResponse),
        (status = 400, description = "Not an image data URI (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 500, description = "Title generation not configured (CONFIGURATION_ERROR)", body = ErrorBody),
        (status = 502, description = "Title service failed (BACKEND_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user = %auth_user.username))]
pub async fn generate_title(
    State(state): State<AppState>,
    auth_user: AuthUser,
    AppJson(payload): AppJson<GenerateTitleRequest>,
) -> Result<Json<GenerateTitleResponse>, AppError> {
    let photo = PhotoDataUri::parse(&payload.photo_data_uri)?;
    let generator = state.titles.get()?;
    let title = generator.generate(&photo).await?;
    info!(mime = %photo.mime(), %title, "Generated title");
    Ok(Json(GenerateTitleResponse { title }))
}
