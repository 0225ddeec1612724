use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::gallery::{AddOutcome, DeletionReport, Photo};
use crate::models::gallery::{
    AddPhotosRequest, AddPhotosResponse, AddVariantsRequest, AddVariantsResponse,
    ReorderPhotosRequest, UpdateTitleRequest,
};
use crate::state::AppState;

/// 201 when every item was written, 207 when only some were.
/// Nothing written at all is a backend failure.
fn add_status<T>(outcome: &AddOutcome<T>) -> Result<StatusCode, AppError> {
    if outcome.is_complete() {
        return Ok(StatusCode::CREATED);
    }
    if outcome.created.is_empty() {
        let detail = outcome
            .failures
            .first()
            .map(|f| f.message.clone())
            .unwrap_or_default();
        return Err(AppError::Backend(format!("Nothing could be added: {detail}")));
    }
    Ok(StatusCode::MULTI_STATUS)
}

#[utoipa::path(
    post,
    path = "/collections/{id}/photos",
    tag = "Photos",
    operation_id = "addPhotos",
    summary = "Add photos to a collection",
    description = "Writes one document per photo. Input is validated before any write. \
        Photos that were written stay written when others fail; the response lists both.",
    params(("id" = String, Path, description = "Collection ID")),
    request_body = AddPhotosRequest,
    responses(
        (status = 201, description = "All photos added", body = AddPhotosResponse),
        (status = 207, description = "Some photos added", body = AddPhotosResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Collection not found (NOT_FOUND)", body = ErrorBody),
        (status = 502, description = "No photo could be added (BACKEND_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user = %auth_user.username))]
pub async fn add_photos(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    AppJson(payload): AppJson<AddPhotosRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .gallery
        .get_owned_collection(&id, &auth_user.username)
        .await?;
    let outcome = state.gallery.add_photos(&id, payload.photos).await?;
    let status = add_status(&outcome)?;
    Ok((
        status,
        Json(AddPhotosResponse {
            photos: outcome.created,
            failures: outcome.failures,
        }),
    ))
}

#[utoipa::path(
    put,
    path = "/collections/{id}/photos/reorder",
    tag = "Photos",
    operation_id = "reorderPhotos",
    summary = "Set the display order of photos",
    description = "Each listed photo gets its index as its position. Photos not listed keep theirs.",
    params(("id" = String, Path, description = "Collection ID")),
    request_body = ReorderPhotosRequest,
    responses(
        (status = 204, description = "Order saved"),
        (status = 400, description = "Empty or duplicate ids (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Collection or photo not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user = %auth_user.username))]
pub async fn reorder_photos(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    AppJson(payload): AppJson<ReorderPhotosRequest>,
) -> Result<StatusCode, AppError> {
    state
        .gallery
        .get_owned_collection(&id, &auth_user.username)
        .await?;
    state.gallery.reorder_photos(&id, &payload.photo_ids).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    patch,
    path = "/collections/{id}/photos/{photo_id}",
    tag = "Photos",
    operation_id = "renamePhoto",
    summary = "Rename a photo",
    params(
        ("id" = String, Path, description = "Collection ID"),
        ("photo_id" = String, Path, description = "Photo ID"),
    ),
    request_body = UpdateTitleRequest,
    responses(
        (status = 200, description = "Renamed photo", body = Photo),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Collection or photo not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user = %auth_user.username))]
pub async fn update_photo(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((id, photo_id)): Path<(String, String)>,
    AppJson(payload): AppJson<UpdateTitleRequest>,
) -> Result<Json<Photo>, AppError> {
    state
        .gallery
        .get_owned_collection(&id, &auth_user.username)
        .await?;
    state
        .gallery
        .update_photo_title(&id, &photo_id, &payload.title)
        .await?;
    Ok(Json(state.gallery.get_photo(&id, &photo_id).await?))
}

#[utoipa::path(
    delete,
    path = "/collections/{id}/photos/{photo_id}",
    tag = "Photos",
    operation_id = "deletePhoto",
    summary = "Delete a photo with its variants and blobs",
    params(
        ("id" = String, Path, description = "Collection ID"),
        ("photo_id" = String, Path, description = "Photo ID"),
    ),
    responses(
        (status = 200, description = "Photo deleted", body = DeletionReport),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Collection or photo not found (NOT_FOUND)", body = ErrorBody),
        (status = 502, description = "Document store failure (BACKEND_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user = %auth_user.username))]
pub async fn delete_photo(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((id, photo_id)): Path<(String, String)>,
) -> Result<Json<DeletionReport>, AppError> {
    state
        .gallery
        .get_owned_collection(&id, &auth_user.username)
        .await?;
    Ok(Json(state.cascade.delete_photo(&id, &photo_id).await?))
}

#[utoipa::path(
    post,
    path = "/collections/{id}/photos/{photo_id}/variants",
    tag = "Photos",
    operation_id = "addVariants",
    summary = "Attach variants to a photo",
    params(
        ("id" = String, Path, description = "Collection ID"),
        ("photo_id" = String, Path, description = "Photo ID"),
    ),
    request_body = AddVariantsRequest,
    responses(
        (status = 201, description = "All variants added", body = AddVariantsResponse),
        (status = 207, description = "Some variants added", body = AddVariantsResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Collection or photo not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user = %auth_user.username))]
pub async fn add_variants(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((id, photo_id)): Path<(String, String)>,
    AppJson(payload): AppJson<AddVariantsRequest>,
) -> Result<impl IntoResponse, AppError> {
    state
        .gallery
        .get_owned_collection(&id, &auth_user.username)
        .await?;
    let outcome = state
        .gallery
        .add_variants(&id, &photo_id, payload.variants)
        .await?;
    let status = add_status(&outcome)?;
    Ok((
        status,
        Json(AddVariantsResponse {
            variants: outcome.created,
            failures: outcome.failures,
        }),
    ))
}

#[utoipa::path(
    delete,
    path = "/collections/{id}/photos/{photo_id}/variants/{variant_id}",
    tag = "Photos",
    operation_id = "deleteVariant",
    summary = "Delete a variant and its blob",
    params(
        ("id" = String, Path, description = "Collection ID"),
        ("photo_id" = String, Path, description = "Photo ID"),
        ("variant_id" = String, Path, description = "Variant ID"),
    ),
    responses(
        (status = 200, description = "Variant deleted", body = DeletionReport),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user = %auth_user.username))]
pub async fn delete_variant(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path((id, photo_id, variant_id)): Path<(String, String, String)>,
) -> Result<Json<DeletionReport>, AppError> {
    state
        .gallery
        .get_owned_collection(&id, &auth_user.username)
        .await?;
    Ok(Json(
        state
            .cascade
            .delete_variant(&id, &photo_id, &variant_id)
            .await?,
    ))
}
