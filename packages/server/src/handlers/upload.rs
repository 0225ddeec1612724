use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::{Json, http::StatusCode, response::IntoResponse};
use common::storage::{ObjectStore, PutOptions, is_owned_by};
use tracing::{info, instrument, warn};

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::upload::{DeleteBlobsRequest, DeleteBlobsResponse, UploadResponse};
use crate::state::AppState;
use crate::utils::filename::upload_object_name;

/// Raster formats accepted for upload.
pub const ALLOWED_CONTENT_TYPES: [&str; 4] = ["image/jpeg", "image/png", "image/gif", "image/webp"];

/// Several photos per request, each up to the configured blob limit.
pub fn upload_body_limit(max_blob_size: u64) -> DefaultBodyLimit {
    let per_request = max_blob_size.saturating_mul(8).saturating_add(64 * 1024);
    DefaultBodyLimit::max(usize::try_from(per_request).unwrap_or(usize::MAX))
}

/// Content type of an uploaded file: the declared one if present, otherwise
/// guessed from the filename.
fn resolve_content_type(declared: Option<&str>, filename: &str) -> Result<String, AppError> {
    let content_type = match declared {
        Some(ct) if !ct.is_empty() && ct != "application/octet-stream" => ct.to_ascii_lowercase(),
        _ => mime_guess::from_path(filename)
            .first()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_default(),
    };
    if ALLOWED_CONTENT_TYPES.contains(&content_type.as_str()) {
        Ok(content_type)
    } else {
        Err(AppError::Validation(format!(
            "Unsupported file type '{content_type}'; allowed: {}",
            ALLOWED_CONTENT_TYPES.join(", ")
        )))
    }
}

/// Remove blobs written earlier in a request that ended up failing.
async fn discard_uploads(store: &dyn ObjectStore, urls: &[String]) {
    if urls.is_empty() {
        return;
    }
    if let Err(e) = store.delete_many(urls).await {
        warn!(error = %e, urls = ?urls, "Failed to discard partial upload");
    }
}

#[utoipa::path(
    post,
    path = "/upload",
    tag = "Upload",
    operation_id = "uploadPhotos",
    summary = "Upload photo files",
    description = "Stores every `file` field with public read access and returns the URLs in order. \
        Only JPEG, PNG, GIF and WebP are accepted. If any file fails, files already stored by this request are removed.",
    request_body(content_type = "multipart/form-data", description = "One or more `file` fields"),
    responses(
        (status = 201, description = "Files stored", body = UploadResponse),
        (status = 400, description = "Bad file or upload failure (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 500, description = "Object storage not configured (CONFIGURATION_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user = %auth_user.username))]
pub async fn upload_files(
    State(state): State<AppState>,
    auth_user: AuthUser,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let store = state.blobs.get()?.clone();
    let max_size = state.config.storage.max_blob_size;
    let mut urls: Vec<String> = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                discard_uploads(store.as_ref(), &urls).await;
                return Err(AppError::Validation(format!("Multipart error: {e}")));
            }
        };
        if field.name() != Some("file") {
            continue;
        }

        let result = async {
            let filename = field
                .file_name()
                .map(str::to_string)
                .ok_or_else(|| AppError::Validation("File field must have a filename".into()))?;
            let content_type = resolve_content_type(field.content_type(), &filename)?;
            let object_name = upload_object_name(&auth_user.username, &filename)
                .map_err(|e| AppError::Validation(e.message().into()))?;
            let data = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(format!("Failed to read '{filename}': {e}")))?;
            if data.is_empty() {
                return Err(AppError::Validation(format!("'{filename}' is empty")));
            }
            if data.len() as u64 > max_size {
                return Err(AppError::Validation(format!(
                    "'{filename}' exceeds the {max_size} byte limit"
                )));
            }
            store
                .put(&object_name, &data, &PutOptions::public(content_type))
                .await
                .map_err(|e| {
                    warn!(error = %e, object = %object_name, "Upload failed");
                    AppError::Validation(format!("Upload of '{filename}' failed: {e}"))
                })
        }
        .await;

        match result {
            Ok(url) => urls.push(url),
            Err(e) => {
                discard_uploads(store.as_ref(), &urls).await;
                return Err(e);
            }
        }
    }

    if urls.is_empty() {
        return Err(AppError::Validation("Missing 'file' field".into()));
    }

    info!(count = urls.len(), "Stored uploads");
    Ok((StatusCode::CREATED, Json(UploadResponse { urls })))
}

#[utoipa::path(
    delete,
    path = "/upload",
    tag = "Upload",
    operation_id = "deleteUploads",
    summary = "Delete uploaded files",
    description = "Deletes the listed objects in one request. Only objects under the caller's own upload prefix can be deleted.",
    request_body = DeleteBlobsRequest,
    responses(
        (status = 200, description = "Objects deleted", body = DeleteBlobsResponse),
        (status = 400, description = "Malformed body or foreign URL (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Another user's upload (PROHIBITED_ACTION)", body = ErrorBody),
        (status = 500, description = "Not configured (CONFIGURATION_ERROR) or delete failed (STORAGE_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user = %auth_user.username))]
pub async fn delete_uploads(
    State(state): State<AppState>,
    auth_user: AuthUser,
    AppJson(payload): AppJson<DeleteBlobsRequest>,
) -> Result<Json<DeleteBlobsResponse>, AppError> {
    let urls: Vec<String> = payload
        .urls
        .iter()
        .map(|u| u.trim().to_string())
        .collect();
    if urls.is_empty() || urls.iter().any(String::is_empty) {
        return Err(AppError::Validation(
            "'urls' must be a non-empty list of URLs".into(),
        ));
    }

    let store = state.blobs.get()?;
    for url in &urls {
        let name = store
            .object_name(url)
            .map_err(|e| AppError::Validation(e.to_string()))?;
        if !is_owned_by(name, &auth_user.username) {
            return Err(AppError::Prohibited(format!(
                "'{url}' is not one of your uploads"
            )));
        }
    }

    store
        .delete_many(&urls)
        .await
        .map_err(|e| AppError::Storage(format!("Failed to delete blobs: {e}")))?;

    info!(count = urls.len(), "Deleted uploads");
    Ok(Json(DeleteBlobsResponse {
        deleted: urls.len(),
    }))
}
