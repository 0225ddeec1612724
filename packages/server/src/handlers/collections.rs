use std::convert::Infallible;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{
        IntoResponse,
        sse::{Event, KeepAlive, Sse},
    },
};
use futures::Stream;
use tracing::{instrument, warn};

use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::gallery::{Collection, CollectionView, DeletionReport, GallerySnapshot};
use crate::models::gallery::{CreateCollectionRequest, UpdateTitleRequest};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/collections",
    tag = "Collections",
    operation_id = "listCollections",
    summary = "The caller's collection tree",
    description = "Every collection of the caller, newest first, with photos (unordered ones newest first, then by manual position) and their variants.",
    responses(
        (status = 200, description = "Collection tree", body = Vec<CollectionView>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 502, description = "Document store failure (BACKEND_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user = %auth_user.username))]
pub async fn list_collections(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Result<Json<Vec<CollectionView>>, AppError> {
    Ok(Json(state.gallery.load_tree(&auth_user.username).await?))
}

#[utoipa::path(
    post,
    path = "/collections",
    tag = "Collections",
    operation_id = "createCollection",
    summary = "Create a collection",
    request_body = CreateCollectionRequest,
    responses(
        (status = 201, description = "Collection created", body = Collection),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 502, description = "Document store failure (BACKEND_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user = %auth_user.username))]
pub async fn create_collection(
    State(state): State<AppState>,
    auth_user: AuthUser,
    AppJson(payload): AppJson<CreateCollectionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let collection = state
        .gallery
        .create_collection(&payload.title, &auth_user.username)
        .await?;
    Ok((StatusCode::CREATED, Json(collection)))
}

#[utoipa::path(
    get,
    path = "/collections/events",
    tag = "Collections",
    operation_id = "watchCollections",
    summary = "Live collection tree",
    description = "Server-sent events. Each `snapshot` event carries the full tree as JSON after any change. \
        A read failure sends one `error` event and ends the stream.",
    responses(
        (status = 200, description = "Event stream", content_type = "text/event-stream", body = Vec<CollectionView>),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user = %auth_user.username))]
pub async fn collection_events(
    State(state): State<AppState>,
    auth_user: AuthUser,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let watch = state.gallery.watch(&auth_user.username);

    let stream = futures::stream::unfold(Some(watch), |watch| async move {
        let mut watch = watch?;
        loop {
            match watch.changed().await? {
                GallerySnapshot::Loading => continue,
                GallerySnapshot::Ready(tree) => {
                    let event = Event::default()
                        .event("snapshot")
                        .json_data(&tree)
                        .unwrap_or_else(|e| {
                            warn!(error = %e, "Failed to encode snapshot");
                            Event::default().event("error").data(e.to_string())
                        });
                    return Some((Ok::<_, Infallible>(event), Some(watch)));
                }
                GallerySnapshot::Failed(message) => {
                    let event = Event::default().event("error").data(message);
                    return Some((Ok(event), None));
                }
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[utoipa::path(
    get,
    path = "/collections/{id}",
    tag = "Collections",
    operation_id = "getCollection",
    summary = "One collection with its photos",
    params(("id" = String, Path, description = "Collection ID")),
    responses(
        (status = 200, description = "Collection", body = CollectionView),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Collection not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user = %auth_user.username))]
pub async fn get_collection(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<CollectionView>, AppError> {
    let collection = state
        .gallery
        .get_owned_collection(&id, &auth_user.username)
        .await?;
    Ok(Json(state.gallery.load_collection_view(collection).await?))
}

#[utoipa::path(
    patch,
    path = "/collections/{id}",
    tag = "Collections",
    operation_id = "renameCollection",
    summary = "Rename a collection",
    params(("id" = String, Path, description = "Collection ID")),
    request_body = UpdateTitleRequest,
    responses(
        (status = 200, description = "Renamed collection", body = Collection),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Collection not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user = %auth_user.username))]
pub async fn update_collection(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
    AppJson(payload): AppJson<UpdateTitleRequest>,
) -> Result<Json<Collection>, AppError> {
    state
        .gallery
        .get_owned_collection(&id, &auth_user.username)
        .await?;
    state
        .gallery
        .update_collection_title(&id, &payload.title)
        .await?;
    Ok(Json(state.gallery.get_collection(&id).await?))
}

#[utoipa::path(
    delete,
    path = "/collections/{id}",
    tag = "Collections",
    operation_id = "deleteCollection",
    summary = "Delete a collection and everything in it",
    description = "Deletes every photo and variant blob in one batch, then the photo, variant and collection documents. \
        Blob cleanup failures are reported as warnings and do not stop the document deletes.",
    params(("id" = String, Path, description = "Collection ID")),
    responses(
        (status = 200, description = "Collection deleted", body = DeletionReport),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Collection not found (NOT_FOUND)", body = ErrorBody),
        (status = 502, description = "Document store failure (BACKEND_ERROR)", body = ErrorBody),
    ),
    security(("jwt" = [])),
)]
#[instrument(skip(state, auth_user), fields(user = %auth_user.username))]
pub async fn delete_collection(
    State(state): State<AppState>,
    auth_user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<DeletionReport>, AppError> {
    let collection = state
        .gallery
        .get_owned_collection(&id, &auth_user.username)
        .await?;
    let view = state.gallery.load_collection_view(collection).await?;
    Ok(Json(state.cascade.delete_collection(&view).await?))
}
