use serde::{Deserialize, Serialize};

use crate::gallery::{AddFailure, DeletionReport, NewPhoto, NewVariant, Photo, PhotoVariant};

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateCollectionRequest {
    #[schema(example = "Summer 2024")]
    pub title: String,
}

/// New title for a collection or photo.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateTitleRequest {
    #[schema(example = "Road trip")]
    pub title: String,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct AddPhotosRequest {
    pub photos: Vec<NewPhoto>,
}

/// Photos written by an add. `failures` is non-empty on a partial success.
#[derive(Serialize, utoipa::ToSchema)]
pub struct AddPhotosResponse {
    pub photos: Vec<Photo>,
    pub failures: Vec<AddFailure>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ReorderPhotosRequest {
    /// Photo ids in their new display order.
    #[schema(example = json!(["3f9a", "1c2b", "77de"]))]
    pub photo_ids: Vec<String>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct AddVariantsRequest {
    pub variants: Vec<NewVariant>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct AddVariantsResponse {
    pub variants: Vec<PhotoVariant>,
    pub failures: Vec<AddFailure>,
}

/// Result of deleting a user and everything they own.
#[derive(Serialize, utoipa::ToSchema)]
pub struct DeleteUserResponse {
    #[schema(example = "alice")]
    pub name: String,
    #[serde(flatten)]
    pub report: DeletionReport,
    /// Whether the caller deleted their own account and was signed out.
    pub session_ended: bool,
}
