use serde::{Deserialize, Serialize};

/// Public URLs of the stored files, in upload order.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UploadResponse {
    #[schema(example = json!(["http://127.0.0.1:3000/blobs/alice/4c1d-beach.jpg"]))]
    pub urls: Vec<String>,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct DeleteBlobsRequest {
    pub urls: Vec<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct DeleteBlobsResponse {
    #[schema(example = 2)]
    pub deleted: usize,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct GenerateTitleRequest {
    /// The photo as `data:<image mime>;base64,<payload>`.
    #[schema(example = "data:image/jpeg;base64,/9j/4AAQSkZJRg...")]
    pub photo_data_uri: String,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct GenerateTitleResponse {
    #[schema(example = "Golden Hour at the Beach")]
    pub title: String,
}
