use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use common::docstore::{CollectionPath, DocPath, DocStoreError, Document};
use serde::{Deserialize, Serialize};

use super::error::GalleryError;

pub const USERS: &str = "users";
pub const COLLECTIONS: &str = "collections";
pub const PHOTOS: &str = "photos";
pub const VARIANTS: &str = "variants";

/// Document-store layout: `users`, `collections`, `collections/{id}/photos`,
/// `collections/{id}/photos/{id}/variants`.
pub mod paths {
    use super::*;

    fn invalid(err: DocStoreError) -> GalleryError {
        GalleryError::Validation(format!("Invalid identifier: {err}"))
    }

    pub fn users() -> Result<CollectionPath, GalleryError> {
        CollectionPath::root(USERS).map_err(invalid)
    }

    pub fn user(id: &str) -> Result<DocPath, GalleryError> {
        users()?.doc(id).map_err(invalid)
    }

    pub fn collections() -> Result<CollectionPath, GalleryError> {
        CollectionPath::root(COLLECTIONS).map_err(invalid)
    }

    pub fn collection(id: &str) -> Result<DocPath, GalleryError> {
        collections()?.doc(id).map_err(invalid)
    }

    pub fn photos(collection_id: &str) -> Result<CollectionPath, GalleryError> {
        collection(collection_id)?
            .sub_collection(PHOTOS)
            .map_err(invalid)
    }

    pub fn photo(collection_id: &str, photo_id: &str) -> Result<DocPath, GalleryError> {
        photos(collection_id)?.doc(photo_id).map_err(invalid)
    }

    pub fn variants(collection_id: &str, photo_id: &str) -> Result<CollectionPath, GalleryError> {
        photo(collection_id, photo_id)?
            .sub_collection(VARIANTS)
            .map_err(invalid)
    }

    pub fn variant(
        collection_id: &str,
        photo_id: &str,
        variant_id: &str,
    ) -> Result<DocPath, GalleryError> {
        variants(collection_id, photo_id)?
            .doc(variant_id)
            .map_err(invalid)
    }
}

// Field sets as stored in the document store.

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserFields {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionFields {
    pub title: String,
    pub owner_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhotoFields {
    pub src: String,
    pub title: String,
    /// Manual position set by a reorder; absent until the first reorder.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantFields {
    pub src: String,
}

/// A gallery account. Credentials never leave the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct User {
    #[schema(example = "4f1c2a9b8e7d4c3b")]
    pub id: String,
    #[schema(example = "alice")]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct Collection {
    #[schema(example = "9a8b7c6d5e4f")]
    pub id: String,
    #[schema(example = "Summer")]
    pub title: String,
    #[schema(example = "alice")]
    pub owner_name: String,
    pub created_at: DateTime<Utc>,
}

impl Collection {
    pub fn from_document(doc: &Document) -> Result<Self, GalleryError> {
        let fields: CollectionFields = doc.decode()?;
        Ok(Self {
            id: doc.id.clone(),
            title: fields.title,
            owner_name: fields.owner_name,
            created_at: doc.create_time,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct Photo {
    pub id: String,
    pub collection_id: String,
    /// Object-storage URL of the image.
    #[schema(example = "http://127.0.0.1:3000/blobs/alice/1d2c-beach.jpg")]
    pub src: String,
    #[schema(example = "Beach")]
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub order: Option<i64>,
}

impl Photo {
    pub fn from_document(collection_id: &str, doc: &Document) -> Result<Self, GalleryError> {
        let fields: PhotoFields = doc.decode()?;
        Ok(Self {
            id: doc.id.clone(),
            collection_id: collection_id.to_string(),
            src: fields.src,
            title: fields.title,
            created_at: doc.create_time,
            order: fields.order,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct PhotoVariant {
    pub id: String,
    pub photo_id: String,
    pub src: String,
    pub created_at: DateTime<Utc>,
}

impl PhotoVariant {
    pub fn from_document(photo_id: &str, doc: &Document) -> Result<Self, GalleryError> {
        let fields: VariantFields = doc.decode()?;
        Ok(Self {
            id: doc.id.clone(),
            photo_id: photo_id.to_string(),
            src: fields.src,
            created_at: doc.create_time,
        })
    }
}

/// A photo with its variants.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct PhotoView {
    #[serde(flatten)]
    pub photo: Photo,
    pub variants: Vec<PhotoVariant>,
}

impl PhotoView {
    /// Every blob this photo owns: its own image first, then its variants.
    pub fn blob_urls(&self) -> Vec<String> {
        std::iter::once(self.photo.src.clone())
            .chain(self.variants.iter().map(|v| v.src.clone()))
            .filter(|src| !src.is_empty())
            .collect()
    }
}

/// A collection with its photos, materialised from the nested documents.
#[derive(Debug, Clone, PartialEq, Serialize, utoipa::ToSchema)]
pub struct CollectionView {
    #[serde(flatten)]
    pub collection: Collection,
    pub photos: Vec<PhotoView>,
}

impl CollectionView {
    pub fn blob_urls(&self) -> Vec<String> {
        self.photos.iter().flat_map(PhotoView::blob_urls).collect()
    }
}

/// A photo to append to a collection.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct NewPhoto {
    #[schema(example = "http://127.0.0.1:3000/blobs/alice/1d2c-beach.jpg")]
    pub src: String,
    #[schema(example = "Beach")]
    pub title: String,
}

/// A variant to attach to a photo.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct NewVariant {
    #[schema(example = "http://127.0.0.1:3000/blobs/alice/1d2c-beach-thumb.jpg")]
    pub src: String,
}

/// Validate a trimmed title (1-256 Unicode characters) and return it trimmed.
pub fn validate_title(title: &str, what: &str) -> Result<String, GalleryError> {
    let title = title.trim();
    if title.is_empty() || title.chars().count() > 256 {
        return Err(GalleryError::Validation(format!(
            "{what} must be 1-256 characters"
        )));
    }
    Ok(title.to_string())
}

/// Newest collections first.
pub fn sort_collections(collections: &mut [CollectionView]) {
    collections.sort_by(|a, b| {
        b.collection
            .created_at
            .cmp(&a.collection.created_at)
            .then_with(|| a.collection.id.cmp(&b.collection.id))
    });
}

/// Photos without a manual position first, newest first; then manually
/// ordered photos by ascending position.
pub fn sort_photos(photos: &mut [PhotoView]) {
    photos.sort_by(|a, b| {
        let (a, b) = (&a.photo, &b.photo);
        let by_position = match (a.order, b.order) {
            (None, None) => b.created_at.cmp(&a.created_at),
            (None, Some(_)) => Ordering::Less,
            (Some(_), None) => Ordering::Greater,
            (Some(x), Some(y)) => x.cmp(&y),
        };
        by_position.then_with(|| a.id.cmp(&b.id))
    });
}

/// Variants in the order they were attached.
pub fn sort_variants(variants: &mut [PhotoVariant]) {
    variants.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
}
