use std::collections::HashSet;
use std::sync::Arc;

use common::docstore::{DocumentStore, Query, to_fields};
use futures::future::{join_all, try_join_all};
use serde::Serialize;
use serde_json::json;
use tracing::{info, instrument, warn};

use super::error::GalleryError;
use super::model::{
    Collection, CollectionFields, CollectionView, NewPhoto, NewVariant, Photo, PhotoFields,
    PhotoVariant, PhotoView, VariantFields, paths, sort_collections, sort_photos, sort_variants,
    validate_title,
};

/// One item of a multi-item add that did not make it into the store.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct AddFailure {
    /// Position of the item in the request.
    pub index: usize,
    pub message: String,
}

/// Per-item result of a multi-item add. Items that were written stay
/// written even when others fail.
#[derive(Debug, Clone)]
pub struct AddOutcome<T> {
    pub created: Vec<T>,
    pub failures: Vec<AddFailure>,
}

impl<T> AddOutcome<T> {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Reads and writes the collection/photo/variant tree.
#[derive(Clone)]
pub struct GalleryRepository {
    docs: Arc<dyn DocumentStore>,
}

impl GalleryRepository {
    pub fn new(docs: Arc<dyn DocumentStore>) -> Self {
        Self { docs }
    }

    pub fn documents(&self) -> &Arc<dyn DocumentStore> {
        &self.docs
    }

    #[instrument(skip(self))]
    pub async fn create_collection(
        &self,
        title: &str,
        owner_name: &str,
    ) -> Result<Collection, GalleryError> {
        let title = validate_title(title, "Collection title")?;
        let fields = to_fields(&CollectionFields {
            title,
            owner_name: owner_name.to_string(),
        })?;
        let doc = self.docs.add(&paths::collections()?, fields).await?;
        info!(collection_id = %doc.id, "Collection created");
        Collection::from_document(&doc)
    }

    pub async fn get_collection(&self, collection_id: &str) -> Result<Collection, GalleryError> {
        let doc = self
            .docs
            .get(&paths::collection(collection_id)?)
            .await?
            .ok_or_else(|| GalleryError::NotFound(format!("Collection '{collection_id}'")))?;
        Collection::from_document(&doc)
    }

    /// The collection if `owner_name` owns it. Other users' collections
    /// are reported as missing.
    pub async fn get_owned_collection(
        &self,
        collection_id: &str,
        owner_name: &str,
    ) -> Result<Collection, GalleryError> {
        let collection = self.get_collection(collection_id).await?;
        if collection.owner_name != owner_name {
            return Err(GalleryError::NotFound(format!(
                "Collection '{collection_id}'"
            )));
        }
        Ok(collection)
    }

    pub async fn list_collections(&self, owner_name: &str) -> Result<Vec<Collection>, GalleryError> {
        let docs = self
            .docs
            .query(
                &paths::collections()?,
                &Query::new().where_eq("owner_name", owner_name),
            )
            .await?;
        docs.iter().map(Collection::from_document).collect()
    }

    pub async fn list_photos(&self, collection_id: &str) -> Result<Vec<Photo>, GalleryError> {
        let docs = self
            .docs
            .query(&paths::photos(collection_id)?, &Query::new())
            .await?;
        docs.iter()
            .map(|doc| Photo::from_document(collection_id, doc))
            .collect()
    }

    pub async fn list_variants(
        &self,
        collection_id: &str,
        photo_id: &str,
    ) -> Result<Vec<PhotoVariant>, GalleryError> {
        let docs = self
            .docs
            .query(&paths::variants(collection_id, photo_id)?, &Query::new())
            .await?;
        let mut variants = docs
            .iter()
            .map(|doc| PhotoVariant::from_document(photo_id, doc))
            .collect::<Result<Vec<_>, _>>()?;
        sort_variants(&mut variants);
        Ok(variants)
    }

    pub async fn get_photo(&self, collection_id: &str, photo_id: &str) -> Result<Photo, GalleryError> {
        let doc = self
            .docs
            .get(&paths::photo(collection_id, photo_id)?)
            .await?
            .ok_or_else(|| GalleryError::NotFound(format!("Photo '{photo_id}'")))?;
        Photo::from_document(collection_id, &doc)
    }

    pub async fn get_variant(
        &self,
        collection_id: &str,
        photo_id: &str,
        variant_id: &str,
    ) -> Result<PhotoVariant, GalleryError> {
        let doc = self
            .docs
            .get(&paths::variant(collection_id, photo_id, variant_id)?)
            .await?
            .ok_or_else(|| GalleryError::NotFound(format!("Variant '{variant_id}'")))?;
        PhotoVariant::from_document(photo_id, &doc)
    }

    pub async fn load_photo_view(&self, photo: Photo) -> Result<PhotoView, GalleryError> {
        let variants = self.list_variants(&photo.collection_id, &photo.id).await?;
        Ok(PhotoView { photo, variants })
    }

    /// Materialise a collection with its photos and their variants.
    pub async fn load_collection_view(
        &self,
        collection: Collection,
    ) -> Result<CollectionView, GalleryError> {
        let photos = self.list_photos(&collection.id).await?;
        let mut photos =
            try_join_all(photos.into_iter().map(|photo| self.load_photo_view(photo))).await?;
        sort_photos(&mut photos);
        Ok(CollectionView { collection, photos })
    }

    /// Every collection of `owner_name`, newest first, fully materialised.
    #[instrument(skip(self))]
    pub async fn load_tree(&self, owner_name: &str) -> Result<Vec<CollectionView>, GalleryError> {
        let collections = self.list_collections(owner_name).await?;
        let mut views = try_join_all(
            collections
                .into_iter()
                .map(|collection| self.load_collection_view(collection)),
        )
        .await?;
        sort_collections(&mut views);
        Ok(views)
    }

    /// Append photos to a collection, one independent write per photo.
    ///
    /// Input is validated before any write. Writes that succeed are kept
    /// even when others fail; the outcome lists both.
    #[instrument(skip(self, photos), fields(count = photos.len()))]
    pub async fn add_photos(
        &self,
        collection_id: &str,
        photos: Vec<NewPhoto>,
    ) -> Result<AddOutcome<Photo>, GalleryError> {
        if photos.is_empty() {
            return Err(GalleryError::Validation("No photos to add".into()));
        }
        let mut records = Vec::with_capacity(photos.len());
        for (index, photo) in photos.into_iter().enumerate() {
            let src = photo.src.trim();
            if src.is_empty() {
                return Err(GalleryError::Validation(format!(
                    "Photo {index} has no source URL"
                )));
            }
            records.push(PhotoFields {
                src: src.to_string(),
                title: validate_title(&photo.title, "Photo title")?,
                order: None,
            });
        }

        self.get_collection(collection_id).await?;
        let path = paths::photos(collection_id)?;

        let results = join_all(records.iter().map(|record| {
            let path = &path;
            async move {
                let doc = self.docs.add(path, to_fields(record)?).await?;
                Photo::from_document(collection_id, &doc)
            }
        }))
        .await;

        let outcome = split_outcome(results);
        if outcome.is_complete() {
            info!(created = outcome.created.len(), "Photos added");
        } else {
            warn!(
                created = outcome.created.len(),
                failed = outcome.failures.len(),
                "Some photos could not be added"
            );
        }
        Ok(outcome)
    }

    /// Attach variants to a photo, with the same per-item contract as [`Self::add_photos`].
    #[instrument(skip(self, variants), fields(count = variants.len()))]
    pub async fn add_variants(
        &self,
        collection_id: &str,
        photo_id: &str,
        variants: Vec<NewVariant>,
    ) -> Result<AddOutcome<PhotoVariant>, GalleryError> {
        if variants.is_empty() {
            return Err(GalleryError::Validation("No variants to add".into()));
        }
        let mut records = Vec::with_capacity(variants.len());
        for (index, variant) in variants.into_iter().enumerate() {
            let src = variant.src.trim();
            if src.is_empty() {
                return Err(GalleryError::Validation(format!(
                    "Variant {index} has no source URL"
                )));
            }
            records.push(VariantFields {
                src: src.to_string(),
            });
        }

        self.get_photo(collection_id, photo_id).await?;
        let path = paths::variants(collection_id, photo_id)?;

        let results = join_all(records.iter().map(|record| {
            let path = &path;
            async move {
                let doc = self.docs.add(path, to_fields(record)?).await?;
                PhotoVariant::from_document(photo_id, &doc)
            }
        }))
        .await;

        let outcome = split_outcome(results);
        if !outcome.is_complete() {
            warn!(
                failed = outcome.failures.len(),
                "Some variants could not be added"
            );
        }
        Ok(outcome)
    }

    #[instrument(skip(self))]
    pub async fn update_collection_title(
        &self,
        collection_id: &str,
        title: &str,
    ) -> Result<(), GalleryError> {
        let title = validate_title(title, "Collection title")?;
        let path = paths::collection(collection_id)?;
        self.docs
            .update(&path, to_fields(&json!({ "title": title }))?)
            .await
            .map_err(|e| {
                GalleryError::from_store(e, || format!("Collection '{collection_id}'"))
            })
    }

    #[instrument(skip(self))]
    pub async fn update_photo_title(
        &self,
        collection_id: &str,
        photo_id: &str,
        title: &str,
    ) -> Result<(), GalleryError> {
        let title = validate_title(title, "Photo title")?;
        let path = paths::photo(collection_id, photo_id)?;
        self.docs
            .update(&path, to_fields(&json!({ "title": title }))?)
            .await
            .map_err(|e| GalleryError::from_store(e, || format!("Photo '{photo_id}'")))
    }

    /// Give each listed photo its position in `ordered_ids`. Photos of the
    /// collection left out of the list lose any earlier position, so they
    /// sort with the unordered photos instead of colliding with new ones.
    ///
    /// Positions are written independently and concurrently; two reorders
    /// racing on the same collection resolve per photo, last writer wins.
    #[instrument(skip(self, ordered_ids), fields(count = ordered_ids.len()))]
    pub async fn reorder_photos(
        &self,
        collection_id: &str,
        ordered_ids: &[String],
    ) -> Result<(), GalleryError> {
        if ordered_ids.is_empty() {
            return Err(GalleryError::Validation("No photo ids given".into()));
        }
        let mut seen = HashSet::new();
        for id in ordered_ids {
            if !seen.insert(id.as_str()) {
                return Err(GalleryError::Validation(format!(
                    "Duplicate photo id '{id}'"
                )));
            }
        }
        let updates = ordered_ids
            .iter()
            .enumerate()
            .map(|(position, id)| -> Result<_, GalleryError> {
                Ok((id, paths::photo(collection_id, id)?, position as i64))
            })
            .collect::<Result<Vec<_>, _>>()?;

        try_join_all(updates.into_iter().map(|(id, path, position)| async move {
            self.docs
                .update(&path, to_fields(&json!({ "order": position }))?)
                .await
                .map_err(|e| GalleryError::from_store(e, || format!("Photo '{id}'")))
        }))
        .await?;

        let stale = self
            .list_photos(collection_id)
            .await?
            .into_iter()
            .filter(|photo| photo.order.is_some() && !seen.contains(photo.id.as_str()))
            .map(|photo| paths::photo(collection_id, &photo.id))
            .collect::<Result<Vec<_>, _>>()?;
        try_join_all(stale.iter().map(|path| async move {
            self.docs
                .update(path, to_fields(&json!({ "order": null }))?)
                .await
                .map_err(GalleryError::from)
        }))
        .await?;

        info!("Photos reordered");
        Ok(())
    }
}

fn split_outcome<T>(results: Vec<Result<T, GalleryError>>) -> AddOutcome<T> {
    let mut outcome = AddOutcome {
        created: Vec::new(),
        failures: Vec::new(),
    };
    for (index, result) in results.into_iter().enumerate() {
        match result {
            Ok(item) => outcome.created.push(item),
            Err(e) => outcome.failures.push(AddFailure {
                index,
                message: e.to_string(),
            }),
        }
    }
    outcome
}
