use std::sync::Arc;

use common::Backend;
use common::docstore::DocumentStore;
use common::storage::{ObjectStore, is_owned_by};
use futures::future::try_join_all;
use serde::Serialize;
use tracing::{error, info, instrument, warn};

use super::directory::UserDirectory;
use super::error::GalleryError;
use super::model::{CollectionView, PhotoView, paths};
use super::policy::ProtectedIdentity;
use super::repository::GalleryRepository;
use crate::session::SessionRegistry;

/// What a cascading delete removed.
///
/// Blob cleanup is best effort: a failed batch delete is recorded as a
/// warning and the document deletes still run, which can leave orphaned
/// blobs behind. Only blobs under the owner's upload prefix are ever
/// deleted; any other `src` is left alone with a warning of its own.
#[derive(Debug, Clone, Default, Serialize, utoipa::ToSchema)]
pub struct DeletionReport {
    /// URLs the object store confirmed as deleted.
    pub blobs_deleted: Vec<String>,
    pub documents_deleted: usize,
    pub warnings: Vec<String>,
}

/// Deletes photos, variants, collections and users together with
/// everything they own, in an order that never leaves a parent document
/// without its children.
#[derive(Clone)]
pub struct CascadeDeleter {
    docs: Arc<dyn DocumentStore>,
    blobs: Backend<dyn ObjectStore>,
    gallery: GalleryRepository,
    directory: UserDirectory,
    policy: ProtectedIdentity,
    sessions: Arc<SessionRegistry>,
}

impl CascadeDeleter {
    pub fn new(
        docs: Arc<dyn DocumentStore>,
        blobs: Backend<dyn ObjectStore>,
        policy: ProtectedIdentity,
        sessions: Arc<SessionRegistry>,
    ) -> Self {
        Self {
            gallery: GalleryRepository::new(docs.clone()),
            directory: UserDirectory::new(docs.clone()),
            docs,
            blobs,
            policy,
            sessions,
        }
    }

    /// Delete a photo, its variants and all their blobs.
    #[instrument(skip(self))]
    pub async fn delete_photo(
        &self,
        collection_id: &str,
        photo_id: &str,
    ) -> Result<DeletionReport, GalleryError> {
        let collection = self.gallery.get_collection(collection_id).await?;
        let photo = self.gallery.get_photo(collection_id, photo_id).await?;
        let view = self.gallery.load_photo_view(photo).await?;

        let mut report = DeletionReport::default();
        self.delete_blobs(view.blob_urls(), &collection.owner_name, &mut report)
            .await;
        report.documents_deleted += self.delete_photo_documents(&view).await?;

        info!(documents = report.documents_deleted, "Photo deleted");
        Ok(report)
    }

    /// Delete a single variant and its blob.
    #[instrument(skip(self))]
    pub async fn delete_variant(
        &self,
        collection_id: &str,
        photo_id: &str,
        variant_id: &str,
    ) -> Result<DeletionReport, GalleryError> {
        let collection = self.gallery.get_collection(collection_id).await?;
        let variant = self
            .gallery
            .get_variant(collection_id, photo_id, variant_id)
            .await?;

        let mut report = DeletionReport::default();
        self.delete_blobs(vec![variant.src], &collection.owner_name, &mut report)
            .await;
        self.docs
            .delete(&paths::variant(collection_id, photo_id, variant_id)?)
            .await?;
        report.documents_deleted = 1;

        info!("Variant deleted");
        Ok(report)
    }

    /// Delete a collection as described by `view`: all blobs in one batch,
    /// then the photo and variant documents, then the collection itself.
    ///
    /// The tree is taken as given and not re-read, so photos added after
    /// `view` was loaded are not removed.
    #[instrument(skip(self, view), fields(collection_id = %view.collection.id))]
    pub async fn delete_collection(
        &self,
        view: &CollectionView,
    ) -> Result<DeletionReport, GalleryError> {
        let mut report = DeletionReport::default();
        self.delete_blobs(view.blob_urls(), &view.collection.owner_name, &mut report)
            .await;
        report.documents_deleted += self.delete_collection_documents(view).await?;

        info!(documents = report.documents_deleted, "Collection deleted");
        Ok(report)
    }

    /// Delete a user with every collection, photo, variant and blob they own.
    ///
    /// The protected account is refused before anything is read. When
    /// `acting_user` deletes themselves, their sessions end whether or not
    /// the cleanup succeeded.
    #[instrument(skip(self))]
    pub async fn delete_user(
        &self,
        name: &str,
        acting_user: &str,
    ) -> Result<DeletionReport, GalleryError> {
        self.policy.ensure_deletable(name)?;

        let result = self.delete_user_tree(name).await;

        let self_delete = acting_user.eq_ignore_ascii_case(name.trim());
        if result.is_ok() || self_delete {
            let ended = self.sessions.revoke_user(name.trim());
            info!(user = %name, sessions = ended, "Sessions ended for deleted user");
        }
        result
    }

    async fn delete_user_tree(&self, name: &str) -> Result<DeletionReport, GalleryError> {
        let user = self
            .directory
            .find_by_name(name)
            .await?
            .ok_or_else(|| GalleryError::NotFound(format!("User '{}'", name.trim())))?;

        let mut report = DeletionReport::default();
        let mut blob_urls = Vec::new();

        let collections = self.gallery.list_collections(&user.name).await?;
        for collection in collections {
            let view = self.gallery.load_collection_view(collection).await?;
            blob_urls.extend(view.blob_urls());
            report.documents_deleted += self.delete_collection_documents(&view).await?;
        }

        self.delete_blobs(blob_urls, &user.name, &mut report).await;

        self.docs.delete(&paths::user(&user.id)?).await?;
        report.documents_deleted += 1;

        info!(
            user = %user.name,
            documents = report.documents_deleted,
            blobs = report.blobs_deleted.len(),
            "User deleted"
        );
        Ok(report)
    }

    /// Photo documents in parallel, then the collection document.
    async fn delete_collection_documents(
        &self,
        view: &CollectionView,
    ) -> Result<usize, GalleryError> {
        let counts = try_join_all(
            view.photos
                .iter()
                .map(|photo| self.delete_photo_documents(photo)),
        )
        .await?;

        self.docs
            .delete(&paths::collection(&view.collection.id)?)
            .await
            .inspect_err(|e| {
                error!(collection_id = %view.collection.id, error = %e, "Failed to delete collection document");
            })?;
        Ok(counts.into_iter().sum::<usize>() + 1)
    }

    /// Variant documents in parallel, then the photo document.
    async fn delete_photo_documents(&self, view: &PhotoView) -> Result<usize, GalleryError> {
        let photo = &view.photo;
        let variant_paths = view
            .variants
            .iter()
            .map(|v| paths::variant(&photo.collection_id, &photo.id, &v.id))
            .collect::<Result<Vec<_>, _>>()?;

        try_join_all(variant_paths.iter().map(|path| self.docs.delete(path))).await?;

        self.docs
            .delete(&paths::photo(&photo.collection_id, &photo.id)?)
            .await
            .inspect_err(|e| {
                error!(photo_id = %photo.id, error = %e, "Failed to delete photo document");
            })?;
        Ok(variant_paths.len() + 1)
    }

    /// One batch delete for the `urls` this store serves under `owner`'s
    /// prefix. Everything else, and any failure, is logged and recorded as a
    /// warning, never returned.
    async fn delete_blobs(&self, urls: Vec<String>, owner: &str, report: &mut DeletionReport) {
        if urls.is_empty() {
            return;
        }
        let store = match self.blobs.get() {
            Ok(store) => store,
            Err(e) => {
                warn!(count = urls.len(), reason = %e, "Object storage not configured, blobs left in place");
                report.warnings.push(format!(
                    "Object storage not configured; {} blob(s) were not deleted",
                    urls.len()
                ));
                return;
            }
        };

        let mut batch = Vec::with_capacity(urls.len());
        for url in urls {
            let skipped = match store.object_name(&url) {
                Ok(name) if is_owned_by(name, owner) => None,
                Ok(_) => Some(format!("Skipped blob outside {owner}'s uploads: {url}")),
                Err(e) => Some(format!("Skipped blob: {e}")),
            };
            match skipped {
                None => batch.push(url),
                Some(warning) => {
                    warn!(%url, owner, "{warning}");
                    report.warnings.push(warning);
                }
            }
        }
        if batch.is_empty() {
            return;
        }
        let urls = batch;

        match store.delete_many(&urls).await {
            Ok(()) => report.blobs_deleted.extend(urls),
            Err(e) => {
                warn!(count = urls.len(), error = %e, "Blob cleanup failed, continuing with documents");
                report.warnings.push(format!(
                    "Failed to delete {} blob(s): {e}",
                    urls.len()
                ));
            }
        }
    }
}
