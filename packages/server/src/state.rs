use std::sync::Arc;

use chrono::Duration;
use common::Backend;
use common::docstore::DocumentStore;
use common::docstore::memory::MemoryDocumentStore;
use common::storage::ObjectStore;
use common::storage::filesystem::FilesystemObjectStore;
use common::storage::memory::MemoryObjectStore;
use common::storage::s3::{S3ObjectStore, S3Options};
use tracing::{info, warn};

use crate::config::{AppConfig, DatabaseConfig, DocumentBackend, StorageBackend, StorageConfig, TitleConfig};
use crate::database::init_db;
use crate::docstore::SeaOrmDocumentStore;
use crate::gallery::{CascadeDeleter, GalleryError, GalleryRepository, ProtectedIdentity, UserDirectory};
use crate::session::SessionRegistry;
use crate::titles::{ChatTitleGenerator, TitleGenerator};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub blobs: Backend<dyn ObjectStore>,
    pub titles: Backend<dyn TitleGenerator>,
    pub directory: UserDirectory,
    pub gallery: GalleryRepository,
    pub cascade: CascadeDeleter,
    pub sessions: Arc<SessionRegistry>,
}

impl AppState {
    /// Wire the services around already-built backends.
    pub fn new(
        config: AppConfig,
        docs: Arc<dyn DocumentStore>,
        blobs: Backend<dyn ObjectStore>,
        titles: Backend<dyn TitleGenerator>,
    ) -> Self {
        let sessions = Arc::new(SessionRegistry::new(Duration::hours(
            config.auth.session_ttl_hours,
        )));
        let policy = ProtectedIdentity::new(config.auth.protected_user.clone());
        Self {
            directory: UserDirectory::new(docs.clone()),
            gallery: GalleryRepository::new(docs.clone()),
            cascade: CascadeDeleter::new(docs, blobs.clone(), policy, sessions.clone()),
            config: Arc::new(config),
            blobs,
            titles,
            sessions,
        }
    }

    /// Build every backend from configuration.
    pub async fn from_config(config: AppConfig) -> Result<Self, GalleryError> {
        let docs = build_document_store(&config.database).await?;
        let blobs = build_object_store(&config.storage).await?;
        let titles = build_title_generator(config.titles.as_ref());
        Ok(Self::new(config, docs, blobs, titles))
    }
}

pub async fn build_document_store(
    config: &DatabaseConfig,
) -> Result<Arc<dyn DocumentStore>, GalleryError> {
    match config.backend {
        DocumentBackend::Memory => {
            warn!("Using the in-memory document store; data is lost on restart");
            Ok(Arc::new(MemoryDocumentStore::new()))
        }
        DocumentBackend::Sql => {
            let url = config.url.as_deref().ok_or_else(|| {
                GalleryError::Configuration(
                    "database.url is required for the sql document store".into(),
                )
            })?;
            let db = init_db(url, config.max_connections, config.min_connections)
                .await
                .map_err(|e| GalleryError::Configuration(format!("database connection failed: {e}")))?;
            info!("Connected to SQL document store");
            Ok(Arc::new(SeaOrmDocumentStore::new(db)))
        }
    }
}

/// The configured object store. Missing credentials produce a
/// `NotConfigured` handle instead of an error; a broken configuration that
/// was asked for explicitly still fails startup.
pub async fn build_object_store(
    config: &StorageConfig,
) -> Result<Backend<dyn ObjectStore>, GalleryError> {
    let store: Arc<dyn ObjectStore> = match config.backend {
        StorageBackend::None => {
            warn!("Object storage disabled; uploads are refused and blob cleanup is skipped");
            return Ok(Backend::not_configured("Object storage is not configured"));
        }
        StorageBackend::Memory => Arc::new(MemoryObjectStore::new()),
        StorageBackend::Filesystem => Arc::new(
            FilesystemObjectStore::new(
                config.base_path.clone(),
                config.public_base_url.clone(),
                config.max_blob_size,
            )
            .await?,
        ),
        StorageBackend::S3 => {
            let s3 = &config.s3;
            let (Some(bucket), Some(access_key), Some(secret_key)) =
                (s3.bucket.clone(), s3.access_key.clone(), s3.secret_key.clone())
            else {
                warn!("S3 storage selected but bucket or credentials are missing");
                return Ok(Backend::not_configured(
                    "Object storage credentials are not configured",
                ));
            };
            Arc::new(S3ObjectStore::new(S3Options {
                bucket,
                region: s3.region.clone(),
                endpoint: s3.endpoint.clone(),
                access_key,
                secret_key,
                public_base_url: s3.public_base_url.clone(),
            })?)
        }
    };
    info!(backend = ?config.backend, "Object storage ready");
    Ok(Backend::ready(store))
}

pub fn build_title_generator(config: Option<&TitleConfig>) -> Backend<dyn TitleGenerator> {
    let Some(config) = config else {
        return Backend::not_configured("AI title generation is not configured");
    };
    match ChatTitleGenerator::new(config) {
        Ok(generator) => {
            let generator: Arc<dyn TitleGenerator> = Arc::new(generator);
            Backend::ready(generator)
        }
        Err(e) => {
            warn!(error = %e, "Title generator unavailable");
            Backend::not_configured(format!("AI title generation is unavailable: {e}"))
        }
    }
}
