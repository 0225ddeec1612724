use common::NotConfigured;
use common::docstore::DocStoreError;
use common::storage::StorageError;
use thiserror::Error;

/// Failures of gallery, directory and cascade operations.
#[derive(Debug, Error)]
pub enum GalleryError {
    /// A required backend or credential is missing. Not retried.
    #[error("{0}")]
    Configuration(String),

    #[error("{0} not found")]
    NotFound(String),

    /// The document store failed; the operation was aborted.
    #[error("document store error: {0}")]
    Store(#[from] DocStoreError),

    /// The object store failed where a blob is required (uploads).
    #[error("object storage error: {0}")]
    Storage(#[from] StorageError),

    /// Rejected before any remote call.
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    DuplicateName(String),

    /// Destructive action against a protected resource, rejected before any remote call.
    #[error("{0}")]
    Prohibited(String),

    #[error("{0}")]
    CredentialMismatch(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<NotConfigured> for GalleryError {
    fn from(err: NotConfigured) -> Self {
        GalleryError::Configuration(err.0)
    }
}

impl GalleryError {
    /// Map a document-store `NotFound` to a domain `NotFound` naming the resource.
    pub fn from_store(err: DocStoreError, what: impl FnOnce() -> String) -> Self {
        match err {
            DocStoreError::NotFound(_) => GalleryError::NotFound(what()),
            other => GalleryError::Store(other),
        }
    }
}
