use async_trait::async_trait;
use serde::Serialize;
use tokio::sync::broadcast;

use super::document::{Document, Fields};
use super::error::DocStoreError;
use super::path::{CollectionPath, DocPath};
use super::query::Query;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

/// Notification emitted after a write has been applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub path: DocPath,
    pub kind: ChangeKind,
}

/// A single write inside an atomic batch.
#[derive(Debug, Clone)]
pub enum BatchWrite {
    Set { path: DocPath, fields: Fields },
    Delete { path: DocPath },
}

/// Client of a hosted document database organised as nested collections.
///
/// Deleting a document leaves its sub-collections in place; removing a whole
/// tree is the caller's job.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a single document, `None` if it does not exist.
    async fn get(&self, path: &DocPath) -> Result<Option<Document>, DocStoreError>;

    /// Create a document with a store-assigned id and creation time.
    async fn add(
        &self,
        collection: &CollectionPath,
        fields: Fields,
    ) -> Result<Document, DocStoreError>;

    /// Create or replace a document at a known path.
    async fn set(&self, path: &DocPath, fields: Fields) -> Result<(), DocStoreError>;

    /// Merge `fields` into an existing document.
    ///
    /// Fails with `NotFound` if the document no longer exists.
    async fn update(&self, path: &DocPath, fields: Fields) -> Result<(), DocStoreError>;

    /// Delete a document. Deleting a missing document succeeds.
    async fn delete(&self, path: &DocPath) -> Result<(), DocStoreError>;

    async fn query(
        &self,
        collection: &CollectionPath,
        query: &Query,
    ) -> Result<Vec<Document>, DocStoreError>;

    /// Apply every write or none of them.
    async fn commit(&self, writes: Vec<BatchWrite>) -> Result<(), DocStoreError>;

    /// Receive a notification for every applied write from now on.
    fn subscribe(&self) -> broadcast::Receiver<ChangeEvent>;
}
