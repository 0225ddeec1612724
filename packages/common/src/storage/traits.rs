use async_trait::async_trait;

use super::error::StorageError;

/// Options applied when writing an object.
#[derive(Debug, Clone, Default)]
pub struct PutOptions {
    /// MIME type recorded with the object.
    pub content_type: Option<String>,
    /// Whether the object should be readable by anyone holding its URL.
    pub public_access: bool,
}

impl PutOptions {
    pub fn public(content_type: impl Into<String>) -> Self {
        Self {
            content_type: Some(content_type.into()),
            public_access: true,
        }
    }
}

/// Hosted binary storage addressed by URL.
///
/// Objects carry no back-link to the documents referencing them; callers own
/// the bookkeeping between a document's `src` and the object behind it.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Store bytes under `object_name` and return the URL the object is reachable at.
    ///
    /// Writing to an existing name replaces the object.
    async fn put(
        &self,
        object_name: &str,
        data: &[u8],
        options: &PutOptions,
    ) -> Result<String, StorageError>;

    /// Delete every object addressed by `urls` as a single request.
    ///
    /// URLs whose object is already gone are ignored. A URL that this store
    /// does not serve fails the whole request before anything is deleted, so
    /// callers holding URLs of mixed origin should sort them with
    /// [`ObjectStore::object_name`] first.
    async fn delete_many(&self, urls: &[String]) -> Result<(), StorageError>;

    /// Check whether the object behind `url` exists.
    async fn exists(&self, url: &str) -> Result<bool, StorageError>;

    /// Map a URL issued by this store back to its object name.
    ///
    /// Fails with [`StorageError::ForeignUrl`] for URLs the store does not serve.
    fn object_name<'a>(&self, url: &'a str) -> Result<&'a str, StorageError>;
}

/// Whether `object_name` sits under `owner`'s `<owner>/` prefix.
pub fn is_owned_by(object_name: &str, owner: &str) -> bool {
    !owner.is_empty()
        && object_name
            .strip_prefix(owner)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Validate a relative, `/`-separated object name.
pub fn validate_object_name(name: &str) -> Result<(), StorageError> {
    if name.is_empty() {
        return Err(StorageError::InvalidObjectName("name is empty".into()));
    }
    if name.starts_with('/') || name.contains('\\') {
        return Err(StorageError::InvalidObjectName(format!(
            "'{name}' must be a relative path"
        )));
    }
    for segment in name.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(StorageError::InvalidObjectName(format!(
                "'{name}' contains an empty or relative segment"
            )));
        }
    }
    Ok(())
}
