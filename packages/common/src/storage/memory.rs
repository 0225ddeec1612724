use async_trait::async_trait;
use dashmap::DashMap;

use super::error::StorageError;
use super::traits::{ObjectStore, PutOptions, validate_object_name};

const URL_PREFIX: &str = "memory://objects/";

#[derive(Debug, Clone)]
struct StoredObject {
    data: Vec<u8>,
    content_type: Option<String>,
}

/// Process-local object store for development and tests.
#[derive(Default)]
pub struct MemoryObjectStore {
    objects: DashMap<String, StoredObject>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes stored behind `url`, if any.
    pub fn get(&self, url: &str) -> Option<Vec<u8>> {
        self.objects.get(url).map(|o| o.data.clone())
    }

    pub fn content_type(&self, url: &str) -> Option<String> {
        self.objects.get(url).and_then(|o| o.content_type.clone())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put(
        &self,
        object_name: &str,
        data: &[u8],
        options: &PutOptions,
    ) -> Result<String, StorageError> {
        validate_object_name(object_name)?;
        let url = format!("{URL_PREFIX}{object_name}");
        self.objects.insert(
            url.clone(),
            StoredObject {
                data: data.to_vec(),
                content_type: options.content_type.clone(),
            },
        );
        Ok(url)
    }

    async fn delete_many(&self, urls: &[String]) -> Result<(), StorageError> {
        for url in urls {
            self.object_name(url)?;
        }
        for url in urls {
            self.objects.remove(url);
        }
        Ok(())
    }

    async fn exists(&self, url: &str) -> Result<bool, StorageError> {
        self.object_name(url)?;
        Ok(self.objects.contains_key(url))
    }

    fn object_name<'a>(&self, url: &'a str) -> Result<&'a str, StorageError> {
        let name = url
            .strip_prefix(URL_PREFIX)
            .ok_or_else(|| StorageError::ForeignUrl(url.to_string()))?;
        validate_object_name(name)?;
        Ok(name)
    }
}
