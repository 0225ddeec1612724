use std::path::PathBuf;

use async_trait::async_trait;
use tokio::fs;

use super::error::StorageError;
use super::traits::{ObjectStore, PutOptions, validate_object_name};

/// Filesystem-backed object store.
///
/// Objects live at `{base_path}/{object_name}` and are published under
/// `{public_base_url}/{object_name}`, typically by a static file route.
pub struct FilesystemObjectStore {
    base_path: PathBuf,
    public_base_url: String,
    max_size: u64,
}

impl FilesystemObjectStore {
    /// Create a new filesystem object store.
    pub async fn new(
        base_path: PathBuf,
        public_base_url: impl Into<String>,
        max_size: u64,
    ) -> Result<Self, StorageError> {
        fs::create_dir_all(&base_path).await?;
        fs::create_dir_all(base_path.join(".tmp")).await?;
        Ok(Self {
            base_path,
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            max_size,
        })
    }

    pub fn base_path(&self) -> &PathBuf {
        &self.base_path
    }

    fn object_path(&self, name: &str) -> PathBuf {
        self.base_path.join(name)
    }

    /// Path for a temporary file during writes.
    fn temp_path(&self) -> PathBuf {
        self.base_path
            .join(".tmp")
            .join(uuid::Uuid::new_v4().to_string())
    }

    fn url_for(&self, name: &str) -> String {
        format!("{}/{}", self.public_base_url, name)
    }
}

#[async_trait]
impl ObjectStore for FilesystemObjectStore {
    async fn put(
        &self,
        object_name: &str,
        data: &[u8],
        _options: &PutOptions,
    ) -> Result<String, StorageError> {
        validate_object_name(object_name)?;
        if object_name.starts_with(".tmp/") {
            return Err(StorageError::InvalidObjectName(format!(
                "'{object_name}' is reserved"
            )));
        }
        if data.len() as u64 > self.max_size {
            return Err(StorageError::SizeLimitExceeded {
                actual: data.len() as u64,
                limit: self.max_size,
            });
        }

        let object_path = self.object_path(object_name);
        let temp_path = self.temp_path();
        if let Err(e) = fs::write(&temp_path, data).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        if let Some(parent) = object_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        if let Err(e) = fs::rename(&temp_path, &object_path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e.into());
        }

        Ok(self.url_for(object_name))
    }

    async fn delete_many(&self, urls: &[String]) -> Result<(), StorageError> {
        let names = urls
            .iter()
            .map(|url| self.object_name(url))
            .collect::<Result<Vec<_>, _>>()?;

        for name in names {
            match fs::remove_file(self.object_path(name)).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    async fn exists(&self, url: &str) -> Result<bool, StorageError> {
        let name = self.object_name(url)?;
        Ok(fs::try_exists(self.object_path(name)).await?)
    }

    fn object_name<'a>(&self, url: &'a str) -> Result<&'a str, StorageError> {
        let name = url
            .strip_prefix(self.public_base_url.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| StorageError::ForeignUrl(url.to_string()))?;
        if name.starts_with(".tmp/") {
            return Err(StorageError::ForeignUrl(url.to_string()));
        }
        validate_object_name(name)?;
        Ok(name)
    }
}
