use async_trait::async_trait;
use futures::future::try_join_all;
use s3::creds::Credentials;
use s3::error::S3Error;
use s3::{Bucket, Region};
use tracing::debug;

use super::error::StorageError;
use super::traits::{ObjectStore, PutOptions, validate_object_name};

/// Connection settings for an S3-compatible bucket.
#[derive(Debug, Clone)]
pub struct S3Options {
    pub bucket: String,
    pub region: String,
    /// Custom endpoint for S3-compatible services (MinIO, R2, ...).
    pub endpoint: Option<String>,
    pub access_key: String,
    pub secret_key: String,
    /// Base URL objects are publicly reachable under. Defaults to `{endpoint}/{bucket}`.
    pub public_base_url: Option<String>,
}

/// Object store backed by an S3-compatible bucket.
///
/// Public readability is governed by the bucket policy; `PutOptions::public_access`
/// is not translated into per-object ACLs.
pub struct S3ObjectStore {
    bucket: Box<Bucket>,
    public_base_url: String,
}

fn backend_err(err: impl std::fmt::Display) -> StorageError {
    StorageError::Backend(err.to_string())
}

impl S3ObjectStore {
    pub fn new(options: S3Options) -> Result<Self, StorageError> {
        let region = match &options.endpoint {
            Some(endpoint) => Region::Custom {
                region: options.region.clone(),
                endpoint: endpoint.clone(),
            },
            None => options.region.parse().map_err(backend_err)?,
        };

        let credentials = Credentials::new(
            Some(&options.access_key),
            Some(&options.secret_key),
            None,
            None,
            None,
        )
        .map_err(backend_err)?;

        let bucket = Bucket::new(&options.bucket, region, credentials)
            .map_err(backend_err)?
            .with_path_style();

        let public_base_url = match options.public_base_url {
            Some(url) => url,
            None => match &options.endpoint {
                Some(endpoint) => format!("{}/{}", endpoint.trim_end_matches('/'), options.bucket),
                None => format!(
                    "https://{}.s3.{}.amazonaws.com",
                    options.bucket, options.region
                ),
            },
        }
        .trim_end_matches('/')
        .to_string();

        Ok(Self {
            bucket,
            public_base_url,
        })
    }

    async fn delete_key(&self, key: &str) -> Result<(), StorageError> {
        match self.bucket.delete_object(key).await {
            Ok(response) if (200..300).contains(&response.status_code()) => Ok(()),
            Ok(response) if response.status_code() == 404 => Ok(()),
            Ok(response) => Err(StorageError::Backend(format!(
                "delete of '{key}' answered {}",
                response.status_code()
            ))),
            Err(S3Error::HttpFailWithBody(404, _)) => Ok(()),
            Err(e) => Err(backend_err(e)),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put(
        &self,
        object_name: &str,
        data: &[u8],
        options: &PutOptions,
    ) -> Result<String, StorageError> {
        validate_object_name(object_name)?;
        let content_type = options
            .content_type
            .as_deref()
            .unwrap_or("application/octet-stream");

        let response = self
            .bucket
            .put_object_with_content_type(object_name, data, content_type)
            .await
            .map_err(backend_err)?;

        let status = response.status_code();
        if !(200..300).contains(&status) {
            return Err(StorageError::Backend(format!(
                "upload of '{object_name}' answered {status}"
            )));
        }

        debug!(object_name, status, "Stored object in bucket");
        Ok(format!("{}/{}", self.public_base_url, object_name))
    }

    async fn delete_many(&self, urls: &[String]) -> Result<(), StorageError> {
        let keys = urls
            .iter()
            .map(|url| self.object_name(url))
            .collect::<Result<Vec<_>, _>>()?;

        try_join_all(keys.into_iter().map(|key| self.delete_key(key))).await?;
        Ok(())
    }

    async fn exists(&self, url: &str) -> Result<bool, StorageError> {
        let key = self.object_name(url)?;
        match self.bucket.head_object(key).await {
            Ok((_, status)) => Ok((200..300).contains(&status)),
            Err(S3Error::HttpFailWithBody(404, _)) => Ok(false),
            Err(e) => Err(backend_err(e)),
        }
    }

    fn object_name<'a>(&self, url: &'a str) -> Result<&'a str, StorageError> {
        let key = url
            .strip_prefix(self.public_base_url.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| StorageError::ForeignUrl(url.to_string()))?;
        validate_object_name(key)?;
        Ok(key)
    }
}
