use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocStoreError {
    #[error("document not found: {0}")]
    NotFound(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("document store unavailable: {0}")]
    Unavailable(String),
}

impl From<serde_json::Error> for DocStoreError {
    fn from(err: serde_json::Error) -> Self {
        DocStoreError::Serialization(err.to_string())
    }
}
