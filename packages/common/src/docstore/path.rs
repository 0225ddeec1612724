use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::DocStoreError;

fn validate_segment(segment: &str) -> Result<(), DocStoreError> {
    if segment.is_empty() || segment.len() > 128 {
        return Err(DocStoreError::InvalidPath(format!(
            "segment must be 1-128 bytes, got {:?}",
            segment
        )));
    }
    if segment == "." || segment == ".." {
        return Err(DocStoreError::InvalidPath(format!(
            "segment {segment:?} is reserved"
        )));
    }
    if segment.chars().any(|c| c == '/' || c.is_control()) {
        return Err(DocStoreError::InvalidPath(format!(
            "segment {segment:?} contains '/' or control characters"
        )));
    }
    Ok(())
}

/// Path to a collection: an odd number of segments (`users`, `collections/{id}/photos`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CollectionPath(String);

impl CollectionPath {
    /// A top-level collection.
    pub fn root(name: &str) -> Result<Self, DocStoreError> {
        validate_segment(name)?;
        Ok(Self(name.to_string()))
    }

    /// Parse a full `/`-separated collection path.
    pub fn parse(path: &str) -> Result<Self, DocStoreError> {
        let segments: Vec<&str> = path.split('/').collect();
        if segments.len() % 2 == 0 {
            return Err(DocStoreError::InvalidPath(format!(
                "'{path}' names a document, not a collection"
            )));
        }
        for segment in &segments {
            validate_segment(segment)?;
        }
        Ok(Self(path.to_string()))
    }

    /// Reference a document in this collection.
    pub fn doc(&self, id: &str) -> Result<DocPath, DocStoreError> {
        validate_segment(id)?;
        Ok(DocPath {
            collection: self.clone(),
            id: id.to_string(),
        })
    }

    /// Name of the top-level collection this path lives under.
    pub fn root_name(&self) -> &str {
        self.0.split('/').next().unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CollectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CollectionPath {
    type Error = DocStoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CollectionPath> for String {
    fn from(path: CollectionPath) -> Self {
        path.0
    }
}

/// Path to a single document.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocPath {
    collection: CollectionPath,
    id: String,
}

impl DocPath {
    pub fn collection(&self) -> &CollectionPath {
        &self.collection
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Reference a collection nested under this document.
    pub fn sub_collection(&self, name: &str) -> Result<CollectionPath, DocStoreError> {
        validate_segment(name)?;
        Ok(CollectionPath(format!("{}/{}/{}", self.collection, self.id, name)))
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.collection, self.id)
    }
}
