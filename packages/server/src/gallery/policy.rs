use super::error::GalleryError;

/// The account that destructive operations must never touch.
#[derive(Debug, Clone)]
pub struct ProtectedIdentity {
    name: String,
}

impl ProtectedIdentity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into().trim().to_lowercase(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Case-insensitive match against the protected name.
    pub fn is_protected(&self, candidate: &str) -> bool {
        !self.name.is_empty() && candidate.trim().to_lowercase() == self.name
    }

    /// Reject a deletion aimed at the protected account.
    pub fn ensure_deletable(&self, candidate: &str) -> Result<(), GalleryError> {
        if self.is_protected(candidate) {
            return Err(GalleryError::Prohibited(format!(
                "The '{}' user cannot be deleted",
                self.name
            )));
        }
        Ok(())
    }
}
