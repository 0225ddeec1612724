use std::fmt;
use std::sync::Arc;

/// Returned when a call site reaches a service that was never configured.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotConfigured(pub String);

impl fmt::Display for NotConfigured {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for NotConfigured {}

/// Handle to an externally hosted service.
///
/// Handles are built once at startup and passed to the services that need
/// them. A missing credential produces `NotConfigured` instead of a client,
/// and every call site has to go through [`Backend::get`] before using it.
pub enum Backend<T: ?Sized> {
    Ready(Arc<T>),
    NotConfigured(String),
}

impl<T: ?Sized> Backend<T> {
    pub fn ready(inner: Arc<T>) -> Self {
        Self::Ready(inner)
    }

    pub fn not_configured(reason: impl Into<String>) -> Self {
        Self::NotConfigured(reason.into())
    }

    /// Borrow the client, or report why it is unavailable.
    pub fn get(&self) -> Result<&Arc<T>, NotConfigured> {
        match self {
            Self::Ready(inner) => Ok(inner),
            Self::NotConfigured(reason) => Err(NotConfigured(reason.clone())),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

impl<T: ?Sized> Clone for Backend<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Ready(inner) => Self::Ready(Arc::clone(inner)),
            Self::NotConfigured(reason) => Self::NotConfigured(reason.clone()),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Backend<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(_) => f.write_str("Backend::Ready"),
            Self::NotConfigured(reason) => write!(f, "Backend::NotConfigured({reason})"),
        }
    }
}
