//! Hierarchical document store: collections of documents, each document
//! optionally owning named sub-collections (`collections/{id}/photos/{id}`).

mod document;
mod error;
mod path;
mod query;
mod traits;

pub mod memory;

pub use document::{Document, Fields, to_fields};
pub use error::DocStoreError;
pub use path::{CollectionPath, DocPath};
pub use query::{Direction, OrderKey, Query};
pub use traits::{BatchWrite, ChangeEvent, ChangeKind, DocumentStore};
