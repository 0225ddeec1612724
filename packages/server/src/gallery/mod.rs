//! Photo collections, their users, and the cascading deletes that tie
//! document records to object-storage blobs.

pub mod cascade;
pub mod directory;
pub mod error;
pub mod model;
pub mod policy;
pub mod repository;
pub mod watch;

#[cfg(test)]
mod testing;

pub use cascade::{CascadeDeleter, DeletionReport};
pub use directory::{UserDirectory, UserRecord};
pub use error::GalleryError;
pub use model::{
    Collection, CollectionView, NewPhoto, NewVariant, Photo, PhotoVariant, PhotoView, User,
};
pub use policy::ProtectedIdentity;
pub use repository::{AddFailure, AddOutcome, GalleryRepository};
pub use watch::{GallerySnapshot, GalleryWatch};
