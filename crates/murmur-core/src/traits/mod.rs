//! Collaborator traits defined in `murmur-core` and implemented by other crates.

pub mod notice;
pub mod object_store;
pub mod repository;

pub use notice::NoticeSender;
pub use object_store::{ObjectMetadata, ObjectStore, StoredObject};
pub use repository::{Document, Repository};
