//! Binary object storage trait.

use async_trait::async_trait;
use bytes::Bytes;

use crate::result::AppResult;

/// Metadata supplied alongside an upload.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct ObjectMetadata {
    /// Original file name, if the client sent one.
    pub file_name: Option<String>,
    /// MIME type (if known).
    pub content_type: Option<String>,
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StoredObject {
    /// Publicly reachable URL.
    pub url: String,
    /// Handle used to delete the object later.
    pub public_id: String,
}

/// Trait for object storage backends.
#[async_trait]
pub trait ObjectStore: Send + Sync + std::fmt::Debug + 'static {
    /// Store `data` and return where it can be fetched.
    async fn upload(&self, data: Bytes, metadata: ObjectMetadata) -> AppResult<StoredObject>;

    /// Remove an object. Returns `false` when no such object existed.
    async fn delete_by_public_id(&self, public_id: &str) -> AppResult<bool>;
}
