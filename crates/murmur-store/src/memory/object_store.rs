//! In-memory object store.

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use tracing::info;
use uuid::Uuid;

use murmur_core::result::AppResult;
use murmur_core::traits::{ObjectMetadata, ObjectStore, StoredObject};

/// Keeps uploaded objects in process memory.
#[derive(Debug)]
pub struct MemoryObjectStore {
    /// Prefix for generated URLs, e.g. `https://cdn.example.com/files`.
    base_url: String,
    objects: DashMap<String, (Bytes, ObjectMetadata)>,
}

impl MemoryObjectStore {
    /// Create an empty store whose URLs start with `base_url`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            objects: DashMap::new(),
        }
    }

    /// Fetch an object's bytes.
    pub fn get(&self, public_id: &str) -> Option<Bytes> {
        self.objects.get(public_id).map(|o| o.value().0.clone())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn upload(&self, data: Bytes, metadata: ObjectMetadata) -> AppResult<StoredObject> {
        let public_id = Uuid::new_v4().simple().to_string();
        let url = match &metadata.file_name {
            Some(name) => format!("{}/{public_id}/{name}", self.base_url),
            None => format!("{}/{public_id}", self.base_url),
        };

        info!(public_id = %public_id, size = data.len(), "Object uploaded");
        self.objects.insert(public_id.clone(), (data, metadata));

        Ok(StoredObject { url, public_id })
    }

    async fn delete_by_public_id(&self, public_id: &str) -> AppResult<bool> {
        Ok(self.objects.remove(public_id).is_some())
    }
}
