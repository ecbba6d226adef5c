//! In-memory document repository.

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;

use murmur_core::result::AppResult;
use murmur_core::traits::{Document, Repository};

/// A document store keyed by each document's primary key.
#[derive(Debug)]
pub struct MemoryRepository<E: Document> {
    documents: DashMap<E::Id, E>,
}

impl<E: Document> MemoryRepository<E> {
    /// Create an empty repository.
    pub fn new() -> Self {
        Self {
            documents: DashMap::new(),
        }
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the repository is empty.
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl<E: Document> Default for MemoryRepository<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: Document> Repository<E, E::Id> for MemoryRepository<E> {
    async fn save(&self, entity: E) -> AppResult<E> {
        self.documents.insert(entity.id(), entity.clone());
        Ok(entity)
    }

    async fn find_by_id(&self, id: &E::Id) -> AppResult<Option<E>> {
        Ok(self.documents.get(id).map(|doc| doc.value().clone()))
    }

    async fn find_by_field(
        &self,
        field: &str,
        value: &serde_json::Value,
    ) -> AppResult<Vec<E>> {
        // Snapshot first so no shard lock is held while serializing.
        let snapshot: Vec<E> = self.documents.iter().map(|d| d.value().clone()).collect();

        let mut matches = Vec::new();
        for doc in snapshot {
            let json = serde_json::to_value(&doc)?;
            if json.get(field) == Some(value) {
                matches.push(doc);
            }
        }

        debug!(field, count = matches.len(), "Field lookup");
        Ok(matches)
    }

    async fn delete_by_id(&self, id: &E::Id) -> AppResult<bool> {
        Ok(self.documents.remove(id).is_some())
    }
}
