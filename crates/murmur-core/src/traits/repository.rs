//! Generic document repository trait.

use async_trait::async_trait;

use crate::result::AppResult;

/// A persisted document addressable by a primary key.
pub trait Document: Clone + std::fmt::Debug + Send + Sync + serde::Serialize + 'static {
    /// Primary key type.
    type Id: Clone + Eq + std::hash::Hash + std::fmt::Debug + Send + Sync + 'static;

    /// Return the document's primary key.
    fn id(&self) -> Self::Id;
}

/// Minimal document-store contract.
///
/// Each call is independent; nothing here spans multiple entities, so
/// implementations need no transactions.
#[async_trait]
pub trait Repository<Entity, Id>: Send + Sync + 'static
where
    Entity: Send + Sync + 'static + serde::Serialize,
    Id: Send + Sync + 'static,
{
    /// Insert or replace the entity and return the stored version.
    async fn save(&self, entity: Entity) -> AppResult<Entity>;

    /// Find an entity by its primary key.
    async fn find_by_id(&self, id: &Id) -> AppResult<Option<Entity>>;

    /// Find every entity whose serialized `field` equals `value`.
    async fn find_by_field(&self, field: &str, value: &serde_json::Value)
    -> AppResult<Vec<Entity>>;

    /// Delete an entity by its primary key. Returns `true` if deleted.
    async fn delete_by_id(&self, id: &Id) -> AppResult<bool>;
}
