//! Storage trait definition

use std::fmt::Debug;

use async_trait::async_trait;

use crate::domain::DomainError;

use super::entity::StorageEntity;

/// Generic document storage for one collection of entities
///
/// Documents are written whole and never partially updated. There is no
/// delete operation; removing documents is an administrative action against
/// the backing store.
#[async_trait]
pub trait Storage<E>: Send + Sync + Debug
where
    E: StorageEntity + 'static,
{
    /// Retrieves an entity by its document key
    async fn get(&self, key: &E::Key) -> Result<Option<E>, DomainError>;

    /// Retrieves every entity in the collection, in backend enumeration order
    async fn list(&self) -> Result<Vec<E>, DomainError>;

    /// Writes an entity at its key, replacing any existing document
    async fn save(&self, entity: E) -> Result<E, DomainError>;

    /// Retrieves entities whose stored string field equals `value`
    ///
    /// The filter is evaluated by the backend where it supports queries.
    async fn find_by_field(&self, field: &str, value: &str) -> Result<Vec<E>, DomainError>;

    /// Checks if an entity exists by its key
    async fn exists(&self, key: &E::Key) -> Result<bool, DomainError> {
        Ok(self.get(key).await?.is_some())
    }

    /// Returns the count of entities
    async fn count(&self) -> Result<usize, DomainError> {
        Ok(self.list().await?.len())
    }
}

/// Reads a stored string field from an entity's JSON form
pub(crate) fn field_value<E: StorageEntity>(entity: &E, field: &str) -> Option<String> {
    let value = serde_json::to_value(entity).ok()?;

    match value.get(field)? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Null => None,
        other => Some(other.to_string()),
    }
}
