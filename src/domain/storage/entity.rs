//! Storage entity traits and types

use std::fmt::Debug;

use serde::{de::DeserializeOwned, Serialize};

/// Trait for types that can be used as storage keys
pub trait StorageKey: Clone + Debug + Send + Sync + Eq + std::hash::Hash {
    /// Returns the key as a string for storage backends that require string keys
    fn as_str(&self) -> &str;
}

/// Trait for types that can be stored as documents
///
/// An entity serializes to a flat JSON object. The field named by
/// [`StorageEntity::KEY_FIELD`] mirrors the document key; document stores
/// re-attach the key under that field when reading documents back.
pub trait StorageEntity: Clone + Debug + Send + Sync + Serialize + DeserializeOwned {
    /// The key type for this entity
    type Key: StorageKey;

    /// Name of the serialized field that carries the document key
    const KEY_FIELD: &'static str;

    /// Returns the entity's key
    fn key(&self) -> &Self::Key;
}
