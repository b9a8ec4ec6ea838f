//! Storage domain - Generic document storage abstraction layer

mod entity;
mod repository;

pub use entity::{StorageEntity, StorageKey};
pub use repository::Storage;
pub(crate) use repository::field_value;

#[cfg(test)]
pub use repository::mock;
