//! Domain layer - Core business logic and entities

pub mod error;
pub mod serial_key;
pub mod storage;

pub use error::DomainError;
pub use serial_key::{KeyPlan, RecordField, SerialKey, SerialKeyRecord, SerialKeyRepository};
pub use storage::{Storage, StorageEntity, StorageKey};
