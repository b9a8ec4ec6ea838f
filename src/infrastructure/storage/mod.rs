//! Storage infrastructure - Storage implementations

mod factory;
pub mod firestore;
mod in_memory;
mod postgres;

pub use factory::{StorageConfig, StorageFactory, StorageType};
pub use firestore::{FirestoreConfig, FirestoreStorage};
pub use in_memory::InMemoryStorage;
pub use postgres::{PostgresConfig, PostgresStorage};
