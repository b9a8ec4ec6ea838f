//! Storage factory for runtime storage selection

use std::sync::Arc;

use tracing::info;

use crate::domain::storage::{Storage, StorageEntity};
use crate::domain::DomainError;

use super::firestore::{FirestoreConfig, FirestoreStorage};
use super::in_memory::InMemoryStorage;
use super::postgres::{PostgresConfig, PostgresStorage};

/// Supported storage types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageType {
    /// In-memory storage (for testing/development)
    InMemory,
    /// PostgreSQL JSONB document table
    Postgres,
    /// Google Cloud Firestore
    Firestore,
}

impl StorageType {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "memory" | "inmemory" | "in-memory" | "in_memory" => Some(Self::InMemory),
            "postgres" | "postgresql" | "pg" => Some(Self::Postgres),
            "firestore" | "firebase" => Some(Self::Firestore),
            _ => None,
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone)]
pub enum StorageConfig {
    /// In-memory storage configuration
    InMemory,
    /// PostgreSQL storage configuration
    Postgres(PostgresConfig),
    /// Firestore storage configuration
    Firestore(FirestoreConfig),
}

impl StorageConfig {
    /// Creates an in-memory storage configuration
    pub fn in_memory() -> Self {
        Self::InMemory
    }

    /// Creates a PostgreSQL storage configuration
    pub fn postgres(config: PostgresConfig) -> Self {
        Self::Postgres(config)
    }

    /// Creates a Firestore storage configuration
    pub fn firestore(config: FirestoreConfig) -> Self {
        Self::Firestore(config)
    }

    /// Returns the storage type
    pub fn storage_type(&self) -> StorageType {
        match self {
            Self::InMemory => StorageType::InMemory,
            Self::Postgres(_) => StorageType::Postgres,
            Self::Firestore(_) => StorageType::Firestore,
        }
    }
}

/// Factory for creating storage instances
#[derive(Debug)]
pub struct StorageFactory;

impl StorageFactory {
    /// Creates a storage instance for `collection` based on the configuration
    pub async fn create<E>(
        config: &StorageConfig,
        collection: &str,
    ) -> Result<Arc<dyn Storage<E>>, DomainError>
    where
        E: StorageEntity + 'static,
    {
        info!(
            backend = ?config.storage_type(),
            collection = %collection,
            "Creating storage"
        );

        match config {
            StorageConfig::InMemory => Ok(Arc::new(InMemoryStorage::<E>::new())),
            StorageConfig::Postgres(pg_config) => {
                let storage = PostgresStorage::<E>::connect(pg_config, collection).await?;
                storage.ensure_table().await?;
                Ok(Arc::new(storage))
            }
            StorageConfig::Firestore(fs_config) => {
                let storage = FirestoreStorage::<E>::connect(fs_config, collection)?;
                Ok(Arc::new(storage))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::serial_key::SerialKeyRecord;

    #[test]
    fn test_storage_type_from_str() {
        assert_eq!(
            StorageType::from_str("memory"),
            Some(StorageType::InMemory)
        );
        assert_eq!(
            StorageType::from_str("in-memory"),
            Some(StorageType::InMemory)
        );
        assert_eq!(
            StorageType::from_str("postgresql"),
            Some(StorageType::Postgres)
        );
        assert_eq!(StorageType::from_str("pg"), Some(StorageType::Postgres));
        assert_eq!(
            StorageType::from_str("Firestore"),
            Some(StorageType::Firestore)
        );
        assert_eq!(
            StorageType::from_str("firebase"),
            Some(StorageType::Firestore)
        );
        assert_eq!(StorageType::from_str("unknown"), None);
    }

    #[test]
    fn test_storage_config_types() {
        let in_memory = StorageConfig::in_memory();
        assert_eq!(in_memory.storage_type(), StorageType::InMemory);

        let postgres = StorageConfig::postgres(PostgresConfig::default());
        assert_eq!(postgres.storage_type(), StorageType::Postgres);

        let firestore = StorageConfig::firestore(FirestoreConfig::default());
        assert_eq!(firestore.storage_type(), StorageType::Firestore);
    }

    #[tokio::test]
    async fn test_create_in_memory_storage() {
        let storage = StorageFactory::create::<SerialKeyRecord>(&StorageConfig::in_memory(), "serial_keys")
            .await
            .unwrap();

        assert_eq!(storage.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_create_firestore_with_missing_credentials() {
        let mut config = FirestoreConfig::default()
            .with_credentials_path("/nonexistent/admin.json")
            .with_project_id("demo");
        config.credentials_env = "SERIAL_KEY_TEST_UNSET_CREDENTIALS".to_string();

        let result =
            StorageFactory::create::<SerialKeyRecord>(&StorageConfig::firestore(config), "serial_keys")
                .await;

        // Only meaningful when no emulator is configured in the environment
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_err() {
            assert!(matches!(result, Err(DomainError::Credential { .. })));
        }
    }
}
