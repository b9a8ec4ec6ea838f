//! Storage-backed serial key repository implementation

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::serial_key::{RecordField, SerialKey, SerialKeyRecord, SerialKeyRepository};
use crate::domain::storage::Storage;
use crate::domain::DomainError;

/// Storage-backed implementation of SerialKeyRepository
#[derive(Debug, Clone)]
pub struct StorageSerialKeyRepository {
    storage: Arc<dyn Storage<SerialKeyRecord>>,
}

impl StorageSerialKeyRepository {
    /// Create a new storage-backed repository
    pub fn new(storage: Arc<dyn Storage<SerialKeyRecord>>) -> Self {
        Self { storage }
    }
}

#[async_trait]
impl SerialKeyRepository for StorageSerialKeyRepository {
    async fn write(&self, record: SerialKeyRecord) -> Result<SerialKeyRecord, DomainError> {
        self.storage.save(record).await
    }

    async fn exists(&self, serial_key: &SerialKey) -> Result<bool, DomainError> {
        self.storage.exists(serial_key).await
    }

    async fn scan_all(&self) -> Result<Vec<SerialKeyRecord>, DomainError> {
        let records = self.storage.list().await?;
        debug!(count = records.len(), "Scanned serial key collection");
        Ok(records)
    }

    async fn lookup_exact(&self, serial: &str) -> Result<Vec<SerialKeyRecord>, DomainError> {
        self.storage
            .find_by_field(RecordField::SerialKey.as_str(), serial)
            .await
    }

    async fn count(&self) -> Result<usize, DomainError> {
        self.storage.count().await
    }
}
