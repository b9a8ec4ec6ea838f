//! Serial key repository trait

use async_trait::async_trait;

use super::entity::{SerialKey, SerialKeyRecord};
use crate::domain::DomainError;

#[cfg(test)]
use mockall::automock;

/// Gateway to the collection of issued serial keys
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SerialKeyRepository: Send + Sync {
    /// Writes a record at its serial key, overwriting any existing document
    async fn write(&self, record: SerialKeyRecord) -> Result<SerialKeyRecord, DomainError>;

    /// Checks whether a document already exists at the given key
    async fn exists(&self, serial_key: &SerialKey) -> Result<bool, DomainError>;

    /// Returns every stored record
    async fn scan_all(&self) -> Result<Vec<SerialKeyRecord>, DomainError>;

    /// Returns the records whose stored `serial_key` field equals `serial`
    async fn lookup_exact(&self, serial: &str) -> Result<Vec<SerialKeyRecord>, DomainError>;

    /// Returns the number of stored records
    async fn count(&self) -> Result<usize, DomainError>;
}
