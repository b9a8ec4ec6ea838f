//! Application state for shared services

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::domain::serial_key::{KeyPlan, RecordField, SerialKeyRecord, SerialKeyRepository};
use crate::domain::DomainError;
use crate::infrastructure::serial_key::SerialKeyService;

/// Application state containing shared services using dynamic dispatch
#[derive(Clone)]
pub struct AppState {
    pub serial_key_service: Arc<dyn SerialKeyServiceTrait>,
}

/// Trait for serial key service operations
#[async_trait::async_trait]
pub trait SerialKeyServiceTrait: Send + Sync {
    async fn issue(&self, plan: KeyPlan, customer: &str) -> Result<SerialKeyRecord, DomainError>;
    async fn list(&self) -> Result<Vec<SerialKeyRecord>, DomainError>;
    async fn project(&self, field: RecordField) -> Result<Vec<Map<String, Value>>, DomainError>;
    async fn search(&self, keyword: &str) -> Result<Vec<SerialKeyRecord>, DomainError>;
    async fn validate(&self, serial: &str) -> Result<Vec<SerialKeyRecord>, DomainError>;
    async fn count(&self) -> Result<usize, DomainError>;
}

#[async_trait::async_trait]
impl<R: SerialKeyRepository + 'static> SerialKeyServiceTrait for SerialKeyService<R> {
    async fn issue(&self, plan: KeyPlan, customer: &str) -> Result<SerialKeyRecord, DomainError> {
        SerialKeyService::issue(self, plan, customer).await
    }

    async fn list(&self) -> Result<Vec<SerialKeyRecord>, DomainError> {
        SerialKeyService::list(self).await
    }

    async fn project(&self, field: RecordField) -> Result<Vec<Map<String, Value>>, DomainError> {
        SerialKeyService::project(self, field).await
    }

    async fn search(&self, keyword: &str) -> Result<Vec<SerialKeyRecord>, DomainError> {
        SerialKeyService::search(self, keyword).await
    }

    async fn validate(&self, serial: &str) -> Result<Vec<SerialKeyRecord>, DomainError> {
        SerialKeyService::validate(self, serial).await
    }

    async fn count(&self) -> Result<usize, DomainError> {
        SerialKeyService::count(self).await
    }
}

impl AppState {
    pub fn new(serial_key_service: Arc<dyn SerialKeyServiceTrait>) -> Self {
        Self { serial_key_service }
    }
}
