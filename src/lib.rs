//! Serial Key Service
//!
//! Issues time-bound license serial keys bound to a customer name and answers
//! inquiry, search and validation requests over HTTP. Keys are stored as
//! documents in a pluggable backend:
//! - Firestore (REST API, service-account or emulator auth)
//! - PostgreSQL JSONB table
//! - In-memory (development and tests)

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use api::state::AppState;
use domain::serial_key::SerialKeyRecord;
use domain::storage::Storage;
use infrastructure::serial_key::{SerialKeyService, StorageSerialKeyRepository};
use infrastructure::storage::StorageFactory;

/// Create the application state with custom configuration
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let storage_config = config
        .storage_config()
        .context("Invalid storage configuration")?;

    let storage: Arc<dyn Storage<SerialKeyRecord>> =
        StorageFactory::create(&storage_config, &config.storage.collection)
            .await
            .with_context(|| {
                format!(
                    "Failed to initialize {:?} storage",
                    storage_config.storage_type()
                )
            })?;

    info!(
        backend = ?storage_config.storage_type(),
        collection = %config.storage.collection,
        reject_collisions = config.keys.reject_collisions,
        "Key store ready"
    );

    Ok(create_app_state_with_storage(storage, config))
}

/// Build the application state over an already constructed key store
pub fn create_app_state_with_storage(
    storage: Arc<dyn Storage<SerialKeyRecord>>,
    config: &AppConfig,
) -> AppState {
    let repository = Arc::new(StorageSerialKeyRepository::new(storage));
    let service = SerialKeyService::with_config(repository, config.keys.clone());

    AppState::new(Arc::new(service))
}
