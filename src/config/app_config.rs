use serde::Deserialize;

use crate::infrastructure::serial_key::KeyIssuanceConfig;
use crate::infrastructure::storage::{
    FirestoreConfig, PostgresConfig, StorageConfig, StorageType,
};

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub storage: StorageSettings,
    pub cors: CorsConfig,
    pub keys: KeyIssuanceConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Storage backend selection and per-backend settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// `memory`, `postgres` or `firestore`
    pub backend: String,
    /// Collection (or table) holding the serial key documents
    pub collection: String,
    pub firestore: FirestoreConfig,
    pub postgres: PostgresConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: "firestore".to_string(),
            collection: "serial_keys".to_string(),
            firestore: FirestoreConfig::default(),
            postgres: PostgresConfig::default(),
        }
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Resolve the configured backend into a storage configuration
    pub fn storage_config(&self) -> Result<StorageConfig, config::ConfigError> {
        let backend = StorageType::from_str(&self.storage.backend).ok_or_else(|| {
            config::ConfigError::Message(format!(
                "Unknown storage backend '{}'",
                self.storage.backend
            ))
        })?;

        Ok(match backend {
            StorageType::InMemory => StorageConfig::in_memory(),
            StorageType::Postgres => StorageConfig::postgres(self.storage.postgres.clone()),
            StorageType::Firestore => StorageConfig::firestore(self.storage.firestore.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Pretty);
        assert_eq!(config.storage.backend, "firestore");
        assert_eq!(config.storage.collection, "serial_keys");
        assert!(config.cors.enabled);
        assert!(!config.keys.reject_collisions);
        assert_eq!(config.keys.max_generation_attempts, 5);
    }

    #[test]
    fn test_storage_config_resolution() {
        let mut config = AppConfig::default();
        assert_eq!(
            config.storage_config().unwrap().storage_type(),
            StorageType::Firestore
        );

        config.storage.backend = "memory".to_string();
        assert_eq!(
            config.storage_config().unwrap().storage_type(),
            StorageType::InMemory
        );

        config.storage.backend = "firebase".to_string();
        assert_eq!(
            config.storage_config().unwrap().storage_type(),
            StorageType::Firestore
        );

        config.storage.backend = "pg".to_string();
        assert_eq!(
            config.storage_config().unwrap().storage_type(),
            StorageType::Postgres
        );

        config.storage.backend = "cassandra".to_string();
        assert!(config.storage_config().is_err());
    }

    #[test]
    fn test_deserialize_partial_sources() {
        let config: AppConfig = config::Config::builder()
            .set_override("server.port", 9000)
            .unwrap()
            .set_override("logging.format", "json")
            .unwrap()
            .set_override("storage.backend", "firestore")
            .unwrap()
            .set_override("storage.firestore.project_id", "demo")
            .unwrap()
            .set_override("keys.reject_collisions", true)
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.storage.firestore.project_id.as_deref(), Some("demo"));
        assert!(config.keys.reject_collisions);
        assert_eq!(config.keys.max_generation_attempts, 5);
    }
}
