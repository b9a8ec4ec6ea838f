//! Serial key service: issuance, inquiry, search and validation

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::domain::serial_key::{
    KeyPlan, RecordField, SerialKey, SerialKeyRecord, SerialKeyRepository,
};
use crate::domain::DomainError;

use super::generator::SerialKeyGenerator;

/// Detail returned when a serial key lookup finds nothing
pub const INVALID_SERIAL_MESSAGE: &str = "시리얼키가 유효하지 않습니다.";

/// Key issuance settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KeyIssuanceConfig {
    /// Check the store for a generated key before writing it
    pub reject_collisions: bool,
    /// Generation attempts before giving up when collisions are rejected
    pub max_generation_attempts: u32,
}

impl Default for KeyIssuanceConfig {
    fn default() -> Self {
        Self {
            reject_collisions: false,
            max_generation_attempts: 5,
        }
    }
}

/// Serial key service
#[derive(Debug)]
pub struct SerialKeyService<R: SerialKeyRepository> {
    repository: Arc<R>,
    generator: SerialKeyGenerator,
    config: KeyIssuanceConfig,
}

impl<R: SerialKeyRepository> SerialKeyService<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self::with_config(repository, KeyIssuanceConfig::default())
    }

    pub fn with_config(repository: Arc<R>, config: KeyIssuanceConfig) -> Self {
        Self {
            repository,
            generator: SerialKeyGenerator::new(),
            config,
        }
    }

    /// Issue a key for `customer` dated today (UTC)
    pub async fn issue(
        &self,
        plan: KeyPlan,
        customer: &str,
    ) -> Result<SerialKeyRecord, DomainError> {
        self.issue_on(plan, customer, Utc::now().date_naive()).await
    }

    /// Issue a key for `customer` dated `issued_on`
    pub async fn issue_on(
        &self,
        plan: KeyPlan,
        customer: &str,
        issued_on: NaiveDate,
    ) -> Result<SerialKeyRecord, DomainError> {
        let serial_key = if self.config.reject_collisions {
            self.generate_unused(plan).await?
        } else {
            self.generator.generate(plan)
        };

        let record = SerialKeyRecord::issue(serial_key, customer, plan, issued_on);

        info!(
            serial_key = %record.serial_key(),
            plan = %plan,
            customer = %record.customer(),
            end = %record.end(),
            "Issuing serial key"
        );

        self.repository.write(record).await
    }

    async fn generate_unused(&self, plan: KeyPlan) -> Result<SerialKey, DomainError> {
        let attempts = self.config.max_generation_attempts.max(1);

        for attempt in 1..=attempts {
            let candidate = self.generator.generate(plan);

            if !self.repository.exists(&candidate).await? {
                return Ok(candidate);
            }

            warn!(serial_key = %candidate, attempt, "Generated serial key already exists");
        }

        Err(DomainError::conflict(format!(
            "Could not generate an unused {} serial key after {} attempts",
            plan, attempts
        )))
    }

    /// Every stored record
    pub async fn list(&self) -> Result<Vec<SerialKeyRecord>, DomainError> {
        let records = self.repository.scan_all().await?;
        debug!(count = records.len(), "Listed serial keys");
        Ok(records)
    }

    /// One single-field object per stored record
    pub async fn project(&self, field: RecordField) -> Result<Vec<Map<String, Value>>, DomainError> {
        let records = self.repository.scan_all().await?;

        Ok(records
            .iter()
            .map(|record| {
                let mut projected = Map::new();
                projected.insert(field.as_str().to_string(), Value::String(record.field(field)));
                projected
            })
            .collect())
    }

    /// Records whose customer, create or end value contains `keyword`, ignoring case
    pub async fn search(&self, keyword: &str) -> Result<Vec<SerialKeyRecord>, DomainError> {
        let matches: Vec<_> = self
            .repository
            .scan_all()
            .await?
            .into_iter()
            .filter(|record| record.matches_keyword(keyword))
            .collect();

        debug!(keyword = %keyword, matches = matches.len(), "Searched serial keys");
        Ok(matches)
    }

    /// Records stored under exactly `serial`; an empty result is NotFound
    pub async fn validate(&self, serial: &str) -> Result<Vec<SerialKeyRecord>, DomainError> {
        let found = self.repository.lookup_exact(serial).await?;

        if found.is_empty() {
            debug!(serial = %serial, "Serial key not found");
            return Err(DomainError::not_found(INVALID_SERIAL_MESSAGE));
        }

        Ok(found)
    }

    /// Number of stored records
    pub async fn count(&self) -> Result<usize, DomainError> {
        self.repository.count().await
    }
}
