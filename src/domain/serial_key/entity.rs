//! Serial key entity and related types

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::validation::{validate_serial_key, SerialKeyValidationError};
use crate::domain::storage::{StorageEntity, StorageKey};

/// Serial key identifier - `PXXX-XXXX-XXXX-XXXX` with a plan prefix letter
///
/// The format is enforced when a key is created. Keys read back from storage
/// are taken as stored, so documents written by other tools stay readable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SerialKey(String);

impl SerialKey {
    /// Create a new SerialKey after validation
    pub fn new(key: impl Into<String>) -> Result<Self, SerialKeyValidationError> {
        let key = key.into();
        validate_serial_key(&key)?;
        Ok(Self(key))
    }

    /// Wrap a key produced by the generator, which always emits the valid format
    pub(crate) fn from_generated(key: String) -> Self {
        debug_assert!(super::validation::is_valid_format(&key));
        Self(key)
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SerialKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl StorageKey for SerialKey {
    fn as_str(&self) -> &str {
        &self.0
    }
}

/// License plan, selecting the key prefix and validity window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyPlan {
    /// 30-day key, prefix `M`
    Monthly,
    /// 365-day key, prefix `Y`
    Yearly,
}

impl KeyPlan {
    /// Key prefix letter for this plan
    pub fn prefix(&self) -> char {
        match self {
            Self::Monthly => 'M',
            Self::Yearly => 'Y',
        }
    }

    /// Number of days a key of this plan stays valid
    pub fn validity_days(&self) -> i64 {
        match self {
            Self::Monthly => 30,
            Self::Yearly => 365,
        }
    }
}

impl std::fmt::Display for KeyPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Monthly => write!(f, "monthly"),
            Self::Yearly => write!(f, "yearly"),
        }
    }
}

/// A single stored field of a serial key record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordField {
    SerialKey,
    Create,
    End,
    Customer,
}

impl RecordField {
    /// Serialized field name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SerialKey => "serial_key",
            Self::Create => "create",
            Self::End => "end",
            Self::Customer => "customer",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "serial_key" => Some(Self::SerialKey),
            "create" => Some(Self::Create),
            "end" => Some(Self::End),
            "customer" => Some(Self::Customer),
            _ => None,
        }
    }
}

impl std::fmt::Display for RecordField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An issued serial key
///
/// Records are written once at issuance and never modified afterwards.
/// `end` is always `create` plus the validity window of the key's plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialKeyRecord {
    serial_key: SerialKey,
    customer: String,
    create: NaiveDate,
    end: NaiveDate,
}

impl SerialKeyRecord {
    /// Build the record for a key issued on `issued_on` under `plan`
    pub fn issue(
        serial_key: SerialKey,
        customer: impl Into<String>,
        plan: KeyPlan,
        issued_on: NaiveDate,
    ) -> Self {
        Self {
            serial_key,
            customer: customer.into(),
            create: issued_on,
            end: issued_on + Duration::days(plan.validity_days()),
        }
    }

    pub fn serial_key(&self) -> &SerialKey {
        &self.serial_key
    }

    pub fn customer(&self) -> &str {
        &self.customer
    }

    pub fn create(&self) -> NaiveDate {
        self.create
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// String form of a field as it appears in the stored document
    pub fn field(&self, field: RecordField) -> String {
        match field {
            RecordField::SerialKey => self.serial_key.to_string(),
            RecordField::Create => self.create.format("%Y-%m-%d").to_string(),
            RecordField::End => self.end.format("%Y-%m-%d").to_string(),
            RecordField::Customer => self.customer.clone(),
        }
    }

    /// Case-insensitive substring match against the stored field values
    ///
    /// Only `customer`, `create` and `end` take part; a keyword that occurs
    /// solely inside the serial key does not match.
    pub fn matches_keyword(&self, keyword: &str) -> bool {
        let keyword = keyword.to_lowercase();

        [RecordField::Customer, RecordField::Create, RecordField::End]
            .into_iter()
            .any(|field| self.field(field).to_lowercase().contains(&keyword))
    }
}

impl StorageEntity for SerialKeyRecord {
    type Key = SerialKey;
    const KEY_FIELD: &'static str = "serial_key";

    fn key(&self) -> &Self::Key {
        &self.serial_key
    }
}
