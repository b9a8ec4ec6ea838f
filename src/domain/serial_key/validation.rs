//! Serial key format validation

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static SERIAL_KEY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[MY][A-Z0-9]{3}-[A-Z0-9]{4}-[A-Z0-9]{4}-[A-Z0-9]{4}$")
        .expect("serial key pattern is a valid regex")
});

/// Errors that can occur when validating a serial key
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerialKeyValidationError {
    #[error("Serial key cannot be empty")]
    Empty,

    #[error("Serial key '{0}' does not match the PXXX-XXXX-XXXX-XXXX format")]
    InvalidFormat(String),
}

/// Checks whether a string is a well-formed serial key
pub fn is_valid_format(key: &str) -> bool {
    SERIAL_KEY_PATTERN.is_match(key)
}

/// Validate a serial key string
pub fn validate_serial_key(key: &str) -> Result<(), SerialKeyValidationError> {
    if key.is_empty() {
        return Err(SerialKeyValidationError::Empty);
    }

    if !is_valid_format(key) {
        return Err(SerialKeyValidationError::InvalidFormat(key.to_string()));
    }

    Ok(())
}
