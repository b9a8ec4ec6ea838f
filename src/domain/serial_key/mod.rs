//! Serial key domain module
//!
//! A serial key is a time-bound license identifier issued to a customer.
//! Keys are issued once and only read afterwards.

mod entity;
mod repository;
mod validation;

pub use entity::{KeyPlan, RecordField, SerialKey, SerialKeyRecord};
pub use repository::SerialKeyRepository;
pub use validation::{is_valid_format, validate_serial_key, SerialKeyValidationError};

#[cfg(test)]
pub use repository::MockSerialKeyRepository;
