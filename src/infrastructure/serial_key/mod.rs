//! Serial key infrastructure implementations

mod generator;
mod repository;
mod service;

pub use generator::{format_key, SerialKeyGenerator, KEY_ALPHABET, KEY_BODY_LEN};
pub use repository::StorageSerialKeyRepository;
pub use service::{KeyIssuanceConfig, SerialKeyService, INVALID_SERIAL_MESSAGE};
