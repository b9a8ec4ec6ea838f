//! Infrastructure layer - External service implementations

pub mod logging;
pub mod serial_key;
pub mod storage;
