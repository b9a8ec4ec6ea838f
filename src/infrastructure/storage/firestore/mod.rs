//! Firestore storage backend
//!
//! Talks to Cloud Firestore through its REST API. Authenticates with a
//! service-account key, or with the emulator's fixed token when
//! `FIRESTORE_EMULATOR_HOST` is set.

mod auth;
mod client;
mod value;

pub use auth::{ServiceAccountKey, ServiceAccountTokenProvider, StaticTokenProvider, TokenProvider};
pub use client::{FirestoreConfig, FirestoreStorage};
pub use value::{decode_fields, encode_fields};
