//! Serial key generation
//!
//! Keys are a plan prefix letter followed by 15 characters drawn uniformly,
//! with replacement, from `A-Z0-9` and grouped 3-4-4-4.

use rand::Rng;

use crate::domain::serial_key::{KeyPlan, SerialKey};

/// Symbols a serial key body is drawn from
pub const KEY_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Number of random characters following the prefix
pub const KEY_BODY_LEN: usize = 15;

/// Generator for formatted serial keys
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialKeyGenerator;

impl SerialKeyGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Generate a new key for the plan using the thread-local CSPRNG
    pub fn generate(&self, plan: KeyPlan) -> SerialKey {
        self.generate_with(plan, &mut rand::thread_rng())
    }

    /// Generate a new key drawing from the given random source
    pub fn generate_with<R: Rng + ?Sized>(&self, plan: KeyPlan, rng: &mut R) -> SerialKey {
        let body: String = (0..KEY_BODY_LEN)
            .map(|_| KEY_ALPHABET[rng.gen_range(0..KEY_ALPHABET.len())] as char)
            .collect();

        SerialKey::from_generated(format_key(plan.prefix(), &body))
    }
}

/// Lay out a prefix and a 15-character body as `PXXX-XXXX-XXXX-XXXX`
pub fn format_key(prefix: char, body: &str) -> String {
    format!(
        "{}{}-{}-{}-{}",
        prefix,
        &body[..3],
        &body[3..7],
        &body[7..11],
        &body[11..]
    )
}
