//! Hash-based ID generation for tasks and dependency edges.
//!
//! IDs are derived from a SHA256 hash of the record content, a timestamp and
//! a retry nonce, then base36-encoded.
//!
//! # Features
//!
//! - **Adaptive length**: ID length grows with store size (4-6 characters)
//! - **Collision resistant**: Uses SHA256 hashing with nonce retry
//! - **Format**: `{prefix}-{hash}` (e.g., "task-a3f8", "dep-09zk")
//!
//! # Example
//!
//! ```
//! use tasklink::id_generation::{IdGenerator, IdGeneratorConfig};
//!
//! let mut generator = IdGenerator::new(IdGeneratorConfig {
//!     prefix: "dep".to_string(),
//!     store_size: 0,
//! });
//!
//! let id = generator.generate(&["task-a1b2", "task-c3d4", "alice"]).unwrap();
//! assert!(id.starts_with("dep-"));
//! ```

use chrono::Utc;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, warn};

const BASE36_CHARS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const MAX_NONCE: u32 = 100;
const MIN_ID_LENGTH: usize = 4;
const MAX_ID_LENGTH: usize = 6;

/// Errors that can occur during ID generation
#[derive(Debug, Error)]
pub enum IdGenerationError {
    /// Unable to generate a unique ID after exhausting all nonces and length increases
    #[error("Unable to generate unique ID after {attempts} attempts")]
    CollisionExhausted {
        /// Number of nonces tried
        attempts: u32,
    },

    /// Invalid length parameter
    #[error("Length must be greater than 0")]
    InvalidLength,
}

/// Configuration for ID generation
#[derive(Debug, Clone)]
pub struct IdGeneratorConfig {
    /// Prefix for all IDs (e.g., "task")
    pub prefix: String,

    /// Current number of records in the store (affects adaptive length)
    pub store_size: usize,
}

/// Hash-based ID generator with collision detection.
///
/// The generator remembers every ID it produced or was told about, so the
/// owning store must `register_id` anything it loads from disk.
#[derive(Debug)]
pub struct IdGenerator {
    config: IdGeneratorConfig,
    existing_ids: HashSet<String>,
}

impl IdGenerator {
    /// Create a new ID generator with the given configuration
    pub fn new(config: IdGeneratorConfig) -> Self {
        Self {
            config,
            existing_ids: HashSet::new(),
        }
    }

    /// Register an existing ID to prevent collisions
    pub fn register_id(&mut self, id: impl Into<String>) {
        self.existing_ids.insert(id.into());
    }

    /// Forget a released ID
    pub fn release_id(&mut self, id: &str) {
        self.existing_ids.remove(id);
    }

    /// Update the store size used for adaptive length.
    pub fn set_store_size(&mut self, store_size: usize) {
        self.config.store_size = store_size;
    }

    /// Generate a new unique ID from the given content parts.
    ///
    /// # Errors
    ///
    /// Returns an error if unable to generate a unique ID after trying all nonces.
    pub fn generate(&mut self, parts: &[&str]) -> Result<String, IdGenerationError> {
        let id_length = self.adaptive_length();

        for nonce in 0..MAX_NONCE {
            let id = self.generate_hash_id(parts, nonce, id_length)?;

            if !self.existing_ids.contains(&id) {
                if nonce > 0 {
                    debug!(nonce, id_length, "Generated unique ID after collision retries");
                }
                self.existing_ids.insert(id.clone());
                return Ok(id);
            }
        }

        if id_length < MAX_ID_LENGTH {
            warn!(
                id_length,
                max_nonce = MAX_NONCE,
                "All nonces exhausted, increasing ID length"
            );
            for nonce in 0..MAX_NONCE {
                let id = self.generate_hash_id(parts, nonce, id_length + 1)?;
                if self.existing_ids.insert(id.clone()) {
                    return Ok(id);
                }
            }
        }

        Err(IdGenerationError::CollisionExhausted {
            attempts: MAX_NONCE,
        })
    }

    fn generate_hash_id(
        &self,
        parts: &[&str],
        nonce: u32,
        length: usize,
    ) -> Result<String, IdGenerationError> {
        let timestamp = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let content = format!("{}|{}|{}", parts.join("|"), timestamp, nonce);

        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        let hash_bytes = hasher.finalize();

        let hash_str = encode_base36(&hash_bytes[..8], length)?;

        Ok(format!("{}-{}", self.config.prefix, hash_str))
    }

    /// Determine ID length based on store size
    ///
    /// - 0-500 records: 4 chars
    /// - 500-1,500: 5 chars
    /// - 1,500+: 6 chars
    fn adaptive_length(&self) -> usize {
        match self.config.store_size {
            0..=500 => MIN_ID_LENGTH,
            501..=1500 => 5,
            _ => MAX_ID_LENGTH,
        }
    }
}

/// Encode the first bytes of a hash as a fixed-length base36 string.
///
/// Input is limited to 8 bytes by the caller; wrapping arithmetic keeps the
/// result deterministic.
fn encode_base36(bytes: &[u8], length: usize) -> Result<String, IdGenerationError> {
    if length == 0 {
        return Err(IdGenerationError::InvalidLength);
    }

    let mut n: u64 = 0;
    for &byte in bytes {
        n = n.wrapping_shl(8).wrapping_add(u64::from(byte));
    }

    let mut result = Vec::with_capacity(length);
    while result.len() < length {
        let remainder = (n % 36) as usize;
        result.push(char::from(BASE36_CHARS[remainder]));
        n /= 36;
    }

    Ok(result.into_iter().rev().collect())
}
