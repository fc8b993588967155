// faultline-core/src/core/sealed.rs
// ============================================================================
// Module: Faultline Sealed Secrets
// Description: Authenticated encryption for sensitive stored configuration.
// Purpose: Keep credentials and channel configs unreadable at rest.
// Dependencies: aes-gcm, base64, rand, sha2
// ============================================================================

//! ## Overview
//! Sensitive fields (notification channel configs, integration credentials)
//! are stored as AES-256-GCM ciphertext keyed by a process-wide master key.
//! Sealing prepends a random 96-bit nonce to the ciphertext and encodes the
//! result as base64. Opening authenticates before returning plaintext, and
//! sealing-then-opening any JSON document yields the input byte-identical.
//! Display shapes mask sensitive keys with `***` instead of decrypting.

// ============================================================================
// SECTION: Imports
// ============================================================================

use aes_gcm::Aes256Gcm;
use aes_gcm::KeyInit;
use aes_gcm::Nonce;
use aes_gcm::aead::Aead;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use rand::RngCore;
use serde_json::Value;
use sha2::Digest;
use sha2::Sha256;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// AES-GCM nonce length in bytes.
const NONCE_LEN: usize = 12;
/// Substrings identifying sensitive config keys for display masking.
const SENSITIVE_KEY_MARKERS: [&str; 6] =
    ["password", "secret", "token", "api_key", "routing_key", "webhook_url"];

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Sealed-secret errors.
#[derive(Debug, Error)]
pub enum SealedError {
    /// Ciphertext malformed or tampered with.
    #[error("sealed payload invalid: {0}")]
    Invalid(String),
    /// Encryption failed.
    #[error("seal failure: {0}")]
    Seal(String),
    /// JSON serialization failed.
    #[error("sealed json failure: {0}")]
    Json(String),
}

// ============================================================================
// SECTION: Sealed Box
// ============================================================================

/// Process-wide sealing key derived from the configured master key.
#[derive(Clone)]
pub struct SealedBox {
    /// Derived 256-bit AES key.
    key: [u8; 32],
}

impl std::fmt::Debug for SealedBox {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SealedBox").finish_non_exhaustive()
    }
}

impl SealedBox {
    /// Derives a sealing key from the configured master key material.
    #[must_use]
    pub fn from_master_key(master_key: &str) -> Self {
        let digest = Sha256::digest(master_key.as_bytes());
        let mut key = [0_u8; 32];
        key.copy_from_slice(&digest);
        Self { key }
    }

    /// Seals plaintext bytes into a base64 `nonce || ciphertext` payload.
    ///
    /// # Errors
    ///
    /// Returns [`SealedError::Seal`] when encryption fails.
    pub fn seal(&self, plaintext: &[u8]) -> Result<String, SealedError> {
        let cipher = Aes256Gcm::new_from_slice(&self.key)
            .map_err(|err| SealedError::Seal(err.to_string()))?;
        let mut nonce_bytes = [0_u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);
        let ciphertext =
            cipher.encrypt(nonce, plaintext).map_err(|err| SealedError::Seal(err.to_string()))?;
        let mut payload = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        payload.extend_from_slice(&nonce_bytes);
        payload.extend_from_slice(&ciphertext);
        Ok(BASE64.encode(payload))
    }

    /// Opens a sealed payload, authenticating before returning plaintext.
    ///
    /// # Errors
    ///
    /// Returns [`SealedError::Invalid`] when the payload is malformed or the
    /// authentication tag does not verify.
    pub fn open(&self, sealed: &str) -> Result<Vec<u8>, SealedError> {
        let payload =
            BASE64.decode(sealed).map_err(|err| SealedError::Invalid(err.to_string()))?;
        if payload.len() <= NONCE_LEN {
            return Err(SealedError::Invalid("payload shorter than nonce".to_string()));
        }
        let (nonce_bytes, ciphertext) = payload.split_at(NONCE_LEN);
        let cipher = Aes256Gcm::new_from_slice(&self.key)
            .map_err(|err| SealedError::Invalid(err.to_string()))?;
        cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|_| SealedError::Invalid("authentication failed".to_string()))
    }

    /// Seals a JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`SealedError`] when serialization or encryption fails.
    pub fn seal_json(&self, value: &Value) -> Result<String, SealedError> {
        let bytes = serde_json::to_vec(value).map_err(|err| SealedError::Json(err.to_string()))?;
        self.seal(&bytes)
    }

    /// Opens a sealed JSON value.
    ///
    /// # Errors
    ///
    /// Returns [`SealedError`] when decryption or deserialization fails.
    pub fn open_json(&self, sealed: &str) -> Result<Value, SealedError> {
        let bytes = self.open(sealed)?;
        serde_json::from_slice(&bytes).map_err(|err| SealedError::Json(err.to_string()))
    }
}

// ============================================================================
// SECTION: Display Masking
// ============================================================================

/// Returns a copy of the value with sensitive keys masked as `***`.
///
/// Masking applies recursively to objects; keys are matched by lowercase
/// substring against a fixed marker set.
#[must_use]
pub fn mask_sensitive(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut masked = serde_json::Map::with_capacity(map.len());
            for (key, entry) in map {
                if is_sensitive_key(key) {
                    masked.insert(key.clone(), Value::String("***".to_string()));
                } else {
                    masked.insert(key.clone(), mask_sensitive(entry));
                }
            }
            Value::Object(masked)
        }
        Value::Array(items) => Value::Array(items.iter().map(mask_sensitive).collect()),
        other => other.clone(),
    }
}

/// Returns true when the key names sensitive material.
fn is_sensitive_key(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    SENSITIVE_KEY_MARKERS.iter().any(|marker| lower.contains(marker))
}
