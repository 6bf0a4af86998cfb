//! Encryption at rest for the database password kept in the configuration
//! file.
//!
//! Protected values are written as `ENC(<base64>)` where the payload is
//! nonce + AES-256-GCM ciphertext + tag. The key is never part of the binary:
//! it comes from `PPE_IMPORT_KEY` as 32 base64-encoded bytes.

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Key, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use thiserror::Error;
use tracing::{info, warn};

use crate::config::{ConfigStore, JDBC_PASSWORD};
use crate::error::ImportError;

pub const KEY_ENV_VAR: &str = "PPE_IMPORT_KEY";

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const PREFIX: &str = "ENC(";
const SUFFIX: &str = ")";

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("{var} is not set; generate a key with `ppe-import keygen`")]
    KeyUnavailable { var: &'static str },
    #[error("key must be 32 base64-encoded bytes")]
    InvalidKey,
    #[error("value is not an ENC(...) protected secret")]
    NotEncrypted,
    #[error("invalid encoding: {0}")]
    Encoding(String),
    #[error("encryption failed: {0}")]
    Encryption(String),
    #[error("decryption failed; wrong key or tampered value")]
    Decryption,
}

pub struct CredentialGuard {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for CredentialGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialGuard").finish_non_exhaustive()
    }
}

impl CredentialGuard {
    pub fn from_key_bytes(key: &[u8]) -> Result<Self, CryptoError> {
        if key.len() != KEY_LEN {
            return Err(CryptoError::InvalidKey);
        }
        let key = Key::<Aes256Gcm>::from_slice(key);
        Ok(Self {
            cipher: Aes256Gcm::new(key),
        })
    }

    pub fn from_base64_key(encoded: &str) -> Result<Self, CryptoError> {
        let decoded = STANDARD
            .decode(encoded.trim())
            .map_err(|_| CryptoError::InvalidKey)?;
        Self::from_key_bytes(&decoded)
    }

    /// Reads the key from `PPE_IMPORT_KEY`. The binary loads `.env` before
    /// this is called.
    pub fn from_env() -> Result<Self, CryptoError> {
        let encoded = std::env::var(KEY_ENV_VAR).map_err(|_| CryptoError::KeyUnavailable {
            var: KEY_ENV_VAR,
        })?;
        Self::from_base64_key(&encoded)
    }

    /// Returns the protected form of `secret`. Already protected values are
    /// verified and returned unchanged.
    pub fn protect(&self, secret: &str) -> Result<String, CryptoError> {
        if is_protected(secret) {
            self.unprotect(secret)?;
            return Ok(secret.to_string());
        }

        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = self
            .cipher
            .encrypt(&nonce, secret.as_bytes())
            .map_err(|e| CryptoError::Encryption(e.to_string()))?;
        let blob = [nonce.as_slice(), &ciphertext].concat();

        Ok(format!("{PREFIX}{}{SUFFIX}", STANDARD.encode(blob)))
    }

    pub fn unprotect(&self, value: &str) -> Result<String, CryptoError> {
        let payload = value
            .strip_prefix(PREFIX)
            .and_then(|rest| rest.strip_suffix(SUFFIX))
            .ok_or(CryptoError::NotEncrypted)?;

        let blob = STANDARD
            .decode(payload)
            .map_err(|e| CryptoError::Encoding(e.to_string()))?;
        if blob.len() < NONCE_LEN + TAG_LEN {
            return Err(CryptoError::Encoding(format!(
                "ciphertext is {} bytes, shorter than nonce and tag",
                blob.len()
            )));
        }

        let (nonce, ciphertext) = blob.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CryptoError::Decryption)?;

        String::from_utf8(plaintext).map_err(|e| CryptoError::Encoding(e.to_string()))
    }
}

pub fn is_protected(value: &str) -> bool {
    value.starts_with(PREFIX) && value.ends_with(SUFFIX) && value.len() > PREFIX.len()
}

/// Fresh random key, base64-encoded for `PPE_IMPORT_KEY`.
pub fn generate_key() -> String {
    let key = Aes256Gcm::generate_key(&mut OsRng);
    STANDARD.encode(key)
}

/// Protects `JDBC_PASSWORD`, rewrites the configuration file with the
/// protected value and returns the plaintext for opening the connection.
///
/// The file is rewritten on every call even when the value did not change.
/// A failed rewrite is logged and does not stop the run.
pub fn unlock_stored_password(
    store: &mut ConfigStore,
    guard: &CredentialGuard,
) -> Result<String, ImportError> {
    let raw = store.require(JDBC_PASSWORD)?.to_string();
    let was_protected = is_protected(&raw);
    let protected = guard.protect(&raw)?;

    store.set(JDBC_PASSWORD, protected.clone());
    match store.save() {
        Ok(()) if was_protected => info!(path = %store.path().display(), "Configuration rewritten"),
        Ok(()) => info!(path = %store.path().display(), "Password encrypted in configuration"),
        Err(err) => warn!(error = %err, "Could not rewrite configuration"),
    }

    Ok(guard.unprotect(&protected)?)
}
