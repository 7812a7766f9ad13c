//! Credential vault for at-rest connection configs
//!
//! Serialized form is `ivBase64:authTagBase64:cipherBase64` using AES-256-GCM
//! with a fresh 12-byte IV per call and a 16-byte authentication tag.

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Serialize;

const IV_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Failure to decrypt a stored credential blob.
///
/// Retrying with the same ciphertext cannot succeed.
#[derive(Debug, thiserror::Error)]
pub enum DecryptionError {
    #[error("Malformed credential blob: expected 3 parts, got {0}")]
    FieldCount(usize),

    #[error("Malformed credential blob: invalid base64 in {0}")]
    Encoding(&'static str),

    #[error("Malformed credential blob: invalid IV or auth tag length")]
    Length,

    #[error("Credential authentication failed (tampered data or wrong key)")]
    Authentication,

    #[error("Decrypted credential is not valid JSON: {0}")]
    Payload(String),
}

#[derive(Debug, thiserror::Error)]
pub enum EncryptionError {
    #[error("Failed to serialize credential: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("AES-GCM encryption failed")]
    Cipher,
}

/// Symmetric encrypt/decrypt of JSON payloads under a fixed 256-bit key
#[derive(Clone)]
pub struct CredentialVault {
    cipher: Aes256Gcm,
}

impl CredentialVault {
    /// Create a vault from a raw 32-byte key
    pub fn new(key: [u8; 32]) -> Self {
        let key = Key::<Aes256Gcm>::from_slice(&key);
        Self {
            cipher: Aes256Gcm::new(key),
        }
    }

    /// Create a vault from a 64-character hex key
    pub fn from_hex(hex_key: &str) -> anyhow::Result<Self> {
        let bytes = hex::decode(hex_key.trim())
            .map_err(|e| anyhow::anyhow!("Encryption key is not valid hex: {}", e))?;
        let key: [u8; 32] = bytes.try_into().map_err(|v: Vec<u8>| {
            anyhow::anyhow!("Encryption key must be 32 bytes, got {}", v.len())
        })?;
        Ok(Self::new(key))
    }

    /// Encrypt the JSON encoding of `value`
    pub fn encrypt<T: Serialize>(&self, value: &T) -> Result<String, EncryptionError> {
        let plaintext = serde_json::to_vec(value)?;
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        // aes-gcm appends the tag to the ciphertext
        let mut sealed = self
            .cipher
            .encrypt(&nonce, plaintext.as_ref())
            .map_err(|_| EncryptionError::Cipher)?;
        let tag = sealed.split_off(sealed.len() - TAG_LEN);

        Ok(format!(
            "{}:{}:{}",
            BASE64.encode(nonce),
            BASE64.encode(tag),
            BASE64.encode(sealed)
        ))
    }

    /// Decrypt a serialized blob back into `T`
    pub fn decrypt<T: DeserializeOwned>(&self, serialized: &str) -> Result<T, DecryptionError> {
        let parts: Vec<&str> = serialized.split(':').collect();
        if parts.len() != 3 {
            return Err(DecryptionError::FieldCount(parts.len()));
        }

        let iv = BASE64
            .decode(parts[0])
            .map_err(|_| DecryptionError::Encoding("iv"))?;
        let tag = BASE64
            .decode(parts[1])
            .map_err(|_| DecryptionError::Encoding("auth tag"))?;
        let mut ciphertext = BASE64
            .decode(parts[2])
            .map_err(|_| DecryptionError::Encoding("ciphertext"))?;

        if iv.len() != IV_LEN || tag.len() != TAG_LEN {
            return Err(DecryptionError::Length);
        }

        ciphertext.extend_from_slice(&tag);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(&iv), ciphertext.as_ref())
            .map_err(|_| DecryptionError::Authentication)?;

        serde_json::from_slice(&plaintext).map_err(|e| DecryptionError::Payload(e.to_string()))
    }
}
