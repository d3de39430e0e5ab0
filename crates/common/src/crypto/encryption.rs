//! Authenticated encryption for data at rest.
//!
//! - [`EncryptionService`]: AES-256-GCM encryption/decryption
//! - [`EncryptedData`]: serializable envelope carrying nonce, ciphertext and
//!   the Argon2 salt needed to re-derive the key
//!
//! Every call to [`EncryptionService::encrypt`] draws a fresh 96-bit nonce, so
//! encrypting the same plaintext twice yields different envelopes.
//!
//! ## Usage
//!
//! ```rust
//! use uplinkbridge_common::crypto::{EncryptedData, EncryptionService};
//!
//! let service = EncryptionService::from_password_with_salt("client:secret", None)?;
//! let encoded = service.encrypt_to_string(b"sensitive data")?;
//!
//! // Later, with only the password: read the salt back out of the envelope.
//! let envelope = EncryptedData::decode(&encoded)?;
//! let salt = envelope.salt.clone();
//! let service = EncryptionService::from_password_with_salt("client:secret", salt.as_deref())?;
//! assert_eq!(service.decrypt(&envelope)?, b"sensitive data");
//! # Ok::<(), uplinkbridge_common::crypto::CryptoError>(())
//! ```

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use argon2::password_hash::rand_core::{OsRng, RngCore};
use argon2::password_hash::SaltString;
use argon2::Argon2;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const ALGORITHM: &str = "AES-256-GCM";
const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

/// Failures of the encryption layer
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Bad key length, bad salt or a failed key derivation
    #[error("Key setup failed: {0}")]
    Key(String),

    /// The envelope is not base64 / JSON / a supported algorithm
    #[error("Malformed encrypted payload: {0}")]
    Envelope(String),

    /// Authentication tag mismatch: wrong key or tampered data
    #[error("Decryption failed: {0}")]
    Decrypt(String),

    #[error("Encryption failed: {0}")]
    Encrypt(String),
}

/// Result type alias for crypto operations
pub type CryptoResult<T> = std::result::Result<T, CryptoError>;

/// Encrypted data container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedData {
    pub nonce: Vec<u8>,
    pub ciphertext: Vec<u8>,
    pub salt: Option<String>,
    pub algorithm: String,
}

impl EncryptedData {
    /// Base64 of the JSON envelope
    ///
    /// # Errors
    /// Returns `CryptoError::Envelope` if serialization fails.
    pub fn encode(&self) -> CryptoResult<String> {
        let serialized =
            serde_json::to_vec(self).map_err(|e| CryptoError::Envelope(e.to_string()))?;
        Ok(BASE64.encode(serialized))
    }

    /// Inverse of [`EncryptedData::encode`]
    ///
    /// # Errors
    /// Returns `CryptoError::Envelope` for bad base64 or bad JSON.
    pub fn decode(encoded: &str) -> CryptoResult<Self> {
        let decoded = BASE64
            .decode(encoded.trim())
            .map_err(|e| CryptoError::Envelope(format!("Base64 decode failed: {e}")))?;
        serde_json::from_slice(&decoded)
            .map_err(|e| CryptoError::Envelope(format!("Invalid envelope: {e}")))
    }
}

/// AES-GCM encryption service with optional password-based key derivation.
pub struct EncryptionService {
    cipher: Aes256Gcm,
    password_salt: Option<String>,
}

impl std::fmt::Debug for EncryptionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionService")
            .field("key", &"[REDACTED]")
            .field("password_salt", &self.password_salt.is_some())
            .finish()
    }
}

impl EncryptionService {
    /// Create a new encryption service from a raw 32-byte key.
    ///
    /// # Errors
    /// Returns `CryptoError::Key` if the key is not 32 bytes.
    pub fn new(key: &[u8]) -> CryptoResult<Self> {
        if key.len() != KEY_LEN {
            return Err(CryptoError::Key("Encryption key must be exactly 32 bytes".to_string()));
        }

        let cipher = Aes256Gcm::new_from_slice(key)
            .map_err(|e| CryptoError::Key(format!("Failed to create encryption cipher: {e}")))?;

        Ok(Self { cipher, password_salt: None })
    }

    /// Derive an encryption key from a password and optional salt using Argon2.
    ///
    /// A fresh random salt is generated when `salt` is `None`; it is embedded
    /// in every envelope this service produces.
    ///
    /// # Errors
    /// Returns `CryptoError::Key` for an unparsable salt or a failed derivation.
    pub fn from_password_with_salt(password: &str, salt: Option<&str>) -> CryptoResult<Self> {
        let salt = match salt {
            Some(existing) => SaltString::from_b64(existing)
                .map_err(|e| CryptoError::Key(format!("Invalid password salt: {e}")))?,
            None => SaltString::generate(&mut OsRng),
        };

        let mut key = [0u8; KEY_LEN];
        Argon2::default()
            .hash_password_into(password.as_bytes(), salt.as_str().as_bytes(), &mut key)
            .map_err(|e| CryptoError::Key(format!("Key derivation failed: {e}")))?;

        let mut service = Self::new(&key)?;
        service.password_salt = Some(salt.as_str().to_string());
        Ok(service)
    }

    /// Generate a random 32-byte symmetric key.
    #[must_use]
    pub fn generate_key() -> Vec<u8> {
        let mut key = vec![0u8; KEY_LEN];
        OsRng.fill_bytes(&mut key);
        key
    }

    /// Encrypt bytes into an `EncryptedData` payload.
    ///
    /// # Errors
    /// Returns `CryptoError::Encrypt` if the cipher rejects the input.
    pub fn encrypt(&self, data: &[u8]) -> CryptoResult<EncryptedData> {
        let nonce_bytes = Self::generate_nonce();
        let ciphertext = self
            .cipher
            .encrypt(&Nonce::from(nonce_bytes), data)
            .map_err(|e| CryptoError::Encrypt(e.to_string()))?;

        Ok(EncryptedData {
            nonce: nonce_bytes.to_vec(),
            ciphertext,
            salt: self.password_salt.clone(),
            algorithm: ALGORITHM.to_string(),
        })
    }

    /// Decrypt an [`EncryptedData`] payload back into raw bytes.
    ///
    /// # Errors
    /// Returns `CryptoError::Envelope` for an unsupported algorithm or nonce
    /// length, `CryptoError::Decrypt` when authentication fails.
    pub fn decrypt(&self, encrypted: &EncryptedData) -> CryptoResult<Vec<u8>> {
        if encrypted.algorithm != ALGORITHM {
            return Err(CryptoError::Envelope(format!(
                "Unsupported algorithm: {}",
                encrypted.algorithm
            )));
        }

        let nonce_array: [u8; NONCE_LEN] =
            encrypted.nonce.as_slice().try_into().map_err(|_| {
                CryptoError::Envelope("Nonce must be exactly 12 bytes for AES-256-GCM".to_string())
            })?;

        self.cipher
            .decrypt(&Nonce::from(nonce_array), encrypted.ciphertext.as_ref())
            .map_err(|e| CryptoError::Decrypt(e.to_string()))
    }

    /// Encrypt bytes and encode the payload as a base64 string.
    ///
    /// # Errors
    /// See [`EncryptionService::encrypt`] and [`EncryptedData::encode`].
    pub fn encrypt_to_string(&self, data: &[u8]) -> CryptoResult<String> {
        self.encrypt(data)?.encode()
    }

    /// Decode a base64 string and decrypt the contained payload.
    ///
    /// # Errors
    /// See [`EncryptedData::decode`] and [`EncryptionService::decrypt`].
    pub fn decrypt_from_string(&self, encrypted_str: &str) -> CryptoResult<Vec<u8>> {
        let encrypted = EncryptedData::decode(encrypted_str)?;
        self.decrypt(&encrypted)
    }

    fn generate_nonce() -> [u8; NONCE_LEN] {
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);
        nonce
    }
}
