//! Ed25519 key pairs and their text encodings.
//!
//! Public keys cross the boundary as standard base64 of exactly 32 bytes.
//! Decoding enforces the length before any curve arithmetic runs.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use ed25519_dalek::{SigningKey, VerifyingKey, PUBLIC_KEY_LENGTH};

use crate::error::{IdentityError, Result};

/// An Ed25519 key pair for signing operations.
///
/// `SigningKey` zeroizes its secret scalar on drop.
pub struct Ed25519KeyPair {
    signing_key: SigningKey,
    verifying_key: VerifyingKey,
}

impl Ed25519KeyPair {
    /// Generate a new random Ed25519 key pair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate(&mut rand::thread_rng());
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Reconstruct a key pair from raw signing key bytes.
    pub fn from_signing_key_bytes(bytes: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(bytes);
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Return a reference to the signing key.
    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    /// Return the verifying (public) key.
    pub fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }

    /// Split into the signing key; the verifying key is recomputable.
    pub fn into_signing_key(self) -> SigningKey {
        self.signing_key
    }
}

/// Encode a verifying key as standard base64.
pub fn encode_public_key(key: &VerifyingKey) -> String {
    STANDARD.encode(key.to_bytes())
}

/// Decode a base64 public key, enforcing the exact 32-byte length.
///
/// # Errors
///
/// `IdentityError::InvalidEncoding` for bad base64, a wrong length, or bytes
/// that are not a valid Ed25519 point.
pub fn decode_public_key(b64: &str) -> Result<VerifyingKey> {
    let bytes = STANDARD
        .decode(b64)
        .map_err(|e| IdentityError::InvalidEncoding(format!("public key is not base64: {e}")))?;
    let array: [u8; PUBLIC_KEY_LENGTH] = bytes.try_into().map_err(|v: Vec<u8>| {
        IdentityError::InvalidEncoding(format!(
            "public key must be {PUBLIC_KEY_LENGTH} bytes, got {}",
            v.len()
        ))
    })?;
    VerifyingKey::from_bytes(&array).map_err(|_| {
        IdentityError::InvalidEncoding("public key is not a valid Ed25519 point".into())
    })
}
