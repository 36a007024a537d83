//! Identity anchor — the root cryptographic identity.
//!
//! An identity anchor is an Ed25519 key pair that serves as the
//! permanent root of an agent's identity. The public key IS the
//! identity. The private key proves ownership.
//!
//! An anchor can be closed explicitly. Closing drops the signing key, which
//! zeroizes it, and every later call on the anchor fails with
//! `IdentityError::InvalidHandle`. Dropping an open anchor closes it.

use std::sync::{Mutex, MutexGuard, PoisonError};

use ed25519_dalek::{Signature, SigningKey, VerifyingKey};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::canonical::{CanonicalRecord, IDENTITY_DOCUMENT_DOMAIN};
use crate::crypto::keys::{decode_public_key, encode_public_key, Ed25519KeyPair};
use crate::crypto::signing;
use crate::error::{IdentityError, Result};

/// Signature algorithm recorded in identity documents.
pub const ALGORITHM_ED25519: &str = "ed25519";

/// Unique identifier for an identity.
///
/// Format: `aid_` + base58 of first 16 bytes of SHA-256(public_key).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdentityId(pub String);

impl IdentityId {
    /// Compute an identity ID from a verifying (public) key.
    pub fn from_verifying_key(key: &VerifyingKey) -> Self {
        let hash = Sha256::digest(key.as_bytes());
        let truncated = &hash[..16];
        let encoded = bs58::encode(truncated).into_string();
        Self(format!("aid_{encoded}"))
    }

    /// Compute an identity ID from a base64 public key.
    pub fn from_public_key_base64(b64: &str) -> Result<Self> {
        Ok(Self::from_verifying_key(&decode_public_key(b64)?))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for IdentityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The root identity anchor containing key material.
///
/// Signing goes through an internal mutex, so one anchor may be shared
/// across threads (`Arc<IdentityAnchor>`).
pub struct IdentityAnchor {
    id: IdentityId,
    verifying_key: VerifyingKey,
    /// Creation timestamp (seconds since Unix epoch).
    created_at: u64,
    name: Option<String>,
    /// `None` once the anchor is closed.
    signing_key: Mutex<Option<SigningKey>>,
}

impl IdentityAnchor {
    /// Create a new identity anchor with a fresh key pair.
    pub(crate) fn generate(name: Option<String>) -> Self {
        let key_pair = Ed25519KeyPair::generate();
        Self::from_signing_key(key_pair.into_signing_key(), crate::time::now_secs(), name)
    }

    /// Reconstruct from existing key bytes and metadata.
    pub(crate) fn from_parts(
        signing_key_bytes: &[u8; 32],
        created_at: u64,
        name: Option<String>,
    ) -> Self {
        let key_pair = Ed25519KeyPair::from_signing_key_bytes(signing_key_bytes);
        Self::from_signing_key(key_pair.into_signing_key(), created_at, name)
    }

    fn from_signing_key(signing_key: SigningKey, created_at: u64, name: Option<String>) -> Self {
        let verifying_key = signing_key.verifying_key();
        Self {
            id: IdentityId::from_verifying_key(&verifying_key),
            verifying_key,
            created_at,
            name,
            signing_key: Mutex::new(Some(signing_key)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<SigningKey>> {
        // A panic while holding the lock cannot leave the key half-written.
        self.signing_key
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.lock().is_some() {
            Ok(())
        } else {
            Err(IdentityError::InvalidHandle)
        }
    }

    /// Whether [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.lock().is_none()
    }

    /// Release the signing key. Idempotent.
    pub fn close(&self) {
        if let Some(key) = self.lock().take() {
            // SigningKey zeroizes itself on drop.
            drop(key);
            log::info!("closed identity {}", self.id);
        }
    }

    /// Return the identity ID (derived from public key).
    pub fn id(&self) -> Result<IdentityId> {
        self.ensure_open()?;
        Ok(self.id.clone())
    }

    /// Return the identity ID as a plain string.
    pub fn identity_id(&self) -> Result<String> {
        Ok(self.id()?.0)
    }

    /// Return the verifying (public) key.
    pub fn verifying_key(&self) -> Result<VerifyingKey> {
        self.ensure_open()?;
        Ok(self.verifying_key)
    }

    /// Return the public key as base64.
    pub fn public_key(&self) -> Result<String> {
        Ok(encode_public_key(&self.verifying_key()?))
    }

    pub fn name(&self) -> Result<Option<String>> {
        self.ensure_open()?;
        Ok(self.name.clone())
    }

    pub fn created_at(&self) -> Result<u64> {
        self.ensure_open()?;
        Ok(self.created_at)
    }

    /// Sign arbitrary bytes. The only operation that touches the private key.
    pub fn sign(&self, message: &[u8]) -> Result<Signature> {
        let guard = self.lock();
        let key = guard.as_ref().ok_or(IdentityError::InvalidHandle)?;
        Ok(signing::sign(key, message))
    }

    /// Sign and return the signature as base64.
    pub fn sign_base64(&self, message: &[u8]) -> Result<String> {
        Ok(signing::encode_signature(&self.sign(message)?))
    }

    /// Run `f` with the raw signing key. Used when sealing the key into a
    /// container; the closure must not let the bytes escape.
    pub(crate) fn with_signing_key<T>(&self, f: impl FnOnce(&SigningKey) -> T) -> Result<T> {
        let guard = self.lock();
        let key = guard.as_ref().ok_or(IdentityError::InvalidHandle)?;
        Ok(f(key))
    }

    /// Generate the public identity document.
    pub fn to_document(&self) -> Result<IdentityDocument> {
        let mut doc = IdentityDocument {
            id: self.id()?,
            public_key: self.public_key()?,
            algorithm: ALGORITHM_ED25519.to_string(),
            created_at: self.created_at,
            name: self.name.clone(),
            signature: String::new(),
        };

        // Self-sign the document
        let to_sign = doc.canonical_bytes()?;
        doc.signature = self.sign_base64(&to_sign)?;

        Ok(doc)
    }
}

impl Drop for IdentityAnchor {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for IdentityAnchor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityAnchor")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("created_at", &self.created_at)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

/// Public identity document (shareable, does not contain private keys).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityDocument {
    pub id: IdentityId,
    pub public_key: String,
    pub algorithm: String,
    pub created_at: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub signature: String,
}

impl IdentityDocument {
    /// Canonical bytes covered by the self-signature.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>> {
        CanonicalRecord::new(IDENTITY_DOCUMENT_DOMAIN)
            .field("id", self.id.0.as_str())
            .field("public_key", self.public_key.as_str())
            .field("algorithm", self.algorithm.as_str())
            .field("created_at", self.created_at)
            .optional("name", self.name.as_deref())
            .to_bytes()
    }

    /// Verify the self-signature on this document, and that `id` really is
    /// the identity derived from `public_key`.
    ///
    /// Malformed key or signature encodings are errors; a well-formed
    /// document that does not check out returns `Ok(false)`.
    pub fn verify_signature(&self) -> Result<bool> {
        let verifying_key = decode_public_key(&self.public_key)?;
        let signature = signing::decode_signature(&self.signature)?;

        if self.algorithm != ALGORITHM_ED25519 {
            return Ok(false);
        }
        if IdentityId::from_verifying_key(&verifying_key) != self.id {
            return Ok(false);
        }
        let to_verify = self.canonical_bytes()?;
        Ok(signing::verify(&verifying_key, &to_verify, &signature))
    }
}
