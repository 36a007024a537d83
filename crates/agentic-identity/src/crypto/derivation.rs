//! Key derivation using HKDF-SHA256.
//!
//! Splits a passphrase-derived master key into purpose-bound subkeys so
//! the Argon2id output is never used directly as a cipher key.

use hkdf::Hkdf;
use sha2::Sha256;

use crate::error::{IdentityError, Result};

/// HKDF info string for the identity container encryption key.
/// Must remain stable across versions.
pub const IDENTITY_ENCRYPTION_CONTEXT: &str = "identity-encryption";

/// Derive a 32-byte child key from a root key and context string.
///
/// Uses HKDF-SHA256 (RFC 5869) with the root key as IKM and
/// the context as info.
pub fn derive_key(root_key_bytes: &[u8; 32], context: &str) -> Result<[u8; 32]> {
    let hk = Hkdf::<Sha256>::new(None, root_key_bytes);
    let mut output = [0u8; 32];
    hk.expand(context.as_bytes(), &mut output)
        .map_err(|e| IdentityError::DerivationFailed(format!("HKDF expand failed: {e}")))?;
    Ok(output)
}
