//! Ed25519 signing and verification.
//!
//! Signatures cross the boundary as standard base64 of exactly 64 bytes.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey, SIGNATURE_LENGTH};

use crate::error::{IdentityError, Result};

/// Sign a message with an Ed25519 signing key.
pub fn sign(signing_key: &SigningKey, message: &[u8]) -> Signature {
    signing_key.sign(message)
}

/// Sign a message and return the signature as base64.
pub fn sign_to_base64(signing_key: &SigningKey, message: &[u8]) -> String {
    encode_signature(&sign(signing_key, message))
}

/// Check an Ed25519 signature. Uses strict verification, which rejects
/// small-order keys and non-canonical signature encodings.
pub fn verify(verifying_key: &VerifyingKey, message: &[u8], signature: &Signature) -> bool {
    verifying_key.verify_strict(message, signature).is_ok()
}

/// Encode a signature as standard base64.
pub fn encode_signature(signature: &Signature) -> String {
    STANDARD.encode(signature.to_bytes())
}

/// Decode a base64 signature, enforcing the exact 64-byte length.
///
/// # Errors
///
/// `IdentityError::InvalidEncoding` for bad base64 or a wrong length.
pub fn decode_signature(b64: &str) -> Result<Signature> {
    let bytes = STANDARD
        .decode(b64)
        .map_err(|e| IdentityError::InvalidEncoding(format!("signature is not base64: {e}")))?;
    let array: [u8; SIGNATURE_LENGTH] = bytes.try_into().map_err(|v: Vec<u8>| {
        IdentityError::InvalidEncoding(format!(
            "signature must be {SIGNATURE_LENGTH} bytes, got {}",
            v.len()
        ))
    })?;
    Ok(Signature::from_bytes(&array))
}

/// Verify a message against an already-checked base64 signature.
pub fn verify_base64(
    verifying_key: &VerifyingKey,
    message: &[u8],
    signature_b64: &str,
) -> Result<bool> {
    let signature = decode_signature(signature_b64)?;
    Ok(verify(verifying_key, message, &signature))
}
