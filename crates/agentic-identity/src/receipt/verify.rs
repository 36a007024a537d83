//! Receipt verification.
//!
//! Three independent checks, reported separately for diagnostics:
//! the actor id is derived from the embedded key, the embedded hash matches
//! the canonical content, and the signature verifies over that content.

use crate::canonical;
use crate::crypto::keys::decode_public_key;
use crate::crypto::signing;
use crate::error::Result;
use crate::identity::IdentityId;

use super::receipt::ActionReceipt;

/// Result of verifying a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReceiptVerification {
    pub actor_valid: bool,
    pub hash_valid: bool,
    pub signature_valid: bool,
    pub is_valid: bool,
}

/// Check a receipt.
///
/// # Errors
///
/// `InvalidEncoding` if `actor_key` or `signature` is not base64 of the
/// right length. A well-formed receipt that fails any check is not an error.
pub fn check_receipt(receipt: &ActionReceipt) -> Result<ReceiptVerification> {
    let verifying_key = decode_public_key(&receipt.actor_key)?;
    let signature = signing::decode_signature(&receipt.signature)?;

    let canonical = receipt.canonical_bytes()?;
    let actor_valid = IdentityId::from_verifying_key(&verifying_key) == receipt.actor;
    let hash_valid = canonical::content_hash(&canonical) == receipt.receipt_hash;
    let signature_valid = signing::verify(&verifying_key, &canonical, &signature);
    let is_valid = actor_valid && hash_valid && signature_valid;

    if !is_valid {
        log::debug!(
            "receipt {} rejected: actor={actor_valid} hash={hash_valid} signature={signature_valid}",
            receipt.id
        );
    }

    Ok(ReceiptVerification {
        actor_valid,
        hash_valid,
        signature_valid,
        is_valid,
    })
}
