//! Stateless verification of serialized records.
//!
//! Every function here takes untrusted JSON text, parses it, and answers a
//! yes/no question. Input that cannot be parsed is an error; a well-formed
//! record that fails a check is `Ok(false)`. Nothing is cached between calls,
//! so these are safe to call from any number of threads.

use crate::error::{IdentityError, Result};
use crate::receipt::{self, ActionReceipt};
use crate::trust::{self, TrustGrant};

fn require_input<'a>(serialized: &'a str, what: &str) -> Result<&'a str> {
    if serialized.trim().is_empty() {
        return Err(IdentityError::MissingInput(format!("{what} is empty")));
    }
    Ok(serialized)
}

fn parse_receipt(serialized: &str) -> Result<ActionReceipt> {
    ActionReceipt::from_json(require_input(serialized, "serialized receipt")?)
}

fn parse_grant(serialized: &str) -> Result<TrustGrant> {
    TrustGrant::from_json(require_input(serialized, "serialized grant")?)
}

/// Verify a serialized receipt: actor, content hash and signature.
///
/// # Errors
///
/// `MissingInput` for empty input, `SerializationError` if the text is not a
/// receipt, `InvalidEncoding` for a malformed key or signature.
pub fn verify_receipt(serialized: &str) -> Result<bool> {
    let receipt = parse_receipt(serialized)?;
    Ok(receipt::check_receipt(&receipt)?.is_valid)
}

/// Verify a receipt and that it links directly to `serialized_previous`.
pub fn verify_receipt_with_previous(serialized: &str, serialized_previous: &str) -> Result<bool> {
    let previous = parse_receipt(serialized_previous)?;
    let receipt = parse_receipt(serialized)?;
    receipt::verify_chain(&[previous, receipt])
}

/// Verify a JSON array of receipts ordered oldest first.
pub fn verify_receipt_chain(serialized_array: &str) -> Result<bool> {
    let chain: Vec<ActionReceipt> =
        serde_json::from_str(require_input(serialized_array, "receipt chain")?)?;
    receipt::verify_chain(&chain)
}

/// Verify a serialized grant for `requested_capability` at the current time.
///
/// Use limits are not evaluated; see [`verify_trust_grant_with_uses`].
pub fn verify_trust_grant(serialized: &str, requested_capability: &str) -> Result<bool> {
    verify_trust_grant_at(serialized, requested_capability, crate::time::now_secs())
}

/// Verify a serialized grant at a fixed time (seconds since epoch).
pub fn verify_trust_grant_at(
    serialized: &str,
    requested_capability: &str,
    now: u64,
) -> Result<bool> {
    let grant = parse_grant(serialized)?;
    Ok(trust::check_grant_at(&grant, requested_capability, now, None)?.is_granted())
}

/// Verify a serialized grant given how many times it has already been used.
///
/// The count comes from whatever ledger the caller keeps; this crate does
/// not track uses itself.
pub fn verify_trust_grant_with_uses(
    serialized: &str,
    requested_capability: &str,
    uses: u64,
) -> Result<bool> {
    let grant = parse_grant(serialized)?;
    let verdict = trust::check_grant(&grant, requested_capability, Some(uses))?;
    Ok(verdict.is_granted())
}

/// Verify a JSON array of grants, root first, as a delegation chain.
pub fn verify_trust_chain(serialized_array: &str, requested_capability: &str) -> Result<bool> {
    let chain: Vec<TrustGrant> =
        serde_json::from_str(require_input(serialized_array, "trust chain")?)?;
    trust::verify_trust_chain(&chain, requested_capability, crate::time::now_secs())
}
