//! Receipt chain verification.
//!
//! Verifies the integrity of a sequence of chained receipts
//! by walking the `previous_receipt` links.

use super::receipt::ActionReceipt;
use super::verify::check_receipt;
use crate::error::{IdentityError, Result};

/// Verify a chain of receipts (ordered from oldest to newest).
///
/// Every receipt must verify, each receipt after the first must name its
/// predecessor in `previous_receipt`, and timestamps must not go backwards.
/// The first receipt may itself point further back: a partial chain is
/// still a chain.
///
/// # Errors
///
/// `Validation` for an empty slice; `InvalidEncoding` if a receipt carries a
/// malformed key or signature.
pub fn verify_chain(chain: &[ActionReceipt]) -> Result<bool> {
    if chain.is_empty() {
        return Err(IdentityError::Validation(
            "receipt chain must not be empty".into(),
        ));
    }

    for (i, receipt) in chain.iter().enumerate() {
        if !check_receipt(receipt)?.is_valid {
            return Ok(false);
        }

        if i > 0 {
            let prev = &chain[i - 1];
            if receipt.previous_receipt.as_ref() != Some(&prev.id) {
                log::debug!("receipt {} does not link to {}", receipt.id, prev.id);
                return Ok(false);
            }
            if receipt.timestamp < prev.timestamp {
                log::debug!("receipt {} predates its predecessor", receipt.id);
                return Ok(false);
            }
        }
    }

    Ok(true)
}
