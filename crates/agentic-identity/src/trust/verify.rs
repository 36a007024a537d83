//! Trust verification — checking if a trust grant is currently valid.
//!
//! Checks run in order and stop at the first failure:
//! 1. Signature validity (grantor signed the grant)
//! 2. Time validity (within not_before / not_after window)
//! 3. Use count (only when the caller supplies one)
//! 4. Capability match (requested capability is covered)
//!
//! Verification is stateless. `max_uses` is declared by the grant; counting
//! uses is the job of an external ledger, which passes its count in.

use crate::error::Result;

use super::capability::validate_requested;
use super::constraint::GrantPhase;
use super::grant::TrustGrant;

/// Outcome of verifying a trust grant: granted, or the first check that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrustVerdict {
    Granted,
    SignatureInvalid,
    NotYetValid,
    Expired,
    MaxUsesExceeded,
    CapabilityNotGranted,
}

impl TrustVerdict {
    pub fn is_granted(self) -> bool {
        self == Self::Granted
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Granted => "granted",
            Self::SignatureInvalid => "signature_invalid",
            Self::NotYetValid => "not_yet_valid",
            Self::Expired => "expired",
            Self::MaxUsesExceeded => "max_uses_exceeded",
            Self::CapabilityNotGranted => "capability_not_granted",
        }
    }
}

impl std::fmt::Display for TrustVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verify a grant for `requested_capability` at time `now`.
///
/// `uses` is the number of times the grant has already been honoured, if
/// known. With `None` the use limit is not evaluated.
///
/// # Errors
///
/// `Validation` for an empty requested capability, `InvalidEncoding` for a
/// malformed grantor key or signature.
pub fn check_grant_at(
    grant: &TrustGrant,
    requested_capability: &str,
    now: u64,
    uses: Option<u64>,
) -> Result<TrustVerdict> {
    validate_requested(requested_capability)?;

    let verdict = if !grant.verify_signature()? {
        TrustVerdict::SignatureInvalid
    } else {
        match grant.phase_at(now) {
            GrantPhase::NotYetActive => TrustVerdict::NotYetValid,
            GrantPhase::Expired => TrustVerdict::Expired,
            GrantPhase::Active => {
                if uses.is_some_and(|u| !grant.constraints.is_within_uses(u)) {
                    TrustVerdict::MaxUsesExceeded
                } else if !grant.covers(requested_capability) {
                    TrustVerdict::CapabilityNotGranted
                } else {
                    TrustVerdict::Granted
                }
            }
        }
    };

    log::debug!(
        "trust grant {} for {requested_capability:?}: {verdict}",
        grant.id
    );
    Ok(verdict)
}

/// Verify a grant at the current time.
pub fn check_grant(
    grant: &TrustGrant,
    requested_capability: &str,
    uses: Option<u64>,
) -> Result<TrustVerdict> {
    check_grant_at(grant, requested_capability, crate::time::now_secs(), uses)
}

/// Quick check: is a grant valid for a capability right now?
pub fn is_grant_valid(grant: &TrustGrant, requested_capability: &str) -> bool {
    check_grant(grant, requested_capability, None)
        .map(TrustVerdict::is_granted)
        .unwrap_or(false)
}
