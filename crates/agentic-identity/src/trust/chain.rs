//! Trust chain walking — delegation verification.
//!
//! When Identity A trusts B, and B delegates to C, then C's trust
//! must be verified through the entire chain: A → B → C.
//! Each hop is its own signed grant naming its parent. Every link must be
//! valid on its own, and each delegator must have had delegation rights
//! with sufficient depth.

use crate::error::{IdentityError, Result};
use crate::identity::{IdentityAnchor, IdentityId};

use super::capability::{capabilities_cover, validate_requested, Capability};
use super::constraint::TrustConstraints;
use super::grant::{TrustGrant, TrustGrantBuilder};
use super::verify::check_grant_at;

/// Verify a trust chain for a specific capability.
///
/// `chain` is the delegation chain from root grant to the final delegated grant.
/// The chain must be ordered: chain[0] is the root grant (A→B),
/// chain[1] is the first delegation (B→C), etc.
///
/// The walk is bounded by the root's delegation limit. Any broken rule
/// returns `Ok(false)`.
///
/// # Errors
///
/// `Validation` for an empty chain or an empty capability, `InvalidEncoding`
/// if any link carries a malformed key or signature.
pub fn verify_trust_chain(
    chain: &[TrustGrant],
    requested_capability: &str,
    now: u64,
) -> Result<bool> {
    validate_requested(requested_capability)?;
    let Some(root) = chain.first() else {
        return Err(IdentityError::Validation(
            "trust chain must not be empty".into(),
        ));
    };

    if root.delegation_depth != 0 || root.parent_grant.is_some() {
        log::debug!("chain root {} is itself a delegated grant", root.id);
        return Ok(false);
    }
    let hops = chain.len() - 1;
    if hops > root.delegation_limit() as usize {
        log::debug!("chain of {hops} hops exceeds the root's limit");
        return Ok(false);
    }

    for (i, grant) in chain.iter().enumerate() {
        if !check_grant_at(grant, requested_capability, now, None)?.is_granted() {
            return Ok(false);
        }
        if i > 0 && !is_valid_hop(&chain[i - 1], grant) {
            log::debug!(
                "grant {} is not a valid delegation of {}",
                grant.id,
                chain[i - 1].id
            );
            return Ok(false);
        }
    }

    Ok(true)
}

fn is_valid_hop(parent: &TrustGrant, child: &TrustGrant) -> bool {
    let limit = parent.delegation_limit();
    parent.delegation_allowed
        && child.parent_grant.as_ref() == Some(&parent.id)
        && child.grantor == parent.grantee
        && child.grantor_key == parent.grantee_key
        && child.delegation_depth == parent.delegation_depth.saturating_add(1)
        && child.delegation_depth <= limit
        && child.delegation_limit() <= limit
}

/// Check that the grantee of `parent_grant` may delegate `requested_capabilities`.
///
/// # Errors
///
/// `Validation` if delegation is not allowed, the depth would be exceeded
/// or overflow, `delegator` is not the parent's grantee, or a capability is
/// not covered by the parent.
pub fn validate_delegation(
    parent_grant: &TrustGrant,
    delegator: &IdentityId,
    requested_capabilities: &[Capability],
) -> Result<()> {
    if !parent_grant.delegation_allowed {
        return Err(IdentityError::Validation(format!(
            "grant {} does not allow delegation",
            parent_grant.id
        )));
    }

    let next_depth = parent_grant
        .delegation_depth
        .checked_add(1)
        .ok_or_else(|| IdentityError::Validation("delegation depth overflows".into()))?;
    if next_depth > parent_grant.delegation_limit() {
        return Err(IdentityError::Validation(format!(
            "delegation depth {next_depth} exceeds limit {}",
            parent_grant.delegation_limit()
        )));
    }

    if delegator != &parent_grant.grantee {
        return Err(IdentityError::Validation(format!(
            "{delegator} is not the grantee of {}",
            parent_grant.id
        )));
    }

    for cap in requested_capabilities {
        if !capabilities_cover(&parent_grant.capabilities, &cap.uri) {
            return Err(IdentityError::Validation(format!(
                "parent grant does not cover capability: {}",
                cap.uri
            )));
        }
    }

    Ok(())
}

/// Delegate part of `parent` onward, signed by the parent's grantee.
///
/// The child sits one level deeper than the parent, inherits the parent's
/// delegation limit, and may delegate further only while that limit leaves
/// room.
///
/// # Errors
///
/// Everything [`validate_delegation`] rejects, plus `Validation` if the
/// parent's own signature does not verify.
pub fn delegate(
    parent: &TrustGrant,
    delegator: &IdentityAnchor,
    grantee_id: &str,
    grantee_key: &str,
    capabilities: &[&str],
    constraints: Option<TrustConstraints>,
) -> Result<TrustGrant> {
    let caps: Vec<Capability> = capabilities.iter().copied().map(Capability::new).collect();
    validate_delegation(parent, &delegator.id()?, &caps)?;
    if !parent.verify_signature()? {
        return Err(IdentityError::Validation(format!(
            "parent grant {} has an invalid signature",
            parent.id
        )));
    }

    let depth = parent
        .delegation_depth
        .checked_add(1)
        .ok_or_else(|| IdentityError::Validation("delegation depth overflows".into()))?;
    let limit = parent.delegation_limit();
    let mut builder = TrustGrantBuilder::new(IdentityId(grantee_id.to_string()), grantee_key)
        .capabilities(caps)
        .constraints(constraints.unwrap_or_default())
        .delegated_from(parent.id.clone(), depth);
    if depth < limit {
        builder = builder.allow_delegation(limit);
    }
    builder.sign(delegator)
}
