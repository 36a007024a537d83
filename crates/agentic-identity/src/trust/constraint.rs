//! Trust constraints — time and count limits.
//!
//! Constraints define the boundaries of a trust grant: when it becomes
//! valid, when it expires and how many times it may be used. Both time
//! bounds are inclusive.

use serde::{Deserialize, Serialize};

use crate::error::{IdentityError, Result};

/// Effective validity of a grant at some instant. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GrantPhase {
    NotYetActive,
    Active,
    Expired,
}

/// Constraints on a trust grant.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustConstraints {
    /// Not valid before this time (seconds since epoch).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_before: Option<u64>,
    /// Not valid after this time (seconds since epoch).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_after: Option<u64>,
    /// Maximum number of uses, enforced by whoever tracks usage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_uses: Option<u64>,
}

impl TrustConstraints {
    /// No time bounds, unlimited uses.
    pub fn open() -> Self {
        Self::default()
    }

    /// Create constraints with a specific time window.
    pub fn time_bounded(not_before: u64, not_after: u64) -> Self {
        Self {
            not_before: Some(not_before),
            not_after: Some(not_after),
            max_uses: None,
        }
    }

    pub fn valid_from(mut self, not_before: u64) -> Self {
        self.not_before = Some(not_before);
        self
    }

    pub fn expires_at(mut self, not_after: u64) -> Self {
        self.not_after = Some(not_after);
        self
    }

    /// Add a maximum use count.
    pub fn with_max_uses(mut self, max: u64) -> Self {
        self.max_uses = Some(max);
        self
    }

    /// Reject constraints no grant could ever satisfy.
    pub fn validate(&self) -> Result<()> {
        if let (Some(nb), Some(na)) = (self.not_before, self.not_after) {
            if nb > na {
                return Err(IdentityError::Validation(format!(
                    "not_before ({nb}) is after not_after ({na})"
                )));
            }
        }
        if self.max_uses == Some(0) {
            return Err(IdentityError::Validation(
                "max_uses must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Phase at the given time.
    pub fn phase_at(&self, now: u64) -> GrantPhase {
        if self.not_before.is_some_and(|nb| now < nb) {
            return GrantPhase::NotYetActive;
        }
        if self.not_after.is_some_and(|na| now > na) {
            return GrantPhase::Expired;
        }
        GrantPhase::Active
    }

    /// Check if the grant is within its time window at the given time.
    pub fn is_time_valid(&self, now: u64) -> bool {
        self.phase_at(now) == GrantPhase::Active
    }

    /// Check if the use count is within limits.
    pub fn is_within_uses(&self, current_uses: u64) -> bool {
        match self.max_uses {
            Some(max) => current_uses < max,
            None => true,
        }
    }
}
