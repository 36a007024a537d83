//! Trust web — scoped trust relationships between identities.
//!
//! The trust module provides:
//! - Capability URI parsing with wildcard matching
//! - Time-bounded, use-limited trust constraints
//! - Signed trust grants between identities
//! - Trust chain verification for delegation
//! - Delegation depth limits

pub mod capability;
pub mod chain;
pub mod constraint;
pub mod grant;
pub mod verify;

pub use capability::{capabilities_cover, capabilities_cover_all, Capability};
pub use chain::{delegate, validate_delegation, verify_trust_chain};
pub use constraint::{GrantPhase, TrustConstraints};
pub use grant::{create_trust_grant, TrustGrant, TrustGrantBuilder, TrustId};
pub use verify::{check_grant, check_grant_at, is_grant_valid, TrustVerdict};
