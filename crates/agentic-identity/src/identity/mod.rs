//! Identity management — creation, loading and release.
//!
//! The identity module provides the core `IdentityAnchor` type
//! which is the root of an agent's cryptographic identity.

pub mod anchor;

pub use anchor::{IdentityAnchor, IdentityDocument, IdentityId, ALGORITHM_ED25519};
