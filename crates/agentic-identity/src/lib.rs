//! AgenticIdentity — Cryptographic identity anchor for AI agents.
//!
//! Provides persistent, passphrase-protected identities, signed and
//! hash-chained action receipts, and scoped trust grants between
//! identities, with stateless verification of all of them.
//!
//! ```no_run
//! use agentic_identity::{sign_action, verification, KeyVault};
//!
//! # fn main() -> agentic_identity::Result<()> {
//! let vault = KeyVault::default();
//! let anchor = vault.create("agent.aid".as_ref(), "passphrase", Some("agent"))?;
//! let receipt = sign_action(&anchor, "decision", "Approved deploy", None, None)?;
//! assert!(verification::verify_receipt(&receipt.to_json()?)?);
//! # Ok(())
//! # }
//! ```

pub mod canonical;
pub mod config;
pub mod crypto;
pub mod engine;
pub mod error;
pub mod identity;
pub mod receipt;
pub mod storage;
pub mod time;
pub mod trust;
pub mod verification;

// Re-export primary types
pub use config::{EngineConfig, KdfParams, VaultConfig};
pub use engine::{AnchorHandle, Engine};
pub use error::{ErrorKind, IdentityError, Result, AID_OK};
pub use identity::{IdentityAnchor, IdentityDocument, IdentityId};
pub use receipt::{
    sign_action, ActionContent, ActionReceipt, ActionType, ReceiptBuilder, ReceiptId,
    ReceiptVerification,
};
pub use storage::{KeyVault, ReceiptStore, TrustStore};
pub use trust::{
    create_trust_grant, Capability, GrantPhase, TrustConstraints, TrustGrant, TrustGrantBuilder,
    TrustId, TrustVerdict,
};

/// Library version as `major.minor.patch`.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
