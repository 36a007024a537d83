//! Storage layer for identity containers and the local audit trail.
//!
//! Handles the `.aid` file format, the [`KeyVault`] that creates and
//! loads passphrase-protected identities, and JSON stores for receipts and
//! trust grants.
//!
//! # Directory layout
//!
//! By convention the default root is `~/.agentic/`:
//!
//! ```text
//! ~/.agentic/
//! ├── identity/
//! │   ├── default.aid
//! │   └── {name}.aid
//! ├── receipts/
//! │   └── {receipt_id}.json
//! └── trust/
//!     ├── granted/
//!     └── received/
//! ```
//!
//! # Modules
//!
//! - [`identity_file`] — `.aid` container sealing, parsing and atomic writes.
//! - [`vault`] — the key vault operations built on top of it.
//! - [`receipt_store`] — one verified receipt per file.
//! - [`trust_store`] — issued and received grants.

pub mod identity_file;
pub mod receipt_store;
pub mod trust_store;
pub mod vault;

pub use identity_file::{AidFile, EncryptionMetadata};
pub use receipt_store::ReceiptStore;
pub use trust_store::TrustStore;
pub use vault::KeyVault;

use crate::error::{IdentityError, Result};

/// `{id}.json` for a record id, which must be `prefix` followed by base58.
///
/// Ids come from untrusted records, so anything that could name a path
/// outside the store is rejected.
pub(crate) fn record_file_name(id: &str, prefix: &str) -> Result<String> {
    let valid = id.strip_prefix(prefix).is_some_and(|rest| {
        !rest.is_empty() && rest.chars().all(|c| c.is_ascii_alphanumeric())
    });
    if !valid {
        return Err(IdentityError::Validation(format!(
            "not a valid {prefix} record id: {id:?}"
        )));
    }
    Ok(format!("{id}.json"))
}
