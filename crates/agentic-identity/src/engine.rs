//! Engine — the boundary surface for host bindings.
//!
//! Loaded identities live in a handle table owned by an [`Engine`] the
//! caller constructs. Handles are plain integers that are never reused, so a
//! stale handle fails with [`IdentityError::InvalidHandle`] instead of
//! reaching freed key material. Records cross this surface as JSON text.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::config::EngineConfig;
use crate::error::{IdentityError, Result};
use crate::identity::IdentityAnchor;
use crate::receipt;
use crate::storage::KeyVault;
use crate::trust::{self, TrustConstraints};
use crate::verification;

/// Opaque reference to an identity loaded into an [`Engine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnchorHandle(pub u64);

impl std::fmt::Display for AnchorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Holds the vault configuration and every identity currently open.
#[derive(Debug)]
pub struct Engine {
    vault: KeyVault,
    anchors: Mutex<HashMap<u64, Arc<IdentityAnchor>>>,
    next_handle: AtomicU64,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            vault: KeyVault::new(config.vault),
            anchors: Mutex::new(HashMap::new()),
            // 0 is never handed out
            next_handle: AtomicU64::new(1),
        }
    }

    /// Version of this library, `major.minor.patch`.
    pub fn version() -> &'static str {
        crate::version()
    }

    pub fn vault(&self) -> &KeyVault {
        &self.vault
    }

    fn register(&self, anchor: IdentityAnchor) -> AnchorHandle {
        let handle = self.next_handle.fetch_add(1, Ordering::Relaxed);
        self.anchors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(handle, Arc::new(anchor));
        AnchorHandle(handle)
    }

    fn anchor(&self, handle: AnchorHandle) -> Result<Arc<IdentityAnchor>> {
        self.anchors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&handle.0)
            .cloned()
            .ok_or(IdentityError::InvalidHandle)
    }

    /// Number of identities currently open.
    pub fn open_count(&self) -> usize {
        self.anchors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Create a new encrypted identity at `path` and open it.
    pub fn create_identity(
        &self,
        path: impl AsRef<Path>,
        passphrase: &str,
        name: Option<&str>,
    ) -> Result<AnchorHandle> {
        let anchor = self.vault.create(path.as_ref(), passphrase, name)?;
        Ok(self.register(anchor))
    }

    /// Decrypt the identity at `path` and open it.
    pub fn load_identity(&self, path: impl AsRef<Path>, passphrase: &str) -> Result<AnchorHandle> {
        let anchor = self.vault.load(path.as_ref(), passphrase)?;
        Ok(self.register(anchor))
    }

    /// Release an identity and zeroize its signing key.
    ///
    /// Closing an unknown or already closed handle is `InvalidHandle`.
    pub fn close_identity(&self, handle: AnchorHandle) -> Result<()> {
        let anchor = self
            .anchors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&handle.0)
            .ok_or(IdentityError::InvalidHandle)?;
        // Another thread may still hold a clone mid-call; closing the anchor
        // itself makes that clone unusable too.
        anchor.close();
        Ok(())
    }

    pub fn identity_id(&self, handle: AnchorHandle) -> Result<String> {
        self.anchor(handle)?.identity_id()
    }

    pub fn public_key(&self, handle: AnchorHandle) -> Result<String> {
        self.anchor(handle)?.public_key()
    }

    /// Sign an action and return the receipt as JSON.
    ///
    /// `data_json`, when given, must be a JSON value.
    pub fn sign_action(
        &self,
        handle: AnchorHandle,
        action_type: &str,
        description: &str,
        data_json: Option<&str>,
        previous_receipt: Option<&str>,
    ) -> Result<String> {
        let anchor = self.anchor(handle)?;
        let data = data_json
            .map(serde_json::from_str::<serde_json::Value>)
            .transpose()?;
        receipt::sign_action(&anchor, action_type, description, data, previous_receipt)?.to_json()
    }

    /// Grant capabilities to another identity and return the grant as JSON.
    ///
    /// `capabilities_json` is a JSON array of capability URIs.
    /// `constraints_json`, when given, is an object with any of `not_before`,
    /// `not_after` and `max_uses`.
    pub fn create_trust_grant(
        &self,
        handle: AnchorHandle,
        grantee_id: &str,
        grantee_key: &str,
        capabilities_json: &str,
        constraints_json: Option<&str>,
        max_delegation_depth: Option<u32>,
    ) -> Result<String> {
        let anchor = self.anchor(handle)?;
        let capabilities: Vec<String> = serde_json::from_str(capabilities_json)?;
        let constraints = constraints_json
            .map(serde_json::from_str::<TrustConstraints>)
            .transpose()?;
        let caps: Vec<&str> = capabilities.iter().map(String::as_str).collect();
        trust::create_trust_grant(
            &anchor,
            grantee_id,
            grantee_key,
            &caps,
            constraints,
            max_delegation_depth,
        )?
        .to_json()
    }

    /// See [`verification::verify_receipt`].
    pub fn verify_receipt(&self, receipt_json: &str) -> Result<bool> {
        verification::verify_receipt(receipt_json)
    }

    /// See [`verification::verify_trust_grant`].
    pub fn verify_trust_grant(&self, grant_json: &str, capability: &str) -> Result<bool> {
        verification::verify_trust_grant(grant_json, capability)
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        let anchors = self
            .anchors
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        for (_, anchor) in anchors.drain() {
            anchor.close();
        }
    }
}
