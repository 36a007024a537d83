//! Key vault — passphrase-protected identity lifecycle.
//!
//! `create` generates a key pair and seals it into a new container;
//! `load` opens a container back into a live [`IdentityAnchor`].
//! Both block on file I/O and on Argon2id, which is deliberately slow.

use std::path::Path;

use crate::config::VaultConfig;
use crate::error::{IdentityError, Result};
use crate::identity::{IdentityAnchor, IdentityDocument};
use crate::storage::identity_file;

/// Creates, loads and inspects `.aid` identity containers.
#[derive(Debug, Clone, Default)]
pub struct KeyVault {
    config: VaultConfig,
}

impl KeyVault {
    pub fn new(config: VaultConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Generate a fresh identity and write it, encrypted, to `path`.
    ///
    /// An empty `name` is treated as no name.
    ///
    /// # Errors
    ///
    /// `Validation` for an empty passphrase, `Io` if the path exists or is
    /// not writable, `DerivationFailed`/`EncryptionFailed` on crypto faults.
    pub fn create(
        &self,
        path: &Path,
        passphrase: &str,
        name: Option<&str>,
    ) -> Result<IdentityAnchor> {
        let anchor = Self::ephemeral(name);
        self.save(&anchor, path, passphrase)?;
        log::info!(
            "created identity {} at {}",
            anchor.identity_id()?,
            path.display()
        );
        Ok(anchor)
    }

    /// Write an already-open anchor to a new container at `path`.
    pub fn save(&self, anchor: &IdentityAnchor, path: &Path, passphrase: &str) -> Result<()> {
        if passphrase.is_empty() {
            return Err(IdentityError::Validation(
                "passphrase must not be empty".into(),
            ));
        }
        let aid_file = identity_file::seal(anchor, passphrase, &self.config.kdf)?;
        identity_file::write_new_aid_file(path, &aid_file)
    }

    /// Decrypt the container at `path`.
    ///
    /// # Errors
    ///
    /// `NotFound` if the path does not exist, `InvalidPassphrase` for a wrong
    /// passphrase or a tampered container (indistinguishable on purpose),
    /// `InvalidFileFormat` for a malformed or unsupported container.
    pub fn load(&self, path: &Path, passphrase: &str) -> Result<IdentityAnchor> {
        let aid_file = identity_file::read_aid_file(path)?;
        let anchor = identity_file::open(&aid_file, passphrase).map_err(|e| {
            log::warn!("rejected container {}: {}", path.display(), e.kind());
            e
        })?;
        log::info!(
            "loaded identity {} from {}",
            anchor.identity_id()?,
            path.display()
        );
        Ok(anchor)
    }

    /// Create a named identity under the configured identity directory.
    pub fn create_named(&self, name: &str, passphrase: &str) -> Result<IdentityAnchor> {
        let path = self.config.identity_path(name)?;
        self.create(&path, passphrase, Some(name))
    }

    /// Load a named identity from the configured identity directory.
    pub fn load_named(&self, name: &str, passphrase: &str) -> Result<IdentityAnchor> {
        let path = self.config.identity_path(name)?;
        self.load(&path, passphrase)
    }

    /// Read only the public identity document from a container.
    ///
    /// This does not require the passphrase because the public document is
    /// stored in plaintext. The document is not trusted until
    /// [`IdentityDocument::verify_signature`] says so.
    pub fn read_public_document(&self, path: &Path) -> Result<IdentityDocument> {
        Ok(identity_file::read_aid_file(path)?.public_document)
    }

    /// An in-memory identity that is never written anywhere.
    pub fn ephemeral(name: Option<&str>) -> IdentityAnchor {
        let name = name.filter(|n| !n.is_empty()).map(str::to_string);
        IdentityAnchor::generate(name)
    }
}
