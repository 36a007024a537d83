//! Trust grant persistence.
//!
//! ```text
//! {base_dir}/
//! ├── granted/     grants issued by this identity
//! │   └── {trust_id}.json
//! └── received/    grants issued to this identity
//!     └── {trust_id}.json
//! ```
//!
//! Each file is `{ "version": 1, "grant": { ... TrustGrant ... } }`. Grants
//! are signature-checked on save and on load.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{IdentityError, Result};
use crate::trust::{TrustGrant, TrustId};

use super::record_file_name;

const TRUST_FILE_VERSION: u32 = 1;

const GRANTED_DIR: &str = "granted";
const RECEIVED_DIR: &str = "received";

#[derive(Debug, Serialize, Deserialize)]
struct TrustGrantFile {
    version: u32,
    grant: TrustGrant,
}

/// Filesystem-backed store for [`TrustGrant`] records.
///
/// One grant id may be present in both directories when grantor and grantee
/// share a machine.
#[derive(Debug, Clone)]
pub struct TrustStore {
    base_dir: PathBuf,
}

impl TrustStore {
    /// Open a store rooted at `base_dir`, creating `granted/` and `received/`.
    ///
    /// # Errors
    ///
    /// `Io` if a directory cannot be created.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(base_dir.join(GRANTED_DIR))?;
        std::fs::create_dir_all(base_dir.join(RECEIVED_DIR))?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Persist a grant this identity issued.
    ///
    /// # Errors
    ///
    /// `Validation` if the grant signature does not verify, `InvalidEncoding`
    /// for a malformed key or signature, `Io` for filesystem errors.
    pub fn save_granted(&self, grant: &TrustGrant) -> Result<()> {
        self.write_grant(grant, GRANTED_DIR)
    }

    /// Persist a grant this identity received.
    ///
    /// # Errors
    ///
    /// Same as [`TrustStore::save_granted`].
    pub fn save_received(&self, grant: &TrustGrant) -> Result<()> {
        self.write_grant(grant, RECEIVED_DIR)
    }

    /// Load a grant by id, looking in `granted/` then `received/`.
    ///
    /// # Errors
    ///
    /// `NotFound` if neither directory holds it, `InvalidFileFormat` if the
    /// file cannot be parsed or its grant no longer verifies.
    pub fn load_grant(&self, id: &TrustId) -> Result<TrustGrant> {
        let name = record_file_name(&id.0, TrustId::PREFIX)?;
        for dir in [GRANTED_DIR, RECEIVED_DIR] {
            let path = self.base_dir.join(dir).join(&name);
            if path.exists() {
                return read_grant(&path, id);
            }
        }
        Err(IdentityError::NotFound(format!("trust grant not found: {id}")))
    }

    /// Ids in `granted/`, sorted.
    pub fn list_granted(&self) -> Result<Vec<TrustId>> {
        self.list_ids(GRANTED_DIR)
    }

    /// Ids in `received/`, sorted.
    pub fn list_received(&self) -> Result<Vec<TrustId>> {
        self.list_ids(RECEIVED_DIR)
    }

    /// Remove a grant from both directories. Missing files are not an error.
    pub fn delete(&self, id: &TrustId) -> Result<()> {
        let name = record_file_name(&id.0, TrustId::PREFIX)?;
        for dir in [GRANTED_DIR, RECEIVED_DIR] {
            match std::fs::remove_file(self.base_dir.join(dir).join(&name)) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(IdentityError::Io(e)),
            }
        }
        Ok(())
    }

    /// Follow `parent_grant` links from `leaf` up to its root.
    ///
    /// Returns the chain root first, ready for
    /// [`verify_trust_chain`](crate::trust::verify_trust_chain).
    ///
    /// # Errors
    ///
    /// `NotFound` if `leaf` or any ancestor is missing, `Validation` if the
    /// links loop, plus anything [`TrustStore::load_grant`] returns.
    pub fn load_chain(&self, leaf: &TrustId) -> Result<Vec<TrustGrant>> {
        let mut chain = vec![self.load_grant(leaf)?];
        let mut seen = HashSet::from([leaf.clone()]);

        while let Some(parent) = chain.last().and_then(|g| g.parent_grant.clone()) {
            if !seen.insert(parent.clone()) {
                return Err(IdentityError::Validation(format!(
                    "delegation chain loops back to {parent}"
                )));
            }
            chain.push(self.load_grant(&parent)?);
        }

        chain.reverse();
        Ok(chain)
    }

    fn write_grant(&self, grant: &TrustGrant, dir: &str) -> Result<()> {
        if !grant.verify_signature()? {
            return Err(IdentityError::Validation(format!(
                "refusing to store grant {} with an invalid signature",
                grant.id
            )));
        }
        let path = self
            .base_dir
            .join(dir)
            .join(record_file_name(&grant.id.0, TrustId::PREFIX)?);
        let file = TrustGrantFile {
            version: TRUST_FILE_VERSION,
            grant: grant.clone(),
        };
        std::fs::write(&path, serde_json::to_vec_pretty(&file)?)?;
        log::debug!("stored grant {} under {dir}/", grant.id);
        Ok(())
    }

    fn list_ids(&self, dir: &str) -> Result<Vec<TrustId>> {
        let mut ids = Vec::new();
        for entry in std::fs::read_dir(self.base_dir.join(dir))? {
            let name = entry?.file_name();
            if let Some(stem) = name.to_string_lossy().strip_suffix(".json") {
                if stem.starts_with(TrustId::PREFIX) {
                    ids.push(TrustId(stem.to_string()));
                }
            }
        }
        ids.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(ids)
    }
}

fn read_grant(path: &Path, id: &TrustId) -> Result<TrustGrant> {
    let bytes = std::fs::read(path)?;
    let file: TrustGrantFile = serde_json::from_slice(&bytes).map_err(|e| {
        IdentityError::InvalidFileFormat(format!(
            "failed to parse trust file {}: {e}",
            path.display()
        ))
    })?;
    if file.version != TRUST_FILE_VERSION {
        return Err(IdentityError::InvalidFileFormat(format!(
            "unsupported trust file version {}",
            file.version
        )));
    }
    if file.grant.id != *id || !file.grant.verify_signature()? {
        log::warn!("trust file {} failed verification", path.display());
        return Err(IdentityError::InvalidFileFormat(format!(
            "stored grant {id} does not verify"
        )));
    }
    Ok(file.grant)
}
