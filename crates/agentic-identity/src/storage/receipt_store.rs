//! Receipt persistence — the on-disk audit trail.
//!
//! Each receipt is stored as `{base_dir}/{receipt_id}.json`:
//!
//! ```json
//! { "version": 1, "receipt": { ... ActionReceipt ... } }
//! ```
//!
//! Only receipts that verify are written, and every load verifies again, so a
//! file edited on disk surfaces as an error instead of a forged entry.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{IdentityError, Result};
use crate::receipt::{check_receipt, ActionReceipt, ReceiptId};

use super::record_file_name;

const RECEIPT_FILE_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct ReceiptFile {
    version: u32,
    receipt: ActionReceipt,
}

/// Filesystem-backed store for [`ActionReceipt`] records.
///
/// Safe for use from one process. Writes from several processes are not
/// coordinated.
#[derive(Debug, Clone)]
pub struct ReceiptStore {
    base_dir: PathBuf,
}

impl ReceiptStore {
    /// Open a store rooted at `base_dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// `Io` if the directory cannot be created.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        std::fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Persist a receipt. Saving the same receipt twice is a no-op overwrite.
    ///
    /// # Errors
    ///
    /// `Validation` if the receipt does not verify or its id is not a receipt
    /// id, `InvalidEncoding` for a malformed key or signature, `Io` for
    /// filesystem errors.
    pub fn save(&self, receipt: &ActionReceipt) -> Result<()> {
        if !check_receipt(receipt)?.is_valid {
            return Err(IdentityError::Validation(format!(
                "refusing to store unverified receipt {}",
                receipt.id
            )));
        }
        let path = self.receipt_path(&receipt.id)?;
        let file = ReceiptFile {
            version: RECEIPT_FILE_VERSION,
            receipt: receipt.clone(),
        };
        std::fs::write(&path, serde_json::to_vec_pretty(&file)?)?;
        log::debug!("stored receipt {}", receipt.id);
        Ok(())
    }

    /// Load and re-verify a receipt by id.
    ///
    /// # Errors
    ///
    /// `NotFound` if no file exists, `InvalidFileFormat` if the file cannot be
    /// parsed or its receipt no longer verifies, `Io` for other filesystem
    /// errors.
    pub fn load(&self, id: &ReceiptId) -> Result<ActionReceipt> {
        let path = self.receipt_path(id)?;
        let bytes = std::fs::read(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                IdentityError::NotFound(format!("receipt not found: {id}"))
            } else {
                IdentityError::Io(e)
            }
        })?;
        let file: ReceiptFile = serde_json::from_slice(&bytes).map_err(|e| {
            IdentityError::InvalidFileFormat(format!(
                "failed to parse receipt file {}: {e}",
                path.display()
            ))
        })?;
        if file.version != RECEIPT_FILE_VERSION {
            return Err(IdentityError::InvalidFileFormat(format!(
                "unsupported receipt file version {}",
                file.version
            )));
        }
        if file.receipt.id != *id || !check_receipt(&file.receipt)?.is_valid {
            log::warn!("receipt file {} failed verification", path.display());
            return Err(IdentityError::InvalidFileFormat(format!(
                "stored receipt {id} does not verify"
            )));
        }
        Ok(file.receipt)
    }

    /// Ids of every stored receipt, sorted.
    ///
    /// # Errors
    ///
    /// `Io` if the directory cannot be read.
    pub fn list(&self) -> Result<Vec<ReceiptId>> {
        let mut ids = Vec::new();
        for entry in std::fs::read_dir(&self.base_dir)? {
            let name = entry?.file_name();
            if let Some(stem) = name.to_string_lossy().strip_suffix(".json") {
                if stem.starts_with(ReceiptId::PREFIX) {
                    ids.push(ReceiptId(stem.to_string()));
                }
            }
        }
        ids.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(ids)
    }

    /// Remove a receipt. Removing an id that is not stored is not an error.
    ///
    /// # Errors
    ///
    /// `Io` for filesystem errors other than "not found".
    pub fn delete(&self, id: &ReceiptId) -> Result<()> {
        match std::fs::remove_file(self.receipt_path(id)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(IdentityError::Io(e)),
        }
    }

    /// Walk `previous_receipt` links back from `tip`, oldest receipt first.
    ///
    /// The walk stops at a receipt with no predecessor or whose predecessor
    /// is not in the store, so the result may be a partial chain. Pass it to
    /// [`verify_chain`](crate::receipt::verify_chain) to check the links.
    ///
    /// # Errors
    ///
    /// Anything [`ReceiptStore::load`] returns for `tip` or a stored
    /// predecessor, and `Validation` if the links form a cycle.
    pub fn load_chain(&self, tip: &ReceiptId) -> Result<Vec<ActionReceipt>> {
        let mut chain = vec![self.load(tip)?];
        let mut seen = HashSet::from([tip.clone()]);

        while let Some(prev) = chain.last().and_then(|r| r.previous_receipt.clone()) {
            if !seen.insert(prev.clone()) {
                return Err(IdentityError::Validation(format!(
                    "receipt chain loops back to {prev}"
                )));
            }
            match self.load(&prev) {
                Ok(receipt) => chain.push(receipt),
                Err(IdentityError::NotFound(_)) => break,
                Err(e) => return Err(e),
            }
        }

        chain.reverse();
        Ok(chain)
    }

    fn receipt_path(&self, id: &ReceiptId) -> Result<PathBuf> {
        Ok(self
            .base_dir
            .join(record_file_name(&id.0, ReceiptId::PREFIX)?))
    }
}
