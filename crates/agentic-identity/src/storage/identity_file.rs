//! .aid file format — encrypted identity storage.
//!
//! An `.aid` file stores an identity anchor's private key material
//! encrypted with ChaCha20-Poly1305 under a key derived from a
//! user passphrase via Argon2id, alongside the public identity document
//! in plaintext for inspection without decryption.
//!
//! File format (JSON):
//! ```json
//! {
//!     "version": 1,
//!     "format": "aid-v1",
//!     "encryption": {
//!         "algorithm": "chacha20-poly1305",
//!         "kdf": "argon2id",
//!         "kdf_params": { "m_cost_kib": 65536, "t_cost": 3, "p_cost": 4 },
//!         "salt": "<base64-16-bytes>",
//!         "nonce": "<base64-12-bytes>"
//!     },
//!     "encrypted_anchor": "<base64-ciphertext>",
//!     "public_document": { ... IdentityDocument ... }
//! }
//! ```
//!
//! Files written before `kdf_params` existed are read with the default
//! work factors.

use std::io::Write;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::config::KdfParams;
use crate::crypto::derivation::{self, IDENTITY_ENCRYPTION_CONTEXT};
use crate::crypto::{encryption, random};
use crate::error::{IdentityError, Result};
use crate::identity::{IdentityAnchor, IdentityDocument};

// ── File format constants ─────────────────────────────────────────────────────

pub const AID_VERSION: u32 = 1;
pub const AID_FORMAT: &str = "aid-v1";
pub const AID_ALGORITHM: &str = "chacha20-poly1305";
pub const AID_KDF: &str = "argon2id";

// ── On-disk structures ────────────────────────────────────────────────────────

/// Top-level structure written to disk as a `.aid` file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AidFile {
    /// Format version number.
    pub version: u32,
    /// Format identifier string.
    pub format: String,
    /// Encryption parameters needed for decryption.
    pub encryption: EncryptionMetadata,
    /// Base64-encoded ciphertext of the encrypted anchor private data.
    pub encrypted_anchor: String,
    /// Public identity document (no private key material).
    pub public_document: IdentityDocument,
}

/// Encryption metadata stored alongside the ciphertext.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptionMetadata {
    /// Symmetric cipher used.
    pub algorithm: String,
    /// Key derivation function used.
    pub kdf: String,
    /// Argon2id work factors used at creation.
    #[serde(default)]
    pub kdf_params: KdfParams,
    /// Base64-encoded Argon2id salt (16 bytes).
    pub salt: String,
    /// Base64-encoded ChaCha20-Poly1305 nonce (12 bytes).
    pub nonce: String,
}

/// Private data serialized into the encrypted anchor blob.
#[derive(Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
struct AnchorPrivateData {
    /// Ed25519 signing key bytes encoded as base64.
    signing_key_b64: String,
    public_key: String,
    identity_id: String,
    name: Option<String>,
    /// Creation timestamp (seconds since Unix epoch).
    created_at: u64,
}

// ── Sealing ───────────────────────────────────────────────────────────────────

/// Encrypt an open anchor into an in-memory container.
///
/// Key schedule:
/// passphrase → Argon2id(passphrase, salt, params) → master_key
/// HKDF-SHA256(master_key, "identity-encryption") → encryption_key
pub fn seal(anchor: &IdentityAnchor, passphrase: &str, kdf: &KdfParams) -> Result<AidFile> {
    let public_document = anchor.to_document()?;

    let signing_key_b64 = anchor.with_signing_key(|key| {
        let bytes = Zeroizing::new(key.to_bytes());
        STANDARD.encode(bytes.as_slice())
    })?;

    let private_data = AnchorPrivateData {
        signing_key_b64,
        public_key: public_document.public_key.clone(),
        identity_id: public_document.id.0.clone(),
        name: public_document.name.clone(),
        created_at: public_document.created_at,
    };
    let plaintext = Zeroizing::new(serde_json::to_vec(&private_data)?);

    let salt = random::random_salt_16();
    let encryption_key = container_key(passphrase, &salt, kdf)?;
    let (nonce, ciphertext) = encryption::encrypt(&encryption_key, &plaintext)?;

    Ok(AidFile {
        version: AID_VERSION,
        format: AID_FORMAT.to_string(),
        encryption: EncryptionMetadata {
            algorithm: AID_ALGORITHM.to_string(),
            kdf: AID_KDF.to_string(),
            kdf_params: *kdf,
            salt: STANDARD.encode(salt),
            nonce: STANDARD.encode(nonce),
        },
        encrypted_anchor: STANDARD.encode(&ciphertext),
        public_document,
    })
}

/// Decrypt a container back into an open anchor.
///
/// # Errors
///
/// `InvalidFileFormat` for unknown versions, algorithms or malformed fields,
/// `InvalidPassphrase` when authenticated decryption fails or the decrypted
/// identity disagrees with the public document.
pub fn open(aid_file: &AidFile, passphrase: &str) -> Result<IdentityAnchor> {
    check_header(aid_file)?;

    let enc = &aid_file.encryption;
    let salt: [u8; 16] = decode_fixed(&enc.salt, "salt")?;
    let nonce: [u8; 12] = decode_fixed(&enc.nonce, "nonce")?;
    let ciphertext = STANDARD
        .decode(&aid_file.encrypted_anchor)
        .map_err(|e| IdentityError::InvalidFileFormat(format!("invalid ciphertext base64: {e}")))?;

    let encryption_key = container_key(passphrase, &salt, &enc.kdf_params)?;
    let plaintext = Zeroizing::new(encryption::decrypt(&encryption_key, &nonce, &ciphertext)?);

    let private_data: AnchorPrivateData = serde_json::from_slice(&plaintext)
        .map_err(|e| IdentityError::InvalidFileFormat(format!("anchor data: {e}")))?;

    let decoded = Zeroizing::new(STANDARD.decode(&private_data.signing_key_b64).map_err(|_| {
        IdentityError::InvalidFileFormat("signing key is not valid base64".into())
    })?);
    if decoded.len() != 32 {
        return Err(IdentityError::InvalidFileFormat(
            "signing key must be 32 bytes".into(),
        ));
    }
    let mut key_bytes = Zeroizing::new([0u8; 32]);
    key_bytes.copy_from_slice(&decoded);

    let anchor = IdentityAnchor::from_parts(
        &key_bytes,
        private_data.created_at,
        private_data.name.clone(),
    );

    // The plaintext document can be swapped without touching the ciphertext.
    let doc = &aid_file.public_document;
    let id = anchor.identity_id()?;
    let public_key = anchor.public_key()?;
    if id != private_data.identity_id
        || id != doc.id.0
        || public_key != private_data.public_key
        || public_key != doc.public_key
        || doc.name != private_data.name
        || doc.created_at != private_data.created_at
        || !matches!(doc.verify_signature(), Ok(true))
    {
        log::warn!("container identity does not match its public document");
        return Err(IdentityError::InvalidPassphrase);
    }

    Ok(anchor)
}

fn check_header(aid_file: &AidFile) -> Result<()> {
    if aid_file.version != AID_VERSION || aid_file.format != AID_FORMAT {
        return Err(IdentityError::InvalidFileFormat(format!(
            "unsupported .aid file version={} format={}",
            aid_file.version, aid_file.format,
        )));
    }
    let enc = &aid_file.encryption;
    if enc.algorithm != AID_ALGORITHM || enc.kdf != AID_KDF {
        return Err(IdentityError::InvalidFileFormat(format!(
            "unsupported encryption algorithm={} kdf={}",
            enc.algorithm, enc.kdf,
        )));
    }
    enc.kdf_params
        .check()
        .map_err(|e| IdentityError::InvalidFileFormat(format!("kdf_params: {e}")))
}

fn decode_fixed<const N: usize>(b64: &str, what: &str) -> Result<[u8; N]> {
    let bytes = STANDARD
        .decode(b64)
        .map_err(|e| IdentityError::InvalidFileFormat(format!("invalid {what} base64: {e}")))?;
    bytes
        .try_into()
        .map_err(|_| IdentityError::InvalidFileFormat(format!("{what} must be {N} bytes")))
}

fn container_key(
    passphrase: &str,
    salt: &[u8; 16],
    kdf: &KdfParams,
) -> Result<Zeroizing<[u8; 32]>> {
    let master_key = Zeroizing::new(encryption::derive_passphrase_key(
        passphrase.as_bytes(),
        salt,
        kdf,
    )?);
    Ok(Zeroizing::new(derivation::derive_key(
        &master_key,
        IDENTITY_ENCRYPTION_CONTEXT,
    )?))
}

// ── Files ─────────────────────────────────────────────────────────────────────

/// Read and parse a container.
///
/// # Errors
///
/// `NotFound` if the path does not exist, `Io` for other filesystem errors,
/// `InvalidFileFormat` if the content is not a container.
pub fn read_aid_file(path: &Path) -> Result<AidFile> {
    let bytes = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            IdentityError::NotFound(path.display().to_string())
        } else {
            IdentityError::Io(e)
        }
    })?;
    serde_json::from_slice(&bytes)
        .map_err(|e| IdentityError::InvalidFileFormat(format!("failed to parse .aid file: {e}")))
}

/// Write a container to a path that must not exist yet.
///
/// The JSON is written to a sibling temporary file and then hard-linked into
/// place, so readers never see a partial file and an existing container is
/// never clobbered. On Unix the file is created with mode `0600`.
pub fn write_new_aid_file(path: &Path, aid_file: &AidFile) -> Result<()> {
    let json = serde_json::to_vec_pretty(aid_file)?;

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension(format!("aid.{}.tmp", random::random_id("")));
    let result = write_private(&tmp_path, &json).and_then(|()| std::fs::hard_link(&tmp_path, path));
    let _ = std::fs::remove_file(&tmp_path);
    result?;
    Ok(())
}

fn write_private(path: &Path, data: &[u8]) -> std::io::Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options.open(path)?;
    file.write_all(data)?;
    file.sync_all()
}

// ── Tests ─────────────────────────────────────────────────────────────────────
