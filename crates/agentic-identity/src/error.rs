//! Error types for AgenticIdentity.
//!
//! All errors are strongly typed and propagated without panicking.
//! Private key material is never included in error messages.
//!
//! Every [`IdentityError`] collapses to one [`ErrorKind`] from a small,
//! fixed taxonomy with a stable numeric code, so bindings in any host
//! language can map failures onto their own conventions.

use std::fmt;

/// Status code returned by boundary operations that succeed.
pub const AID_OK: i32 = 0;

/// Stable error classification shared with foreign bindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A required argument or field was absent.
    NullOrMissingInput,
    /// A string or byte argument was not valid text or had the wrong length.
    InvalidEncoding,
    /// Key generation, derivation, encryption or signing hit an internal fault.
    CryptoFailure,
    /// Filesystem access failed.
    IoFailure,
    /// A structured record could not be parsed or canonicalized.
    SerializationFailure,
    /// Authenticated decryption of a container failed.
    PassphraseFailure,
    /// A semantic precondition was violated.
    ValidationFailure,
    /// An operation was attempted on a closed identity anchor.
    InvalidHandle,
}

impl ErrorKind {
    /// All kinds, in code order.
    pub const ALL: [ErrorKind; 8] = [
        Self::NullOrMissingInput,
        Self::InvalidEncoding,
        Self::CryptoFailure,
        Self::IoFailure,
        Self::SerializationFailure,
        Self::PassphraseFailure,
        Self::ValidationFailure,
        Self::InvalidHandle,
    ];

    /// Stable numeric code. Never changes between releases.
    pub fn code(self) -> i32 {
        match self {
            Self::NullOrMissingInput => -1,
            Self::InvalidEncoding => -2,
            Self::CryptoFailure => -3,
            Self::IoFailure => -4,
            Self::SerializationFailure => -5,
            Self::PassphraseFailure => -6,
            Self::ValidationFailure => -7,
            Self::InvalidHandle => -8,
        }
    }

    /// Inverse of [`ErrorKind::code`].
    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.code() == code)
    }

    /// Stable snake_case name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::NullOrMissingInput => "null_or_missing_input",
            Self::InvalidEncoding => "invalid_encoding",
            Self::CryptoFailure => "crypto_failure",
            Self::IoFailure => "io_failure",
            Self::SerializationFailure => "serialization_failure",
            Self::PassphraseFailure => "passphrase_failure",
            Self::ValidationFailure => "validation_failure",
            Self::InvalidHandle => "invalid_handle",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity error types covering all operations.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("Missing input: {0}")]
    MissingInput(String),

    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    #[error("Key generation failed: {0}")]
    KeyGeneration(String),

    #[error("Key derivation failed: {0}")]
    DerivationFailed(String),

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Identity not found: {0}")]
    NotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid file format: {0}")]
    InvalidFileFormat(String),

    /// Wrong passphrase and tampered container are deliberately the same error.
    #[error("Wrong passphrase or corrupted identity container")]
    InvalidPassphrase,

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Identity handle is closed or unknown")]
    InvalidHandle,
}

impl IdentityError {
    /// Classify this error into the fixed taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MissingInput(_) => ErrorKind::NullOrMissingInput,
            Self::InvalidEncoding(_) => ErrorKind::InvalidEncoding,
            Self::KeyGeneration(_)
            | Self::DerivationFailed(_)
            | Self::EncryptionFailed(_)
            | Self::SigningFailed(_) => ErrorKind::CryptoFailure,
            Self::NotFound(_) | Self::Io(_) => ErrorKind::IoFailure,
            Self::SerializationError(_) | Self::InvalidFileFormat(_) => {
                ErrorKind::SerializationFailure
            }
            Self::InvalidPassphrase => ErrorKind::PassphraseFailure,
            Self::Validation(_) => ErrorKind::ValidationFailure,
            Self::InvalidHandle => ErrorKind::InvalidHandle,
        }
    }

    /// Stable numeric code for this error.
    pub fn code(&self) -> i32 {
        self.kind().code()
    }
}

impl From<serde_json::Error> for IdentityError {
    fn from(e: serde_json::Error) -> Self {
        Self::SerializationError(e.to_string())
    }
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, IdentityError>;
