//! Action receipt — signed proof of an action.
//!
//! The receipt hash and the signature cover the same canonical bytes, so
//! they protect exactly the same content.

use serde::{Deserialize, Serialize};

use crate::canonical::{self, CanonicalRecord, RECEIPT_DOMAIN};
use crate::crypto::random;
use crate::error::{IdentityError, Result};
use crate::identity::{IdentityAnchor, IdentityId};

use super::action::{ActionContent, ActionType};

/// Unique identifier for a receipt.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReceiptId(pub String);

impl ReceiptId {
    /// Prefix carried by every generated id.
    pub const PREFIX: &'static str = "arec_";

    pub(crate) fn generate() -> Self {
        Self(random::random_id(Self::PREFIX))
    }
}

impl std::fmt::Display for ReceiptId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An action receipt proving an agent took an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionReceipt {
    pub id: ReceiptId,
    pub actor: IdentityId,
    /// Base64 public key of the signer.
    pub actor_key: String,
    pub action_type: ActionType,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    /// Seconds since Unix epoch.
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_receipt: Option<ReceiptId>,
    /// Caller-supplied digest of the context the action was taken in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_hash: Option<String>,
    /// Hex SHA-256 of the canonical bytes.
    pub receipt_hash: String,
    /// Base64 Ed25519 signature over the canonical bytes.
    pub signature: String,
}

impl ActionReceipt {
    /// Canonical bytes: every field except `receipt_hash` and `signature`.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>> {
        CanonicalRecord::new(RECEIPT_DOMAIN)
            .field("id", self.id.0.as_str())
            .field("actor", self.actor.0.as_str())
            .field("actor_key", self.actor_key.as_str())
            .field("action_type", self.action_type.as_tag())
            .field("description", self.description.as_str())
            .optional("data", self.data.clone())
            .field("timestamp", self.timestamp)
            .optional(
                "previous_receipt",
                self.previous_receipt.as_ref().map(|r| r.0.as_str()),
            )
            .optional("context_hash", self.context_hash.as_deref())
            .to_bytes()
    }

    /// Recompute the content hash from the current field values.
    pub fn compute_hash(&self) -> Result<String> {
        Ok(canonical::content_hash(&self.canonical_bytes()?))
    }

    /// Serialize to the JSON wire form.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse the JSON wire form. Unknown fields are ignored.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Builder for creating action receipts.
pub struct ReceiptBuilder {
    action_type: ActionType,
    action: ActionContent,
    previous_receipt: Option<ReceiptId>,
    context_hash: Option<String>,
    timestamp: Option<u64>,
}

impl ReceiptBuilder {
    /// Start building a receipt for an action.
    pub fn new(action_type: ActionType, action: ActionContent) -> Self {
        Self {
            action_type,
            action,
            previous_receipt: None,
            context_hash: None,
            timestamp: None,
        }
    }

    /// Chain this receipt to a previous one.
    pub fn chain_to(mut self, previous: ReceiptId) -> Self {
        self.previous_receipt = Some(previous);
        self
    }

    /// Bind the receipt to a digest of the context it was produced in.
    pub fn context_hash(mut self, hash: impl Into<String>) -> Self {
        self.context_hash = Some(hash.into());
        self
    }

    /// Override the signing time (defaults to now).
    pub fn timestamp(mut self, secs: u64) -> Self {
        self.timestamp = Some(secs);
        self
    }

    /// Sign and finalize the receipt.
    ///
    /// # Errors
    ///
    /// `Validation` for an empty action type, previous-receipt id or context hash,
    /// `InvalidHandle` if the anchor is closed, `SerializationError` if the
    /// data cannot be canonicalized.
    pub fn sign(self, anchor: &IdentityAnchor) -> Result<ActionReceipt> {
        if self.action_type.as_tag().trim().is_empty() {
            return Err(IdentityError::Validation(
                "action type must not be empty".into(),
            ));
        }
        if self.previous_receipt.as_ref().is_some_and(|r| r.0.is_empty()) {
            return Err(IdentityError::Validation(
                "previous receipt id must not be empty".into(),
            ));
        }
        if self.context_hash.as_ref().is_some_and(|h| h.is_empty()) {
            return Err(IdentityError::Validation(
                "context hash must not be empty".into(),
            ));
        }

        let mut receipt = ActionReceipt {
            id: ReceiptId::generate(),
            actor: anchor.id()?,
            actor_key: anchor.public_key()?,
            action_type: self.action_type,
            description: self.action.description,
            // null and absent are the same thing on the wire
            data: self.action.data.filter(|d| !d.is_null()),
            timestamp: self.timestamp.unwrap_or_else(crate::time::now_secs),
            previous_receipt: self.previous_receipt,
            context_hash: self.context_hash,
            receipt_hash: String::new(),
            signature: String::new(),
        };

        let canonical = receipt.canonical_bytes()?;
        receipt.receipt_hash = canonical::content_hash(&canonical);
        receipt.signature = anchor.sign_base64(&canonical)?;

        log::debug!(
            "signed receipt {} ({}) for {}",
            receipt.id,
            receipt.action_type,
            receipt.actor
        );
        Ok(receipt)
    }
}

/// Sign an action on behalf of `anchor`.
///
/// `action_type` is a well-known tag or any custom non-empty string.
pub fn sign_action(
    anchor: &IdentityAnchor,
    action_type: &str,
    description: &str,
    data: Option<serde_json::Value>,
    previous_receipt: Option<&str>,
) -> Result<ActionReceipt> {
    let content = ActionContent {
        description: description.to_string(),
        data,
    };
    let mut builder = ReceiptBuilder::new(ActionType::from_tag(action_type), content);
    if let Some(prev) = previous_receipt {
        builder = builder.chain_to(ReceiptId(prev.to_string()));
    }
    builder.sign(anchor)
}
