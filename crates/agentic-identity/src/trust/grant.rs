//! Trust grants — signed trust relationships between identities.
//!
//! A trust grant is a cryptographic object where identity A says
//! "I trust identity B to do {capabilities} under {constraints}."
//!
//! Grants are not chained, so unlike receipts they carry no content hash:
//! the grantor's signature over the canonical bytes is sufficient.

use serde::{Deserialize, Serialize};

use crate::canonical::{CanonicalRecord, TRUST_GRANT_DOMAIN};
use crate::crypto::keys::decode_public_key;
use crate::crypto::{random, signing};
use crate::error::{IdentityError, Result};
use crate::identity::{IdentityAnchor, IdentityId};

use super::capability::{capabilities_cover, validate_capabilities, Capability};
use super::constraint::{GrantPhase, TrustConstraints};

/// Unique identifier for a trust grant.
///
/// Format: `atrust_` + base58 of 16 random bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrustId(pub String);

impl TrustId {
    /// Prefix carried by every generated id.
    pub const PREFIX: &'static str = "atrust_";

    pub(crate) fn generate() -> Self {
        Self(random::random_id(Self::PREFIX))
    }
}

impl std::fmt::Display for TrustId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A signed trust relationship between two identities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustGrant {
    /// Unique trust ID.
    pub id: TrustId,
    /// Grantor identity (who is granting trust).
    pub grantor: IdentityId,
    /// Grantor's public key used for signing.
    pub grantor_key: String,
    /// Grantee identity (who receives trust).
    pub grantee: IdentityId,
    /// Grantee's public key at time of grant.
    pub grantee_key: String,
    /// Capabilities being granted.
    pub capabilities: Vec<Capability>,
    /// Time window and use limit, flattened into the record.
    #[serde(flatten)]
    pub constraints: TrustConstraints,
    /// Can grantee delegate to others?
    #[serde(default)]
    pub delegation_allowed: bool,
    /// Maximum delegation depth (if delegation allowed).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_delegation_depth: Option<u32>,
    /// Parent grant (if this is a delegated grant).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_grant: Option<TrustId>,
    /// Current delegation depth (0 = direct grant).
    #[serde(default)]
    pub delegation_depth: u32,
    /// Grant timestamp (seconds since epoch).
    pub granted_at: u64,
    /// Grantor's signature over the canonical bytes.
    pub signature: String,
}

impl TrustGrant {
    /// Canonical bytes: every field except `signature`.
    pub fn canonical_bytes(&self) -> Result<Vec<u8>> {
        let capabilities: Vec<serde_json::Value> = self
            .capabilities
            .iter()
            .map(|c| serde_json::Value::String(c.uri.clone()))
            .collect();
        CanonicalRecord::new(TRUST_GRANT_DOMAIN)
            .field("id", self.id.0.as_str())
            .field("grantor", self.grantor.0.as_str())
            .field("grantor_key", self.grantor_key.as_str())
            .field("grantee", self.grantee.0.as_str())
            .field("grantee_key", self.grantee_key.as_str())
            .field("capabilities", capabilities)
            .optional("not_before", self.constraints.not_before)
            .optional("not_after", self.constraints.not_after)
            .optional("max_uses", self.constraints.max_uses)
            .field("delegation_allowed", self.delegation_allowed)
            .optional("max_delegation_depth", self.max_delegation_depth)
            .optional("parent_grant", self.parent_grant.as_ref().map(|p| p.0.as_str()))
            .field("delegation_depth", self.delegation_depth)
            .field("granted_at", self.granted_at)
            .to_bytes()
    }

    /// Verify the grantor's signature on this grant, and that `grantor` is
    /// the identity derived from `grantor_key`.
    ///
    /// # Errors
    ///
    /// `InvalidEncoding` if the key or signature is malformed.
    pub fn verify_signature(&self) -> Result<bool> {
        let verifying_key = decode_public_key(&self.grantor_key)?;
        let signature = signing::decode_signature(&self.signature)?;

        if IdentityId::from_verifying_key(&verifying_key) != self.grantor {
            return Ok(false);
        }
        let canonical = self.canonical_bytes()?;
        Ok(signing::verify(&verifying_key, &canonical, &signature))
    }

    /// Phase at the given time.
    pub fn phase_at(&self, now: u64) -> GrantPhase {
        self.constraints.phase_at(now)
    }

    /// Does the capability set cover `requested`? Ignores signature and time.
    pub fn covers(&self, requested: &str) -> bool {
        capabilities_cover(&self.capabilities, requested)
    }

    /// The deepest delegation depth reachable from this grant.
    ///
    /// Equal to the grant's own depth when delegation is not allowed. A grant
    /// that allows delegation without naming a limit permits one more hop.
    pub fn delegation_limit(&self) -> u32 {
        if !self.delegation_allowed {
            return self.delegation_depth;
        }
        self.max_delegation_depth
            .unwrap_or(self.delegation_depth.saturating_add(1))
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

/// Builder for creating trust grants.
pub struct TrustGrantBuilder {
    grantee: IdentityId,
    grantee_key: String,
    capabilities: Vec<Capability>,
    constraints: TrustConstraints,
    delegation_allowed: bool,
    max_delegation_depth: Option<u32>,
    parent_grant: Option<TrustId>,
    delegation_depth: u32,
    granted_at: Option<u64>,
}

impl TrustGrantBuilder {
    /// Start building a trust grant to `grantee`.
    pub fn new(grantee: IdentityId, grantee_key: impl Into<String>) -> Self {
        Self {
            grantee,
            grantee_key: grantee_key.into(),
            capabilities: Vec::new(),
            constraints: TrustConstraints::open(),
            delegation_allowed: false,
            max_delegation_depth: None,
            parent_grant: None,
            delegation_depth: 0,
            granted_at: None,
        }
    }

    /// Add a capability to the grant.
    pub fn capability(mut self, cap: impl Into<Capability>) -> Self {
        self.capabilities.push(cap.into());
        self
    }

    /// Add multiple capabilities.
    pub fn capabilities<C: Into<Capability>>(mut self, caps: impl IntoIterator<Item = C>) -> Self {
        self.capabilities.extend(caps.into_iter().map(Into::into));
        self
    }

    /// Set the constraints.
    pub fn constraints(mut self, constraints: TrustConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    /// Allow the grantee to delegate trust to others.
    pub fn allow_delegation(mut self, max_depth: u32) -> Self {
        self.delegation_allowed = true;
        self.max_delegation_depth = Some(max_depth);
        self
    }

    /// Mark this as a delegated grant from a parent.
    pub fn delegated_from(mut self, parent: TrustId, depth: u32) -> Self {
        self.parent_grant = Some(parent);
        self.delegation_depth = depth;
        self
    }

    /// Override the grant time (defaults to now).
    pub fn granted_at(mut self, secs: u64) -> Self {
        self.granted_at = Some(secs);
        self
    }

    /// Sign and finalize the trust grant with the grantor's anchor.
    ///
    /// # Errors
    ///
    /// `Validation` for an empty or malformed capability set, inconsistent
    /// constraints, a grantee id that does not match `grantee_key`, or
    /// inconsistent delegation fields. `InvalidEncoding` if `grantee_key` is
    /// malformed. `InvalidHandle` if the anchor is closed.
    pub fn sign(self, grantor: &IdentityAnchor) -> Result<TrustGrant> {
        validate_capabilities(&self.capabilities)?;
        self.constraints.validate()?;

        if self.grantee.0.is_empty() {
            return Err(IdentityError::Validation("grantee id must not be empty".into()));
        }
        let grantee_vk = decode_public_key(&self.grantee_key)?;
        if IdentityId::from_verifying_key(&grantee_vk) != self.grantee {
            return Err(IdentityError::Validation(format!(
                "grantee {} does not match grantee key",
                self.grantee
            )));
        }

        match &self.parent_grant {
            Some(parent) if parent.0.is_empty() => {
                return Err(IdentityError::Validation(
                    "parent grant id must not be empty".into(),
                ));
            }
            Some(_) if self.delegation_depth == 0 => {
                return Err(IdentityError::Validation(
                    "a delegated grant must have depth of at least 1".into(),
                ));
            }
            None if self.delegation_depth != 0 => {
                return Err(IdentityError::Validation(
                    "a root grant must have depth 0".into(),
                ));
            }
            _ => {}
        }
        if let Some(max) = self.max_delegation_depth {
            if max < self.delegation_depth {
                return Err(IdentityError::Validation(format!(
                    "max delegation depth {max} is below the grant's own depth {}",
                    self.delegation_depth
                )));
            }
        }

        let mut grant = TrustGrant {
            id: TrustId::generate(),
            grantor: grantor.id()?,
            grantor_key: grantor.public_key()?,
            grantee: self.grantee,
            grantee_key: self.grantee_key,
            capabilities: self.capabilities,
            constraints: self.constraints,
            delegation_allowed: self.delegation_allowed,
            max_delegation_depth: self.max_delegation_depth,
            parent_grant: self.parent_grant,
            delegation_depth: self.delegation_depth,
            granted_at: self.granted_at.unwrap_or_else(crate::time::now_secs),
            signature: String::new(),
        };

        let canonical = grant.canonical_bytes()?;
        grant.signature = grantor.sign_base64(&canonical)?;

        log::debug!(
            "signed trust grant {} from {} to {} ({} capabilities)",
            grant.id,
            grant.grantor,
            grant.grantee,
            grant.capabilities.len()
        );
        Ok(grant)
    }
}

/// Grant `capabilities` from `anchor` to another identity.
///
/// `max_delegation_depth`, when set, allows the grantee to re-delegate up to
/// that depth.
pub fn create_trust_grant(
    anchor: &IdentityAnchor,
    grantee_id: &str,
    grantee_key: &str,
    capabilities: &[&str],
    constraints: Option<TrustConstraints>,
    max_delegation_depth: Option<u32>,
) -> Result<TrustGrant> {
    let mut builder = TrustGrantBuilder::new(IdentityId(grantee_id.to_string()), grantee_key)
        .capabilities(capabilities.iter().copied())
        .constraints(constraints.unwrap_or_default());
    if let Some(depth) = max_delegation_depth {
        builder = builder.allow_delegation(depth);
    }
    builder.sign(anchor)
}
