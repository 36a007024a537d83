//! Capability URI parsing and wildcard matching.
//!
//! Capabilities use a URI scheme: `action:resource` with wildcards.
//! Examples:
//!   - `read:calendar` — read calendar specifically
//!   - `read:*` — read anything
//!   - `execute:deploy:production` — execute deploy to production
//!   - `execute:deploy:*` — execute deploy to any environment
//!   - `*` — all capabilities (root trust)
//!
//! Matching is exact-or-prefix-wildcard only. There is no substring or
//! suffix matching: `read:calendar` does not cover `read:calendars`.

use serde::{Deserialize, Serialize};

use crate::error::{IdentityError, Result};

/// A capability being granted. On the wire it is its URI string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capability {
    /// Capability URI (e.g., "read:calendar", "execute:deploy:production").
    pub uri: String,
}

impl Capability {
    /// Create a new capability from a URI string.
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }

    /// Check whether this capability's URI covers (grants) a requested URI.
    pub fn covers(&self, requested: &str) -> bool {
        capability_uri_covers(&self.uri, requested)
    }

    pub fn as_str(&self) -> &str {
        &self.uri
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.uri)
    }
}

impl From<&str> for Capability {
    fn from(uri: &str) -> Self {
        Self::new(uri)
    }
}

impl From<String> for Capability {
    fn from(uri: String) -> Self {
        Self::new(uri)
    }
}

/// Check whether a granted URI covers a requested URI.
///
/// Matching rules:
/// - `*` matches everything
/// - `action:resource` matches exactly
/// - `action:*` matches anything under `action:` with a non-empty rest,
///   but not the bare `action`
pub fn capability_uri_covers(granted: &str, requested: &str) -> bool {
    // Universal wildcard
    if granted == "*" {
        return true;
    }

    // Exact match
    if granted == requested {
        return true;
    }

    // "read:*" covers "read:calendar"
    if let Some(scope) = granted.strip_suffix('*') {
        if scope.ends_with(':') {
            if let Some(rest) = requested.strip_prefix(scope) {
                return !rest.is_empty();
            }
        }
    }

    false
}

/// Check if a set of granted capabilities covers a single requested capability URI.
pub fn capabilities_cover(granted: &[Capability], requested: &str) -> bool {
    granted.iter().any(|cap| cap.covers(requested))
}

/// Check if a set of granted capabilities covers ALL requested capability URIs.
pub fn capabilities_cover_all(granted: &[Capability], requested: &[&str]) -> bool {
    requested.iter().all(|req| capabilities_cover(granted, req))
}

/// Validate a single URI for use in a grant.
///
/// Rejects empty URIs, empty `:` components, whitespace, and wildcards
/// anywhere other than the whole URI or the final component.
pub fn validate_capability_uri(uri: &str) -> Result<()> {
    if uri.is_empty() {
        return Err(IdentityError::Validation(
            "capability URI must not be empty".into(),
        ));
    }
    if uri.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(IdentityError::Validation(format!(
            "capability URI contains whitespace: {uri:?}"
        )));
    }
    if uri == "*" {
        return Ok(());
    }
    let components: Vec<&str> = uri.split(':').collect();
    if components.iter().any(|c| c.is_empty()) {
        return Err(IdentityError::Validation(format!(
            "capability URI has an empty component: {uri:?}"
        )));
    }
    let last = components.len() - 1;
    for (i, component) in components.iter().enumerate() {
        let wildcard_ok = i == last && i > 0 && *component == "*";
        if component.contains('*') && !wildcard_ok {
            return Err(IdentityError::Validation(format!(
                "wildcard must be the final component: {uri:?}"
            )));
        }
    }
    Ok(())
}

/// Validate the capability set of a new grant: non-empty, every URI valid,
/// no duplicates.
pub fn validate_capabilities(capabilities: &[Capability]) -> Result<()> {
    if capabilities.is_empty() {
        return Err(IdentityError::Validation(
            "a trust grant needs at least one capability".into(),
        ));
    }
    let mut seen = std::collections::HashSet::new();
    for cap in capabilities {
        validate_capability_uri(&cap.uri)?;
        if !seen.insert(cap.uri.as_str()) {
            return Err(IdentityError::Validation(format!(
                "duplicate capability: {}",
                cap.uri
            )));
        }
    }
    Ok(())
}

/// Validate a capability being asked for at verification time.
pub fn validate_requested(requested: &str) -> Result<()> {
    if requested.is_empty() {
        return Err(IdentityError::Validation(
            "requested capability must not be empty".into(),
        ));
    }
    Ok(())
}
