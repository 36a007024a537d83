//! Action types and content for receipts.

use serde::{Deserialize, Serialize};

/// Type of action being recorded.
///
/// The six well-known types are conventional, not an allow-list: any other
/// non-empty tag is carried as `Custom`. On the wire the type is its tag.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum ActionType {
    Decision,
    Observation,
    Mutation,
    Delegation,
    Revocation,
    IdentityOperation,
    Custom(String),
}

impl ActionType {
    /// Map a tag to its type. Unknown tags become `Custom`.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "decision" => Self::Decision,
            "observation" => Self::Observation,
            "mutation" => Self::Mutation,
            "delegation" => Self::Delegation,
            "revocation" => Self::Revocation,
            "identity_operation" => Self::IdentityOperation,
            other => Self::Custom(other.to_string()),
        }
    }

    /// Return a stable string tag for hashing.
    pub fn as_tag(&self) -> &str {
        match self {
            Self::Decision => "decision",
            Self::Observation => "observation",
            Self::Mutation => "mutation",
            Self::Delegation => "delegation",
            Self::Revocation => "revocation",
            Self::IdentityOperation => "identity_operation",
            Self::Custom(s) => s.as_str(),
        }
    }

    pub fn is_custom(&self) -> bool {
        matches!(self, Self::Custom(_))
    }
}

impl From<String> for ActionType {
    fn from(tag: String) -> Self {
        Self::from_tag(&tag)
    }
}

impl From<&str> for ActionType {
    fn from(tag: &str) -> Self {
        Self::from_tag(tag)
    }
}

impl From<ActionType> for String {
    fn from(action_type: ActionType) -> Self {
        match action_type {
            ActionType::Custom(s) => s,
            known => known.as_tag().to_string(),
        }
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// Content of an action.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionContent {
    /// Human-readable description.
    pub description: String,
    /// Structured data, opaque to the engine.
    pub data: Option<serde_json::Value>,
}

impl ActionContent {
    /// Create a simple action with just a description.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            data: None,
        }
    }

    /// Create an action with description and structured data.
    pub fn with_data(description: impl Into<String>, data: serde_json::Value) -> Self {
        Self {
            description: description.into(),
            data: Some(data),
        }
    }
}
