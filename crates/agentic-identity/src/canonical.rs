//! Canonical byte form of signed records.
//!
//! Receipts, trust grants and identity documents are signed over a
//! deterministic serialization: compact JSON with object keys sorted by
//! byte order at every level, no insignificant whitespace, integers in plain
//! decimal and floats in shortest round-trip form. Absent optional fields are
//! omitted entirely, so "absent" and "present" always canonicalize
//! differently.
//!
//! Each record type carries its own `domain` field. A signature made over a
//! receipt can therefore never verify as a grant or a document.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::error::{IdentityError, Result};

/// Domain tag of action receipts.
pub const RECEIPT_DOMAIN: &str = "agentic-identity/receipt/v1";
/// Domain tag of trust grants.
pub const TRUST_GRANT_DOMAIN: &str = "agentic-identity/trust-grant/v1";
/// Domain tag of public identity documents.
pub const IDENTITY_DOCUMENT_DOMAIN: &str = "agentic-identity/identity-document/v1";

/// A record under construction for canonicalization.
///
/// Field insertion order is irrelevant; the output is always key-sorted.
#[derive(Debug, Clone)]
pub struct CanonicalRecord {
    fields: Map<String, Value>,
}

impl CanonicalRecord {
    /// Start a record tagged with `domain`.
    pub fn new(domain: &str) -> Self {
        let mut fields = Map::new();
        fields.insert("domain".to_string(), Value::String(domain.to_string()));
        Self { fields }
    }

    /// Add a required field.
    pub fn field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    /// Add a field only when present. `None` leaves the key out.
    pub fn optional<T: Into<Value>>(mut self, key: &str, value: Option<T>) -> Self {
        if let Some(v) = value {
            self.fields.insert(key.to_string(), v.into());
        }
        self
    }

    /// Produce the canonical bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let mut out = Vec::with_capacity(256);
        write_object(&mut out, &self.fields)?;
        Ok(out)
    }
}

/// Canonicalize an arbitrary JSON value.
pub fn to_canonical_bytes(value: &Value) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(128);
    write_value(&mut out, value)?;
    Ok(out)
}

/// Lowercase hex SHA-256 of canonical bytes.
pub fn content_hash(canonical: &[u8]) -> String {
    hex::encode(Sha256::digest(canonical))
}

fn write_value(out: &mut Vec<u8>, value: &Value) -> Result<()> {
    match value {
        Value::Null => out.extend_from_slice(b"null"),
        Value::Bool(true) => out.extend_from_slice(b"true"),
        Value::Bool(false) => out.extend_from_slice(b"false"),
        Value::Number(n) => {
            if n.as_f64().is_some_and(|f| !f.is_finite()) {
                return Err(IdentityError::SerializationError(
                    "non-finite number cannot be canonicalized".into(),
                ));
            }
            out.extend_from_slice(n.to_string().as_bytes());
        }
        Value::String(s) => serde_json::to_writer(&mut *out, s)?,
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_value(out, item)?;
            }
            out.push(b']');
        }
        Value::Object(map) => write_object(out, map)?,
    }
    Ok(())
}

fn write_object(out: &mut Vec<u8>, map: &Map<String, Value>) -> Result<()> {
    let mut entries: Vec<(&String, &Value)> = map.iter().collect();
    entries.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));

    out.push(b'{');
    for (i, (key, value)) in entries.into_iter().enumerate() {
        if i > 0 {
            out.push(b',');
        }
        serde_json::to_writer(&mut *out, key)?;
        out.push(b':');
        write_value(out, value)?;
    }
    out.push(b'}');
    Ok(())
}
