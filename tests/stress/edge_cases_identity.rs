//! Edge case tests: trust expiration, use limits, wildcards, delegation
//! bounds, receipt tampering, canonical form, and closed identities.

use agentic_identity::canonical::to_canonical_bytes;
use agentic_identity::error::ErrorKind;
use agentic_identity::identity::IdentityAnchor;
use agentic_identity::receipt::action::{ActionContent, ActionType};
use agentic_identity::receipt::receipt::{sign_action, ReceiptBuilder};
use agentic_identity::receipt::verify::check_receipt;
use agentic_identity::storage::KeyVault;
use agentic_identity::trust::capability::capability_uri_covers;
use agentic_identity::trust::chain::delegate;
use agentic_identity::trust::grant::{create_trust_grant, TrustGrant};
use agentic_identity::trust::verify::{check_grant_at, TrustVerdict};
use agentic_identity::trust::TrustConstraints;
use agentic_identity::verification;

fn grant(
    grantor: &IdentityAnchor,
    grantee: &IdentityAnchor,
    caps: &[&str],
    constraints: Option<TrustConstraints>,
) -> TrustGrant {
    create_trust_grant(
        grantor,
        &grantee.identity_id().unwrap(),
        &grantee.public_key().unwrap(),
        caps,
        constraints,
        None,
    )
    .expect("grant should succeed")
}

// === Trust Edge Cases ===

#[test]
fn edge_expired_trust_verification_fails() {
    let grantor = KeyVault::ephemeral(Some("grantor"));
    let grantee = KeyVault::ephemeral(Some("grantee"));
    let g = grant(
        &grantor,
        &grantee,
        &["calendar:*"],
        Some(TrustConstraints::time_bounded(1_000, 2_000)),
    );

    assert_eq!(
        check_grant_at(&g, "calendar:events", 999, None).unwrap(),
        TrustVerdict::NotYetValid
    );
    assert!(check_grant_at(&g, "calendar:events", 1_000, None).unwrap().is_granted());
    assert!(check_grant_at(&g, "calendar:events", 2_000, None).unwrap().is_granted());
    assert_eq!(
        check_grant_at(&g, "calendar:events", 2_001, None).unwrap(),
        TrustVerdict::Expired
    );
    // Expired regardless of capability match
    assert!(!verification::verify_trust_grant(&g.to_json().unwrap(), "calendar:events").unwrap());
}

#[test]
fn edge_wrong_capability_fails() {
    let grantor = KeyVault::ephemeral(None);
    let grantee = KeyVault::ephemeral(None);
    let g = grant(&grantor, &grantee, &["calendar:*"], None);
    assert!(!verification::verify_trust_grant(&g.to_json().unwrap(), "email:inbox:read").unwrap());
}

#[test]
fn edge_max_uses_exhausted() {
    let grantor = KeyVault::ephemeral(None);
    let grantee = KeyVault::ephemeral(None);
    let g = grant(
        &grantor,
        &grantee,
        &["deploy:*"],
        Some(TrustConstraints::open().with_max_uses(1)),
    );
    let json = g.to_json().unwrap();

    assert!(verification::verify_trust_grant_with_uses(&json, "deploy:staging", 0).unwrap());
    assert!(!verification::verify_trust_grant_with_uses(&json, "deploy:staging", 1).unwrap());
    assert!(
        !verification::verify_trust_grant_with_uses(&json, "deploy:staging", u64::MAX).unwrap()
    );
    // Without a count the limit is declared, not enforced
    assert!(verification::verify_trust_grant(&json, "deploy:staging").unwrap());
}

#[test]
fn edge_invalid_constraints_rejected() {
    let grantor = KeyVault::ephemeral(None);
    let grantee = KeyVault::ephemeral(None);
    for constraints in [
        TrustConstraints::time_bounded(20, 10),
        TrustConstraints::open().with_max_uses(0),
    ] {
        let err = create_trust_grant(
            &grantor,
            &grantee.identity_id().unwrap(),
            &grantee.public_key().unwrap(),
            &["read:x"],
            Some(constraints),
            None,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailure);
    }
}

#[test]
fn edge_empty_and_malformed_capabilities_rejected() {
    let grantor = KeyVault::ephemeral(None);
    let grantee = KeyVault::ephemeral(None);
    for caps in [
        &[][..],
        &[""][..],
        &["read:*:x"][..],
        &["read:x", "read:x"][..],
        &["*read"][..],
    ] {
        let err = create_trust_grant(
            &grantor,
            &grantee.identity_id().unwrap(),
            &grantee.public_key().unwrap(),
            caps,
            None,
            None,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailure, "caps {caps:?}");
    }
}

// === Capability Wildcard Edge Cases ===

#[test]
fn edge_wildcard_matching_comprehensive() {
    // Universal wildcard
    assert!(capability_uri_covers("*", "anything:at:all"));
    assert!(capability_uri_covers("*", "x"));

    // Path wildcard
    assert!(capability_uri_covers("calendar:*", "calendar:events"));
    assert!(capability_uri_covers("calendar:*", "calendar:events:read"));
    assert!(!capability_uri_covers("calendar:*", "email:inbox"));
    assert!(!capability_uri_covers("calendar:*", "calendar"));
    assert!(!capability_uri_covers("calendar:*", "calendar:"));

    // Exact match
    assert!(capability_uri_covers("deploy:prod:execute", "deploy:prod:execute"));
    assert!(!capability_uri_covers("deploy:prod:execute", "deploy:staging:execute"));

    // No partial prefix or substring match
    assert!(!capability_uri_covers("cal", "calendar:events"));
    assert!(!capability_uri_covers("read:calendar", "read:calendars"));
    assert!(!capability_uri_covers("events", "calendar:events"));

    // Nested wildcards
    assert!(capability_uri_covers("a:*", "a:b:c:d:e:f"));
    assert!(capability_uri_covers("a:b:*", "a:b:c"));
    assert!(!capability_uri_covers("a:b:*", "a:c:d"));
}

// === Delegation Edge Cases ===

#[test]
fn edge_delegation_cannot_widen_scope() {
    let a = KeyVault::ephemeral(None);
    let b = KeyVault::ephemeral(None);
    let c = KeyVault::ephemeral(None);
    let ab = create_trust_grant(
        &a,
        &b.identity_id().unwrap(),
        &b.public_key().unwrap(),
        &["calendar:read:*"],
        None,
        Some(3),
    )
    .unwrap();

    for caps in [&["calendar:*"][..], &["*"][..], &["email:read"][..]] {
        let err = delegate(
            &ab,
            &b,
            &c.identity_id().unwrap(),
            &c.public_key().unwrap(),
            caps,
            None,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValidationFailure);
    }
}

// === Receipt Edge Cases ===

#[test]
fn edge_receipt_signed_by_other_key_fails() {
    let signer = KeyVault::ephemeral(Some("signer"));
    let other = KeyVault::ephemeral(Some("other"));

    let mut receipt = ReceiptBuilder::new(
        ActionType::Custom("test".into()),
        ActionContent::new("Test action"),
    )
    .sign(&signer)
    .expect("signing should succeed");
    assert!(check_receipt(&receipt).unwrap().is_valid);

    // Substitute another key: actor and signature no longer line up
    receipt.actor_key = other.public_key().unwrap();
    let result = check_receipt(&receipt).unwrap();
    assert!(!result.is_valid);
    assert!(!result.actor_valid);
    assert!(!result.signature_valid);
}

#[test]
fn edge_receipt_all_action_types() {
    let anchor = KeyVault::ephemeral(Some("all-types"));

    for tag in [
        "decision",
        "observation",
        "mutation",
        "delegation",
        "revocation",
        "identity_operation",
        "special_action",
    ] {
        let receipt = sign_action(&anchor, tag, "Action content", None, None).unwrap();
        assert_eq!(receipt.action_type, ActionType::from_tag(tag));
        assert!(verification::verify_receipt(&receipt.to_json().unwrap()).unwrap());
    }
}

#[test]
fn edge_receipt_unicode_and_escapes() {
    let anchor = KeyVault::ephemeral(None);
    let receipt = sign_action(
        &anchor,
        "observation",
        "Line one\nline \"two\" \u{1F600} \u{0007}",
        Some(serde_json::json!({"ключ": "値", "nested": {"z": null, "a": [true, 1.5]}})),
        None,
    )
    .unwrap();
    assert!(verification::verify_receipt(&receipt.to_json().unwrap()).unwrap());
}

#[test]
fn edge_receipt_tampered_hash_only() {
    let anchor = KeyVault::ephemeral(None);
    let mut receipt = sign_action(&anchor, "decision", "x", None, None).unwrap();
    receipt.receipt_hash = "00".repeat(32);
    let result = check_receipt(&receipt).unwrap();
    assert!(!result.hash_valid);
    assert!(result.signature_valid);
    assert!(!result.is_valid);
}

// === Canonical Form ===

#[test]
fn edge_canonical_form_ignores_key_order() {
    let a: serde_json::Value = serde_json::from_str(r#"{"b":1,"a":{"y":2,"x":[3,1]}}"#).unwrap();
    let b: serde_json::Value = serde_json::from_str(r#"{"a":{"x":[3,1],"y":2},"b":1}"#).unwrap();
    assert_eq!(to_canonical_bytes(&a).unwrap(), to_canonical_bytes(&b).unwrap());
    assert_eq!(
        String::from_utf8(to_canonical_bytes(&a).unwrap()).unwrap(),
        r#"{"a":{"x":[3,1],"y":2},"b":1}"#
    );
}

// === Lifecycle ===

#[test]
fn edge_closed_identity_is_invalid_handle() {
    let anchor = KeyVault::ephemeral(None);
    anchor.close();
    anchor.close();
    assert!(anchor.is_closed());
    for err in [
        sign_action(&anchor, "decision", "x", None, None).unwrap_err(),
        anchor.public_key().unwrap_err(),
        anchor.identity_id().unwrap_err(),
    ] {
        assert_eq!(err.kind(), ErrorKind::InvalidHandle);
        assert_eq!(err.code(), -8);
    }
}
