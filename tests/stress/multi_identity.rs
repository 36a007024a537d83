//! Stress test: create 100 identities, verify all have unique IDs,
//! and all can sign and verify a receipt.

use std::collections::HashSet;

use agentic_identity::identity::IdentityAnchor;
use agentic_identity::receipt::receipt::sign_action;
use agentic_identity::receipt::verify::check_receipt;
use agentic_identity::storage::KeyVault;

#[test]
fn stress_100_unique_identities() {
    let mut ids = HashSet::new();
    let mut anchors = Vec::with_capacity(100);

    for i in 0..100 {
        let anchor = KeyVault::ephemeral(Some(format!("agent-{i}").as_str()));
        let id = anchor.identity_id().unwrap();

        assert!(ids.insert(id.clone()), "Duplicate identity ID found: {id}");
        anchors.push(anchor);
    }

    assert_eq!(ids.len(), 100);
}

#[test]
fn stress_100_identities_sign_and_verify() {
    let anchors: Vec<IdentityAnchor> = (0..100)
        .map(|i| KeyVault::ephemeral(Some(format!("agent-{i}").as_str())))
        .collect();

    for (i, anchor) in anchors.iter().enumerate() {
        let receipt = sign_action(anchor, "decision", &format!("Decision by agent-{i}"), None, None)
            .expect("signing should succeed");

        let verification = check_receipt(&receipt).expect("verification should succeed");
        assert!(verification.is_valid, "Receipt from agent-{i} should be valid");
        assert_eq!(receipt.actor, anchor.id().unwrap());
    }
}

#[test]
fn stress_receipts_do_not_verify_as_other_identities() {
    let anchors: Vec<IdentityAnchor> = (0..10).map(|_| KeyVault::ephemeral(None)).collect();

    for (i, signer) in anchors.iter().enumerate() {
        let receipt = sign_action(signer, "observation", "cross-check", None, None).unwrap();
        for (j, other) in anchors.iter().enumerate() {
            if i == j {
                continue;
            }
            let mut forged = receipt.clone();
            forged.actor = other.id().unwrap();
            forged.actor_key = other.public_key().unwrap();
            assert!(!check_receipt(&forged).unwrap().is_valid);
        }
    }
}
