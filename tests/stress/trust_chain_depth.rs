//! Stress test: create a trust chain of depth 50 and verify terminal trust.

use agentic_identity::identity::IdentityAnchor;
use agentic_identity::storage::KeyVault;
use agentic_identity::time::now_secs;
use agentic_identity::trust::chain::{delegate, verify_trust_chain};
use agentic_identity::trust::grant::{create_trust_grant, TrustGrant};

fn build_chain(prefix: &str, depth: usize, capability: &str) -> Vec<TrustGrant> {
    let identities: Vec<IdentityAnchor> = (0..=depth)
        .map(|i| KeyVault::ephemeral(Some(format!("{prefix}-{i}").as_str())))
        .collect();

    let mut grants = Vec::with_capacity(depth);
    grants.push(
        create_trust_grant(
            &identities[0],
            &identities[1].identity_id().unwrap(),
            &identities[1].public_key().unwrap(),
            &[capability],
            None,
            Some(depth as u32),
        )
        .expect("root grant signing should succeed"),
    );

    for i in 1..depth {
        let parent = grants.last().unwrap();
        let grant = delegate(
            parent,
            &identities[i],
            &identities[i + 1].identity_id().unwrap(),
            &identities[i + 1].public_key().unwrap(),
            &[capability],
            None,
        )
        .unwrap_or_else(|e| panic!("delegation {i} should succeed: {e}"));
        grants.push(grant);
    }
    grants
}

#[test]
fn stress_trust_chain_depth_50() {
    let chain_depth = 50;
    let grants = build_chain("node", chain_depth, "read:*");

    assert_eq!(grants.len(), chain_depth);
    assert_eq!(grants.last().unwrap().delegation_depth, chain_depth as u32 - 1);
    assert!(
        verify_trust_chain(&grants, "read:docs", now_secs()).unwrap(),
        "Trust chain of depth {chain_depth} should be valid"
    );
}

#[test]
fn stress_trust_chain_depth_50_specific_capability() {
    let grants = build_chain("cap-node", 50, "execute:deploy:*");

    assert!(verify_trust_chain(&grants, "execute:deploy:production", now_secs()).unwrap());
    assert!(!verify_trust_chain(&grants, "read:calendar", now_secs()).unwrap());
}

#[test]
fn stress_chain_prefixes_are_valid_and_reorderings_are_not() {
    let grants = build_chain("prefix", 10, "read:*");

    for len in 1..=grants.len() {
        assert!(verify_trust_chain(&grants[..len], "read:x", now_secs()).unwrap());
    }

    let mut swapped = grants.clone();
    swapped.swap(3, 4);
    assert!(!verify_trust_chain(&swapped, "read:x", now_secs()).unwrap());

    // Dropping a middle link breaks the parent reference
    let mut gapped = grants;
    gapped.remove(5);
    assert!(!verify_trust_chain(&gapped, "read:x", now_secs()).unwrap());
}
