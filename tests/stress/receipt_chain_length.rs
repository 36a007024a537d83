//! Stress test: create a chain of 1000 receipts, verify chain integrity,
//! and ensure it completes in reasonable time.

use std::time::Instant;

use agentic_identity::receipt::action::{ActionContent, ActionType};
use agentic_identity::receipt::chain::verify_chain;
use agentic_identity::receipt::receipt::{ActionReceipt, ReceiptBuilder};
use agentic_identity::storage::KeyVault;
use agentic_identity::IdentityAnchor;

fn build_chain(anchor: &IdentityAnchor, len: usize) -> Vec<ActionReceipt> {
    let mut chain: Vec<ActionReceipt> = Vec::with_capacity(len);
    for i in 0..len {
        let mut builder = ReceiptBuilder::new(
            ActionType::Decision,
            ActionContent::new(format!("Chain receipt {i}")),
        );
        if let Some(prev) = chain.last() {
            builder = builder.chain_to(prev.id.clone());
        }
        chain.push(
            builder
                .sign(anchor)
                .unwrap_or_else(|_| panic!("receipt {i} signing should succeed")),
        );
    }
    chain
}

#[test]
fn stress_receipt_chain_1000() {
    let anchor = KeyVault::ephemeral(Some("chain-agent"));
    let start = Instant::now();

    let chain = build_chain(&anchor, 1000);
    let build_elapsed = start.elapsed();

    for i in 1..chain.len() {
        assert_eq!(
            chain[i].previous_receipt.as_ref(),
            Some(&chain[i - 1].id),
            "Receipt {i} should chain to receipt {}",
            i - 1
        );
    }

    let verify_start = Instant::now();
    assert!(
        verify_chain(&chain).unwrap(),
        "Chain of 1000 receipts should verify successfully"
    );
    let verify_elapsed = verify_start.elapsed();
    let total_elapsed = start.elapsed();

    assert!(
        total_elapsed.as_secs() < 60,
        "1000-receipt chain should complete in under 60 seconds, took {total_elapsed:?}"
    );
    eprintln!(
        "Receipt chain stress test: build={build_elapsed:?}, verify={verify_elapsed:?}, total={total_elapsed:?}"
    );
}

#[test]
fn stress_receipt_chain_1000_unique_ids() {
    let anchor = KeyVault::ephemeral(None);
    let chain = build_chain(&anchor, 1000);
    let ids: std::collections::HashSet<_> = chain.iter().map(|r| r.id.0.clone()).collect();
    assert_eq!(ids.len(), 1000);
}

#[test]
fn stress_broken_link_detected_anywhere() {
    let anchor = KeyVault::ephemeral(None);
    let chain = build_chain(&anchor, 200);

    for broken_at in [1, 57, 198] {
        let mut tampered = chain.clone();
        tampered.remove(broken_at);
        assert!(
            !verify_chain(&tampered).unwrap(),
            "removing receipt {broken_at} should break the chain"
        );
    }

    let mut edited = chain;
    edited[100].description.push('!');
    assert!(!verify_chain(&edited).unwrap());
}
