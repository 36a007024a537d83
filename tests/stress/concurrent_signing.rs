//! Stress test: one identity shared across threads signs concurrently,
//! plus a single identity performing 1000 sequential sign operations.
//! All receipts must be valid and every receipt id unique.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use agentic_identity::receipt::action::{ActionContent, ActionType};
use agentic_identity::receipt::receipt::ReceiptBuilder;
use agentic_identity::receipt::verify::check_receipt;
use agentic_identity::storage::KeyVault;
use agentic_identity::verification;

#[test]
fn stress_1000_sequential_signs() {
    let anchor = KeyVault::ephemeral(Some("high-throughput-agent"));
    let mut receipts = Vec::with_capacity(1000);

    for i in 0..1000 {
        let receipt = ReceiptBuilder::new(
            ActionType::Decision,
            ActionContent::new(format!("Operation {i}")),
        )
        .sign(&anchor)
        .expect("signing should succeed");
        receipts.push(receipt);
    }

    for (i, receipt) in receipts.iter().enumerate() {
        let verification = check_receipt(receipt).expect("verification should succeed");
        assert!(verification.is_valid, "Receipt {i} should be valid");
    }
}

#[test]
fn stress_shared_anchor_across_threads() {
    let anchor = Arc::new(KeyVault::ephemeral(Some("shared")));
    let threads = 8;
    let per_thread = 100;

    let handles: Vec<_> = (0..threads)
        .map(|t| {
            let anchor = Arc::clone(&anchor);
            thread::spawn(move || {
                (0..per_thread)
                    .map(|i| {
                        ReceiptBuilder::new(
                            ActionType::Observation,
                            ActionContent::new(format!("thread {t} op {i}")),
                        )
                        .sign(&anchor)
                        .expect("signing should succeed")
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut ids = HashSet::new();
    for handle in handles {
        for receipt in handle.join().unwrap() {
            assert!(ids.insert(receipt.id.0.clone()), "duplicate id {}", receipt.id);
            assert!(check_receipt(&receipt).unwrap().is_valid);
        }
    }
    assert_eq!(ids.len(), threads * per_thread);
}

#[test]
fn stress_concurrent_verification() {
    let anchor = KeyVault::ephemeral(None);
    let json: Arc<Vec<String>> = Arc::new(
        (0..50)
            .map(|i| {
                agentic_identity::sign_action(&anchor, "decision", &format!("d{i}"), None, None)
                    .unwrap()
                    .to_json()
                    .unwrap()
            })
            .collect(),
    );

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let json = Arc::clone(&json);
            thread::spawn(move || {
                json.iter()
                    .all(|r| verification::verify_receipt(r).unwrap_or(false))
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
}
