//! Integration test: full end-to-end workflow.
//!
//! Tests the complete lifecycle:
//! 1. Create identities in encrypted containers
//! 2. Sign actions (create receipts)
//! 3. Chain receipts together
//! 4. Grant trust between identities
//! 5. Verify trust grants and a delegation chain
//! 6. Reload identities from disk

use agentic_identity::config::{KdfParams, VaultConfig};
use agentic_identity::error::ErrorKind;
use agentic_identity::receipt::action::{ActionContent, ActionType};
use agentic_identity::receipt::chain::verify_chain;
use agentic_identity::receipt::receipt::{sign_action, ReceiptBuilder};
use agentic_identity::receipt::verify::check_receipt;
use agentic_identity::storage::{KeyVault, ReceiptStore, TrustStore};
use agentic_identity::trust::chain::delegate;
use agentic_identity::trust::grant::create_trust_grant;
use agentic_identity::trust::TrustConstraints;
use agentic_identity::verification;
use agentic_identity::{Engine, EngineConfig};

fn fast_vault() -> KeyVault {
    KeyVault::new(VaultConfig::default().with_kdf(KdfParams::new(64, 1, 1).unwrap()))
}

#[test]
fn full_workflow_identity_to_delegation() {
    let _ = env_logger::builder().is_test(true).try_init();
    let dir = tempfile::tempdir().unwrap();
    let vault = fast_vault();

    // ── Step 1: Create identities ───────────────────────────────────────
    let alice = vault
        .create(&dir.path().join("alice.aid"), "alice-pass", Some("alice"))
        .expect("create alice");
    let bob = vault
        .create(&dir.path().join("bob.aid"), "bob-pass", Some("bob"))
        .expect("create bob");
    let charlie = KeyVault::ephemeral(Some("charlie"));

    assert_ne!(alice.id().unwrap(), bob.id().unwrap());
    assert_ne!(bob.id().unwrap(), charlie.id().unwrap());
    for anchor in [&alice, &bob, &charlie] {
        assert!(anchor.identity_id().unwrap().starts_with("aid_"));
    }

    // Identity documents are self-signed
    let alice_doc = alice.to_document().unwrap();
    assert!(alice_doc.verify_signature().unwrap());

    // ── Step 2: Sign actions ────────────────────────────────────────────
    let receipt_1 = ReceiptBuilder::new(
        ActionType::Observation,
        ActionContent::new("Observed deployment request from Bob"),
    )
    .sign(&alice)
    .expect("Alice should be able to sign a receipt");
    assert!(receipt_1.id.0.starts_with("arec_"));
    assert!(check_receipt(&receipt_1).unwrap().is_valid);

    // ── Step 3: Chain receipts together ─────────────────────────────────
    let receipt_2 = ReceiptBuilder::new(
        ActionType::Decision,
        ActionContent::new("Approved Bob's deployment request"),
    )
    .chain_to(receipt_1.id.clone())
    .sign(&alice)
    .unwrap();
    let receipt_3 = ReceiptBuilder::new(
        ActionType::Mutation,
        ActionContent::with_data(
            "Executed deployment to staging",
            serde_json::json!({"env": "staging", "replicas": 3}),
        ),
    )
    .chain_to(receipt_2.id.clone())
    .sign(&alice)
    .unwrap();

    assert!(verify_chain(&[receipt_1.clone(), receipt_2.clone(), receipt_3.clone()]).unwrap());
    // Out of order is not a chain
    assert!(!verify_chain(&[receipt_1, receipt_3, receipt_2]).unwrap());

    // ── Step 4: Grant trust ─────────────────────────────────────────────
    let alice_to_bob = create_trust_grant(
        &alice,
        &bob.identity_id().unwrap(),
        &bob.public_key().unwrap(),
        &["read:calendar", "read:email"],
        None,
        None,
    )
    .unwrap();
    let alice_to_bob_deploy = create_trust_grant(
        &alice,
        &bob.identity_id().unwrap(),
        &bob.public_key().unwrap(),
        &["execute:deploy:*"],
        Some(TrustConstraints::open().expires_at(agentic_identity::time::now_secs() + 3_600)),
        Some(2),
    )
    .unwrap();
    assert!(alice_to_bob_deploy.delegation_allowed);

    // ── Step 5: Verify over the wire ────────────────────────────────────
    let wire = alice_to_bob.to_json().unwrap();
    assert!(verification::verify_trust_grant(&wire, "read:calendar").unwrap());
    assert!(verification::verify_trust_grant(&wire, "read:email").unwrap());
    assert!(!verification::verify_trust_grant(&wire, "write:calendar").unwrap());

    let bob_to_charlie = delegate(
        &alice_to_bob_deploy,
        &bob,
        &charlie.identity_id().unwrap(),
        &charlie.public_key().unwrap(),
        &["execute:deploy:staging"],
        None,
    )
    .expect("Bob may delegate");
    let chain = serde_json::to_string(&[alice_to_bob_deploy, bob_to_charlie]).unwrap();
    assert!(verification::verify_trust_chain(&chain, "execute:deploy:staging").unwrap());
    assert!(!verification::verify_trust_chain(&chain, "execute:deploy:production").unwrap());

    // ── Step 6: Reload from disk ────────────────────────────────────────
    let reloaded = vault.load(&dir.path().join("alice.aid"), "alice-pass").unwrap();
    assert_eq!(reloaded.id().unwrap(), alice.id().unwrap());
    let later = sign_action(&reloaded, "decision", "signed after reload", None, None).unwrap();
    assert!(verification::verify_receipt(&later.to_json().unwrap()).unwrap());
}

#[test]
fn passphrase_scenario_through_engine() {
    let dir = tempfile::tempdir().unwrap();
    let engine = Engine::new(EngineConfig {
        vault: VaultConfig::default().with_kdf(KdfParams::new(64, 1, 1).unwrap()),
    });
    let path_a = dir.path().join("a.aid");

    let a = engine.create_identity(&path_a, "p1", None).unwrap();
    let receipt = engine.sign_action(a, "decision", "x", None, None).unwrap();
    assert!(engine.verify_receipt(&receipt).unwrap());

    let err = engine.load_identity(&path_a, "wrong").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PassphraseFailure);

    let b = engine
        .create_identity(dir.path().join("b.aid"), "p2", None)
        .unwrap();
    let grant = engine
        .create_trust_grant(
            a,
            &engine.identity_id(b).unwrap(),
            &engine.public_key(b).unwrap(),
            r#"["read:calendar","write:email"]"#,
            None,
            None,
        )
        .unwrap();
    assert!(engine.verify_trust_grant(&grant, "read:calendar").unwrap());
    assert!(!engine.verify_trust_grant(&grant, "delete:everything").unwrap());

    let err = engine
        .create_trust_grant(
            a,
            &engine.identity_id(b).unwrap(),
            &engine.public_key(b).unwrap(),
            "[]",
            None,
            None,
        )
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ValidationFailure);
}

#[test]
fn workflow_receipt_with_structured_data() {
    let agent = KeyVault::ephemeral(Some("data-agent"));

    let receipt = sign_action(
        &agent,
        "mutation",
        "Updated configuration",
        Some(serde_json::json!({
            "key": "max_retries",
            "old_value": 3,
            "new_value": 5,
            "tags": ["b", "a"],
        })),
        None,
    )
    .expect("Receipt with structured data should succeed");

    let json = receipt.to_json().unwrap();
    assert!(verification::verify_receipt(&json).unwrap());

    // Array order is part of the signed content
    let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
    value["data"]["tags"] = serde_json::json!(["a", "b"]);
    assert!(!verification::verify_receipt(&value.to_string()).unwrap());
}

#[test]
fn workflow_identity_id_is_derived_from_key() {
    let dir = tempfile::tempdir().unwrap();
    let vault = fast_vault();
    let path = dir.path().join("stable.aid");
    let created = vault.create(&path, "p", None).unwrap();
    let id = created.identity_id().unwrap();
    created.close();

    for _ in 0..2 {
        let loaded = vault.load(&path, "p").unwrap();
        assert_eq!(loaded.identity_id().unwrap(), id);
        let derived =
            agentic_identity::IdentityId::from_public_key_base64(&loaded.public_key().unwrap())
                .unwrap();
        assert_eq!(derived.as_str(), id);
    }
}

#[test]
fn workflow_audit_trail_persists() {
    let dir = tempfile::tempdir().unwrap();
    let receipts = ReceiptStore::new(dir.path().join("receipts")).unwrap();
    let trust = TrustStore::new(dir.path().join("trust")).unwrap();
    let agent = KeyVault::ephemeral(Some("auditor"));
    let peer = KeyVault::ephemeral(None);

    let first = ReceiptBuilder::new(
        ActionType::Observation,
        ActionContent::new("Read the incident ticket"),
    )
    .context_hash("sha256:9f86d081884c7d65")
    .sign(&agent)
    .unwrap();
    let second =
        sign_action(&agent, "decision", "Escalated", None, Some(first.id.0.as_str())).unwrap();
    receipts.save(&first).unwrap();
    receipts.save(&second).unwrap();

    let trail = receipts.load_chain(&second.id).unwrap();
    assert_eq!(trail.len(), 2);
    assert_eq!(trail[0].context_hash.as_deref(), Some("sha256:9f86d081884c7d65"));
    assert!(verify_chain(&trail).unwrap());
    assert!(verification::verify_receipt(&trail[0].to_json().unwrap()).unwrap());

    let grant = create_trust_grant(
        &agent,
        &peer.identity_id().unwrap(),
        &peer.public_key().unwrap(),
        &["read:tickets"],
        None,
        None,
    )
    .unwrap();
    trust.save_granted(&grant).unwrap();
    let reloaded = trust.load_grant(&grant.id).unwrap();
    let wire = reloaded.to_json().unwrap();
    assert!(verification::verify_trust_grant(&wire, "read:tickets").unwrap());
}
