//! Basic Identity — create an encrypted identity, reload it, sign actions.
//!
//! Run with:
//!   RUST_LOG=agentic_identity=debug cargo run --example basic_identity -p agentic-identity

use agentic_identity::config::{KdfParams, VaultConfig};
use agentic_identity::error::ErrorKind;
use agentic_identity::receipt::sign_action;
use agentic_identity::storage::KeyVault;
use agentic_identity::{time, verification};

fn main() {
    env_logger::init();

    // ── 1. Create an identity container ─────────────────────────────────────
    //
    // A fresh Ed25519 key pair is generated and sealed under the passphrase
    // (Argon2id, then ChaCha20-Poly1305). A lighter work factor keeps the
    // example quick; the default is 64 MiB / 3 passes.
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("my-agent.aid");
    let vault = KeyVault::new(
        VaultConfig::default().with_kdf(KdfParams::new(8 * 1024, 2, 1).expect("valid params")),
    );

    let anchor = vault
        .create(&path, "correct horse battery staple", Some("my-agent"))
        .expect("identity creation should succeed");

    println!("Identity created at {}", path.display());
    println!("  ID:         {}", anchor.identity_id().unwrap());
    println!(
        "  Name:       {}",
        anchor.name().unwrap().as_deref().unwrap_or("(none)")
    );
    println!("  Public key: {}", anchor.public_key().unwrap());
    println!(
        "  Created at: {}",
        time::secs_to_rfc3339(anchor.created_at().unwrap())
    );
    println!();

    // ── 2. The public identity document ─────────────────────────────────────
    //
    // Readable without the passphrase, self-signed, and verifiable by anyone.
    let doc = vault
        .read_public_document(&path)
        .expect("public document should be readable");
    println!("Identity document (self-signed):");
    println!("  Algorithm:  {}", doc.algorithm);
    println!("  Signature:  {}...", &doc.signature[..32]);
    assert!(doc.verify_signature().expect("well-formed document"));
    println!("  Verified:   OK");
    println!();

    // ── 3. Reload with the right and the wrong passphrase ───────────────────
    let reloaded = vault
        .load(&path, "correct horse battery staple")
        .expect("reload should succeed");
    assert_eq!(reloaded.identity_id().unwrap(), anchor.identity_id().unwrap());
    println!("Reloaded: same identity id");

    let err = vault
        .load(&path, "wrong passphrase")
        .expect_err("wrong passphrase must fail");
    assert_eq!(err.kind(), ErrorKind::PassphraseFailure);
    println!("Wrong passphrase: {err} (code {})", err.code());
    println!();

    // ── 4. Sign a short, chained history ────────────────────────────────────
    let first = sign_action(&reloaded, "observation", "Noticed error spike", None, None)
        .expect("signing should succeed");
    let second = sign_action(
        &reloaded,
        "decision",
        "Rolled back release",
        Some(serde_json::json!({"release": "v42", "reason": "error rate"})),
        Some(&first.id.0),
    )
    .expect("signing should succeed");

    for receipt in [&first, &second] {
        let json = receipt.to_json().expect("serializable");
        let valid = verification::verify_receipt(&json).expect("well-formed receipt");
        println!(
            "Receipt {} [{}] hash={}... valid={valid}",
            receipt.id,
            receipt.action_type,
            &receipt.receipt_hash[..16]
        );
    }
    let chain = serde_json::to_string(&[&first, &second]).expect("serializable");
    println!(
        "Chain valid: {}",
        verification::verify_receipt_chain(&chain).expect("well-formed chain")
    );
    println!();

    // ── 5. Close the identity ───────────────────────────────────────────────
    //
    // The signing key is zeroized; any later use is an error, not a crash.
    reloaded.close();
    let err = sign_action(&reloaded, "decision", "too late", None, None)
        .expect_err("closed identity cannot sign");
    println!("After close: {err}");

    println!("All operations completed successfully.");
}
