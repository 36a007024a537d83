//! Trust Delegation — grant trust, check constraints, delegate, verify chains.
//!
//! Run with:
//!   cargo run --example trust_delegation -p agentic-identity

use agentic_identity::storage::KeyVault;
use agentic_identity::time::now_secs;
use agentic_identity::trust::chain::{delegate, validate_delegation, verify_trust_chain};
use agentic_identity::trust::constraint::TrustConstraints;
use agentic_identity::trust::grant::TrustGrantBuilder;
use agentic_identity::trust::verify::{check_grant, check_grant_at};
use agentic_identity::trust::Capability;

fn main() {
    env_logger::init();

    // ── Setup: three identities ─────────────────────────────────────────────
    let alice = KeyVault::ephemeral(Some("alice-orchestrator"));
    let bob = KeyVault::ephemeral(Some("bob-worker"));
    let carol = KeyVault::ephemeral(Some("carol-specialist"));

    println!("Identities:");
    println!("  Alice (orchestrator): {}", alice.id().unwrap());
    println!("  Bob   (worker):       {}", bob.id().unwrap());
    println!("  Carol (specialist):   {}", carol.id().unwrap());
    println!();

    // ── 1. Alice grants trust to Bob ────────────────────────────────────────
    //
    // The grant names Bob and pins his public key, and is signed by Alice.
    let grant_ab = TrustGrantBuilder::new(bob.id().unwrap(), bob.public_key().unwrap())
        .capability("read:calendar")
        .capability("read:documents")
        .sign(&alice)
        .expect("trust grant signing should succeed");

    println!("Trust grant: Alice -> Bob");
    println!("  Grant ID:      {}", grant_ab.id);
    println!(
        "  Capabilities:  {:?}",
        grant_ab.capabilities.iter().map(Capability::as_str).collect::<Vec<_>>()
    );
    println!("  Delegation:    allowed={}", grant_ab.delegation_allowed);
    println!("  Signature:     {}...", &grant_ab.signature[..32]);
    println!();

    // ── 2. Verify the grant ─────────────────────────────────────────────────
    //
    // Checks run in order: signature, time window, use count, capability.
    for cap in ["read:calendar", "write:calendar"] {
        let verdict = check_grant(&grant_ab, cap, None).expect("well-formed grant");
        println!("  {cap:<20} -> {verdict}");
    }
    println!();

    // ── 3. Grant with wildcard capabilities ─────────────────────────────────
    let grant_wild = TrustGrantBuilder::new(bob.id().unwrap(), bob.public_key().unwrap())
        .capability("read:*")
        .sign(&alice)
        .expect("wildcard grant should succeed");
    println!("Wildcard grant 'read:*':");
    for cap in ["read:calendar", "read:email", "read", "write:calendar"] {
        let verdict = check_grant(&grant_wild, cap, None).expect("well-formed grant");
        println!("  {cap:<20} -> {verdict}");
    }
    println!();

    // ── 4. Grant with constraints ───────────────────────────────────────────
    //
    // One hour window, at most five uses. Use counting belongs to the caller.
    let now = now_secs();
    let grant_limited = TrustGrantBuilder::new(bob.id().unwrap(), bob.public_key().unwrap())
        .capability("execute:report")
        .constraints(TrustConstraints::time_bounded(now, now + 3_600).with_max_uses(5))
        .sign(&alice)
        .expect("constrained grant should succeed");

    println!("Constrained grant (1 hour, max 5 uses):");
    for (at, uses) in [(now, 0), (now, 5), (now + 7_200, 0)] {
        let verdict =
            check_grant_at(&grant_limited, "execute:report", at, Some(uses)).expect("well-formed");
        println!("  t+{:>5}s, {uses} uses -> {verdict}", at - now);
    }
    println!();

    // ── 5. Delegation: Alice -> Bob -> Carol ────────────────────────────────
    let grant_delegatable = TrustGrantBuilder::new(bob.id().unwrap(), bob.public_key().unwrap())
        .capability("read:*")
        .allow_delegation(2)
        .sign(&alice)
        .expect("delegatable grant should succeed");
    println!("Delegatable grant: Alice -> Bob (max depth: 2)");
    println!("  Grant ID:   {}", grant_delegatable.id);
    println!();

    validate_delegation(
        &grant_delegatable,
        &bob.id().unwrap(),
        &[Capability::new("read:calendar")],
    )
    .expect("Bob may delegate read:calendar");
    println!("Delegation validation: Bob can delegate 'read:calendar' to Carol");

    if let Err(e) = validate_delegation(
        &grant_delegatable,
        &bob.id().unwrap(),
        &[Capability::new("write:calendar")],
    ) {
        println!("Delegation validation: 'write:calendar' refused ({e})");
    }

    let grant_bc = delegate(
        &grant_delegatable,
        &bob,
        &carol.identity_id().unwrap(),
        &carol.public_key().unwrap(),
        &["read:calendar"],
        None,
    )
    .expect("delegation should succeed");
    println!("Delegated grant: Bob -> Carol");
    println!("  Grant ID:         {}", grant_bc.id);
    println!("  Parent grant:     {:?}", grant_bc.parent_grant.as_ref().map(|p| p.0.as_str()));
    println!("  Delegation depth: {}", grant_bc.delegation_depth);
    println!();

    // ── 6. Verify the trust chain ───────────────────────────────────────────
    //
    // Every link must verify on its own, and each hop must be signed by the
    // previous grantee within the root's depth limit.
    let chain = [grant_delegatable, grant_bc];
    for cap in ["read:calendar", "read:email"] {
        let valid = verify_trust_chain(&chain, cap, now_secs()).expect("well-formed chain");
        println!("Trust chain (Alice -> Bob -> Carol) for '{cap}': valid={valid}");
    }

    println!();
    println!("All operations completed successfully.");
}
