//! Resilience tests: corrupted files, wrong passphrases, tampered data.

use agentic_identity::config::{KdfParams, VaultConfig};
use agentic_identity::error::ErrorKind;
use agentic_identity::storage::KeyVault;

fn vault() -> KeyVault {
    KeyVault::new(VaultConfig::default().with_kdf(KdfParams::new(64, 1, 1).unwrap()))
}

#[test]
fn resilience_corrupted_aid_file_detected() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("corrupted.aid");
    vault().create(&path, "test_pass", Some("corruption-test")).unwrap();

    // Corrupt the file by flipping bytes in the middle
    {
        let mut data = std::fs::read(&path).unwrap();
        for item in data.iter_mut().take(50).skip(40) {
            *item ^= 0xFF;
        }
        std::fs::write(&path, data).unwrap();
    }

    assert!(
        vault().load(&path, "test_pass").is_err(),
        "Corrupted file should fail to load"
    );
}

#[test]
fn resilience_wrong_passphrase_fails() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("passphrase-test.aid");
    vault().create(&path, "correct_password", None).unwrap();

    let err = vault().load(&path, "wrong_password").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PassphraseFailure);
    // Nothing about the key leaks into the message
    assert!(!err.to_string().contains("correct_password"));
}

#[test]
fn resilience_tampered_ciphertext_looks_like_wrong_passphrase() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("tamper.aid");
    vault().create(&path, "pass", None).unwrap();

    let mut value: serde_json::Value =
        serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    let ct = value["encrypted_anchor"].as_str().unwrap().to_string();
    // Swap two base64 characters in the middle of the ciphertext
    let mut chars: Vec<char> = ct.chars().collect();
    let mid = chars.len() / 2;
    let replacement = if chars[mid] == 'A' { 'B' } else { 'A' };
    chars[mid] = replacement;
    value["encrypted_anchor"] = chars.into_iter().collect::<String>().into();
    std::fs::write(&path, value.to_string()).unwrap();

    let err = vault().load(&path, "pass").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PassphraseFailure);
}

#[test]
fn resilience_truncated_file_detected() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("truncated.aid");
    vault().create(&path, "test_pass", None).unwrap();

    let data = std::fs::read(&path).unwrap();
    std::fs::write(&path, &data[..data.len() / 2]).unwrap();

    let err = vault().load(&path, "test_pass").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SerializationFailure);
}

#[test]
fn resilience_empty_file_detected() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("empty.aid");
    std::fs::write(&path, b"").unwrap();

    let err = vault().load(&path, "test_pass").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SerializationFailure);
}

#[test]
fn resilience_nonexistent_file() {
    let tmp = tempfile::tempdir().unwrap();
    let err = vault()
        .load(&tmp.path().join("definitely_does_not_exist.aid"), "test_pass")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::IoFailure);
}

#[test]
fn resilience_save_creates_parent_directories() {
    let tmp = tempfile::tempdir().unwrap();
    let deep_path = tmp.path().join("a").join("b").join("c").join("deep.aid");

    let anchor = vault()
        .create(&deep_path, "test_pass", Some("deep-save"))
        .expect("Should create parent directories");
    let loaded = vault().load(&deep_path, "test_pass").unwrap();
    assert_eq!(loaded.id().unwrap(), anchor.id().unwrap());
}

#[test]
fn resilience_identity_roundtrip_100_times() {
    let tmp = tempfile::tempdir().unwrap();
    let v = vault();

    for i in 0..100 {
        let path = tmp.path().join(format!("roundtrip-{i}.aid"));
        let anchor = KeyVault::ephemeral(Some(format!("roundtrip-{i}").as_str()));
        v.save(&anchor, &path, "pass").unwrap();
        let loaded = v.load(&path, "pass").unwrap();
        assert_eq!(loaded.id().unwrap(), anchor.id().unwrap(), "Roundtrip {i} failed");
    }
}

#[test]
fn resilience_random_bytes_not_valid_aid() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("random.aid");

    let random_data: Vec<u8> = (0..1024).map(|i| (i * 17 + 31) as u8).collect();
    std::fs::write(&path, &random_data).unwrap();

    let err = vault().load(&path, "test_pass").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::SerializationFailure);
}
