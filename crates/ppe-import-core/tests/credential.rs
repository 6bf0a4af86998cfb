use std::fs;

use ppe_import_core::config::{ConfigStore, JDBC_PASSWORD};
use ppe_import_core::credential::{
    generate_key, is_protected, unlock_stored_password, CredentialGuard, CryptoError,
    KEY_ENV_VAR,
};
use ppe_import_core::{ErrorKind, ImportError};

fn guard() -> CredentialGuard {
    CredentialGuard::from_key_bytes(&[7u8; 32]).expect("valid key")
}

#[test]
fn protect_then_unprotect_round_trips() {
    let guard = guard();
    for plaintext in ["hunter2", "", "pa ss#word$", "ünïcødé", "aGVsbG8="] {
        let protected = guard.protect(plaintext).expect("protect");
        assert_ne!(protected, plaintext);
        assert!(is_protected(&protected));
        assert_eq!(guard.unprotect(&protected).expect("unprotect"), plaintext);
    }
}

#[test]
fn protect_is_idempotent() {
    let guard = guard();
    let once = guard.protect("hunter2").unwrap();
    let twice = guard.protect(&once).unwrap();
    assert_eq!(once, twice);
}

#[test]
fn fresh_nonce_per_encryption() {
    let guard = guard();
    let a = guard.protect("hunter2").unwrap();
    let b = guard.protect("hunter2").unwrap();
    assert_ne!(a, b);
    assert_eq!(guard.unprotect(&a).unwrap(), guard.unprotect(&b).unwrap());
}

#[test]
fn base64_plaintext_is_not_mistaken_for_ciphertext() {
    let guard = guard();
    let protected = guard.protect("aGVsbG8gd29ybGQ=").unwrap();
    assert_ne!(protected, "aGVsbG8gd29ybGQ=");
}

#[test]
fn unprotect_rejects_untagged_value() {
    let err = guard().unprotect("hunter2").unwrap_err();
    assert!(matches!(err, CryptoError::NotEncrypted));
}

#[test]
fn unprotect_rejects_bad_base64() {
    let err = guard().unprotect("ENC(not base64!)").unwrap_err();
    assert!(matches!(err, CryptoError::Encoding(_)));
}

#[test]
fn unprotect_rejects_truncated_payload() {
    let err = guard().unprotect("ENC(AAAA)").unwrap_err();
    assert!(matches!(err, CryptoError::Encoding(_)));
}

#[test]
fn tampered_ciphertext_fails_authentication() {
    let guard = guard();
    let protected = guard.protect("hunter2").unwrap();
    let mut chars: Vec<char> = protected.chars().collect();
    let idx = 10;
    chars[idx] = if chars[idx] == 'A' { 'B' } else { 'A' };
    let tampered: String = chars.into_iter().collect();

    let err = guard.unprotect(&tampered).unwrap_err();
    assert!(matches!(err, CryptoError::Decryption));
}

#[test]
fn wrong_key_cannot_decrypt_or_reprotect() {
    let protected = guard().protect("hunter2").unwrap();
    let other = CredentialGuard::from_key_bytes(&[9u8; 32]).unwrap();

    assert!(matches!(
        other.unprotect(&protected).unwrap_err(),
        CryptoError::Decryption
    ));
    assert!(matches!(
        other.protect(&protected).unwrap_err(),
        CryptoError::Decryption
    ));
}

#[test]
fn key_must_be_32_bytes() {
    assert!(matches!(
        CredentialGuard::from_key_bytes(&[1u8; 16]).unwrap_err(),
        CryptoError::InvalidKey
    ));
    assert!(matches!(
        CredentialGuard::from_base64_key("%%%").unwrap_err(),
        CryptoError::InvalidKey
    ));
}

#[test]
fn generated_key_is_usable() {
    let key = generate_key();
    let guard = CredentialGuard::from_base64_key(&key).expect("generated key decodes");
    let protected = guard.protect("secret").unwrap();
    assert_eq!(guard.unprotect(&protected).unwrap(), "secret");
}

#[test]
fn stored_password_is_encrypted_at_rest_and_stable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.properties");
    fs::write(
        &path,
        "CSV_FILE_PATH=/data/in\nJDBC_URL=jdbc:postgresql://localhost:5432/ppe\nJDBC_USERNAME=loader\nJDBC_PASSWORD=hunter2\n",
    )
    .unwrap();
    let guard = guard();

    let mut store = ConfigStore::load(&path).unwrap();
    let plaintext = unlock_stored_password(&mut store, &guard).unwrap();
    assert_eq!(plaintext, "hunter2");

    let first = ConfigStore::load(&path).unwrap();
    let stored = first.get(JDBC_PASSWORD).unwrap().to_string();
    assert_ne!(stored, "hunter2");
    assert_eq!(guard.unprotect(&stored).unwrap(), "hunter2");

    let mut store = ConfigStore::load(&path).unwrap();
    let plaintext = unlock_stored_password(&mut store, &guard).unwrap();
    assert_eq!(plaintext, "hunter2");

    let second = ConfigStore::load(&path).unwrap();
    assert_eq!(second.get(JDBC_PASSWORD), Some(stored.as_str()));
    assert_eq!(second.get("JDBC_USERNAME"), Some("loader"));
}

#[test]
fn hand_written_special_characters_survive_encryption() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.properties");
    fs::write(&path, "JDBC_PASSWORD=hunter$2abc\nNOTE=a #b\n").unwrap();
    let guard = guard();

    let mut store = ConfigStore::load(&path).unwrap();
    let plaintext = unlock_stored_password(&mut store, &guard).unwrap();
    assert_eq!(plaintext, "hunter$2abc");

    let reloaded = ConfigStore::load(&path).unwrap();
    let stored = reloaded.get(JDBC_PASSWORD).unwrap();
    assert_eq!(guard.unprotect(stored).unwrap(), "hunter$2abc");
    assert_eq!(reloaded.get("NOTE"), Some("a #b"));
}

#[test]
fn from_env_reads_key_variable() {
    let key = generate_key();
    std::env::set_var(KEY_ENV_VAR, &key);
    let guard = CredentialGuard::from_env().expect("key from environment");
    let protected = guard.protect("hunter2").unwrap();
    assert_eq!(
        CredentialGuard::from_base64_key(&key)
            .unwrap()
            .unprotect(&protected)
            .unwrap(),
        "hunter2"
    );

    std::env::remove_var(KEY_ENV_VAR);
    assert!(matches!(
        CredentialGuard::from_env().unwrap_err(),
        CryptoError::KeyUnavailable { .. }
    ));
}

#[test]
fn missing_password_key_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = ConfigStore::empty(dir.path().join("config.properties"));

    let err = unlock_stored_password(&mut store, &guard()).unwrap_err();
    assert!(matches!(err, ImportError::Config(_)));
    assert_eq!(err.kind(), ErrorKind::Config);
}
