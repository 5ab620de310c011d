// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use muster_core::test_support::{method, password_blob, ssh_key_blob};
use muster_core::Credential;

fn credential(id: i64, credential_type: CredentialType, blob: Vec<u8>) -> Credential {
    Credential { id, credential_type, encrypted_credentials: blob, is_primary: false }
}

#[tokio::test]
async fn resolves_password_credential() {
    let mut m = method(1, "ssh", true, true);
    m.credentials.push(credential(
        1,
        CredentialType::Password,
        password_blob("ops", "hunter2"),
    ));

    let resolved = resolve(&FakeDecryptor::new(), &m).await.unwrap();
    assert_eq!(
        resolved,
        ResolvedCredential::Password { username: "ops".into(), password: "hunter2".into() }
    );
    assert_eq!(resolved.username(), "ops");
}

#[tokio::test]
async fn resolves_ssh_key_with_optional_passphrase() {
    let mut m = method(1, "ssh", true, true);
    m.credentials.push(credential(
        1,
        CredentialType::SshKey,
        ssh_key_blob("ops", "-----BEGIN KEY-----", None),
    ));
    let resolved = resolve(&FakeDecryptor::new(), &m).await.unwrap();
    match resolved {
        ResolvedCredential::SshKey { username, passphrase, .. } => {
            assert_eq!(username, "ops");
            assert!(passphrase.is_none());
        }
        other => panic!("expected ssh key, got {other:?}"),
    }
}

#[tokio::test]
async fn empty_blobs_are_skipped() {
    let mut m = method(1, "ssh", true, true);
    m.credentials.push(credential(1, CredentialType::Password, Vec::new()));
    m.credentials.push(credential(
        2,
        CredentialType::Password,
        password_blob("fallback", "pw"),
    ));
    let resolved = resolve(&FakeDecryptor::new(), &m).await.unwrap();
    assert_eq!(resolved.username(), "fallback");
}

#[tokio::test]
async fn invalid_candidates_fall_through_to_next() {
    let mut m = method(1, "ssh", true, true);
    // Password credential missing its password field.
    m.credentials.push(credential(
        1,
        CredentialType::Password,
        br#"{"username":"incomplete"}"#.to_vec(),
    ));
    m.credentials.push(credential(
        2,
        CredentialType::Password,
        password_blob("second", "pw"),
    ));
    let resolved = resolve(&FakeDecryptor::new(), &m).await.unwrap();
    assert_eq!(resolved.username(), "second");
}

#[tokio::test]
async fn no_credentials_error() {
    let m = method(1, "ssh", true, true);
    let err = resolve(&FakeDecryptor::new(), &m).await.unwrap_err();
    assert!(matches!(err, ResolveError::NoCredentials));
}

#[tokio::test]
async fn decrypt_failure_yields_no_credentials() {
    let mut m = method(1, "ssh", true, true);
    m.credentials.push(credential(1, CredentialType::Password, password_blob("ops", "pw")));
    let err = resolve(&FakeDecryptor::failing(), &m).await.unwrap_err();
    assert!(matches!(err, ResolveError::NoCredentials));
}

#[test]
fn debug_never_shows_secrets() {
    let password = ResolvedCredential::Password {
        username: "ops".into(),
        password: "hunter2".into(),
    };
    let key = ResolvedCredential::SshKey {
        username: "ops".into(),
        private_key: "-----BEGIN KEY-----".into(),
        passphrase: Some("opensesame".into()),
    };
    let rendered = format!("{password:?} {key:?}");
    assert!(!rendered.contains("hunter2"), "leaked: {rendered}");
    assert!(!rendered.contains("BEGIN KEY"), "leaked: {rendered}");
    assert!(!rendered.contains("opensesame"), "leaked: {rendered}");
    assert!(rendered.contains("ops"));
}
