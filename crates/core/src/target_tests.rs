// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_support::{method, target_with_methods};
use serde_json::json;

#[test]
fn primary_active_method_wins() {
    let target = target_with_methods(vec![
        method(1, "winrm", false, true),
        method(2, "ssh", true, true),
    ]);
    assert_eq!(target.primary_method().unwrap().id, 2);
}

#[test]
fn inactive_primary_is_skipped() {
    let target = target_with_methods(vec![
        method(1, "ssh", true, false),
        method(2, "winrm", false, true),
    ]);
    assert_eq!(target.primary_method().unwrap().id, 2);
}

#[test]
fn no_active_method_yields_none() {
    let target = target_with_methods(vec![method(1, "ssh", true, false)]);
    assert!(target.primary_method().is_none());
}

#[test]
fn method_config_accessors() {
    let mut m = method(1, "ssh", true, true);
    m.config.insert("host".to_owned(), json!("10.0.0.5"));
    m.config.insert("port".to_owned(), json!(2222));
    assert_eq!(m.host(), Some("10.0.0.5"));
    assert_eq!(m.port(), Some(2222));
}

#[test]
fn missing_or_empty_host_is_none() {
    let mut m = method(1, "ssh", true, true);
    assert!(m.host().is_none());
    m.config.insert("host".to_owned(), json!(""));
    assert!(m.host().is_none());
}

#[test]
fn credential_debug_redacts_blob() {
    let credential = Credential {
        id: 1,
        credential_type: CredentialType::Password,
        encrypted_credentials: b"s3cret-blob".to_vec(),
        is_primary: true,
    };
    let rendered = format!("{credential:?}");
    assert!(!rendered.contains("s3cret"), "blob leaked into Debug: {rendered}");
    assert!(rendered.contains("<11 bytes>"));
}
