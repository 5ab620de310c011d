// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Credential resolution for remote sessions.
//!
//! Communication methods carry encrypted credential blobs; the engine opens
//! them at connection time through the injected [`Decryptor`] capability and
//! never persists or logs the plaintext. Resolution walks the method's
//! credentials in stored order and returns the first one that decrypts into a
//! complete record for its declared type.

use async_trait::async_trait;
use muster_core::{CommunicationMethod, CredentialType};
use std::collections::HashMap;
use thiserror::Error;

/// Errors from the decryption capability.
#[derive(Debug, Clone, Error)]
pub enum DecryptError {
    #[error("malformed credential blob: {0}")]
    Malformed(String),
    #[error("decryption failed: {0}")]
    Failed(String),
}

/// Opens an encrypted credential blob into its key/value fields.
#[async_trait]
pub trait Decryptor: Send + Sync {
    async fn decrypt(&self, blob: &[u8]) -> Result<HashMap<String, String>, DecryptError>;
}

/// Errors from credential resolution.
#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// No attached credential decrypted into a usable record.
    #[error("no usable credentials on communication method")]
    NoCredentials,
}

/// A decrypted, typed credential. Secret material never appears in `Debug`
/// output; only the username is fit for diagnostics.
#[derive(Clone, PartialEq, Eq)]
pub enum ResolvedCredential {
    Password { username: String, password: String },
    SshKey { username: String, private_key: String, passphrase: Option<String> },
}

impl ResolvedCredential {
    pub fn username(&self) -> &str {
        match self {
            ResolvedCredential::Password { username, .. } => username,
            ResolvedCredential::SshKey { username, .. } => username,
        }
    }
}

impl std::fmt::Debug for ResolvedCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolvedCredential::Password { username, .. } => f
                .debug_struct("Password")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            ResolvedCredential::SshKey { username, passphrase, .. } => f
                .debug_struct("SshKey")
                .field("username", username)
                .field("private_key", &"<redacted>")
                .field("passphrase", &passphrase.as_ref().map(|_| "<redacted>"))
                .finish(),
        }
    }
}

/// Resolve the credential to use for a communication method.
///
/// Skips credentials with empty blobs and candidates that fail to decrypt or
/// are missing required fields; returns the first that validates.
pub async fn resolve(
    decryptor: &dyn Decryptor,
    method: &CommunicationMethod,
) -> Result<ResolvedCredential, ResolveError> {
    for credential in &method.credentials {
        if credential.encrypted_credentials.is_empty() {
            continue;
        }
        let fields = match decryptor.decrypt(&credential.encrypted_credentials).await {
            Ok(fields) => fields,
            Err(error) => {
                tracing::warn!(
                    credential_id = credential.id,
                    method_id = method.id,
                    error = %error,
                    "credential blob failed to decrypt, trying next"
                );
                continue;
            }
        };
        match validate(credential.credential_type, &fields) {
            Some(resolved) => return Ok(resolved),
            None => {
                tracing::warn!(
                    credential_id = credential.id,
                    method_id = method.id,
                    credential_type = %credential.credential_type,
                    "decrypted credential is missing required fields, trying next"
                );
            }
        }
    }
    Err(ResolveError::NoCredentials)
}

/// Check required fields by credential type and build the typed record.
fn validate(
    credential_type: CredentialType,
    fields: &HashMap<String, String>,
) -> Option<ResolvedCredential> {
    let field = |name: &str| fields.get(name).filter(|v| !v.is_empty()).cloned();
    match credential_type {
        CredentialType::Password => Some(ResolvedCredential::Password {
            username: field("username")?,
            password: field("password")?,
        }),
        CredentialType::SshKey => Some(ResolvedCredential::SshKey {
            username: field("username")?,
            private_key: field("private_key")?,
            passphrase: field("passphrase"),
        }),
    }
}

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::*;

    /// Decryptor whose "ciphertext" is plain JSON, e.g. the blobs produced by
    /// `muster_core::test_support::password_blob`.
    #[derive(Clone, Copy, Default)]
    pub struct FakeDecryptor {
        fail: bool,
    }

    impl FakeDecryptor {
        pub fn new() -> Self {
            Self::default()
        }

        /// A decryptor that rejects every blob, as with a wrong key.
        pub fn failing() -> Self {
            Self { fail: true }
        }
    }

    #[async_trait]
    impl Decryptor for FakeDecryptor {
        async fn decrypt(&self, blob: &[u8]) -> Result<HashMap<String, String>, DecryptError> {
            if self.fail {
                return Err(DecryptError::Failed("wrong key".to_owned()));
            }
            serde_json::from_slice(blob).map_err(|e| DecryptError::Malformed(e.to_string()))
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeDecryptor;

#[cfg(test)]
#[path = "credential_tests.rs"]
mod tests;
