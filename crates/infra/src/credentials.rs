//! Password hashing with bcrypt.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use thiserror::Error;
use tracing::warn;

use gotham_auth::CredentialVerifier;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("password hashing failed: {0}")]
pub struct HashError(String);

/// bcrypt-based [`CredentialVerifier`] that also hashes new passwords.
///
/// bcrypt is deliberately slow, so both directions run on the blocking pool
/// when called from async code.
#[derive(Debug, Clone)]
pub struct BcryptCredentials {
    cost: u32,
    /// Hash of a throwaway password at `cost`, made on first use.
    decoy: Arc<OnceLock<String>>,
}

const DECOY_PASSWORD: &str = "gotham-decoy-password";

impl BcryptCredentials {
    pub fn new(cost: u32) -> Self {
        Self {
            cost,
            decoy: Arc::default(),
        }
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash on the current thread.
    pub fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        bcrypt::hash(plaintext, self.cost).map_err(|e| HashError(e.to_string()))
    }

    /// Hash on the blocking pool.
    pub async fn hash_async(&self, plaintext: &str) -> Result<String, HashError> {
        let this = self.clone();
        let plaintext = plaintext.to_string();
        tokio::task::spawn_blocking(move || this.hash(&plaintext))
            .await
            .map_err(|e| HashError(e.to_string()))?
    }

    /// Hash checked against when the principal is unknown. Blocking on first
    /// use; empty if hashing failed, which `bcrypt::verify` rejects.
    fn decoy_hash(&self) -> &str {
        self.decoy
            .get_or_init(|| self.hash(DECOY_PASSWORD).unwrap_or_default())
    }
}

impl Default for BcryptCredentials {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

#[async_trait]
impl CredentialVerifier for BcryptCredentials {
    async fn verify(&self, plaintext: &str, stored_hash: &str) -> bool {
        let plaintext = plaintext.to_string();
        let stored_hash = stored_hash.to_string();
        let outcome =
            tokio::task::spawn_blocking(move || bcrypt::verify(plaintext, &stored_hash)).await;

        match outcome {
            Ok(Ok(matches)) => matches,
            // Unparseable hash: same outcome as a wrong password.
            Ok(Err(_)) => false,
            Err(e) => {
                warn!(error = %e, "password verification task failed");
                false
            }
        }
    }

    async fn verify_decoy(&self, plaintext: &str) {
        let this = self.clone();
        let plaintext = plaintext.to_string();
        let outcome =
            tokio::task::spawn_blocking(move || bcrypt::verify(plaintext, this.decoy_hash())).await;

        if let Err(e) = outcome {
            warn!(error = %e, "decoy verification task failed");
        }
    }
}
