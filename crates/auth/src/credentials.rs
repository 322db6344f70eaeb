use async_trait::async_trait;

/// Opaque password check.
///
/// The hashing scheme is the implementor's business. A malformed stored hash
/// must yield `false`, not an error, so that it is indistinguishable from a
/// wrong password.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(&self, plaintext: &str, stored_hash: &str) -> bool;

    /// Spend about as much work as [`verify`](Self::verify) without a stored
    /// hash to check against. Runs when a login names an unknown principal,
    /// so that both failures take comparable time.
    async fn verify_decoy(&self, plaintext: &str) {
        let _ = plaintext;
    }
}
