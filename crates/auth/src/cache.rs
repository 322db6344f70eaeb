//! Session cache contract (liveness markers with TTL).

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Value stored for a live session. Anything else is treated as revoked.
pub const LIVENESS_MARKER: &str = "valid";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CacheError {
    #[error("session cache backend error: {0}")]
    Backend(String),
}

/// Key-value store with per-entry expiry.
///
/// Implementations must be safe for concurrent use; the auth core holds no
/// locks of its own. An expired entry must read back as `None`.
#[async_trait]
pub trait SessionCache: Send + Sync {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError>;

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Remove `key`. Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}
