use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gotham_core::{RoleId, SessionId};

use crate::Permission;

/// Session token payload.
///
/// Serialized with the registered JWT names (`iat`, `exp`, `jti`) so the token
/// stays readable by standard JWT tooling. Timestamps are whole seconds.
///
/// Claims are immutable once signed: the permission list is a snapshot taken
/// at issuance and is not refreshed when the role changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject email.
    pub email: String,

    /// Role granted at issuance; resolved again on every request.
    pub role_id: RoleId,

    /// Permission names of the role at issuance time.
    pub permissions: Vec<Permission>,

    #[serde(rename = "iat", with = "chrono::serde::ts_seconds")]
    pub issued_at: DateTime<Utc>,

    #[serde(rename = "exp", with = "chrono::serde::ts_seconds")]
    pub expires_at: DateTime<Utc>,

    #[serde(rename = "jti")]
    pub session_id: SessionId,
}

impl SessionClaims {
    /// A token is expired from the instant `expires_at` is reached.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Lifetime left at `now`, or `None` once expired.
    pub fn remaining_lifetime(&self, now: DateTime<Utc>) -> Option<chrono::Duration> {
        if self.is_expired_at(now) {
            None
        } else {
            Some(self.expires_at - now)
        }
    }
}
