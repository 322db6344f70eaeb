use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission name attached to a role (e.g. "view_tasks").
///
/// Permissions are snapshotted into a token at issuance and are informational
/// from then on: request authorization is decided by the role's capabilities,
/// which are always loaded fresh.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
