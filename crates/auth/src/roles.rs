use std::borrow::Cow;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use gotham_core::RoleId;

use crate::{Capability, Permission};

/// Role name used by route allow-lists (e.g. "admin", "agent").
///
/// Names are unique within the principal store.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleName(Cow<'static, str>);

impl RoleName {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for RoleName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A coarse-grained role with its fine-grained grants.
///
/// # Invariants
/// - `capabilities` is empty, `{"*"}`, or an explicit allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: RoleName,
    pub permissions: BTreeSet<Permission>,
    pub capabilities: BTreeSet<Capability>,
}

impl Role {
    pub fn new(id: RoleId, name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            id,
            name: RoleName::new(name),
            permissions: BTreeSet::new(),
            capabilities: BTreeSet::new(),
        }
    }

    pub fn with_permissions(mut self, permissions: impl IntoIterator<Item = Permission>) -> Self {
        self.permissions.extend(permissions);
        self
    }

    pub fn with_capabilities(mut self, capabilities: impl IntoIterator<Item = Capability>) -> Self {
        self.capabilities.extend(capabilities);
        self
    }

    pub fn has_unrestricted_access(&self) -> bool {
        self.capabilities.iter().any(Capability::is_wildcard)
    }

    /// Permission names in a stable order, as snapshotted into tokens.
    pub fn permission_snapshot(&self) -> Vec<Permission> {
        self.permissions.iter().cloned().collect()
    }
}
