//! Capabilities: fine-grained access strings evaluated against an allow-list.

use std::borrow::Cow;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Capability identifier (e.g. "delete:user").
///
/// Capabilities are opaque strings. The special wildcard capability `"*"`
/// grants every capability; there is no deny form.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capability(Cow<'static, str>);

impl Capability {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == WILDCARD.as_str()
    }
}

impl core::fmt::Display for Capability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

pub const WILDCARD: Capability = Capability::from_static("*");

pub const CREATE_USER: Capability = Capability::from_static("create:user");
pub const READ_USER: Capability = Capability::from_static("read:user");
pub const UPDATE_USER: Capability = Capability::from_static("update:user");
pub const DELETE_USER: Capability = Capability::from_static("delete:user");
pub const MANAGE_ROLES: Capability = Capability::from_static("manage:roles");
pub const VIEW_TASKS: Capability = Capability::from_static("view:tasks");
pub const MANAGE_TASKS: Capability = Capability::from_static("manage:tasks");

/// Whether `granted` covers every capability in `required`.
///
/// - No IO
/// - An empty requirement is always satisfied
/// - A granted wildcard satisfies any requirement
pub fn capabilities_satisfy(granted: &BTreeSet<Capability>, required: &[Capability]) -> bool {
    if granted.contains(&WILDCARD) {
        return true;
    }
    required.iter().all(|cap| granted.contains(cap))
}
