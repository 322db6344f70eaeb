use serde::{Deserialize, Serialize};

use gotham_core::{RoleId, UserId};

/// An account that can authenticate.
///
/// The credential hash is opaque to this crate; only a
/// [`CredentialVerifier`](crate::CredentialVerifier) interprets it.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: UserId,
    pub email: String,
    pub display_name: String,
    #[serde(skip_serializing)]
    pub credential_hash: String,
    pub role_id: RoleId,
}

impl core::fmt::Debug for Principal {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Principal")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("display_name", &self.display_name)
            .field("credential_hash", &"<redacted>")
            .field("role_id", &self.role_id)
            .finish()
    }
}

/// A principal about to be registered. The store assigns the id.
#[derive(Clone, PartialEq, Eq)]
pub struct NewPrincipal {
    pub email: String,
    pub display_name: String,
    /// Already hashed.
    pub credential_hash: String,
    pub role_id: RoleId,
}

impl NewPrincipal {
    pub fn with_id(self, id: UserId) -> Principal {
        Principal {
            id,
            email: self.email,
            display_name: self.display_name,
            credential_hash: self.credential_hash,
            role_id: self.role_id,
        }
    }
}

impl core::fmt::Debug for NewPrincipal {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("NewPrincipal")
            .field("email", &self.email)
            .field("display_name", &self.display_name)
            .field("credential_hash", &"<redacted>")
            .field("role_id", &self.role_id)
            .finish()
    }
}

/// Partial update applied by administrators.
///
/// `None` fields are left untouched. `credential_hash` must already be hashed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrincipalUpdate {
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub credential_hash: Option<String>,
    pub role_id: Option<RoleId>,
}

impl PrincipalUpdate {
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.display_name.is_none()
            && self.credential_hash.is_none()
            && self.role_id.is_none()
    }

    /// Apply the update in place.
    pub fn apply(self, principal: &mut Principal) {
        if let Some(email) = self.email {
            principal.email = email;
        }
        if let Some(name) = self.display_name {
            principal.display_name = name;
        }
        if let Some(hash) = self.credential_hash {
            principal.credential_hash = hash;
        }
        if let Some(role_id) = self.role_id {
            principal.role_id = role_id;
        }
    }
}
