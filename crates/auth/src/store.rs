//! Principal store contracts.

use async_trait::async_trait;
use thiserror::Error;

use gotham_core::{RoleId, UserId};

use crate::{NewPrincipal, Principal, PrincipalUpdate, Role};

/// I/O failure of a principal store. "Not found" is `Ok(None)`, never an error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("principal store backend error: {0}")]
    Backend(String),

    #[error("principal store rejected the write: {0}")]
    Conflict(String),
}

/// Read side consulted on every login and every protected request.
#[async_trait]
pub trait PrincipalStore: Send + Sync {
    async fn find_role_by_id(&self, id: RoleId) -> Result<Option<Role>, StoreError>;

    async fn find_principal_by_email(&self, email: &str) -> Result<Option<Principal>, StoreError>;
}

/// One page of principals, ordered by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrincipalPage {
    pub principals: Vec<Principal>,
    /// Number of principals in the whole store.
    pub total: u64,
}

/// Registration, listing and administrative writes on principals.
#[async_trait]
pub trait PrincipalDirectory: Send + Sync {
    /// Store a new principal under a fresh id. A taken email or an unknown
    /// role is a `Conflict`.
    async fn create_principal(&self, new: NewPrincipal) -> Result<Principal, StoreError>;

    async fn find_principal_by_id(&self, id: UserId) -> Result<Option<Principal>, StoreError>;

    /// Up to `limit` principals ordered by id, skipping the first `offset`.
    async fn list_principals(&self, offset: u64, limit: u64) -> Result<PrincipalPage, StoreError>;

    /// Returns the updated principal, or `None` if `id` is unknown.
    async fn update_principal(
        &self,
        id: UserId,
        update: PrincipalUpdate,
    ) -> Result<Option<Principal>, StoreError>;

    /// Returns whether a principal was removed.
    async fn remove_principal(&self, id: UserId) -> Result<bool, StoreError>;
}
