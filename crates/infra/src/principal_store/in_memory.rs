use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;

use gotham_auth::{
    NewPrincipal, Principal, PrincipalDirectory, PrincipalPage, PrincipalStore, PrincipalUpdate,
    Role, RoleId, StoreError, UserId,
};

#[derive(Debug, Default)]
struct Inner {
    roles: HashMap<RoleId, Role>,
    principals: BTreeMap<UserId, Principal>,
    /// Ids are never reused, even after removal.
    next_id: u64,
}

impl Inner {
    fn check_insert(&self, email: &str, id: UserId, role_id: RoleId) -> Result<(), StoreError> {
        if self.email_taken_by_other(email, id) {
            return Err(StoreError::Conflict(format!("email already in use: {email}")));
        }
        if !self.roles.contains_key(&role_id) {
            return Err(StoreError::Conflict(format!("unknown role: {role_id}")));
        }
        Ok(())
    }

    fn insert(&mut self, principal: Principal) {
        self.next_id = self.next_id.max(principal.id.get().saturating_add(1));
        self.principals.insert(principal.id, principal);
    }

    fn email_taken_by_other(&self, email: &str, id: UserId) -> bool {
        self.principals
            .values()
            .any(|p| p.email == email && p.id != id)
    }
}

/// In-memory principal store.
///
/// Intended for tests/dev. Emails are unique and matched exactly.
#[derive(Debug, Default)]
pub struct InMemoryPrincipalStore {
    inner: RwLock<Inner>,
}

fn poisoned() -> StoreError {
    StoreError::Backend("principal store lock poisoned".to_string())
}

impl InMemoryPrincipalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a role.
    pub fn upsert_role(&self, role: Role) -> Result<(), StoreError> {
        self.inner
            .write()
            .map_err(|_| poisoned())?
            .roles
            .insert(role.id, role);
        Ok(())
    }

    /// Insert or replace a principal by id.
    ///
    /// Fails if the email belongs to another principal or the role is unknown.
    pub fn upsert_principal(&self, principal: Principal) -> Result<(), StoreError> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        inner.check_insert(&principal.email, principal.id, principal.role_id)?;
        inner.insert(principal);
        Ok(())
    }

    pub fn principal_by_id(&self, id: UserId) -> Result<Option<Principal>, StoreError> {
        Ok(self
            .inner
            .read()
            .map_err(|_| poisoned())?
            .principals
            .get(&id)
            .cloned())
    }

    pub fn role_count(&self) -> usize {
        self.inner.read().map(|i| i.roles.len()).unwrap_or(0)
    }

    pub fn principal_count(&self) -> usize {
        self.inner.read().map(|i| i.principals.len()).unwrap_or(0)
    }
}

#[async_trait]
impl PrincipalStore for InMemoryPrincipalStore {
    async fn find_role_by_id(&self, id: RoleId) -> Result<Option<Role>, StoreError> {
        Ok(self
            .inner
            .read()
            .map_err(|_| poisoned())?
            .roles
            .get(&id)
            .cloned())
    }

    async fn find_principal_by_email(&self, email: &str) -> Result<Option<Principal>, StoreError> {
        Ok(self
            .inner
            .read()
            .map_err(|_| poisoned())?
            .principals
            .values()
            .find(|p| p.email == email)
            .cloned())
    }
}

#[async_trait]
impl PrincipalDirectory for InMemoryPrincipalStore {
    async fn create_principal(&self, new: NewPrincipal) -> Result<Principal, StoreError> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        let id = UserId::new(inner.next_id.max(1));
        inner.check_insert(&new.email, id, new.role_id)?;

        let principal = new.with_id(id);
        inner.insert(principal.clone());
        Ok(principal)
    }

    async fn find_principal_by_id(&self, id: UserId) -> Result<Option<Principal>, StoreError> {
        self.principal_by_id(id)
    }

    async fn list_principals(&self, offset: u64, limit: u64) -> Result<PrincipalPage, StoreError> {
        let inner = self.inner.read().map_err(|_| poisoned())?;
        let skip = usize::try_from(offset).unwrap_or(usize::MAX);
        let take = usize::try_from(limit).unwrap_or(usize::MAX);

        Ok(PrincipalPage {
            principals: inner.principals.values().skip(skip).take(take).cloned().collect(),
            total: inner.principals.len() as u64,
        })
    }

    async fn update_principal(
        &self,
        id: UserId,
        update: PrincipalUpdate,
    ) -> Result<Option<Principal>, StoreError> {
        let mut inner = self.inner.write().map_err(|_| poisoned())?;
        if !inner.principals.contains_key(&id) {
            return Ok(None);
        }

        if let Some(email) = update.email.as_deref() {
            if inner.email_taken_by_other(email, id) {
                return Err(StoreError::Conflict(format!("email already in use: {email}")));
            }
        }
        if let Some(role_id) = update.role_id {
            if !inner.roles.contains_key(&role_id) {
                return Err(StoreError::Conflict(format!("unknown role: {role_id}")));
            }
        }

        let Some(principal) = inner.principals.get_mut(&id) else {
            return Ok(None);
        };
        update.apply(principal);
        Ok(Some(principal.clone()))
    }

    async fn remove_principal(&self, id: UserId) -> Result<bool, StoreError> {
        Ok(self
            .inner
            .write()
            .map_err(|_| poisoned())?
            .principals
            .remove(&id)
            .is_some())
    }
}
