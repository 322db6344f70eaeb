//! Test doubles for the external interfaces.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};

use crate::capability::{READ_USER, VIEW_TASKS, WILDCARD};
use crate::{
    CacheError, CredentialVerifier, Permission, Principal, PrincipalStore, Role, RoleId,
    SessionCache, SessionConfig, SessionManager, SigningSecret, StoreError, TokenCodec, UserId,
};

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 4, 10, 0, 0).unwrap()
}

pub fn admin_role() -> Role {
    Role::new(RoleId::new(1), "admin")
        .with_permissions([Permission::new("view_tasks"), Permission::new("delete_tasks")])
        .with_capabilities([WILDCARD])
}

pub fn agent_role() -> Role {
    Role::new(RoleId::new(2), "agent")
        .with_permissions([Permission::new("view_tasks")])
        .with_capabilities([READ_USER, VIEW_TASKS])
}

pub fn user_role() -> Role {
    Role::new(RoleId::new(3), "user").with_capabilities([VIEW_TASKS])
}

pub fn principal(id: u64, email: &str, password: &str, role: RoleId) -> Principal {
    Principal {
        id: UserId::new(id),
        email: email.to_string(),
        display_name: email.to_string(),
        credential_hash: format!("plain:{password}"),
        role_id: role,
    }
}

/// Principal store backed by maps; can be switched into a failing mode.
#[derive(Default)]
pub struct MemoryStore {
    roles: RwLock<HashMap<RoleId, Role>>,
    principals: RwLock<HashMap<String, Principal>>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn seeded() -> Self {
        let store = Self::default();
        store.put_role(admin_role());
        store.put_role(agent_role());
        store.put_role(user_role());
        store.put_principal(principal(1, "admin@example.com", "admin123", RoleId::new(1)));
        store.put_principal(principal(2, "agent@example.com", "agent123", RoleId::new(2)));
        store.put_principal(principal(3, "user@example.com", "user123", RoleId::new(3)));
        store
    }

    pub fn put_role(&self, role: Role) {
        self.roles.write().unwrap().insert(role.id, role);
    }

    pub fn remove_role(&self, id: RoleId) {
        self.roles.write().unwrap().remove(&id);
    }

    pub fn put_principal(&self, principal: Principal) {
        self.principals
            .write()
            .unwrap()
            .insert(principal.email.clone(), principal);
    }

    pub fn remove_principal(&self, email: &str) {
        self.principals.write().unwrap().remove(email);
    }

    pub fn principal(&self, email: &str) -> Principal {
        self.principals.read().unwrap()[email].clone()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(StoreError::Backend("database is down".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PrincipalStore for MemoryStore {
    async fn find_role_by_id(&self, id: RoleId) -> Result<Option<Role>, StoreError> {
        self.check()?;
        Ok(self.roles.read().unwrap().get(&id).cloned())
    }

    async fn find_principal_by_email(&self, email: &str) -> Result<Option<Principal>, StoreError> {
        self.check()?;
        Ok(self.principals.read().unwrap().get(email).cloned())
    }
}

/// Session cache that counts reads and can fail on demand. TTLs are ignored.
#[derive(Default)]
pub struct CountingCache {
    entries: Mutex<HashMap<String, String>>,
    gets: AtomicUsize,
    fail_writes: AtomicBool,
    fail_reads: AtomicBool,
}

impl CountingCache {
    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn insert_raw(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl SessionCache for CountingCache {
    async fn set(&self, key: &str, value: &str, _ttl: Duration) -> Result<(), CacheError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(CacheError::Backend("write refused".to_string()));
        }
        self.insert_raw(key, value);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(CacheError::Backend("read refused".to_string()));
        }
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }
}

/// Accepts `plain:<password>` hashes and counts every check, decoys included.
#[derive(Default)]
pub struct PlainVerifier {
    checks: AtomicUsize,
    decoys: AtomicUsize,
}

impl PlainVerifier {
    pub fn checks(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }

    pub fn decoys(&self) -> usize {
        self.decoys.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialVerifier for PlainVerifier {
    async fn verify(&self, plaintext: &str, stored_hash: &str) -> bool {
        self.checks.fetch_add(1, Ordering::SeqCst);
        stored_hash.strip_prefix("plain:") == Some(plaintext)
    }

    async fn verify_decoy(&self, _plaintext: &str) {
        self.decoys.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub cache: Arc<CountingCache>,
    pub verifier: Arc<PlainVerifier>,
    pub sessions: Arc<SessionManager>,
}

pub fn harness(config: SessionConfig) -> Harness {
    let store = Arc::new(MemoryStore::seeded());
    let cache = Arc::new(CountingCache::default());
    let verifier = Arc::new(PlainVerifier::default());
    let codec = TokenCodec::new(&SigningSecret::new("test-signing-secret").unwrap());
    let sessions = Arc::new(SessionManager::new(
        codec,
        cache.clone(),
        store.clone(),
        verifier.clone(),
        config,
    ));
    Harness {
        store,
        cache,
        verifier,
        sessions,
    }
}
