use std::collections::HashMap;
use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use gotham_auth::{CacheError, SessionCache};

/// How often a write also sweeps expired entries.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

#[derive(Debug)]
struct State {
    entries: HashMap<String, Entry>,
    next_sweep: Instant,
}

impl State {
    fn purge(&mut self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, e| e.expires_at > now);
        before - self.entries.len()
    }
}

/// In-process session cache.
///
/// Intended for tests/dev and single-node deployments. Expired entries are
/// treated as absent on read and dropped lazily. Writes also sweep every
/// expired entry once per sweep interval, so abandoned sessions do not
/// accumulate; [`purge_expired`] sweeps on demand.
///
/// [`purge_expired`]: InMemorySessionCache::purge_expired
#[derive(Debug)]
pub struct InMemorySessionCache {
    state: RwLock<State>,
    sweep_interval: Duration,
}

impl InMemorySessionCache {
    pub fn new() -> Self {
        Self::with_sweep_interval(DEFAULT_SWEEP_INTERVAL)
    }

    pub fn with_sweep_interval(sweep_interval: Duration) -> Self {
        Self {
            state: RwLock::new(State {
                entries: HashMap::new(),
                next_sweep: Instant::now() + sweep_interval,
            }),
            sweep_interval,
        }
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> Result<usize, CacheError> {
        let now = Instant::now();
        let mut state = self.state.write().map_err(|_| poisoned())?;
        state.next_sweep = now + self.sweep_interval;
        Ok(state.purge(now))
    }

    pub fn len(&self) -> usize {
        self.state.read().map(|s| s.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for InMemorySessionCache {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> CacheError {
    CacheError::Backend("session cache lock poisoned".to_string())
}

#[async_trait]
impl SessionCache for InMemorySessionCache {
    async fn set(&self, key: &str, value: &str, ttl: Duration) -> Result<(), CacheError> {
        let now = Instant::now();
        let entry = Entry {
            value: value.to_string(),
            expires_at: now + ttl,
        };

        let mut state = self.state.write().map_err(|_| poisoned())?;
        if now >= state.next_sweep {
            state.purge(now);
            state.next_sweep = now + self.sweep_interval;
        }
        state.entries.insert(key.to_string(), entry);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        let now = Instant::now();
        {
            let state = self.state.read().map_err(|_| poisoned())?;
            match state.entries.get(key) {
                None => return Ok(None),
                Some(e) if e.expires_at > now => return Ok(Some(e.value.clone())),
                Some(_) => {}
            }
        }

        // Expired: remove unless a concurrent `set` refreshed it.
        let mut state = self.state.write().map_err(|_| poisoned())?;
        if state.entries.get(key).is_some_and(|e| e.expires_at <= now) {
            state.entries.remove(key);
        }
        Ok(None)
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        self.state.write().map_err(|_| poisoned())?.entries.remove(key);
        Ok(())
    }
}
