use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SecurityError;
use crate::BoxFuture;

/// Identifier of an HTTP session, carried in the session cookie.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(String);

impl SessionId {
    const MAX_LEN: usize = 128;

    /// Allocate a fresh, unpredictable session id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    /// Accept a client-supplied id. Rejects empty, oversized, or
    /// non-`[A-Za-z0-9_-]` values.
    pub fn parse(raw: &str) -> Option<Self> {
        let valid = !raw.is_empty()
            && raw.len() <= Self::MAX_LEN
            && raw
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        valid.then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Pluggable session attribute storage.
///
/// A session springs into existence the first time an attribute is written
/// and disappears when invalidated or when it expires. Reads and removals
/// never create a session.
pub trait SessionStore: Send + Sync + 'static {
    fn get_attribute<'a>(
        &'a self,
        id: &'a SessionId,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Option<Value>, SecurityError>>;

    fn set_attribute<'a>(
        &'a self,
        id: &'a SessionId,
        name: &'a str,
        value: Value,
    ) -> BoxFuture<'a, Result<(), SecurityError>>;

    fn remove_attribute<'a>(
        &'a self,
        id: &'a SessionId,
        name: &'a str,
    ) -> BoxFuture<'a, Result<(), SecurityError>>;

    /// Whether `id` names a live session. Only ids the store has issued
    /// attributes for, and that have not expired or been invalidated, exist.
    fn exists<'a>(&'a self, id: &'a SessionId) -> BoxFuture<'a, Result<bool, SecurityError>>;

    fn invalidate<'a>(&'a self, id: &'a SessionId) -> BoxFuture<'a, Result<(), SecurityError>>;
}

struct SessionEntry {
    attributes: HashMap<String, Value>,
    last_accessed: Instant,
}

/// Default in-memory session store backed by `DashMap`.
///
/// Sessions expire after `idle_timeout` without access. Expired entries are
/// evicted when touched, and swept from the whole map on writes at most once
/// per `idle_timeout`. [`InMemorySessionStore::evict_expired`] sweeps on demand.
#[derive(Clone)]
pub struct InMemorySessionStore {
    inner: Arc<DashMap<SessionId, SessionEntry>>,
    idle_timeout: Duration,
    last_sweep: Arc<Mutex<Instant>>,
}

impl InMemorySessionStore {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            inner: Arc::new(DashMap::new()),
            idle_timeout,
            last_sweep: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    /// Number of live (possibly expired but not yet evicted) sessions.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.inner
            .get(id)
            .map(|entry| entry.last_accessed.elapsed() < self.idle_timeout)
            .unwrap_or(false)
    }

    /// Remove all expired sessions.
    pub fn evict_expired(&self) {
        let timeout = self.idle_timeout;
        let before = self.inner.len();
        self.inner
            .retain(|_, entry| entry.last_accessed.elapsed() < timeout);
        let evicted = before.saturating_sub(self.inner.len());
        if evicted > 0 {
            tracing::debug!(evicted, "Expired sessions evicted");
        }
    }

    /// Sweep expired sessions if a full idle period has passed since the last sweep.
    /// Must not be called while holding a map guard.
    fn sweep_if_due(&self) {
        let Ok(mut last) = self.last_sweep.try_lock() else {
            return;
        };
        if last.elapsed() < self.idle_timeout {
            return;
        }
        *last = Instant::now();
        drop(last);
        self.evict_expired();
    }

    fn get_sync(&self, id: &SessionId, name: &str) -> Option<Value> {
        let timeout = self.idle_timeout;
        let mut entry = self.inner.get_mut(id)?;
        if entry.last_accessed.elapsed() >= timeout {
            // Drop the write guard before removing; a concurrent refresh keeps the entry
            drop(entry);
            if self
                .inner
                .remove_if(id, |_, entry| entry.last_accessed.elapsed() >= timeout)
                .is_some()
            {
                tracing::debug!(session = %id, "Session expired");
            }
            return None;
        }
        entry.last_accessed = Instant::now();
        entry.attributes.get(name).cloned()
    }

    fn set_sync(&self, id: &SessionId, name: &str, value: Value) {
        self.sweep_if_due();
        let timeout = self.idle_timeout;
        let mut entry = self.inner.entry(id.clone()).or_insert_with(|| SessionEntry {
            attributes: HashMap::new(),
            last_accessed: Instant::now(),
        });
        if entry.last_accessed.elapsed() >= timeout {
            entry.attributes.clear();
        }
        entry.last_accessed = Instant::now();
        entry.attributes.insert(name.to_string(), value);
    }
}

impl SessionStore for InMemorySessionStore {
    fn get_attribute<'a>(
        &'a self,
        id: &'a SessionId,
        name: &'a str,
    ) -> BoxFuture<'a, Result<Option<Value>, SecurityError>> {
        Box::pin(async move { Ok(self.get_sync(id, name)) })
    }

    fn set_attribute<'a>(
        &'a self,
        id: &'a SessionId,
        name: &'a str,
        value: Value,
    ) -> BoxFuture<'a, Result<(), SecurityError>> {
        Box::pin(async move {
            self.set_sync(id, name, value);
            Ok(())
        })
    }

    fn remove_attribute<'a>(
        &'a self,
        id: &'a SessionId,
        name: &'a str,
    ) -> BoxFuture<'a, Result<(), SecurityError>> {
        Box::pin(async move {
            if let Some(mut entry) = self.inner.get_mut(id) {
                entry.attributes.remove(name);
            }
            Ok(())
        })
    }

    fn exists<'a>(&'a self, id: &'a SessionId) -> BoxFuture<'a, Result<bool, SecurityError>> {
        Box::pin(async move { Ok(self.contains(id)) })
    }

    fn invalidate<'a>(&'a self, id: &'a SessionId) -> BoxFuture<'a, Result<(), SecurityError>> {
        Box::pin(async move {
            if self.inner.remove(id).is_some() {
                tracing::debug!(session = %id, "Session invalidated");
            }
            Ok(())
        })
    }
}
