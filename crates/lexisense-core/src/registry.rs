//! Explicit owner of every live session store.
//!
//! Stores come from an injected factory and are expired by a pluggable
//! policy, so nothing here depends on process-wide state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, TimeDelta, Utc};
use tracing::info;
use uuid::Uuid;

use crate::config::{AppConfig, SessionConfig};
use crate::embedding::build_embedder;
use crate::error::{LexiError, Result};
use crate::models::SessionInfo;
use crate::store::SessionStore;

pub trait StoreFactory: Send + Sync {
    fn create_store(&self) -> SessionStore;
}

impl<F> StoreFactory for F
where
    F: Fn() -> SessionStore + Send + Sync,
{
    fn create_store(&self) -> SessionStore {
        self()
    }
}

pub trait ExpiryPolicy: Send + Sync {
    fn is_expired(&self, last_access: DateTime<Utc>, now: DateTime<Utc>) -> bool;
}

/// Expires sessions that have not been touched for longer than `idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdleTimeout {
    idle: TimeDelta,
}

impl IdleTimeout {
    #[must_use]
    pub fn minutes(minutes: u64) -> Self {
        let idle = i64::try_from(minutes)
            .ok()
            .and_then(TimeDelta::try_minutes)
            .unwrap_or(TimeDelta::MAX);
        Self { idle }
    }

    #[must_use]
    pub fn from_config(config: &SessionConfig) -> Self {
        Self::minutes(config.idle_timeout_minutes)
    }
}

impl ExpiryPolicy for IdleTimeout {
    fn is_expired(&self, last_access: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(last_access) > self.idle
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NeverExpire;

impl ExpiryPolicy for NeverExpire {
    fn is_expired(&self, _last_access: DateTime<Utc>, _now: DateTime<Utc>) -> bool {
        false
    }
}

struct SessionEntry {
    store: Arc<SessionStore>,
    created_at: DateTime<Utc>,
    last_access: DateTime<Utc>,
}

pub struct SessionRegistry {
    factory: Box<dyn StoreFactory>,
    expiry: Box<dyn ExpiryPolicy>,
    sessions: Mutex<HashMap<String, SessionEntry>>,
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sessions = self.sessions.lock().map(|sessions| sessions.len()).ok();
        f.debug_struct("SessionRegistry")
            .field("sessions", &sessions)
            .finish_non_exhaustive()
    }
}

impl SessionRegistry {
    pub fn new(factory: impl StoreFactory + 'static, expiry: impl ExpiryPolicy + 'static) -> Self {
        Self {
            factory: Box::new(factory),
            expiry: Box::new(expiry),
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// One embedding provider shared by every store, idle expiry from `config.session`.
    pub fn from_config(config: AppConfig) -> Result<Self> {
        let provider = build_embedder(&config.embedding)?;
        let expiry = IdleTimeout::from_config(&config.session);
        Ok(Self::new(
            move || SessionStore::new(Arc::clone(&provider), &config),
            expiry,
        ))
    }

    /// Registers a new empty session. Without an id a random one is assigned;
    /// an id that is already registered is a validation error.
    pub fn create(&self, session_id: Option<&str>) -> Result<(String, Arc<SessionStore>)> {
        let session_id = normalize_session_id(session_id);
        let mut sessions = self.lock_sessions()?;
        if let Some(id) = &session_id
            && sessions.contains_key(id)
        {
            return Err(LexiError::Validation(format!("session already exists: {id}")));
        }
        Ok(self.insert_new(&mut sessions, session_id, Utc::now()))
    }

    /// Returns the live store for `session_id`, refreshing its last access.
    /// Expired sessions are evicted on lookup.
    pub fn get(&self, session_id: &str) -> Result<Option<Arc<SessionStore>>> {
        let now = Utc::now();
        let mut sessions = self.lock_sessions()?;
        let Some(entry) = sessions.get_mut(session_id) else {
            return Ok(None);
        };
        if self.expiry.is_expired(entry.last_access, now) {
            let expired = sessions.remove(session_id);
            drop(sessions);
            if let Some(entry) = expired {
                release(session_id, &entry)?;
            }
            return Ok(None);
        }
        entry.last_access = now;
        Ok(Some(Arc::clone(&entry.store)))
    }

    /// The existing session when `session_id` names a live one, otherwise a
    /// fresh session under that id (or a random id).
    pub fn get_or_create(&self, session_id: Option<&str>) -> Result<(String, Arc<SessionStore>)> {
        let session_id = normalize_session_id(session_id);
        if let Some(id) = &session_id
            && let Some(store) = self.get(id)?
        {
            return Ok((id.clone(), store));
        }
        let mut sessions = self.lock_sessions()?;
        let now = Utc::now();
        if let Some(id) = &session_id
            && let Some(entry) = sessions.get_mut(id)
        {
            entry.last_access = now;
            return Ok((id.clone(), Arc::clone(&entry.store)));
        }
        Ok(self.insert_new(&mut sessions, session_id, now))
    }

    /// Removes the session and clears its store. Returns whether it existed.
    pub fn evict(&self, session_id: &str) -> Result<bool> {
        let removed = self.lock_sessions()?.remove(session_id);
        match removed {
            Some(entry) => {
                release(session_id, &entry)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn evict_expired(&self) -> Result<Vec<String>> {
        self.evict_expired_at(Utc::now())
    }

    /// Evicts every session the expiry policy rejects at `now`; returns their ids sorted.
    pub fn evict_expired_at(&self, now: DateTime<Utc>) -> Result<Vec<String>> {
        let expired = {
            let mut sessions = self.lock_sessions()?;
            let ids = sessions
                .iter()
                .filter(|(_, entry)| self.expiry.is_expired(entry.last_access, now))
                .map(|(id, _)| id.clone())
                .collect::<Vec<_>>();
            ids.into_iter()
                .filter_map(|id| sessions.remove(&id).map(|entry| (id, entry)))
                .collect::<Vec<_>>()
        };

        let mut evicted = Vec::with_capacity(expired.len());
        for (id, entry) in expired {
            release(&id, &entry)?;
            evicted.push(id);
        }
        evicted.sort();
        Ok(evicted)
    }

    pub fn session_info(&self, session_id: &str) -> Result<Option<SessionInfo>> {
        let snapshot = {
            let sessions = self.lock_sessions()?;
            sessions
                .get(session_id)
                .map(|entry| (Arc::clone(&entry.store), entry.created_at, entry.last_access))
        };
        let Some((store, created_at, last_access)) = snapshot else {
            return Ok(None);
        };
        Ok(Some(SessionInfo {
            session_id: session_id.to_string(),
            created_at,
            last_access,
            total_chunks: store.total_chunks()?,
            files: store.file_summaries()?,
        }))
    }

    pub fn len(&self) -> Result<usize> {
        Ok(self.lock_sessions()?.len())
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.lock_sessions()?.is_empty())
    }

    fn insert_new(
        &self,
        sessions: &mut HashMap<String, SessionEntry>,
        session_id: Option<String>,
        now: DateTime<Utc>,
    ) -> (String, Arc<SessionStore>) {
        let id = session_id.unwrap_or_else(|| Uuid::new_v4().to_string());
        let store = Arc::new(self.factory.create_store());
        sessions.insert(
            id.clone(),
            SessionEntry {
                store: Arc::clone(&store),
                created_at: now,
                last_access: now,
            },
        );
        info!(
            session_id = %id,
            provider = store.provider_name(),
            live_sessions = sessions.len(),
            "session created"
        );
        (id, store)
    }

    fn lock_sessions(&self) -> Result<MutexGuard<'_, HashMap<String, SessionEntry>>> {
        self.sessions
            .lock()
            .map_err(|_| LexiError::lock_poisoned("session registry"))
    }
}

fn normalize_session_id(session_id: Option<&str>) -> Option<String> {
    session_id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(ToString::to_string)
}

fn release(session_id: &str, entry: &SessionEntry) -> Result<()> {
    entry.store.clear()?;
    info!(
        session_id,
        created_at = %entry.created_at,
        last_access = %entry.last_access,
        "session evicted"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::embedding::NullEmbedder;

    fn null_factory() -> impl StoreFactory {
        || SessionStore::with_provider(Arc::new(NullEmbedder::new(4)))
    }

    #[test]
    fn create_assigns_random_ids_and_rejects_duplicates() {
        let registry = SessionRegistry::new(null_factory(), NeverExpire);
        let (first, _) = registry.create(None).expect("create");
        let (second, _) = registry.create(Some("  ")).expect("create blank id");
        assert_ne!(first, second);
        assert!(Uuid::parse_str(&first).is_ok());

        registry.create(Some("alpha")).expect("create alpha");
        let err = registry.create(Some("alpha")).expect_err("duplicate");
        assert_eq!(err.code(), "VALIDATION_FAILED");
        assert_eq!(registry.len().expect("len"), 3);
    }

    #[test]
    fn sessions_are_isolated() {
        let registry = SessionRegistry::new(null_factory(), NeverExpire);
        let (_, a) = registry.create(Some("a")).expect("a");
        let (_, b) = registry.create(Some("b")).expect("b");
        a.add_document("revenue increased", "a.txt", "txt").expect("add");
        assert_eq!(a.total_chunks().expect("a total"), 1);
        assert_eq!(b.total_chunks().expect("b total"), 0);
    }

    #[test]
    fn get_or_create_reuses_live_sessions() {
        let created = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&created);
        let registry = SessionRegistry::new(
            move || {
                counter.fetch_add(1, Ordering::SeqCst);
                SessionStore::with_provider(Arc::new(NullEmbedder::new(4)))
            },
            NeverExpire,
        );
        let (id, store) = registry.get_or_create(Some("s1")).expect("create");
        store.add_document("kept text", "k.txt", "txt").expect("add");
        let (same_id, same_store) = registry.get_or_create(Some("s1")).expect("reuse");
        assert_eq!(id, same_id);
        assert_eq!(same_store.total_chunks().expect("total"), 1);
        assert_eq!(created.load(Ordering::SeqCst), 1);

        let (fresh, _) = registry.get_or_create(None).expect("fresh");
        assert_ne!(fresh, id);
        assert_eq!(created.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn get_unknown_session_is_none() {
        let registry = SessionRegistry::new(null_factory(), NeverExpire);
        assert!(registry.get("missing").expect("get").is_none());
        assert!(registry.session_info("missing").expect("info").is_none());
    }

    #[test]
    fn evict_clears_and_removes() {
        let registry = SessionRegistry::new(null_factory(), NeverExpire);
        let (id, store) = registry.create(None).expect("create");
        store.add_document("some text", "t.txt", "txt").expect("add");
        assert!(registry.evict(&id).expect("evict"));
        assert!(!registry.evict(&id).expect("evict twice"));
        assert_eq!(store.total_chunks().expect("total"), 0);
        assert!(registry.is_empty().expect("empty"));
    }

    #[test]
    fn idle_sessions_expire() {
        let registry = SessionRegistry::new(null_factory(), IdleTimeout::minutes(30));
        let (old, _) = registry.create(Some("old")).expect("create");
        let later = Utc::now() + TimeDelta::minutes(31);
        assert_eq!(registry.evict_expired_at(later).expect("evict"), vec![old]);
        assert!(registry.is_empty().expect("empty"));

        registry.create(Some("fresh")).expect("create");
        assert!(registry.evict_expired().expect("evict").is_empty());
        assert_eq!(registry.len().expect("len"), 1);
    }

    #[test]
    fn never_expire_keeps_everything() {
        let registry = SessionRegistry::new(null_factory(), NeverExpire);
        registry.create(Some("a")).expect("create");
        let far = Utc::now() + TimeDelta::days(365);
        assert!(registry.evict_expired_at(far).expect("evict").is_empty());
    }

    #[test]
    fn idle_timeout_compares_elapsed_time() {
        let policy = IdleTimeout::minutes(60);
        let start = Utc::now();
        assert!(!policy.is_expired(start, start + TimeDelta::minutes(60)));
        assert!(policy.is_expired(start, start + TimeDelta::minutes(61)));
        assert!(!IdleTimeout::minutes(u64::MAX).is_expired(start, start + TimeDelta::days(3650)));
    }

    #[test]
    fn session_info_reports_store_contents() {
        let registry = SessionRegistry::new(null_factory(), NeverExpire);
        let (id, store) = registry.create(Some("info")).expect("create");
        store.add_document("alpha beta", "a.md", "md").expect("add");
        let info = registry.session_info(&id).expect("info").expect("present");
        assert_eq!(info.session_id, "info");
        assert_eq!(info.total_chunks, 1);
        assert_eq!(info.files.len(), 1);
        assert_eq!(info.files[0].filename, "a.md");
        assert!(info.last_access >= info.created_at);
    }

    #[test]
    fn registry_from_config_builds_null_provider_stores() {
        let registry = SessionRegistry::from_config(AppConfig::default()).expect("registry");
        let (_, store) = registry.create(None).expect("create");
        assert_eq!(store.provider_name(), "none");
    }
}
