//! LocalStore: the embedded fallback store.
//!
//! The whole live state lives in memory behind one coarse mutex. Every
//! mutation stages its change on a clone, writes the clone through the
//! backend, and only then swaps it in, all while holding the lock. Readers
//! therefore never see a torn state, and a failed write changes nothing.

use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;
use tokio::sync::broadcast;

use vestry_core::{
    generate_id, human_size, BackupEntry, Clock, Collection, CollectionName, HealthSnapshot,
    HealthStatus, LogEntry, Record, StorePhase, StoreState, SystemClock, ID_FIELD, SECRET_FIELD,
};

use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::traits::{KeyValueBackend, BACKUPS_KEY, LIVE_KEY};

/// Capacity of the change-notification channel.
const EVENT_CAPACITY: usize = 16;

/// Whole-state changes that cached views must reload after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    /// Live state was replaced from a backup.
    Restored { backup_id: String },
    /// Live state was replaced with the seed dataset.
    Reset,
}

/// State guarded by the store lock.
pub(crate) struct Inner {
    pub(crate) live: StoreState,
    /// Newest first.
    pub(crate) backups: Vec<BackupEntry>,
    pub(crate) phase: StorePhase,
}

/// The local store.
///
/// Construct one per process and share it by reference (typically in an
/// `Arc`). All operations are synchronous and fully applied, including the
/// durable write, before they return.
pub struct LocalStore<B: KeyValueBackend> {
    backend: B,
    config: StoreConfig,
    clock: Arc<dyn Clock>,
    seed: StoreState,
    inner: Mutex<Inner>,
    events: broadcast::Sender<StoreEvent>,
}

/// Builder for [`LocalStore`].
pub struct StoreBuilder<B: KeyValueBackend> {
    backend: B,
    config: StoreConfig,
    clock: Arc<dyn Clock>,
    seed: StoreState,
}

impl<B: KeyValueBackend> StoreBuilder<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            config: StoreConfig::default(),
            clock: Arc::new(SystemClock),
            seed: vestry_core::seed_dataset(),
        }
    }

    pub fn config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replace the seed dataset used for a fresh store and for `reset`.
    pub fn seed(mut self, seed: StoreState) -> Self {
        self.seed = seed;
        self
    }

    /// Load persisted state, or seed and persist it if there is none.
    pub fn open(self) -> Result<LocalStore<B>> {
        let Self {
            backend,
            config,
            clock,
            seed,
        } = self;

        let (live, phase) = match backend.get(LIVE_KEY)? {
            Some(raw) => {
                let mut state = StoreState::from_json(&raw)?;
                state.fill_missing_from(&seed);
                tracing::debug!("loaded persisted live state");
                (state, StorePhase::Active)
            }
            None => {
                let state = seed.clone();
                backend.set(LIVE_KEY, &state.to_json()?)?;
                tracing::info!("no persisted state, seeded initial dataset");
                (state, StorePhase::Seeded)
            }
        };

        let backups: Vec<BackupEntry> = match backend.get(BACKUPS_KEY)? {
            Some(raw) => serde_json::from_str(&raw)?,
            None => Vec::new(),
        };

        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(LocalStore {
            backend,
            config,
            clock,
            seed,
            inner: Mutex::new(Inner {
                live,
                backups,
                phase,
            }),
            events,
        })
    }
}

impl<B: KeyValueBackend> LocalStore<B> {
    /// Open with the system clock and the default seed dataset.
    pub fn open(backend: B, config: StoreConfig) -> Result<Self> {
        StoreBuilder::new(backend).config(config).open()
    }

    pub fn builder(backend: B) -> StoreBuilder<B> {
        StoreBuilder::new(backend)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Subscribe to whole-state replacement events.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.events.subscribe()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────────

    /// Snapshot of a keyed collection, most recent first.
    pub fn collection(&self, name: CollectionName) -> Result<Vec<Record>> {
        ensure_keyed(name, "list")?;
        let inner = self.lock()?;
        Ok(inner
            .live
            .collection(name)
            .map(Collection::to_vec)
            .unwrap_or_default())
    }

    /// A single record by id.
    pub fn get(&self, name: CollectionName, id: &str) -> Result<Option<Record>> {
        ensure_keyed(name, "get by id from")?;
        let inner = self.lock()?;
        Ok(inner
            .live
            .collection(name)
            .and_then(|c| c.get(id))
            .cloned())
    }

    /// Copy of a singleton document.
    pub fn singleton(&self, name: CollectionName) -> Result<Record> {
        ensure_singleton(name)?;
        let inner = self.lock()?;
        Ok(inner.live.singleton(name).cloned().unwrap_or_default())
    }

    /// Activity log, newest first.
    pub fn logs(&self) -> Result<Vec<LogEntry>> {
        Ok(self.lock()?.live.logs.clone())
    }

    /// Deep copy of the entire live state.
    pub fn snapshot(&self) -> Result<StoreState> {
        Ok(self.lock()?.live.clone())
    }

    pub fn phase(&self) -> Result<StorePhase> {
        Ok(self.lock()?.phase)
    }

    /// Check a member's email (case-insensitive) and secret (exact).
    ///
    /// The returned record never carries the secret field.
    pub fn verify_credential(&self, email: &str, secret: &str) -> Result<Option<Record>> {
        let inner = self.lock()?;
        let found = inner
            .live
            .collection(CollectionName::Members)
            .and_then(|members| {
                members
                    .iter()
                    .find(|r| r.email_matches(email) && r.get_str(SECRET_FIELD) == Some(secret))
            })
            .map(|r| r.without(SECRET_FIELD));

        tracing::debug!(matched = found.is_some(), "credential check");
        Ok(found)
    }

    /// Status, size and per-collection counts.
    pub fn health(&self) -> Result<HealthSnapshot> {
        let now = self.now();
        let inner = self.lock()?;
        let size_bytes = inner.live.encoded_len()?;

        let status = match self.backend.get(LIVE_KEY) {
            Ok(Some(_)) => HealthStatus::Healthy,
            Ok(None) => HealthStatus::Degraded,
            Err(e) => {
                tracing::warn!(error = %e, "backend unreadable during health check");
                HealthStatus::Degraded
            }
        };

        Ok(HealthSnapshot {
            status,
            phase: inner.phase,
            size_bytes,
            size: human_size(size_bytes),
            counts: inner.live.counts(),
            backups: inner.backups.len(),
            log_entries: inner.live.logs.len(),
            pending_otps: inner.live.otps.iter().filter(|o| o.is_live(now)).count(),
            timestamp: now,
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Prepend a record to a keyed collection.
    ///
    /// A missing id is generated; a string or numeric id is kept (as a
    /// string). An id already present is rejected.
    pub fn insert(&self, name: CollectionName, record: Record) -> Result<Record> {
        ensure_keyed(name, "insert into")?;
        let mut inner = self.lock()?;

        let inserted = self.stage(&mut inner, |state| {
            let mut record = record;
            let id = record_id(&record).unwrap_or_else(|| generate_id(name.id_prefix()));
            let collection = state.collection_mut(name);
            if collection.contains(&id) {
                return Err(StoreError::DuplicateId {
                    collection: name,
                    id,
                });
            }
            record.set_id(id);
            collection.prepend(record.clone());
            state.push_log(
                self.log_entry(format!("Inserted into {}", name)),
                self.config.max_log_entries,
            );
            Ok(record)
        })?;

        tracing::debug!(collection = %name, id = inserted.id().unwrap_or_default(), "inserted");
        Ok(inserted)
    }

    /// Shallow-merge `patch` into the record with this id.
    ///
    /// For a singleton name the id is ignored and the patch merges into the
    /// document. The patch's own `id` field is never applied.
    pub fn update_by_id(&self, name: CollectionName, id: &str, patch: Record) -> Result<Record> {
        if name.is_singleton() {
            tracing::debug!(collection = %name, id, "id ignored for singleton update");
            return self.update_singleton(name, patch);
        }

        let patch = patch.without(ID_FIELD);
        let mut inner = self.lock()?;
        let updated = self.stage(&mut inner, |state| {
            let record = state
                .collection_mut(name)
                .get_mut(id)
                .ok_or_else(|| StoreError::NotFound {
                    collection: name,
                    key: id.to_string(),
                })?;
            record.merge(&patch);
            let updated = record.clone();
            state.push_log(
                self.log_entry(format!("Updated {} ID {}", name, id)),
                self.config.max_log_entries,
            );
            Ok(updated)
        })?;

        tracing::debug!(collection = %name, id, "updated");
        Ok(updated)
    }

    /// Shallow-merge `patch` into the first record whose `email` matches,
    /// ignoring case. Used by the password-reset flow.
    pub fn update_by_email(
        &self,
        name: CollectionName,
        email: &str,
        patch: Record,
    ) -> Result<Record> {
        ensure_keyed(name, "update by email in")?;

        let patch = patch.without(ID_FIELD);
        let mut inner = self.lock()?;
        let updated = self.stage(&mut inner, |state| {
            let record = state
                .collection_mut(name)
                .find_by_email_mut(email)
                .ok_or_else(|| StoreError::NotFound {
                    collection: name,
                    key: email.to_string(),
                })?;
            record.merge(&patch);
            let updated = record.clone();
            let label = updated.id().unwrap_or(email).to_string();
            state.push_log(
                self.log_entry(format!("Updated {} ID {}", name, label)),
                self.config.max_log_entries,
            );
            Ok(updated)
        })?;

        tracing::debug!(collection = %name, "updated by email");
        Ok(updated)
    }

    /// Shallow-merge `patch` into a singleton document.
    pub fn update_singleton(&self, name: CollectionName, patch: Record) -> Result<Record> {
        ensure_singleton(name)?;
        let mut inner = self.lock()?;
        let updated = self.stage(&mut inner, |state| {
            let doc = state.singleton_mut(name);
            doc.merge(&patch);
            let updated = doc.clone();
            state.push_log(
                self.log_entry(format!("Updated {} configuration", name)),
                self.config.max_log_entries,
            );
            Ok(updated)
        })?;

        tracing::debug!(collection = %name, "singleton updated");
        Ok(updated)
    }

    /// Delete a record by id.
    ///
    /// Always takes a backup first, even if the id turns out to be absent.
    /// Returns `false` when nothing matched; no second backup is taken.
    pub fn delete(&self, name: CollectionName, id: &str) -> Result<bool> {
        ensure_keyed(name, "delete from")?;
        let mut inner = self.lock()?;

        self.backup_locked(
            &mut inner,
            format!("Auto-backup before deletion in {}", name),
        )?;

        if !inner.live.collection(name).is_some_and(|c| c.contains(id)) {
            tracing::debug!(collection = %name, id, "delete matched nothing");
            return Ok(false);
        }

        self.stage(&mut inner, |state| {
            state.collection_mut(name).remove(id);
            state.push_log(
                self.log_entry(format!("Deleted from {} ID {}", name, id)),
                self.config.max_log_entries,
            );
            Ok(())
        })?;

        tracing::debug!(collection = %name, id, "deleted");
        Ok(true)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internals shared with the otp and backup modules
    // ─────────────────────────────────────────────────────────────────────────

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|e| StoreError::Poisoned(format!("store state: {}", e)))
    }

    pub(crate) fn now(&self) -> i64 {
        self.clock.now_millis()
    }

    pub(crate) fn seed(&self) -> &StoreState {
        &self.seed
    }

    /// Apply `f` to a clone of the live state, persist it, then swap it in.
    pub(crate) fn stage<T>(
        &self,
        inner: &mut Inner,
        f: impl FnOnce(&mut StoreState) -> Result<T>,
    ) -> Result<T> {
        let mut staged = inner.live.clone();
        let out = f(&mut staged)?;
        self.commit(inner, staged)?;
        Ok(out)
    }

    /// Persist `state` and make it the live state.
    pub(crate) fn commit(&self, inner: &mut Inner, state: StoreState) -> Result<()> {
        if let Err(e) = self.backend.set(LIVE_KEY, &state.to_json()?) {
            tracing::warn!(error = %e, "failed to persist live state, change discarded");
            return Err(e);
        }
        inner.live = state;
        inner.phase = StorePhase::Active;
        Ok(())
    }

    pub(crate) fn persist_backups(&self, backups: &[BackupEntry]) -> Result<()> {
        let raw = serde_json::to_string(backups)?;
        self.backend.set(BACKUPS_KEY, &raw)
    }

    pub(crate) fn log_entry(&self, action: String) -> LogEntry {
        LogEntry {
            id: generate_id("log"),
            action,
            timestamp: self.now(),
        }
    }

    pub(crate) fn emit(&self, event: StoreEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

fn ensure_keyed(name: CollectionName, op: &str) -> Result<()> {
    if name.is_singleton() {
        return Err(StoreError::InvalidOperation(format!(
            "cannot {} singleton {}",
            op, name
        )));
    }
    Ok(())
}

fn ensure_singleton(name: CollectionName) -> Result<()> {
    if !name.is_singleton() {
        return Err(StoreError::InvalidOperation(format!(
            "{} is a keyed collection, not a singleton",
            name
        )));
    }
    Ok(())
}

/// A record's id as a string, accepting numeric ids.
fn record_id(record: &Record) -> Option<String> {
    match record.get(ID_FIELD)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBackend;
    use serde_json::json;

    fn rec(value: Value) -> Record {
        Record::from_value(value).unwrap()
    }

    fn store() -> LocalStore<MemoryBackend> {
        LocalStore::open(MemoryBackend::new(), StoreConfig::default()).unwrap()
    }

    fn ids(records: &[Record]) -> Vec<String> {
        records
            .iter()
            .filter_map(|r| r.id().map(String::from))
            .collect()
    }

    #[test]
    fn test_open_seeds_and_persists() {
        let store = store();
        assert_eq!(store.phase().unwrap(), StorePhase::Seeded);
        assert!(store.backend().raw(LIVE_KEY).is_some());
        assert_eq!(store.snapshot().unwrap(), vestry_core::seed_dataset());
    }

    #[test]
    fn test_insert_prepends() {
        let store = store();
        store
            .insert(CollectionName::Contacts, rec(json!({"id": "a"})))
            .unwrap();
        store
            .insert(CollectionName::Contacts, rec(json!({"id": "b"})))
            .unwrap();

        let contacts = store.collection(CollectionName::Contacts).unwrap();
        assert_eq!(ids(&contacts), vec!["b", "a"]);
        assert_eq!(store.phase().unwrap(), StorePhase::Active);
        assert_eq!(store.logs().unwrap()[0].action, "Inserted into contacts");
    }

    #[test]
    fn test_insert_generates_and_normalizes_ids() {
        let store = store();
        let generated = store
            .insert(CollectionName::News, rec(json!({"title": "t"})))
            .unwrap();
        assert!(generated.id().unwrap().starts_with("news-"));

        let numeric = store
            .insert(CollectionName::News, rec(json!({"id": 42, "title": "n"})))
            .unwrap();
        assert_eq!(numeric.id(), Some("42"));
        assert!(store.get(CollectionName::News, "42").unwrap().is_some());
    }

    #[test]
    fn test_insert_duplicate_id_rejected() {
        let store = store();
        let before = store.snapshot().unwrap();
        let err = store
            .insert(CollectionName::News, rec(json!({"id": "news-welcome"})))
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateId { .. }));
        assert_eq!(store.snapshot().unwrap(), before);
    }

    #[test]
    fn test_insert_into_singleton_is_invalid() {
        let store = store();
        let err = store
            .insert(CollectionName::Home, rec(json!({"x": 1})))
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidOperation(_)));
    }

    #[test]
    fn test_update_by_id_merges() {
        let store = store();
        let updated = store
            .update_by_id(
                CollectionName::News,
                "news-welcome",
                rec(json!({"title": "Edited", "id": "hijack"})),
            )
            .unwrap();

        assert_eq!(updated.id(), Some("news-welcome"));
        assert_eq!(updated.get_str("title"), Some("Edited"));
        assert!(updated.get("body").is_some());
        assert_eq!(
            store.logs().unwrap()[0].action,
            "Updated news ID news-welcome"
        );
    }

    #[test]
    fn test_update_by_id_miss_is_not_found() {
        let store = store();
        let before = store.snapshot().unwrap();
        let err = store
            .update_by_id(CollectionName::News, "missing", rec(json!({"title": "x"})))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
        assert_eq!(store.snapshot().unwrap(), before);
    }

    #[test]
    fn test_update_by_id_on_singleton_ignores_id() {
        let store = store();
        let updated = store
            .update_by_id(
                CollectionName::Home,
                "whatever",
                rec(json!({"heroTitle": "Hello"})),
            )
            .unwrap();
        assert_eq!(updated.get_str("heroTitle"), Some("Hello"));
        assert!(updated.get("heroSubtitle").is_some());
        assert_eq!(
            store.singleton(CollectionName::Home).unwrap(),
            updated
        );
    }

    #[test]
    fn test_update_by_email() {
        let store = store();
        let updated = store
            .update_by_email(
                CollectionName::Members,
                "ADMIN@vestry.local",
                rec(json!({"password": "new-secret"})),
            )
            .unwrap();
        assert_eq!(updated.id(), Some("mem-admin"));
        assert!(store
            .verify_credential("admin@vestry.local", "new-secret")
            .unwrap()
            .is_some());

        let err = store
            .update_by_email(
                CollectionName::Members,
                "nobody@vestry.local",
                rec(json!({"password": "x"})),
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { .. }));
    }

    #[test]
    fn test_delete_missing_returns_false_but_backs_up() {
        let store = store();
        let before = store.collection(CollectionName::News).unwrap();

        assert!(!store.delete(CollectionName::News, "missing").unwrap());
        assert_eq!(store.collection(CollectionName::News).unwrap(), before);
        assert_eq!(store.list_backups().unwrap().len(), 1);
    }

    #[test]
    fn test_delete_removes_and_backs_up_once() {
        let store = store();
        assert!(store.delete(CollectionName::News, "news-welcome").unwrap());

        assert!(store.get(CollectionName::News, "news-welcome").unwrap().is_none());
        let backups = store.list_backups().unwrap();
        assert_eq!(backups.len(), 1);
        assert_eq!(backups[0].description, "Auto-backup before deletion in news");
        assert!(backups[0]
            .snapshot
            .collection(CollectionName::News)
            .unwrap()
            .contains("news-welcome"));
        assert_eq!(
            store.logs().unwrap()[0].action,
            "Deleted from news ID news-welcome"
        );
    }

    #[test]
    fn test_delete_singleton_is_invalid_and_takes_no_backup() {
        let store = store();
        assert!(matches!(
            store.delete(CollectionName::About, "x"),
            Err(StoreError::InvalidOperation(_))
        ));
        assert!(store.list_backups().unwrap().is_empty());
    }

    #[test]
    fn test_verify_credential_strips_secret() {
        let store = store();
        store
            .insert(
                CollectionName::Members,
                rec(json!({"id": "u1", "email": "a@test.com", "password": "pw"})),
            )
            .unwrap();

        let found = store.verify_credential("A@Test.com", "pw").unwrap().unwrap();
        assert_eq!(found.id(), Some("u1"));
        assert!(found.get(SECRET_FIELD).is_none());

        assert!(store.verify_credential("a@test.com", "PW").unwrap().is_none());
        assert!(store.verify_credential("b@test.com", "pw").unwrap().is_none());
    }

    #[test]
    fn test_failed_write_leaves_state_untouched() {
        let store = store();
        let before = store.snapshot().unwrap();

        store.backend().set_fail_writes(true);
        assert!(store
            .insert(CollectionName::News, rec(json!({"title": "lost"})))
            .is_err());
        assert!(store
            .update_singleton(CollectionName::Home, rec(json!({"heroTitle": "lost"})))
            .is_err());

        assert_eq!(store.snapshot().unwrap(), before);
        assert_eq!(store.phase().unwrap(), StorePhase::Seeded);
    }

    #[test]
    fn test_reopen_loads_persisted_state() {
        let backend = Arc::new(MemoryBackend::new());
        {
            let store = LocalStore::open(Arc::clone(&backend), StoreConfig::default()).unwrap();
            store
                .insert(CollectionName::Contacts, rec(json!({"id": "c1", "msg": "hi"})))
                .unwrap();
            store.create_backup("checkpoint").unwrap();
        }

        let store = LocalStore::open(Arc::clone(&backend), StoreConfig::default()).unwrap();
        assert_eq!(store.phase().unwrap(), StorePhase::Active);
        assert!(store.get(CollectionName::Contacts, "c1").unwrap().is_some());
        assert_eq!(store.list_backups().unwrap()[0].description, "checkpoint");
    }

    #[test]
    fn test_log_is_capped() {
        let config = StoreConfig {
            max_log_entries: 5,
            ..StoreConfig::default()
        };
        let store = LocalStore::open(MemoryBackend::new(), config).unwrap();
        for i in 0..8 {
            store
                .insert(CollectionName::Contacts, rec(json!({"n": i})))
                .unwrap();
        }
        assert_eq!(store.logs().unwrap().len(), 5);
    }

    #[test]
    fn test_health_reports_counts() {
        let store = store();
        let health = store.health().unwrap();
        assert_eq!(health.status, HealthStatus::Healthy);
        assert_eq!(health.counts[&CollectionName::News], 2);
        assert_eq!(health.counts[&CollectionName::Donations], 0);
        assert!(health.size_bytes > 0);
        assert_eq!(health.backups, 0);
    }

    #[test]
    fn test_collection_on_singleton_is_invalid() {
        let store = store();
        assert!(store.collection(CollectionName::Home).is_err());
        assert!(store.singleton(CollectionName::News).is_err());
    }
}
