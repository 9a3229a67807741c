//! Test fixtures and helpers.
//!
//! Common setup code for integration tests: an in-memory backend, a manual
//! clock and a scripted transport, wired into a [`Vestry`] instance.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use vestry::{Vestry, VestryConfig};
use vestry_core::{Clock, ManualClock, Record, StoreState};
use vestry_remote::{RemoteConfig, ScriptedTransport};
use vestry_store::{LocalStore, MemoryBackend, StoreConfig};

/// Clock start for fixtures, well after the seed dataset's timestamps.
pub const FIXTURE_EPOCH: i64 = 1_717_200_000_000;

/// Per-request timeout used by fixtures, short enough for hung-request tests.
pub const FIXTURE_TIMEOUT: Duration = Duration::from_millis(250);

pub type FixtureVestry = Vestry<Arc<MemoryBackend>, Arc<ScriptedTransport>>;

/// A Vestry instance over an in-memory backend and a scripted transport.
///
/// The transport starts with an empty script, so every remote call fails
/// and the local store answers unless responses are queued.
pub struct TestFixture {
    pub backend: Arc<MemoryBackend>,
    pub clock: Arc<ManualClock>,
    pub transport: Arc<ScriptedTransport>,
    pub vestry: FixtureVestry,
}

impl TestFixture {
    /// Seeded store, default limits, offline transport.
    pub fn new() -> Self {
        Self::build(StoreConfig::default(), vestry_core::seed_dataset())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        Self::build(config, vestry_core::seed_dataset())
    }

    /// Start from `seed` instead of the default dataset.
    pub fn with_seed(seed: StoreState) -> Self {
        Self::build(StoreConfig::default(), seed)
    }

    fn build(config: StoreConfig, seed: StoreState) -> Self {
        let backend = Arc::new(MemoryBackend::new());
        let clock = Arc::new(ManualClock::new(FIXTURE_EPOCH));
        let transport = Arc::new(ScriptedTransport::offline());

        let store = LocalStore::builder(Arc::clone(&backend))
            .config(config)
            .clock(Arc::clone(&clock) as Arc<dyn Clock>)
            .seed(seed)
            .open()
            .unwrap_or_else(|e| panic!("fixture store failed to open: {}", e));

        let remote = RemoteConfig::default().with_timeout(FIXTURE_TIMEOUT);
        let vestry = Vestry::new(Arc::new(store), Arc::clone(&transport), &remote);

        Self {
            backend,
            clock,
            transport,
            vestry,
        }
    }

    /// A second facade over the same backend, as after a process restart.
    pub fn reopen(&self) -> FixtureVestry {
        let config = VestryConfig {
            store: self.store().config().clone(),
            remote: RemoteConfig::default().with_timeout(FIXTURE_TIMEOUT),
        };
        Vestry::open(
            Arc::clone(&self.backend),
            Arc::new(ScriptedTransport::offline()),
            config,
        )
        .unwrap_or_else(|e| panic!("fixture store failed to reopen: {}", e))
    }

    pub fn store(&self) -> &LocalStore<Arc<MemoryBackend>> {
        self.vestry.store()
    }

    /// Move the clock forward.
    pub fn advance(&self, by: Duration) {
        self.clock.advance(by);
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a record from a JSON object literal.
///
/// Panics on anything but an object.
pub fn record(value: Value) -> Record {
    Record::from_value(value).unwrap_or_else(|e| panic!("fixture record: {}", e))
}

/// Member profile with an email and display name (no password).
pub fn member_profile(name: &str, email: &str) -> Record {
    record(serde_json::json!({ "name": name, "email": email, "role": "member" }))
}

/// Install a test-writer tracing subscriber. Safe to call more than once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use vestry_core::CollectionName;

    #[tokio::test]
    async fn test_fixture_starts_offline_and_seeded() {
        let fixture = TestFixture::new();
        let news = fixture.vestry.news().list().await.unwrap();

        assert!(news.is_degraded());
        assert_eq!(news.value.len(), 2);
        assert_eq!(fixture.transport.call_count(), 1);
    }

    #[tokio::test]
    async fn test_reopen_sees_persisted_state() {
        let fixture = TestFixture::new();
        fixture
            .vestry
            .contacts()
            .create(record(serde_json::json!({"id": "msg-1", "subject": "Hello"})))
            .await
            .unwrap();

        let reopened = fixture.reopen();
        let contacts = reopened.store().collection(CollectionName::Contacts).unwrap();
        assert_eq!(contacts.len(), 1);
        assert_eq!(contacts[0].id(), Some("msg-1"));
    }

    #[test]
    fn test_clock_is_manual() {
        let fixture = TestFixture::new();
        fixture.advance(Duration::from_secs(1));
        assert_eq!(fixture.clock.now_millis(), FIXTURE_EPOCH + 1000);
    }
}
