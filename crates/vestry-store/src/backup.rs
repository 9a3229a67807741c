//! Backup manager: point-in-time snapshots of the whole live state.
//!
//! Backups are deep copies of [`StoreState`] kept newest first and capped at
//! [`StoreConfig::max_backups`]. The history is persisted under its own key,
//! separate from the live state.
//!
//! Restore and reset build the replacement state off to the side, persist it,
//! and only then swap it in. Pending one-time passcodes are carried over from
//! the current state rather than rolled back, so a consumed code can never be
//! revived by restoring an older snapshot.
//!
//! [`StoreConfig::max_backups`]: crate::StoreConfig::max_backups

use vestry_core::{generate_id, human_size, BackupEntry, StoreState};

use crate::error::{Result, StoreError};
use crate::local::{Inner, LocalStore, StoreEvent};
use crate::traits::KeyValueBackend;

/// Description of the automatic snapshot taken by [`LocalStore::reset`].
pub const PRE_RESET_DESCRIPTION: &str = "Pre-reset archival snapshot";

impl<B: KeyValueBackend> LocalStore<B> {
    /// Snapshot the live state.
    pub fn create_backup(&self, description: &str) -> Result<BackupEntry> {
        let mut inner = self.lock()?;
        self.backup_locked(&mut inner, description.to_string())
    }

    /// Backup history, newest first.
    pub fn list_backups(&self) -> Result<Vec<BackupEntry>> {
        Ok(self.lock()?.backups.clone())
    }

    /// Replace the live state with a backup's snapshot.
    ///
    /// Fails with [`StoreError::BackupNotFound`] for an unknown id and
    /// [`StoreError::CorruptBackup`] if the snapshot no longer matches its
    /// checksum; the live state is untouched in both cases.
    pub fn restore(&self, id: &str) -> Result<()> {
        let mut inner = self.lock()?;

        let entry = inner
            .backups
            .iter()
            .find(|b| b.id == id)
            .cloned()
            .ok_or_else(|| StoreError::BackupNotFound(id.to_string()))?;

        if entry.snapshot.digest()? != entry.checksum {
            tracing::warn!(backup_id = id, "backup checksum mismatch, restore refused");
            return Err(StoreError::CorruptBackup(id.to_string()));
        }

        let mut staged = entry.snapshot;
        staged.otps = inner.live.otps.clone();
        staged.push_log(
            self.log_entry(format!("System Restored from Backup: {}", id)),
            self.config().max_log_entries,
        );
        self.commit(&mut inner, staged)?;
        drop(inner);

        tracing::info!(backup_id = id, "restored live state from backup");
        self.emit(StoreEvent::Restored {
            backup_id: id.to_string(),
        });
        Ok(())
    }

    /// Archive the live state, then replace it with the seed dataset.
    pub fn reset(&self) -> Result<()> {
        let mut inner = self.lock()?;
        self.backup_locked(&mut inner, PRE_RESET_DESCRIPTION.to_string())?;

        let mut staged: StoreState = self.seed().clone();
        staged.otps = inner.live.otps.clone();
        staged.push_log(
            self.log_entry("System Reset to Initial Data".to_string()),
            self.config().max_log_entries,
        );
        self.commit(&mut inner, staged)?;
        drop(inner);

        tracing::info!("reset live state to seed dataset");
        self.emit(StoreEvent::Reset);
        Ok(())
    }

    /// Take a backup while already holding the store lock.
    pub(crate) fn backup_locked(&self, inner: &mut Inner, description: String) -> Result<BackupEntry> {
        // Pending passcodes never enter the history; restore keeps the live ones.
        let mut snapshot = inner.live.clone();
        snapshot.otps.clear();
        let size_bytes = snapshot.encoded_len()?;
        let entry = BackupEntry {
            id: generate_id("backup"),
            timestamp: self.now(),
            size: human_size(size_bytes),
            description,
            checksum: snapshot.digest()?,
            snapshot,
        };

        let mut backups = Vec::with_capacity(inner.backups.len() + 1);
        backups.push(entry.clone());
        backups.extend(inner.backups.iter().cloned());
        backups.truncate(self.config().max_backups);

        self.persist_backups(&backups)?;
        inner.backups = backups;

        self.stage(inner, |state| {
            state.push_log(
                self.log_entry(format!("System Backup Created: {}", entry.description)),
                self.config().max_log_entries,
            );
            Ok(())
        })?;

        tracing::info!(backup_id = %entry.id, size = %entry.size, "created backup");
        Ok(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::memory::MemoryBackend;
    use crate::traits::BACKUPS_KEY;
    use proptest::prelude::*;
    use serde_json::json;
    use vestry_core::{CollectionName, Record};

    fn store() -> LocalStore<MemoryBackend> {
        LocalStore::open(MemoryBackend::new(), StoreConfig::default()).unwrap()
    }

    fn rec(value: serde_json::Value) -> Record {
        Record::from_value(value).unwrap()
    }

    #[test]
    fn test_eleven_backups_keep_ten_most_recent() {
        let store = store();
        for i in 0..11 {
            store.create_backup(&format!("backup {}", i)).unwrap();
        }

        let descriptions: Vec<_> = store
            .list_backups()
            .unwrap()
            .into_iter()
            .map(|b| b.description)
            .collect();
        let expected: Vec<_> = (1..11).rev().map(|i| format!("backup {}", i)).collect();
        assert_eq!(descriptions, expected);
    }

    #[test]
    fn test_backup_history_persisted_separately() {
        let store = store();
        let entry = store.create_backup("first").unwrap();

        let raw = store.backend().raw(BACKUPS_KEY).unwrap();
        let persisted: Vec<BackupEntry> = serde_json::from_str(&raw).unwrap();
        assert_eq!(persisted, vec![entry]);
        assert_eq!(
            store.logs().unwrap()[0].action,
            "System Backup Created: first"
        );
    }

    #[test]
    fn test_restore_replaces_live_state() {
        let store = store();
        store
            .insert(CollectionName::Contacts, rec(json!({"id": "c1"})))
            .unwrap();
        let backup = store.create_backup("with c1").unwrap();

        store
            .insert(CollectionName::Contacts, rec(json!({"id": "c2"})))
            .unwrap();
        store
            .update_singleton(CollectionName::About, rec(json!({"mission": "changed"})))
            .unwrap();

        let mut events = store.subscribe();
        store.restore(&backup.id).unwrap();

        let live = store.snapshot().unwrap();
        assert_eq!(live.collections, backup.snapshot.collections);
        assert_eq!(live.singletons, backup.snapshot.singletons);
        assert_eq!(
            live.logs[0].action,
            format!("System Restored from Backup: {}", backup.id)
        );
        assert_eq!(
            events.try_recv().unwrap(),
            StoreEvent::Restored {
                backup_id: backup.id.clone()
            }
        );
    }

    #[test]
    fn test_restore_unknown_id_fails_untouched() {
        let store = store();
        let before = store.snapshot().unwrap();
        assert!(matches!(
            store.restore("backup-nope"),
            Err(StoreError::BackupNotFound(_))
        ));
        assert_eq!(store.snapshot().unwrap(), before);
    }

    #[test]
    fn test_restore_corrupt_backup_refused() {
        let store = store();
        let backup = store.create_backup("good").unwrap();
        store
            .lock()
            .unwrap()
            .backups[0]
            .snapshot
            .collection_mut(CollectionName::News)
            .prepend(rec(json!({"id": "injected"})));

        let before = store.snapshot().unwrap();
        assert!(matches!(
            store.restore(&backup.id),
            Err(StoreError::CorruptBackup(_))
        ));
        assert_eq!(store.snapshot().unwrap(), before);
    }

    #[test]
    fn test_restore_does_not_revive_consumed_otp() {
        let store = store();
        let otp = store.generate_otp("a@test.com").unwrap();
        let backup = store.create_backup("otp pending").unwrap();
        assert!(store.verify_otp("a@test.com", &otp.code).unwrap().is_verified());

        store.restore(&backup.id).unwrap();
        assert!(!store.verify_otp("a@test.com", &otp.code).unwrap().is_verified());
    }

    #[test]
    fn test_backup_omits_pending_otps() {
        let store = store();
        let otp = store.generate_otp("a@test.com").unwrap();
        let backup = store.create_backup("otp pending").unwrap();

        assert!(backup.snapshot.otps.is_empty());
        assert_eq!(backup.checksum, backup.snapshot.digest().unwrap());
        let raw = store.backend().raw(BACKUPS_KEY).unwrap();
        let persisted: Vec<BackupEntry> = serde_json::from_str(&raw).unwrap();
        assert!(persisted.iter().all(|b| b.snapshot.otps.is_empty()));

        // The pending code is still live after the backup.
        assert!(store.verify_otp("a@test.com", &otp.code).unwrap().is_verified());
    }

    #[test]
    fn test_reset_restores_seed_after_archiving() {
        let store = store();
        store
            .insert(CollectionName::Donations, rec(json!({"id": "d1", "amount": 20})))
            .unwrap();

        let mut events = store.subscribe();
        store.reset().unwrap();

        let seed = vestry_core::seed_dataset();
        let live = store.snapshot().unwrap();
        assert_eq!(live.collections, seed.collections);
        assert_eq!(live.singletons, seed.singletons);

        let backups = store.list_backups().unwrap();
        assert_eq!(backups[0].description, PRE_RESET_DESCRIPTION);
        assert!(backups[0]
            .snapshot
            .collection(CollectionName::Donations)
            .unwrap()
            .contains("d1"));
        assert_eq!(events.try_recv().unwrap(), StoreEvent::Reset);
    }

    #[test]
    fn test_failed_backup_write_changes_nothing() {
        let store = store();
        let before = store.snapshot().unwrap();
        store.backend().set_fail_writes(true);

        assert!(store.create_backup("doomed").is_err());
        assert!(store.delete(CollectionName::News, "news-welcome").is_err());

        assert!(store.list_backups().unwrap().is_empty());
        assert_eq!(store.snapshot().unwrap(), before);
    }

    proptest! {
        #[test]
        fn test_backup_retention(count in 0usize..25) {
            let store = store();
            for i in 0..count {
                store.create_backup(&format!("b{}", i)).unwrap();
                prop_assert_eq!(store.list_backups().unwrap().len(), (i + 1).min(10));
            }
            if count > 0 {
                let newest = &store.list_backups().unwrap()[0];
                prop_assert_eq!(&newest.description, &format!("b{}", count - 1));
            }
        }
    }
}
