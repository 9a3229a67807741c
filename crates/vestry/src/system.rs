//! System operations: health, activity log, backups, restore and reset.
//!
//! Callers gate `restore` and `reset` on their own authorization; nothing
//! here checks roles.

use serde_json::{json, Value};
use vestry_core::{BackupEntry, HealthSnapshot, LogEntry};
use vestry_remote::{Fetched, Method, Transport};
use vestry_store::KeyValueBackend;

use crate::error::Result;
use crate::facade::Vestry;

impl<B: KeyValueBackend, T: Transport> Vestry<B, T> {
    pub async fn health(&self) -> Result<Fetched<HealthSnapshot>> {
        let store = self.store();
        let fetched = self
            .remote()
            .with_fallback(Method::Get, "/system/health", None, || store.health())
            .await?;
        Ok(fetched)
    }

    /// Activity log, newest first.
    pub async fn logs(&self) -> Result<Fetched<Vec<LogEntry>>> {
        let store = self.store();
        let fetched = self
            .remote()
            .with_fallback(Method::Get, "/system/logs", None, || store.logs())
            .await?;
        Ok(fetched)
    }

    /// Backup history, newest first. Remote listings carry no snapshots.
    pub async fn list_backups(&self) -> Result<Fetched<Vec<BackupEntry>>> {
        let store = self.store();
        let fetched = self
            .remote()
            .with_fallback(Method::Get, "/system/backups", None, || store.list_backups())
            .await?;
        Ok(fetched)
    }

    /// Take a backup. The entry is `None` when the server acknowledged the
    /// backup without describing it.
    pub async fn create_backup(&self, description: &str) -> Result<Fetched<Option<BackupEntry>>> {
        let store = self.store();
        let body = json!({ "description": description });
        let fetched: Fetched<Value> = self
            .remote()
            .with_fallback(Method::Post, "/system/backups", Some(body), || {
                Ok(serde_json::to_value(store.create_backup(description)?)?)
            })
            .await?;
        tracing::info!(degraded = fetched.is_degraded(), description, "backup requested");
        Ok(fetched.map(|reply| serde_json::from_value(reply).ok()))
    }

    /// Replace the live state with the backup `id`.
    pub async fn restore(&self, id: &str) -> Result<Fetched<()>> {
        let store = self.store();
        let path = format!("/system/backups/{}/restore", id);
        let fetched: Fetched<Value> = self
            .remote()
            .with_fallback(Method::Post, &path, None, || {
                store.restore(id).map(|()| Value::Null)
            })
            .await?;
        tracing::info!(degraded = fetched.is_degraded(), backup_id = id, "restore requested");
        Ok(fetched.map(|_| ()))
    }

    /// Archive the live state, then return to the seed dataset.
    pub async fn reset(&self) -> Result<Fetched<()>> {
        let store = self.store();
        let fetched: Fetched<Value> = self
            .remote()
            .with_fallback(Method::Post, "/system/reset", None, || {
                store.reset().map(|()| Value::Null)
            })
            .await?;
        tracing::info!(degraded = fetched.is_degraded(), "reset requested");
        Ok(fetched.map(|_| ()))
    }
}
