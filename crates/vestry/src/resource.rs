//! Per-resource handles.
//!
//! A [`Resource`] covers a keyed collection (`/{name}`, `/{name}/{id}`), a
//! [`Document`] covers a singleton (`/config/{name}`). Each method is one
//! remote-first call with the matching [`LocalStore`](vestry_store::LocalStore)
//! operation as its fallback.

use std::ops::Deref;

use serde_json::Value;
use vestry_core::{CollectionName, Record};
use vestry_remote::{Fetched, Method, Transport};
use vestry_store::KeyValueBackend;

use crate::error::Result;
use crate::facade::Vestry;

/// A keyed collection.
pub struct Resource<'a, B: KeyValueBackend, T: Transport> {
    vestry: &'a Vestry<B, T>,
    name: CollectionName,
}

impl<'a, B: KeyValueBackend, T: Transport> Resource<'a, B, T> {
    pub(crate) fn new(vestry: &'a Vestry<B, T>, name: CollectionName) -> Self {
        Self { vestry, name }
    }

    pub fn name(&self) -> CollectionName {
        self.name
    }

    fn path(&self) -> String {
        format!("/{}", self.name)
    }

    fn item_path(&self, id: &str) -> String {
        format!("/{}/{}", self.name, id)
    }

    /// All records, most recent first.
    pub async fn list(&self) -> Result<Fetched<Vec<Record>>> {
        let store = self.vestry.store();
        let name = self.name;
        let fetched = self
            .vestry
            .remote()
            .with_fallback(Method::Get, &self.path(), None, || store.collection(name))
            .await?;
        Ok(fetched)
    }

    /// One record, looked up in the listing.
    pub async fn get(&self, id: &str) -> Result<Fetched<Option<Record>>> {
        let fetched = self.list().await?;
        Ok(fetched.map(|records| records.into_iter().find(|r| r.id() == Some(id))))
    }

    /// Create a record. The local fallback assigns an id when none is given.
    ///
    /// When the server's reply carries no record, the record sent is returned.
    pub async fn create(&self, record: Record) -> Result<Fetched<Record>> {
        let store = self.vestry.store();
        let name = self.name;
        let sent = record.clone();
        let fetched: Fetched<Value> = self
            .vestry
            .remote()
            .with_fallback(Method::Post, &self.path(), Some(Value::from(sent.clone())), || {
                store.insert(name, record).map(Value::from)
            })
            .await?;
        Ok(fetched.map(|reply| keyed_reply(reply, sent)))
    }

    /// Shallow-merge `patch` into the record with this id.
    pub async fn update(&self, id: &str, patch: Record) -> Result<Fetched<Record>> {
        let store = self.vestry.store();
        let name = self.name;
        let mut sent = patch.clone();
        sent.set_id(id);
        let fetched: Fetched<Value> = self
            .vestry
            .remote()
            .with_fallback(Method::Put, &self.item_path(id), Some(Value::from(patch.clone())), || {
                store.update_by_id(name, id, patch).map(Value::from)
            })
            .await?;
        Ok(fetched.map(|reply| keyed_reply(reply, sent)))
    }

    /// Delete by id. `false` means nothing matched.
    ///
    /// The local fallback backs up the full state before deleting.
    pub async fn delete(&self, id: &str) -> Result<Fetched<bool>> {
        let store = self.vestry.store();
        let name = self.name;
        let fetched: Fetched<Value> = self
            .vestry
            .remote()
            .with_fallback(Method::Delete, &self.item_path(id), None, || {
                store.delete(name, id).map(Value::Bool)
            })
            .await?;
        Ok(fetched.map(|reply| acknowledged(&reply)))
    }

    /// `PATCH /{name}/{id}/{field}` with `{field: value}`, falling back to a
    /// local merge of the same field.
    async fn patch_field(&self, id: &str, field: &str, value: &str) -> Result<Fetched<Record>> {
        let store = self.vestry.store();
        let name = self.name;
        let path = format!("{}/{}", self.item_path(id), field);
        let mut patch = Record::new();
        patch.insert(field, value);
        let body = Value::from(patch.clone());
        let mut sent = patch.clone();
        sent.set_id(id);
        let fetched: Fetched<Value> = self
            .vestry
            .remote()
            .with_fallback(Method::Patch, &path, Some(body), || {
                store.update_by_id(name, id, patch).map(Value::from)
            })
            .await?;
        Ok(fetched.map(|reply| keyed_reply(reply, sent)))
    }
}

/// Read a keyed mutation reply: an object with an id is the stored record,
/// anything else (empty body, a bare message) falls back to what was sent.
pub(crate) fn keyed_reply(reply: Value, sent: Record) -> Record {
    match Record::from_value(reply) {
        Ok(record) if record.id().is_some() => record,
        _ => sent,
    }
}

/// Read a delete reply: a bare boolean or `{"success": bool}`; anything
/// else from a 2xx counts as deleted.
fn acknowledged(reply: &Value) -> bool {
    match reply {
        Value::Bool(b) => *b,
        Value::Object(map) => map
            .get("success")
            .or_else(|| map.get("deleted"))
            .and_then(Value::as_bool)
            .unwrap_or(true),
        _ => true,
    }
}

/// The `members` collection, with role changes.
pub struct Members<'a, B: KeyValueBackend, T: Transport>(Resource<'a, B, T>);

impl<'a, B: KeyValueBackend, T: Transport> Members<'a, B, T> {
    pub(crate) fn new(resource: Resource<'a, B, T>) -> Self {
        Self(resource)
    }

    /// `PATCH /members/{id}/role`.
    pub async fn update_role(&self, id: &str, role: &str) -> Result<Fetched<Record>> {
        self.0.patch_field(id, "role", role).await
    }
}

impl<'a, B: KeyValueBackend, T: Transport> Deref for Members<'a, B, T> {
    type Target = Resource<'a, B, T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// The `donations` collection, with status changes.
pub struct Donations<'a, B: KeyValueBackend, T: Transport>(Resource<'a, B, T>);

impl<'a, B: KeyValueBackend, T: Transport> Donations<'a, B, T> {
    pub(crate) fn new(resource: Resource<'a, B, T>) -> Self {
        Self(resource)
    }

    /// `PATCH /donations/{id}/status`.
    pub async fn update_status(&self, id: &str, status: &str) -> Result<Fetched<Record>> {
        self.0.patch_field(id, "status", status).await
    }
}

impl<'a, B: KeyValueBackend, T: Transport> Deref for Donations<'a, B, T> {
    type Target = Resource<'a, B, T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// A singleton configuration document.
pub struct Document<'a, B: KeyValueBackend, T: Transport> {
    vestry: &'a Vestry<B, T>,
    name: CollectionName,
}

impl<'a, B: KeyValueBackend, T: Transport> Document<'a, B, T> {
    pub(crate) fn new(vestry: &'a Vestry<B, T>, name: CollectionName) -> Self {
        Self { vestry, name }
    }

    pub fn name(&self) -> CollectionName {
        self.name
    }

    fn path(&self) -> String {
        format!("/config/{}", self.name)
    }

    pub async fn get(&self) -> Result<Fetched<Record>> {
        let store = self.vestry.store();
        let name = self.name;
        let fetched = self
            .vestry
            .remote()
            .with_fallback(Method::Get, &self.path(), None, || store.singleton(name))
            .await?;
        Ok(fetched)
    }

    /// Merge `patch` into the document. Fields not in the patch are kept.
    ///
    /// A reply that is not an object yields the patch that was sent.
    pub async fn update(&self, patch: Record) -> Result<Fetched<Record>> {
        let store = self.vestry.store();
        let name = self.name;
        let sent = patch.clone();
        let fetched: Fetched<Value> = self
            .vestry
            .remote()
            .with_fallback(Method::Put, &self.path(), Some(Value::from(sent.clone())), || {
                store.update_singleton(name, patch).map(Value::from)
            })
            .await?;
        Ok(fetched.map(|reply| Record::from_value(reply).unwrap_or(sent)))
    }
}
