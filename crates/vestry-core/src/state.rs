//! The full live state of a store.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::collection::{Collection, CollectionName};
use crate::error::CoreError;
use crate::record::Record;
use crate::types::{LogEntry, OtpRecord};

/// Everything a store holds: keyed collections, singleton documents, the
/// activity log and pending one-time passcodes.
///
/// A backup snapshot is a `clone()` of this value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreState {
    #[serde(default)]
    pub collections: BTreeMap<CollectionName, Collection>,
    #[serde(default)]
    pub singletons: BTreeMap<CollectionName, Record>,
    /// Newest first.
    #[serde(default)]
    pub logs: Vec<LogEntry>,
    #[serde(default)]
    pub otps: Vec<OtpRecord>,
}

impl StoreState {
    /// An empty state with every collection and singleton present.
    pub fn empty() -> Self {
        let mut state = Self::default();
        for name in CollectionName::KEYED {
            state.collections.insert(name, Collection::new());
        }
        for name in CollectionName::SINGLETONS {
            state.singletons.insert(name, Record::new());
        }
        state
    }

    /// Get a keyed collection.
    pub fn collection(&self, name: CollectionName) -> Option<&Collection> {
        self.collections.get(&name)
    }

    /// Get a keyed collection for mutation, creating it if absent.
    pub fn collection_mut(&mut self, name: CollectionName) -> &mut Collection {
        self.collections.entry(name).or_default()
    }

    /// Get a singleton document.
    pub fn singleton(&self, name: CollectionName) -> Option<&Record> {
        self.singletons.get(&name)
    }

    /// Get a singleton document for mutation, creating it if absent.
    pub fn singleton_mut(&mut self, name: CollectionName) -> &mut Record {
        self.singletons.entry(name).or_default()
    }

    /// Prepend a log entry and truncate to `cap`.
    pub fn push_log(&mut self, entry: LogEntry, cap: usize) {
        self.logs.insert(0, entry);
        self.logs.truncate(cap);
    }

    /// Record count per keyed collection.
    pub fn counts(&self) -> BTreeMap<CollectionName, usize> {
        CollectionName::KEYED
            .iter()
            .map(|name| (*name, self.collection(*name).map_or(0, Collection::len)))
            .collect()
    }

    /// Fill any collection or singleton missing from `self` with the one from
    /// `defaults`. Used after loading persisted state from an older layout.
    pub fn fill_missing_from(&mut self, defaults: &StoreState) {
        for (name, collection) in &defaults.collections {
            self.collections
                .entry(*name)
                .or_insert_with(|| collection.clone());
        }
        for (name, doc) in &defaults.singletons {
            self.singletons.entry(*name).or_insert_with(|| doc.clone());
        }
    }

    /// Serialized JSON form.
    pub fn to_json(&self) -> Result<String, CoreError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse from serialized JSON.
    pub fn from_json(s: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(s)?)
    }

    /// Length of the serialized form, in bytes.
    pub fn encoded_len(&self) -> Result<usize, CoreError> {
        Ok(serde_json::to_vec(self)?.len())
    }

    /// Hex BLAKE3 digest of the serialized form.
    ///
    /// Serialization is deterministic: every map in the state is ordered.
    pub fn digest(&self) -> Result<String, CoreError> {
        let bytes = serde_json::to_vec(self)?;
        Ok(blake3::hash(&bytes).to_hex().to_string())
    }
}
