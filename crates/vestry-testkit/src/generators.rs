//! Proptest generators for property-based testing.

use std::collections::HashSet;

use proptest::prelude::*;
use serde_json::json;

use vestry_core::{CollectionName, Record};
use vestry_store::{KeyValueBackend, LocalStore, StoreError};

/// A keyed collection name.
pub fn keyed_collection() -> impl Strategy<Value = CollectionName> {
    prop::sample::select(CollectionName::KEYED.to_vec())
}

/// An id from a deliberately small space, so operations collide often.
pub fn record_id() -> impl Strategy<Value = String> {
    "[a-c][0-3]".prop_map(String::from)
}

/// A short title.
pub fn title() -> impl Strategy<Value = String> {
    "[A-Za-z ]{1,16}".prop_map(String::from)
}

/// An email with random letter case, for case-insensitive lookups.
pub fn mixed_case_email() -> impl Strategy<Value = (String, String)> {
    ("[a-z]{1,8}", "[a-z]{1,8}", any::<u64>()).prop_map(|(user, host, mask)| {
        let canonical = format!("{}@{}.org", user, host);
        let shuffled: String = canonical
            .chars()
            .enumerate()
            .map(|(i, c)| {
                if (mask >> (i % 64)) & 1 == 1 {
                    c.to_ascii_uppercase()
                } else {
                    c
                }
            })
            .collect();
        (canonical, shuffled)
    })
}

/// One mutation against a keyed collection.
#[derive(Debug, Clone)]
pub enum StoreOp {
    /// Insert with an explicit id, or a generated one when `None`.
    Insert { id: Option<String>, title: String },
    Update { id: String, title: String },
    Delete { id: String },
}

impl Arbitrary for StoreOp {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        prop_oneof![
            3 => (prop::option::of(record_id()), title())
                .prop_map(|(id, title)| StoreOp::Insert { id, title }),
            2 => (record_id(), title()).prop_map(|(id, title)| StoreOp::Update { id, title }),
            1 => record_id().prop_map(|id| StoreOp::Delete { id }),
        ]
        .boxed()
    }
}

/// A sequence of up to `max` operations.
pub fn store_ops(max: usize) -> impl Strategy<Value = Vec<StoreOp>> {
    prop::collection::vec(any::<StoreOp>(), 0..=max)
}

/// Apply `op` to `name`.
///
/// Expected rejections (duplicate id, unknown id) are swallowed; anything
/// else is returned.
pub fn apply<B: KeyValueBackend>(
    store: &LocalStore<B>,
    name: CollectionName,
    op: &StoreOp,
) -> Result<(), StoreError> {
    let outcome = match op {
        StoreOp::Insert { id, title } => {
            let mut record = Record::new();
            if let Some(id) = id {
                record.set_id(id.clone());
            }
            record.insert("title", title.as_str());
            store.insert(name, record).map(|_| ())
        }
        StoreOp::Update { id, title } => {
            let patch = Record::from_value(json!({ "title": title, "id": "hijack" }))?;
            store.update_by_id(name, id, patch).map(|_| ())
        }
        StoreOp::Delete { id } => store.delete(name, id).map(|_| ()),
    };

    match outcome {
        Err(StoreError::DuplicateId { .. }) | Err(StoreError::NotFound { .. }) => Ok(()),
        other => other,
    }
}

/// Whether every record in `records` has a distinct id.
pub fn has_unique_ids(records: &[Record]) -> bool {
    let mut seen = HashSet::new();
    records.iter().all(|r| seen.insert(r.id().unwrap_or_default()))
}
