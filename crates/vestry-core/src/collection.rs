//! Collections: named, ordered sets of records.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;
use crate::record::Record;

/// The fixed set of named collections.
///
/// Most are keyed collections of records with unique ids. [`Home`] and
/// [`About`] are singleton configuration documents.
///
/// [`Home`]: CollectionName::Home
/// [`About`]: CollectionName::About
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollectionName {
    Members,
    News,
    Leaders,
    Announcements,
    Departments,
    Donations,
    Contacts,
    Home,
    About,
}

impl CollectionName {
    /// All keyed collections.
    pub const KEYED: [CollectionName; 7] = [
        CollectionName::Members,
        CollectionName::News,
        CollectionName::Leaders,
        CollectionName::Announcements,
        CollectionName::Departments,
        CollectionName::Donations,
        CollectionName::Contacts,
    ];

    /// All singleton documents.
    pub const SINGLETONS: [CollectionName; 2] = [CollectionName::Home, CollectionName::About];

    /// Whether this names a singleton document rather than a keyed collection.
    pub const fn is_singleton(self) -> bool {
        matches!(self, CollectionName::Home | CollectionName::About)
    }

    /// The wire/storage name.
    pub const fn as_str(self) -> &'static str {
        match self {
            CollectionName::Members => "members",
            CollectionName::News => "news",
            CollectionName::Leaders => "leaders",
            CollectionName::Announcements => "announcements",
            CollectionName::Departments => "departments",
            CollectionName::Donations => "donations",
            CollectionName::Contacts => "contacts",
            CollectionName::Home => "home",
            CollectionName::About => "about",
        }
    }

    /// Prefix used for generated ids.
    pub const fn id_prefix(self) -> &'static str {
        match self {
            CollectionName::Members => "mem",
            CollectionName::News => "news",
            CollectionName::Leaders => "ldr",
            CollectionName::Announcements => "ann",
            CollectionName::Departments => "dept",
            CollectionName::Donations => "don",
            CollectionName::Contacts => "msg",
            CollectionName::Home => "home",
            CollectionName::About => "about",
        }
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CollectionName {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::KEYED
            .iter()
            .chain(Self::SINGLETONS.iter())
            .copied()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| CoreError::UnknownCollection(s.to_string()))
    }
}

/// An ordered list of keyed records.
///
/// Inserts prepend, so iteration order is most recent first. Ids are unique;
/// the collection itself does not enforce it, the store does before calling
/// [`Collection::prepend`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Collection(Vec<Record>);

impl Collection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Records, most recent first.
    pub fn records(&self) -> &[Record] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.0.iter()
    }

    /// Find a record by id.
    pub fn get(&self, id: &str) -> Option<&Record> {
        self.0.iter().find(|r| r.id() == Some(id))
    }

    /// Whether a record with this id exists.
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Find a record by id for mutation.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Record> {
        self.0.iter_mut().find(|r| r.id() == Some(id))
    }

    /// Find the first record whose email matches, ignoring case.
    pub fn find_by_email(&self, email: &str) -> Option<&Record> {
        self.0.iter().find(|r| r.email_matches(email))
    }

    /// Mutable variant of [`Collection::find_by_email`].
    pub fn find_by_email_mut(&mut self, email: &str) -> Option<&mut Record> {
        self.0.iter_mut().find(|r| r.email_matches(email))
    }

    /// Insert at the front.
    pub fn prepend(&mut self, record: Record) {
        self.0.insert(0, record);
    }

    /// Remove a record by id, returning it.
    pub fn remove(&mut self, id: &str) -> Option<Record> {
        let pos = self.0.iter().position(|r| r.id() == Some(id))?;
        Some(self.0.remove(pos))
    }

    /// Owned copy of the records.
    pub fn to_vec(&self) -> Vec<Record> {
        self.0.clone()
    }
}

impl From<Vec<Record>> for Collection {
    fn from(records: Vec<Record>) -> Self {
        Self(records)
    }
}
