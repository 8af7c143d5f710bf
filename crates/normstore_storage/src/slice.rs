//! Per-type state slices.
//!
//! A [`Slice`] holds every record of one entity type, keyed by id. It is a
//! persistent map: clone is O(1), every mutator returns a new slice sharing
//! structure with the original, and mutators that change nothing return a
//! slice that is [`ptr_eq`](Slice::ptr_eq) to the input.

use im::OrdMap;
use normstore_foundation::{EntityId, Record};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// All records of one entity type.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Slice {
    records: OrdMap<EntityId, Record>,
}

impl Slice {
    /// Creates an empty slice.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the slice holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Gets a record by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Record> {
        self.records.get(id)
    }

    /// Returns true if a record with that id exists.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.records.contains_key(id)
    }

    /// Iterates records in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    /// Iterates ids in order.
    pub fn ids(&self) -> impl Iterator<Item = &EntityId> {
        self.records.keys()
    }

    /// Returns true if both slices share the same underlying storage.
    ///
    /// Used for identity-based change detection.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.records.ptr_eq(&other.records)
    }

    /// Returns a new slice with `record` stored under its id, replacing any
    /// record already there.
    #[must_use]
    pub fn insert(&self, record: Record) -> Self {
        Self {
            records: self.records.update(record.id().clone(), record),
        }
    }

    /// Returns a new slice with `record` shallow-merged into the stored record
    /// of the same id, or inserted if absent.
    #[must_use]
    pub fn upsert(&self, record: &Record) -> Self {
        let next = match self.records.get(record.id()) {
            Some(existing) => existing.merge(record),
            None => record.clone(),
        };
        self.insert(next)
    }

    /// Returns a new slice with the record removed.
    ///
    /// Removing an absent id returns `self` unchanged.
    #[must_use]
    pub fn remove(&self, id: &str) -> Self {
        if !self.contains(id) {
            return self.clone();
        }
        Self {
            records: self.records.without(id),
        }
    }

    /// Returns a new slice with the record at `old` moved to `new`.
    ///
    /// The record keeps its attributes; only its id changes. A record already
    /// stored at `new` is replaced. Renaming an absent id returns `self`
    /// unchanged.
    #[must_use]
    pub fn rename(&self, old: &str, new: &EntityId) -> Self {
        let Some(record) = self.records.get(old) else {
            return self.clone();
        };
        let moved = record.with_id(new.clone());
        Self {
            records: self.records.without(old).update(new.clone(), moved),
        }
    }

    /// Returns a new slice where every record of `other` replaces the record
    /// of the same id (last write wins).
    #[must_use]
    pub fn overwrite_with(&self, other: &Slice) -> Self {
        if other.is_empty() {
            return self.clone();
        }
        Self {
            records: other.records.clone().union(self.records.clone()),
        }
    }

    /// Returns a new slice where every record of `other` is upserted.
    #[must_use]
    pub fn merge_with(&self, other: &Slice) -> Self {
        other.iter().fold(self.clone(), |slice, record| slice.upsert(record))
    }
}

impl FromIterator<Record> for Slice {
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        Self {
            records: iter.into_iter().map(|r| (r.id().clone(), r)).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a Slice {
    type Item = &'a Record;
    type IntoIter = im::ordmap::Values<'a, EntityId, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.records.values()
    }
}
