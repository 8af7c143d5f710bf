//! Whole-store state.
//!
//! The [`StoreState`] maps each entity type name to its [`Slice`]. Like the
//! slices it contains, it is an immutable value: every transition produces a
//! new state, and parts that did not change stay [`ptr_eq`](Slice::ptr_eq)
//! to the previous state so holders can detect changes by identity.

use im::OrdMap;
use normstore_foundation::Record;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::slice::Slice;

/// Immutable snapshot of every slice in the store.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct StoreState {
    slices: OrdMap<String, Slice>,
}

impl StoreState {
    /// Creates an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the slice of a type.
    #[must_use]
    pub fn slice(&self, schema: &str) -> Option<&Slice> {
        self.slices.get(schema)
    }

    /// Gets a record by type and id.
    #[must_use]
    pub fn get(&self, schema: &str, id: &str) -> Option<&Record> {
        self.slice(schema).and_then(|s| s.get(id))
    }

    /// Returns a new state with the slice of `schema` replaced.
    #[must_use]
    pub fn with_slice(&self, schema: impl Into<String>, slice: Slice) -> Self {
        Self {
            slices: self.slices.update(schema.into(), slice),
        }
    }

    /// Iterates `(type name, slice)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Slice)> {
        self.slices.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates type names in order.
    pub fn schemas(&self) -> impl Iterator<Item = &str> {
        self.slices.keys().map(String::as_str)
    }

    /// Returns the number of slices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slices.len()
    }

    /// Returns true if there are no slices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slices.is_empty()
    }

    /// Returns the total number of records across all slices.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.slices.values().map(Slice::len).sum()
    }

    /// Returns true if both states share the same underlying storage.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.slices.ptr_eq(&other.slices)
    }
}

impl<S: Into<String>> FromIterator<(S, Slice)> for StoreState {
    fn from_iter<I: IntoIterator<Item = (S, Slice)>>(iter: I) -> Self {
        Self {
            slices: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
