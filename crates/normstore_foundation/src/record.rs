//! Entity records with persistent attribute maps.
//!
//! A [`Record`] is one flat, normalized entity: its id plus attribute values.
//! Relation-valued attributes hold ids (or sequences of ids), never nested
//! objects. Cloning is O(1) and every modification returns a new record that
//! shares structure with the original.

use im::OrdMap;
use serde_json::{Map, Value};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::entity::EntityId;

/// A normalized entity record.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Record {
    /// Primary key.
    id: EntityId,
    /// Attribute values, excluding the id.
    attributes: OrdMap<String, Value>,
}

impl Record {
    /// Creates a record with no attributes.
    #[must_use]
    pub fn new(id: impl Into<EntityId>) -> Self {
        Self {
            id: id.into(),
            attributes: OrdMap::new(),
        }
    }

    /// Creates a record from an id and attribute pairs.
    #[must_use]
    pub fn from_attributes<I>(id: impl Into<EntityId>, attributes: I) -> Self
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        Self {
            id: id.into(),
            attributes: attributes.into_iter().collect(),
        }
    }

    /// Reads a record from a JSON object.
    ///
    /// The id is taken from `id_attribute` and removed from the attributes.
    /// Returns `None` if `value` is not an object or carries no usable id.
    #[must_use]
    pub fn from_json(value: &Value, id_attribute: &str) -> Option<Self> {
        let object = value.as_object()?;
        let id = object.get(id_attribute).and_then(EntityId::from_json)?;
        let attributes = object
            .iter()
            .filter(|(k, _)| k.as_str() != id_attribute)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        Some(Self { id, attributes })
    }

    /// Converts the record back into a JSON object, re-emitting the id
    /// under `id_attribute`.
    #[must_use]
    pub fn to_json(&self, id_attribute: &str) -> Value {
        let mut object = Map::new();
        object.insert(id_attribute.to_string(), self.id.to_json());
        for (k, v) in &self.attributes {
            object.insert(k.clone(), v.clone());
        }
        Value::Object(object)
    }

    /// Returns the record's id.
    #[must_use]
    pub fn id(&self) -> &EntityId {
        &self.id
    }

    /// Returns an attribute value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// Returns true if the attribute is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Returns the attribute map.
    #[must_use]
    pub fn attributes(&self) -> &OrdMap<String, Value> {
        &self.attributes
    }

    /// Returns the number of attributes (not counting the id).
    #[must_use]
    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    /// Returns true if the record has no attributes besides its id.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Returns a new record with the attribute set.
    #[must_use]
    pub fn with(&self, name: impl Into<String>, value: Value) -> Self {
        Self {
            id: self.id.clone(),
            attributes: self.attributes.update(name.into(), value),
        }
    }

    /// Returns a new record with the attribute removed.
    #[must_use]
    pub fn without(&self, name: &str) -> Self {
        Self {
            id: self.id.clone(),
            attributes: self.attributes.without(name),
        }
    }

    /// Returns a new record with the same attributes under a different id.
    #[must_use]
    pub fn with_id(&self, id: impl Into<EntityId>) -> Self {
        Self {
            id: id.into(),
            attributes: self.attributes.clone(),
        }
    }

    /// Shallow merge: attributes of `other` overwrite attributes of `self`;
    /// attributes missing from `other` are kept. The id of `self` is kept.
    #[must_use]
    pub fn merge(&self, other: &Record) -> Self {
        Self {
            id: self.id.clone(),
            attributes: other.attributes.clone().union(self.attributes.clone()),
        }
    }
}
