//! Normalization of nested documents into flat entity tables.
//!
//! The [`Normalizer`] trait is the seam to whatever flattening routine the
//! host prefers. [`JsonNormalizer`] is the built-in implementation: it walks
//! a JSON document along the schema's reference attributes, lifts every
//! nested entity into the table of its own type, and leaves ids in its place.

use im::OrdMap;
use normstore_foundation::{EntityId, Error, ErrorContext, Record, Result, Value};
use normstore_schema::{AttributeSpec, ResolvedSchema};

use crate::slice::Slice;

/// Normalized records, grouped by type name.
pub type EntityTables = OrdMap<String, Slice>;

/// Id(s) of the top-level document(s).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NormalizedResult {
    /// A single document was normalized.
    One(EntityId),
    /// A sequence of documents was normalized, in input order.
    Many(Vec<EntityId>),
}

impl NormalizedResult {
    /// Returns the result ids as a slice.
    #[must_use]
    pub fn ids(&self) -> &[EntityId] {
        match self {
            Self::One(id) => std::slice::from_ref(id),
            Self::Many(ids) => ids,
        }
    }
}

/// Output of a normalization pass.
#[derive(Clone, Debug, PartialEq)]
pub struct Normalized {
    /// Id(s) of the top-level document(s).
    pub result: NormalizedResult,
    /// Every entity found, grouped by type and keyed by id.
    pub entities: EntityTables,
}

impl Normalized {
    /// Returns the table of one type.
    #[must_use]
    pub fn table(&self, schema: &str) -> Option<&Slice> {
        self.entities.get(schema)
    }

    /// Returns one normalized record.
    #[must_use]
    pub fn record(&self, schema: &str, id: &str) -> Option<&Record> {
        self.table(schema).and_then(|t| t.get(id))
    }
}

/// Flattens nested documents into entity tables.
pub trait Normalizer {
    /// Normalizes one document of type `schema`.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidInput` error if the document does not fit the schema.
    fn normalize(&self, document: &Value, schema: ResolvedSchema<'_>) -> Result<Normalized>;

    /// Normalizes a sequence of documents of type `schema`.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidInput` error if any document does not fit the schema.
    fn normalize_many(
        &self,
        documents: &[Value],
        schema: ResolvedSchema<'_>,
    ) -> Result<Normalized>;
}

/// Built-in normalizer for JSON documents.
///
/// - Nested objects under reference attributes become records of the target
///   type and are replaced by their id (a sequence of ids for many references).
/// - Bare strings or numbers under reference attributes are taken as ids.
/// - Computed attributes are dropped; undeclared attributes are kept verbatim.
/// - An entity met twice is shallow-merged, later occurrences winning.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonNormalizer;

impl JsonNormalizer {
    /// Creates a normalizer.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn visit(
        &self,
        value: &Value,
        schema: ResolvedSchema<'_>,
        tables: &mut EntityTables,
    ) -> Result<EntityId> {
        let at = || ErrorContext::new().with_schema(schema.name());

        let object = value.as_object().ok_or_else(|| {
            Error::invalid_input("expected an object for an entity").with_context(at())
        })?;
        let id_attribute = schema.id_attribute();
        let id = object
            .get(id_attribute)
            .and_then(EntityId::from_json)
            .ok_or_else(|| Error::invalid_input("entity has no id").with_context(at()))?;

        let mut attributes = Vec::with_capacity(object.len());
        for (name, value) in object {
            if name == id_attribute {
                continue;
            }
            let normalized = match schema.attribute(name) {
                Some(AttributeSpec::Computed(_)) => continue,
                Some(AttributeSpec::RefOne { .. } | AttributeSpec::RefMany { .. }) => self
                    .visit_reference(value, schema, name, tables)
                    .map_err(|e| match e.context {
                        Some(_) => e,
                        None => e.with_context(at().with_attribute(name)),
                    })?,
                Some(AttributeSpec::Plain { .. }) | None => value.clone(),
            };
            attributes.push((name.clone(), normalized));
        }

        let record = Record::from_attributes(id.clone(), attributes);
        let table = tables.get(schema.key()).cloned().unwrap_or_default();
        tables.insert(schema.key().to_string(), table.upsert(&record));
        Ok(id)
    }

    fn visit_reference(
        &self,
        value: &Value,
        schema: ResolvedSchema<'_>,
        attribute: &str,
        tables: &mut EntityTables,
    ) -> Result<Value> {
        let Some((target, is_many)) = schema.reference(attribute) else {
            return Ok(value.clone());
        };
        if !is_many {
            return self.visit_id(value, target, tables);
        }
        match value {
            Value::Null => Ok(Value::Null),
            Value::Array(items) => items
                .iter()
                .map(|item| self.visit_id(item, target, tables))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            _ => Err(Error::invalid_input("expected an array for a many reference")),
        }
    }

    fn visit_id(
        &self,
        value: &Value,
        target: ResolvedSchema<'_>,
        tables: &mut EntityTables,
    ) -> Result<Value> {
        match value {
            Value::Null => Ok(Value::Null),
            Value::Object(_) => Ok(self.visit(value, target, tables)?.to_json()),
            Value::String(_) | Value::Number(_) => {
                Ok(EntityId::from_json(value).map_or(Value::Null, |id| id.to_json()))
            }
            _ => Err(Error::invalid_input("expected an entity or an id for a reference")),
        }
    }
}

impl Normalizer for JsonNormalizer {
    fn normalize(&self, document: &Value, schema: ResolvedSchema<'_>) -> Result<Normalized> {
        let mut entities = EntityTables::new();
        let id = self.visit(document, schema, &mut entities)?;
        Ok(Normalized {
            result: NormalizedResult::One(id),
            entities,
        })
    }

    fn normalize_many(
        &self,
        documents: &[Value],
        schema: ResolvedSchema<'_>,
    ) -> Result<Normalized> {
        let mut entities = EntityTables::new();
        let ids = documents
            .iter()
            .map(|document| self.visit(document, schema, &mut entities))
            .collect::<Result<Vec<_>>>()?;
        Ok(Normalized {
            result: NormalizedResult::Many(ids),
            entities,
        })
    }
}
