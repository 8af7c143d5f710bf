//! Entity operations and their construction.
//!
//! An [`Operation`] is an immutable description of one intended state change
//! on one entity type. Operations are built by an [`OperationBuilder`], which
//! validates the input, assigns missing ids, and normalizes raw documents
//! against the resolved schema. All validation happens here so that applying
//! an operation never fails.

use normstore_foundation::{
    EntityId, Error, IdGenerator, Record, Result, SeededIdGenerator, Value,
};
use normstore_schema::{ResolvedSchema, ResolvedSchemaSet};
use tracing::debug;

use crate::normalize::{JsonNormalizer, Normalized, Normalizer};

/// The CRUD shape of an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Add one record (and any nested records).
    CreateOne,
    /// Add one or more records (and any nested records).
    CreateMany,
    /// Update one record by id.
    UpdateOne,
    /// Apply the same update to several ids.
    UpdateMany,
    /// Move a record to a new id.
    RenameId,
    /// Remove one record.
    DeleteOne,
}

/// Records carried by a create operation.
#[derive(Clone, Debug, PartialEq)]
pub enum CreateData {
    /// Output of the normalizer; may span several types.
    Normalized(Normalized),
    /// Records stored verbatim in the operation's own slice.
    Raw(Vec<Record>),
}

/// Data carried by an operation.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    /// Payload of [`OperationKind::CreateOne`] and [`OperationKind::CreateMany`].
    Create {
        /// Records to add.
        data: CreateData,
        /// The input document(s), with assigned ids.
        raw: Value,
    },
    /// Payload of [`OperationKind::UpdateOne`].
    Update {
        /// Target id.
        id: EntityId,
        /// Normalized `{id, ...data}`.
        data: Normalized,
        /// Reset attributes missing from `data` to schema defaults.
        use_defaults: bool,
    },
    /// Payload of [`OperationKind::UpdateMany`].
    UpdateMany {
        /// Target ids.
        ids: Vec<EntityId>,
        /// Normalized `{id, ...data}` for every id.
        data: Normalized,
    },
    /// Payload of [`OperationKind::RenameId`].
    Rename {
        /// Current id.
        old_id: EntityId,
        /// Replacement id.
        new_id: EntityId,
    },
    /// Payload of [`OperationKind::DeleteOne`].
    Delete {
        /// Id to remove.
        id: EntityId,
    },
}

/// Flags attached to an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OperationMeta {
    /// Marks operations produced by this crate.
    pub is_entity_operation: bool,
    /// Marks membership in an atomic batch.
    pub atomic: bool,
}

impl Default for OperationMeta {
    fn default() -> Self {
        Self {
            is_entity_operation: true,
            atomic: false,
        }
    }
}

/// An immutable description of one state change.
#[derive(Clone, Debug, PartialEq)]
pub struct Operation {
    kind: OperationKind,
    schema: String,
    payload: Payload,
    meta: OperationMeta,
}

impl Operation {
    fn new(kind: OperationKind, schema: &str, payload: Payload) -> Self {
        Self {
            kind,
            schema: schema.to_string(),
            payload,
            meta: OperationMeta::default(),
        }
    }

    /// Returns the CRUD shape.
    #[must_use]
    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    /// Returns the target type name.
    #[must_use]
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Returns the payload.
    #[must_use]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Returns the flags.
    #[must_use]
    pub fn meta(&self) -> OperationMeta {
        self.meta
    }

    /// Returns this operation marked as a batch member.
    #[must_use]
    pub fn atomic(mut self) -> Self {
        self.meta.atomic = true;
        self
    }
}

/// Options for create operations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CreateOptions {
    /// Store the input verbatim instead of normalizing it.
    pub skip_normalization: bool,
}

impl CreateOptions {
    /// Creates the default options (normalize input).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set `skip_normalization`.
    #[must_use]
    pub fn with_skip_normalization(mut self, skip: bool) -> Self {
        self.skip_normalization = skip;
        self
    }
}

/// What to delete: a bare id or a record-like value carrying one.
#[derive(Clone, Debug, PartialEq)]
pub enum DeleteTarget {
    /// A bare id.
    Id(EntityId),
    /// A JSON value: an id string/number or an object with an id attribute.
    Value(Value),
}

impl From<&str> for DeleteTarget {
    fn from(id: &str) -> Self {
        Self::Id(EntityId::new(id))
    }
}

impl From<String> for DeleteTarget {
    fn from(id: String) -> Self {
        Self::Id(EntityId::from(id))
    }
}

impl From<EntityId> for DeleteTarget {
    fn from(id: EntityId) -> Self {
        Self::Id(id)
    }
}

impl From<&Record> for DeleteTarget {
    fn from(record: &Record) -> Self {
        Self::Id(record.id().clone())
    }
}

impl From<Value> for DeleteTarget {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// Builds validated, normalized operations.
///
/// Holds the resolved schema graph, the normalizer, and the id generator;
/// nothing is looked up from global state.
#[derive(Clone, Debug)]
pub struct OperationBuilder<N = JsonNormalizer, G = SeededIdGenerator> {
    schemas: ResolvedSchemaSet,
    normalizer: N,
    ids: G,
}

impl OperationBuilder {
    /// Creates a builder with the JSON normalizer and entropy-seeded ids.
    #[must_use]
    pub fn new(schemas: ResolvedSchemaSet) -> Self {
        Self::with_parts(schemas, JsonNormalizer, SeededIdGenerator::from_entropy())
    }
}

impl<N: Normalizer, G: IdGenerator> OperationBuilder<N, G> {
    /// Creates a builder from explicit collaborators.
    #[must_use]
    pub fn with_parts(schemas: ResolvedSchemaSet, normalizer: N, ids: G) -> Self {
        Self {
            schemas,
            normalizer,
            ids,
        }
    }

    /// Returns the schema graph.
    #[must_use]
    pub fn schemas(&self) -> &ResolvedSchemaSet {
        &self.schemas
    }

    /// Builds a create operation for one record.
    ///
    /// A missing (or null) id is replaced with a generated one.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidInput` error if `schema` is unknown, `data` is not an
    /// object, or normalization fails.
    pub fn create_one(
        &mut self,
        schema: &str,
        data: Value,
        options: CreateOptions,
    ) -> Result<Operation> {
        let target = self.schemas.require(schema)?;
        let raw = with_id(data, target, &mut self.ids)?;
        let data = if options.skip_normalization {
            CreateData::Raw(vec![raw_record(&raw, target)?])
        } else {
            CreateData::Normalized(self.normalizer.normalize(&raw, target)?)
        };
        debug!(schema, kind = "create_one", "built entity operation");
        Ok(Operation::new(
            OperationKind::CreateOne,
            schema,
            Payload::Create { data, raw },
        ))
    }

    /// Builds a create operation for a record or a sequence of records.
    ///
    /// Missing ids are assigned per element.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidInput` error if `schema` is unknown, any record is
    /// not an object, or normalization fails.
    pub fn create_many(
        &mut self,
        schema: &str,
        data: Value,
        options: CreateOptions,
    ) -> Result<Operation> {
        let target = self.schemas.require(schema)?;
        let (data, raw) = match data {
            Value::Array(items) => {
                let items = items
                    .into_iter()
                    .map(|item| with_id(item, target, &mut self.ids))
                    .collect::<Result<Vec<_>>>()?;
                let data = if options.skip_normalization {
                    CreateData::Raw(
                        items
                            .iter()
                            .map(|item| raw_record(item, target))
                            .collect::<Result<_>>()?,
                    )
                } else {
                    CreateData::Normalized(self.normalizer.normalize_many(&items, target)?)
                };
                (data, Value::Array(items))
            }
            single => {
                let raw = with_id(single, target, &mut self.ids)?;
                let data = if options.skip_normalization {
                    CreateData::Raw(vec![raw_record(&raw, target)?])
                } else {
                    CreateData::Normalized(self.normalizer.normalize(&raw, target)?)
                };
                (data, raw)
            }
        };
        debug!(schema, kind = "create_many", "built entity operation");
        Ok(Operation::new(
            OperationKind::CreateMany,
            schema,
            Payload::Create { data, raw },
        ))
    }

    /// Builds an update operation for one id.
    ///
    /// With `use_defaults` the stored record is replaced by the schema's
    /// defaults overlaid with `data`; otherwise `data` is merged into it.
    /// The explicit `id` wins over any id inside `data`.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidInput` error if `schema` is unknown, `data` is not an
    /// object, or normalization fails.
    pub fn update_one(
        &self,
        schema: &str,
        id: impl Into<EntityId>,
        data: Value,
        use_defaults: bool,
    ) -> Result<Operation> {
        let target = self.schemas.require(schema)?;
        let id = id.into();
        let document = with_explicit_id(data, target, &id)?;
        let data = self.normalizer.normalize(&document, target)?;
        debug!(schema, %id, use_defaults, kind = "update_one", "built entity operation");
        Ok(Operation::new(
            OperationKind::UpdateOne,
            schema,
            Payload::Update {
                id,
                data,
                use_defaults,
            },
        ))
    }

    /// Builds an update operation applying the same `data` to every id.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidInput` error if `schema` is unknown, `data` is not an
    /// object, or normalization fails.
    pub fn update_many<I, T>(&self, schema: &str, ids: I, data: Value) -> Result<Operation>
    where
        I: IntoIterator<Item = T>,
        T: Into<EntityId>,
    {
        let target = self.schemas.require(schema)?;
        let ids: Vec<EntityId> = ids.into_iter().map(Into::into).collect();
        let documents = ids
            .iter()
            .map(|id| with_explicit_id(data.clone(), target, id))
            .collect::<Result<Vec<_>>>()?;
        let data = self.normalizer.normalize_many(&documents, target)?;
        debug!(schema, count = ids.len(), kind = "update_many", "built entity operation");
        Ok(Operation::new(
            OperationKind::UpdateMany,
            schema,
            Payload::UpdateMany { ids, data },
        ))
    }

    /// Builds an operation moving a record from `old_id` to `new_id`.
    ///
    /// References to `old_id` held by other records are not rewritten.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidInput` error if `schema` is unknown.
    pub fn rename_id(
        &self,
        schema: &str,
        old_id: impl Into<EntityId>,
        new_id: impl Into<EntityId>,
    ) -> Result<Operation> {
        self.schemas.require(schema)?;
        let (old_id, new_id) = (old_id.into(), new_id.into());
        debug!(schema, %old_id, %new_id, kind = "rename_id", "built entity operation");
        Ok(Operation::new(
            OperationKind::RenameId,
            schema,
            Payload::Rename { old_id, new_id },
        ))
    }

    /// Builds an operation removing one record.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidInput` error if `schema` is unknown or no id can be
    /// read from `target`.
    pub fn delete_one(&self, schema: &str, target: impl Into<DeleteTarget>) -> Result<Operation> {
        let resolved = self.schemas.require(schema)?;
        let id = match target.into() {
            DeleteTarget::Id(id) => id,
            DeleteTarget::Value(Value::Object(object)) => object
                .get(resolved.id_attribute())
                .and_then(EntityId::from_json)
                .ok_or_else(|| Error::invalid_input("record has no id"))?,
            DeleteTarget::Value(value) => EntityId::from_json(&value)
                .ok_or_else(|| Error::invalid_input("expected an id or a record"))?,
        };
        debug!(schema, %id, kind = "delete_one", "built entity operation");
        Ok(Operation::new(
            OperationKind::DeleteOne,
            schema,
            Payload::Delete { id },
        ))
    }
}

fn with_id<G: IdGenerator>(data: Value, schema: ResolvedSchema<'_>, ids: &mut G) -> Result<Value> {
    let Value::Object(mut object) = data else {
        return Err(Error::invalid_input(format!(
            "expected an object for {}",
            schema.name()
        )));
    };
    let id_attribute = schema.id_attribute();
    if object.get(id_attribute).is_none_or(Value::is_null) {
        object.insert(id_attribute.to_string(), ids.generate_id().to_json());
    }
    Ok(Value::Object(object))
}

fn with_explicit_id(data: Value, schema: ResolvedSchema<'_>, id: &EntityId) -> Result<Value> {
    let mut object = match data {
        Value::Object(object) => object,
        Value::Null => serde_json::Map::new(),
        _ => {
            return Err(Error::invalid_input(format!(
                "expected an object for {}",
                schema.name()
            )));
        }
    };
    object.insert(schema.id_attribute().to_string(), id.to_json());
    Ok(Value::Object(object))
}

fn raw_record(data: &Value, schema: ResolvedSchema<'_>) -> Result<Record> {
    Record::from_json(data, schema.id_attribute())
        .ok_or_else(|| Error::invalid_input(format!("record for {} has no id", schema.name())))
}
