//! Pure state transitions for entity operations.
//!
//! A [`TypeReducer`] owns the transition of one type's [`Slice`]; a
//! [`StoreReducer`] combines one type reducer per schema into a transition
//! of the whole [`StoreState`] and flattens [`Action::Batch`] into a single
//! sequential fold. Reducers are total: every well-formed operation yields a
//! state, and actions that do not belong to this crate pass through untouched.

use normstore_foundation::{EntityId, Error, Record, Result, Value};
use normstore_schema::{ResolvedSchema, ResolvedSchemaSet};
use tracing::{trace, warn};

use crate::normalize::Normalized;
use crate::operation::{CreateData, Operation, Payload};
use crate::slice::Slice;
use crate::state::StoreState;

/// Something dispatched at the store.
#[derive(Clone, Debug, PartialEq)]
pub enum Action {
    /// An entity operation.
    Entity(Operation),
    /// A group of actions applied as one transition.
    Batch(Vec<Action>),
    /// An action belonging to some other part of the host; ignored.
    Foreign(String),
}

impl Action {
    /// Groups operations into one atomic batch, marking each as atomic.
    #[must_use]
    pub fn batch<I>(operations: I) -> Self
    where
        I: IntoIterator<Item = Operation>,
    {
        Self::Batch(
            operations
                .into_iter()
                .map(|op| Self::Entity(op.atomic()))
                .collect(),
        )
    }
}

impl From<Operation> for Action {
    fn from(operation: Operation) -> Self {
        Self::Entity(operation)
    }
}

/// Transition function for one type's slice.
#[derive(Clone, Debug)]
pub struct TypeReducer {
    key: String,
    defaults: Vec<(String, Value)>,
    initial: Slice,
}

/// Creates the reducer for one schema's slice.
#[must_use]
pub fn create_type_reducer(schema: ResolvedSchema<'_>, initial: Option<Slice>) -> TypeReducer {
    TypeReducer {
        key: schema.key().to_string(),
        defaults: schema
            .defaults()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect(),
        initial: initial.unwrap_or_default(),
    }
}

impl TypeReducer {
    /// Returns the key of the slice this reducer owns.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the slice used when the state has none.
    #[must_use]
    pub fn initial(&self) -> &Slice {
        &self.initial
    }

    /// Applies one operation to the slice.
    ///
    /// Create and update operations also carry records of related types
    /// surfaced by normalization; every type reducer picks up its own table.
    /// Rename and delete only touch the slice of the operation's type.
    /// Returns a slice `ptr_eq` to the input when nothing changes.
    #[must_use]
    pub fn reduce(&self, slice: &Slice, operation: &Operation) -> Slice {
        let own = operation.schema() == self.key;

        match operation.payload() {
            Payload::Create { data, .. } => match data {
                CreateData::Normalized(normalized) => match self.table(normalized) {
                    Some(table) => {
                        trace!(schema = %self.key, records = table.len(), "create");
                        slice.overwrite_with(table)
                    }
                    None => slice.clone(),
                },
                CreateData::Raw(records) if own => {
                    trace!(schema = %self.key, records = records.len(), "create raw");
                    records
                        .iter()
                        .fold(slice.clone(), |s, record| s.insert(record.clone()))
                }
                CreateData::Raw(_) => slice.clone(),
            },
            Payload::Update {
                id,
                data,
                use_defaults,
            } => match self.table(data) {
                Some(table) => table.iter().fold(slice.clone(), |s, record| {
                    if own && *use_defaults && record.id() == id {
                        trace!(schema = %self.key, %id, "replace with defaults");
                        s.insert(self.defaults_for(id).merge(record))
                    } else {
                        trace!(schema = %self.key, id = %record.id(), "merge");
                        s.upsert(record)
                    }
                }),
                None => slice.clone(),
            },
            Payload::UpdateMany { data, .. } => match self.table(data) {
                Some(table) => {
                    trace!(schema = %self.key, records = table.len(), "merge many");
                    slice.merge_with(table)
                }
                None => slice.clone(),
            },
            Payload::Rename { old_id, new_id } if own => {
                trace!(schema = %self.key, %old_id, %new_id, "rename");
                slice.rename(old_id.as_str(), new_id)
            }
            Payload::Delete { id } if own => {
                trace!(schema = %self.key, %id, "delete");
                slice.remove(id.as_str())
            }
            Payload::Rename { .. } | Payload::Delete { .. } => slice.clone(),
        }
    }

    fn table<'a>(&self, normalized: &'a Normalized) -> Option<&'a Slice> {
        normalized.table(&self.key).filter(|t| !t.is_empty())
    }

    fn defaults_for(&self, id: &EntityId) -> Record {
        Record::from_attributes(id.clone(), self.defaults.iter().cloned())
    }
}

/// Transition function for the whole store.
#[derive(Clone, Debug)]
pub struct StoreReducer {
    reducers: Vec<TypeReducer>,
}

/// Creates the store reducer for every schema of a resolved set.
///
/// Entries of `initial_state` for types outside the set are ignored.
///
/// # Errors
///
/// Returns an `InvalidSchemas` error if the set is empty.
pub fn create_store_reducer(
    schemas: &ResolvedSchemaSet,
    initial_state: &StoreState,
) -> Result<StoreReducer> {
    create_store_reducer_for(schemas.iter(), initial_state)
}

/// Creates the store reducer for a chosen subset of schemas.
///
/// # Errors
///
/// Returns an `InvalidSchemas` error if `schemas` yields nothing.
pub fn create_store_reducer_for<'a, I>(
    schemas: I,
    initial_state: &StoreState,
) -> Result<StoreReducer>
where
    I: IntoIterator<Item = ResolvedSchema<'a>>,
{
    let reducers: Vec<TypeReducer> = schemas
        .into_iter()
        .map(|schema| create_type_reducer(schema, initial_state.slice(schema.key()).cloned()))
        .collect();
    if reducers.is_empty() {
        return Err(Error::invalid_schemas("no schemas to reduce"));
    }
    for name in initial_state.schemas() {
        if !reducers.iter().any(|r| r.key == name) {
            warn!(schema = name, "ignoring initial state for unknown schema");
        }
    }
    Ok(StoreReducer { reducers })
}

impl StoreReducer {
    /// Returns the per-type reducers.
    #[must_use]
    pub fn reducers(&self) -> &[TypeReducer] {
        &self.reducers
    }

    /// Returns the state before any operation: one slice per type.
    #[must_use]
    pub fn initial_state(&self) -> StoreState {
        self.reducers
            .iter()
            .map(|r| (r.key.clone(), r.initial.clone()))
            .collect()
    }

    /// Applies one operation.
    ///
    /// Slices that do not change are shared with `state`; if no slice changes
    /// the returned state is `ptr_eq` to `state`.
    #[must_use]
    pub fn apply_operation(&self, state: &StoreState, operation: &Operation) -> StoreState {
        self.reducers.iter().fold(state.clone(), |next, reducer| {
            let current = next.slice(&reducer.key).unwrap_or(&reducer.initial);
            let reduced = reducer.reduce(current, operation);
            if next.slice(&reducer.key).is_some_and(|s| s.ptr_eq(&reduced)) {
                next
            } else {
                next.with_slice(reducer.key.clone(), reduced)
            }
        })
    }

    /// Applies operations in order as one transition.
    #[must_use]
    pub fn apply_batch<'a, I>(&self, state: &StoreState, operations: I) -> StoreState
    where
        I: IntoIterator<Item = &'a Operation>,
    {
        operations
            .into_iter()
            .fold(state.clone(), |next, op| self.apply_operation(&next, op))
    }

    /// Applies an action, flattening nested batches and ignoring foreign
    /// actions.
    #[must_use]
    pub fn reduce(&self, state: &StoreState, action: &Action) -> StoreState {
        match action {
            Action::Entity(operation) => self.apply_operation(state, operation),
            Action::Batch(actions) => actions
                .iter()
                .fold(state.clone(), |next, action| self.reduce(&next, action)),
            Action::Foreign(_) => state.clone(),
        }
    }
}
