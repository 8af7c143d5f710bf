//! Normalization, entity operations, reducers, and store state for normstore.
//!
//! This crate provides:
//! - [`Normalizer`] - Flattening of nested documents into entity tables
//! - [`OperationBuilder`] - Construction of create, update, rename, and delete operations
//! - [`StoreReducer`] - Pure transitions of the whole [`StoreState`]
//! - [`Slice`] - Immutable per-type record tables with structural sharing
//! - [`Store`] - Single-writer container with subscriptions and undo

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod normalize;
pub mod operation;
pub mod reducer;
pub mod slice;
pub mod state;
pub mod store;

pub use normalize::{EntityTables, JsonNormalizer, Normalized, NormalizedResult, Normalizer};
pub use operation::{
    CreateData, CreateOptions, DeleteTarget, Operation, OperationBuilder, OperationKind,
    OperationMeta, Payload,
};
pub use reducer::{
    Action, StoreReducer, TypeReducer, create_store_reducer, create_store_reducer_for,
    create_type_reducer,
};
pub use slice::Slice;
pub use state::StoreState;
pub use store::{Store, StoreConfig, SubscriptionId};
