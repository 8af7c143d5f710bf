//! normstore - Normalized relational entity store
//!
//! This crate re-exports all layers of the normstore system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 2: normstore_storage    - Normalization, operations, reducers, store container
//! Layer 1: normstore_schema     - Schema descriptors, relation inference
//! Layer 0: normstore_foundation - Core types (EntityId, Record, Error)
//! ```

pub use normstore_foundation as foundation;
pub use normstore_schema as schema;
pub use normstore_storage as storage;
