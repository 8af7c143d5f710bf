//! Schema descriptors and relation inference for normstore.
//!
//! This crate provides:
//! - [`SchemaDescriptor`] - Declarations of entity types and their attributes
//! - [`resolve`] - Two-phase resolution into a [`ResolvedSchemaSet`]
//! - [`Relation`] - Outgoing relations with inferred reciprocals
//! - [`resolve_json`] - Loading declarations from JSON

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod descriptor;
pub mod resolve;

pub use config::resolve_json;
pub use descriptor::{AttributeSpec, ComputedFn, SchemaDescriptor, SchemaOptions};
pub use resolve::{Relation, ResolvedSchema, ResolvedSchemaSet, SchemaId, resolve};
