//! Core types, records, ids, and errors for normstore.
//!
//! This crate provides:
//! - [`EntityId`] - String primary keys
//! - [`Record`] - Flat, normalized entity records with persistent attributes
//! - [`IdGenerator`] - Id sources for records created without a key
//! - [`Error`] - Construction-time error types with context

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod entity;
pub mod error;
pub mod id;
pub mod record;

pub use entity::EntityId;
pub use error::{Error, ErrorContext, ErrorKind};
pub use id::{IdGenerator, SeededIdGenerator, SequentialIdGenerator};
pub use record::Record;

/// Result type alias using the normstore [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// JSON value type used for documents and attribute values.
pub use serde_json::Value;
