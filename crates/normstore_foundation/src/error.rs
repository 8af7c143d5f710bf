//! Error types for the normstore system.
//!
//! Uses `thiserror` for ergonomic error definition with rich context.
//! Every error is raised while resolving schemas or constructing operations;
//! applying an operation to a state never fails.

use std::fmt;

use thiserror::Error;

/// The main error type for normstore operations.
#[derive(Debug, Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional context about where the error occurred.
    pub context: Option<ErrorContext>,
}

impl Error {
    /// Creates a new error with the given kind.
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            context: None,
        }
    }

    /// Adds context to this error.
    #[must_use]
    pub fn with_context(mut self, context: ErrorContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Creates an invalid schema error.
    #[must_use]
    pub fn invalid_schema(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidSchema(message.into()))
    }

    /// Creates an invalid schema set error.
    #[must_use]
    pub fn invalid_schemas(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidSchemas(message.into()))
    }

    /// Creates an invalid input error.
    #[must_use]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput(message.into()))
    }

    /// Returns true if this is an [`ErrorKind::InvalidSchema`] error.
    #[must_use]
    pub fn is_invalid_schema(&self) -> bool {
        matches!(self.kind, ErrorKind::InvalidSchema(_))
    }

    /// Returns true if this is an [`ErrorKind::InvalidSchemas`] error.
    #[must_use]
    pub fn is_invalid_schemas(&self) -> bool {
        matches!(self.kind, ErrorKind::InvalidSchemas(_))
    }

    /// Returns true if this is an [`ErrorKind::InvalidInput`] error.
    #[must_use]
    pub fn is_invalid_input(&self) -> bool {
        matches!(self.kind, ErrorKind::InvalidInput(_))
    }
}

/// Categorized error kinds for pattern matching.
#[derive(Debug, Error)]
pub enum ErrorKind {
    /// A schema descriptor is malformed or its relations are inconsistent.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// The schema set is empty or not a collection.
    #[error("invalid schemas: {0}")]
    InvalidSchemas(String),

    /// An operation was constructed from unusable input.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Context about where an error occurred.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// Schema (entity type) being processed.
    pub schema: Option<String>,
    /// Attribute being processed.
    pub attribute: Option<String>,
}

impl ErrorContext {
    /// Creates a new empty context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the schema name.
    #[must_use]
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Sets the attribute name.
    #[must_use]
    pub fn with_attribute(mut self, attribute: impl Into<String>) -> Self {
        self.attribute = Some(attribute.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.schema, &self.attribute) {
            (Some(schema), Some(attribute)) => write!(f, "at {schema}.{attribute}"),
            (Some(schema), None) => write!(f, "at {schema}"),
            (None, Some(attribute)) => write!(f, "at .{attribute}"),
            (None, None) => Ok(()),
        }
    }
}
