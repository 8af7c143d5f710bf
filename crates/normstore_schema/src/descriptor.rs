//! Schema descriptors for entity types.
//!
//! A [`SchemaDescriptor`] declares one entity type: its name, its attributes,
//! and for reference attributes the target type and multiplicity.
//! Descriptors are plain data; they are validated and linked together by
//! [`resolve`](crate::resolve).

use std::fmt;

use normstore_foundation::{Record, Value};

/// Function deriving a computed attribute from a stored record.
pub type ComputedFn = fn(&Record) -> Value;

/// Declaration of a single attribute.
#[derive(Clone)]
pub enum AttributeSpec {
    /// A stored value with no relation semantics.
    Plain {
        /// Value used when a record is reset to defaults.
        default: Option<Value>,
    },
    /// A derived value that is never stored.
    Computed(ComputedFn),
    /// Holds the id of one record of `target`.
    RefOne {
        /// Target type name.
        target: String,
        /// Explicit reciprocal attribute on the target type.
        inverse: Option<String>,
    },
    /// Holds a sequence of ids of records of `target`.
    RefMany {
        /// Target type name.
        target: String,
        /// Explicit reciprocal attribute on the target type.
        inverse: Option<String>,
    },
}

impl AttributeSpec {
    /// A plain attribute without a default.
    #[must_use]
    pub fn plain() -> Self {
        Self::Plain { default: None }
    }

    /// A plain attribute with a default value.
    #[must_use]
    pub fn with_default(default: Value) -> Self {
        Self::Plain {
            default: Some(default),
        }
    }

    /// A single reference to `target`.
    #[must_use]
    pub fn one(target: impl Into<String>) -> Self {
        Self::RefOne {
            target: target.into(),
            inverse: None,
        }
    }

    /// A many reference to `target`.
    #[must_use]
    pub fn many(target: impl Into<String>) -> Self {
        Self::RefMany {
            target: target.into(),
            inverse: None,
        }
    }

    /// Names the reciprocal attribute on the target type.
    ///
    /// Has no effect on non-reference attributes.
    #[must_use]
    pub fn inverse(self, name: impl Into<String>) -> Self {
        match self {
            Self::RefOne { target, .. } => Self::RefOne {
                target,
                inverse: Some(name.into()),
            },
            Self::RefMany { target, .. } => Self::RefMany {
                target,
                inverse: Some(name.into()),
            },
            other => other,
        }
    }

    /// Returns the referenced type name for reference attributes.
    #[must_use]
    pub fn target(&self) -> Option<&str> {
        match self {
            Self::RefOne { target, .. } | Self::RefMany { target, .. } => Some(target),
            Self::Plain { .. } | Self::Computed(_) => None,
        }
    }

    /// Returns the explicitly named reciprocal attribute, if any.
    #[must_use]
    pub fn explicit_inverse(&self) -> Option<&str> {
        match self {
            Self::RefOne { inverse, .. } | Self::RefMany { inverse, .. } => inverse.as_deref(),
            Self::Plain { .. } | Self::Computed(_) => None,
        }
    }

    /// Returns true for reference attributes.
    #[must_use]
    pub fn is_reference(&self) -> bool {
        self.target().is_some()
    }

    /// Returns true for many references.
    #[must_use]
    pub fn is_many(&self) -> bool {
        matches!(self, Self::RefMany { .. })
    }

    /// Returns true for computed attributes.
    #[must_use]
    pub fn is_computed(&self) -> bool {
        matches!(self, Self::Computed(_))
    }
}

impl fmt::Debug for AttributeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain { default } => f.debug_struct("Plain").field("default", default).finish(),
            Self::Computed(_) => f.write_str("Computed(<fn>)"),
            Self::RefOne { target, inverse } => f
                .debug_struct("RefOne")
                .field("target", target)
                .field("inverse", inverse)
                .finish(),
            Self::RefMany { target, inverse } => f
                .debug_struct("RefMany")
                .field("target", target)
                .field("inverse", inverse)
                .finish(),
        }
    }
}

/// Per-type options.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemaOptions {
    /// Attribute holding the primary key in raw documents.
    pub id_attribute: String,
}

impl Default for SchemaOptions {
    fn default() -> Self {
        Self {
            id_attribute: "id".to_string(),
        }
    }
}

impl SchemaOptions {
    /// Sets the id attribute.
    #[must_use]
    pub fn with_id_attribute(mut self, id_attribute: impl Into<String>) -> Self {
        self.id_attribute = id_attribute.into();
        self
    }
}

/// Declaration of an entity type.
#[derive(Clone, Debug)]
pub struct SchemaDescriptor {
    /// Type name (e.g., `"Article"`).
    pub name: String,
    /// Attribute declarations, in declaration order.
    pub attributes: Vec<(String, AttributeSpec)>,
    /// Per-type options.
    pub options: SchemaOptions,
}

impl SchemaDescriptor {
    /// Creates a descriptor with no attributes.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            options: SchemaOptions::default(),
        }
    }

    /// Adds an attribute declaration.
    ///
    /// Redeclaring an attribute replaces the earlier declaration in place.
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, spec: AttributeSpec) -> Self {
        let name = name.into();
        if let Some(slot) = self.attributes.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = spec;
        } else {
            self.attributes.push((name, spec));
        }
        self
    }

    /// Adds a plain attribute without a default.
    #[must_use]
    pub fn with_plain(self, name: impl Into<String>) -> Self {
        self.with_attribute(name, AttributeSpec::plain())
    }

    /// Adds a plain attribute with a default value.
    #[must_use]
    pub fn with_default(self, name: impl Into<String>, default: Value) -> Self {
        self.with_attribute(name, AttributeSpec::with_default(default))
    }

    /// Adds a computed attribute.
    #[must_use]
    pub fn with_computed(self, name: impl Into<String>, compute: ComputedFn) -> Self {
        self.with_attribute(name, AttributeSpec::Computed(compute))
    }

    /// Adds a single reference to `target`.
    #[must_use]
    pub fn with_one(self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.with_attribute(name, AttributeSpec::one(target))
    }

    /// Adds a many reference to `target`.
    #[must_use]
    pub fn with_many(self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.with_attribute(name, AttributeSpec::many(target))
    }

    /// Names the reciprocal of an already declared reference attribute.
    #[must_use]
    pub fn with_inverse(mut self, name: &str, inverse: impl Into<String>) -> Self {
        if let Some(slot) = self.attributes.iter_mut().find(|(n, _)| n == name) {
            slot.1 = slot.1.clone().inverse(inverse);
        }
        self
    }

    /// Replaces the options.
    #[must_use]
    pub fn with_options(mut self, options: SchemaOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns an attribute declaration by name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&AttributeSpec> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, spec)| spec)
    }
}
