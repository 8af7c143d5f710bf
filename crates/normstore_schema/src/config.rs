//! Loading schema declarations from JSON.
//!
//! A schema set is a JSON array of declarations:
//!
//! ```json
//! [
//!   { "name": "Article",
//!     "attributes": {
//!       "title": null,
//!       "status": { "default": "draft" },
//!       "author": "User",
//!       "tags": { "hasMany": "Tag" },
//!       "editor": { "hasOne": "User", "inverse": "edited" }
//!     },
//!     "options": { "idAttribute": "id" } }
//! ]
//! ```
//!
//! Computed attributes are functions and cannot be declared in JSON.

use normstore_foundation::{Error, ErrorContext, Result, Value};

use crate::descriptor::{AttributeSpec, SchemaDescriptor, SchemaOptions};
use crate::resolve::{ResolvedSchemaSet, resolve};

/// Resolves a JSON array of schema declarations.
///
/// # Errors
///
/// Returns an `InvalidSchemas` error if `value` is not a non-empty array, and
/// an `InvalidSchema` error for any malformed declaration or any failure
/// reported by [`resolve`].
pub fn resolve_json(value: &Value) -> Result<ResolvedSchemaSet> {
    let Value::Array(items) = value else {
        return Err(Error::invalid_schemas("schema set is not a collection"));
    };
    if items.is_empty() {
        return Err(Error::invalid_schemas("schema set is empty"));
    }
    let descriptors = items
        .iter()
        .map(SchemaDescriptor::from_json)
        .collect::<Result<Vec<_>>>()?;
    resolve(descriptors)
}

impl SchemaDescriptor {
    /// Reads one declaration from JSON.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidSchema` error if the declaration is not an object,
    /// has no non-empty `name`, or contains a malformed attribute or option.
    pub fn from_json(value: &Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| Error::invalid_schema("schema declaration is not an object"))?;

        let name = match object.get("name") {
            Some(Value::String(name)) if !name.is_empty() => name.clone(),
            _ => return Err(Error::invalid_schema("schema declaration is missing a name")),
        };
        let at = || ErrorContext::new().with_schema(&name);

        let mut descriptor = SchemaDescriptor::new(name.clone());

        match object.get("attributes") {
            None | Some(Value::Null) => {}
            Some(Value::Object(attributes)) => {
                for (attribute, spec) in attributes {
                    let spec = attribute_from_json(spec).map_err(|e| {
                        e.with_context(at().with_attribute(attribute))
                    })?;
                    descriptor = descriptor.with_attribute(attribute.clone(), spec);
                }
            }
            Some(_) => {
                return Err(Error::invalid_schema("attributes must be an object").with_context(at()));
            }
        }

        match object.get("options") {
            None | Some(Value::Null) => {}
            Some(Value::Object(options)) => {
                let mut parsed = SchemaOptions::default();
                match options.get("idAttribute") {
                    None => {}
                    Some(Value::String(id)) if !id.is_empty() => {
                        parsed = parsed.with_id_attribute(id.clone());
                    }
                    Some(_) => {
                        return Err(Error::invalid_schema("idAttribute must be a non-empty string")
                            .with_context(at()));
                    }
                }
                descriptor = descriptor.with_options(parsed);
            }
            Some(_) => {
                return Err(Error::invalid_schema("options must be an object").with_context(at()));
            }
        }

        Ok(descriptor)
    }
}

const ATTRIBUTE_KEYS: [&str; 4] = ["hasOne", "hasMany", "inverse", "default"];

fn attribute_from_json(spec: &Value) -> Result<AttributeSpec> {
    match spec {
        Value::Null => Ok(AttributeSpec::plain()),
        Value::String(target) if !target.is_empty() => Ok(AttributeSpec::one(target.clone())),
        Value::Object(fields) => {
            if let Some(key) = fields.keys().find(|k| !ATTRIBUTE_KEYS.contains(&k.as_str())) {
                return Err(Error::invalid_schema(format!("unknown attribute key: {key}")));
            }
            let inverse = match fields.get("inverse") {
                None => None,
                Some(Value::String(inverse)) => Some(inverse.clone()),
                Some(_) => return Err(Error::invalid_schema("inverse must be a string")),
            };
            let reference = match (fields.get("hasOne"), fields.get("hasMany")) {
                (Some(Value::String(target)), None) => Some(AttributeSpec::one(target.clone())),
                (None, Some(Value::String(target))) => Some(AttributeSpec::many(target.clone())),
                (None, None) => None,
                _ => return Err(Error::invalid_schema("malformed reference declaration")),
            };
            if reference.is_some() && fields.contains_key("default") {
                return Err(Error::invalid_schema("a reference cannot have a default"));
            }
            match (reference, inverse) {
                (Some(reference), Some(inverse)) => Ok(reference.inverse(inverse)),
                (Some(reference), None) => Ok(reference),
                (None, Some(_)) => Err(Error::invalid_schema("inverse without a reference")),
                (None, None) => Ok(match fields.get("default") {
                    Some(default) => AttributeSpec::with_default(default.clone()),
                    None => AttributeSpec::plain(),
                }),
            }
        }
        _ => Err(Error::invalid_schema("malformed attribute declaration")),
    }
}
