//! Integration tests for schema resolution
//!
//! Tests validation errors and the resolved schema views.

use normstore_foundation::{Record, Value};
use normstore_schema::{AttributeSpec, SchemaDescriptor, SchemaOptions, resolve};
use serde_json::json;

// =============================================================================
// Validation
// =============================================================================

#[test]
fn empty_set_is_rejected() {
    let err = resolve(Vec::new()).unwrap_err();
    assert!(err.is_invalid_schemas());
}

#[test]
fn nameless_schema_is_rejected() {
    let err = resolve(vec![SchemaDescriptor::new("")]).unwrap_err();
    assert!(err.is_invalid_schema());
}

#[test]
fn duplicate_names_are_rejected() {
    let err = resolve(vec![SchemaDescriptor::new("User"), SchemaDescriptor::new("User")])
        .unwrap_err();
    assert!(err.is_invalid_schema());
}

#[test]
fn unknown_target_is_rejected_with_context() {
    let err = resolve(vec![SchemaDescriptor::new("Post").with_one("author", "User")])
        .unwrap_err();
    assert!(err.is_invalid_schema());

    let ctx = err.context.unwrap();
    assert_eq!(ctx.schema.as_deref(), Some("Post"));
    assert_eq!(ctx.attribute.as_deref(), Some("author"));
}

// =============================================================================
// Resolved Views
// =============================================================================

#[test]
fn set_lookup() {
    let set = resolve(vec![SchemaDescriptor::new("A"), SchemaDescriptor::new("B")]).unwrap();

    assert_eq!(set.len(), 2);
    assert!(set.contains("A"));
    assert!(set.get("C").is_none());
    assert!(set.require("C").unwrap_err().is_invalid_input());
    assert_eq!(set.names().collect::<Vec<_>>(), ["A", "B"]);
}

#[test]
fn clones_share_schemas() {
    let set = resolve(vec![SchemaDescriptor::new("A")]).unwrap();
    let copy = set.clone();
    assert_eq!(set.get("A").unwrap().name(), copy.get("A").unwrap().name());
}

#[test]
fn attribute_order_is_preserved() {
    let set = resolve(vec![
        SchemaDescriptor::new("A")
            .with_plain("z")
            .with_plain("a")
            .with_plain("m"),
    ])
    .unwrap();
    let names: Vec<&str> = set
        .get("A")
        .unwrap()
        .attributes()
        .iter()
        .map(|(name, _)| name.as_str())
        .collect();
    assert_eq!(names, ["z", "a", "m"]);
}

#[test]
fn custom_id_attribute() {
    let set = resolve(vec![
        SchemaDescriptor::new("Doc")
            .with_options(SchemaOptions::default().with_id_attribute("slug")),
    ])
    .unwrap();
    assert_eq!(set.get("Doc").unwrap().id_attribute(), "slug");
}

fn initials(record: &Record) -> Value {
    let name = record.get("name").and_then(Value::as_str).unwrap_or("");
    Value::String(name.chars().take(1).collect())
}

#[test]
fn defaults_and_computed_attributes() {
    let set = resolve(vec![
        SchemaDescriptor::new("User")
            .with_plain("name")
            .with_default("role", json!("member"))
            .with_computed("initial", initials),
    ])
    .unwrap();
    let user = set.get("User").unwrap();

    assert_eq!(user.defaults().collect::<Vec<_>>(), [("role", &json!("member"))]);
    assert_eq!(user.default_record("1").get("role"), Some(&json!("member")));
    assert_eq!(user.computed_attributes().collect::<Vec<_>>(), ["initial"]);

    let ada = Record::new("1").with("name", json!("Ada"));
    assert_eq!(user.compute("initial", &ada), Some(json!("A")));
    assert_eq!(user.compute("name", &ada), None);
    assert!(matches!(user.attribute("initial"), Some(AttributeSpec::Computed(_))));
}
