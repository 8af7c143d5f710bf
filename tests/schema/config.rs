//! Integration tests for JSON schema loading

use normstore_schema::{AttributeSpec, SchemaDescriptor, resolve_json};
use serde_json::json;

#[test]
fn loads_blog_schema() {
    let set = resolve_json(&json!([
        {
            "name": "Article",
            "attributes": {
                "title": null,
                "status": { "default": "draft" },
                "author": "User",
                "tags": { "hasMany": "Tag" }
            }
        },
        { "name": "User", "attributes": { "articles": { "hasMany": "Article" } } },
        { "name": "Tag", "options": { "idAttribute": "slug" } }
    ]))
    .unwrap();

    let article = set.get("Article").unwrap();
    assert_eq!(article.relation("author").unwrap().foreign.as_deref(), Some("articles"));
    assert!(article.relation("tags").unwrap().is_many);
    assert_eq!(article.relation("tags").unwrap().foreign, None);
    assert_eq!(article.defaults().collect::<Vec<_>>(), [("status", &json!("draft"))]);
    assert_eq!(set.get("Tag").unwrap().id_attribute(), "slug");
}

#[test]
fn null_and_empty_sets_are_rejected() {
    assert!(resolve_json(&json!(null)).unwrap_err().is_invalid_schemas());
    assert!(resolve_json(&json!([])).unwrap_err().is_invalid_schemas());
    assert!(resolve_json(&json!({"name": "User"})).unwrap_err().is_invalid_schemas());
}

#[test]
fn malformed_declarations_are_rejected() {
    let cases = [
        json!([{ "attributes": {} }]),
        json!([{ "name": "" }]),
        json!([{ "name": "A", "attributes": [] }]),
        json!([{ "name": "A", "attributes": { "x": 5 } }]),
        json!([{ "name": "A", "attributes": { "x": { "hasOne": "A", "hasMany": "A" } } }]),
        json!([{ "name": "A", "attributes": { "x": { "inverse": "y" } } }]),
        json!([{ "name": "A", "options": { "idAttribute": 1 } }]),
        json!([{ "name": "A", "attributes": { "x": "Missing" } }]),
        json!([{ "name": "A", "attributes": { "x": { "hasMnay": "A" } } }]),
        json!([{ "name": "A", "attributes": { "x": { "hasMany": "A", "default": [] } } }]),
    ];
    for case in cases {
        let err = resolve_json(&case).unwrap_err();
        assert!(err.is_invalid_schema(), "{case}");
    }
}

#[test]
fn declares_inverse_in_json() {
    let descriptor = SchemaDescriptor::from_json(&json!({
        "name": "User",
        "attributes": { "inbox": { "hasMany": "Message", "inverse": "recipient" } }
    }))
    .unwrap();

    let spec = descriptor.attribute("inbox").unwrap();
    assert!(matches!(spec, AttributeSpec::RefMany { .. }));
    assert_eq!(spec.explicit_inverse(), Some("recipient"));
}
