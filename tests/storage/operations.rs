//! Integration tests for per-kind operation semantics

use normstore_storage::{CreateOptions, Payload};
use serde_json::json;

use crate::setup;

// =============================================================================
// Create
// =============================================================================

#[test]
fn create_assigns_generated_id() {
    let (mut ops, reducer, state) = setup();
    let op = ops.create_one("User", json!({"name": "x"}), CreateOptions::new()).unwrap();
    let state = reducer.apply_operation(&state, &op);

    let users = state.slice("User").unwrap();
    assert_eq!(users.len(), 1);
    let user = users.get("gen-1").unwrap();
    assert_eq!(user.get("name"), Some(&json!("x")));
}

#[test]
fn create_with_explicit_id_is_idempotent() {
    let (mut ops, reducer, state) = setup();
    let op = ops
        .create_one("User", json!({"id": "1", "name": "x"}), CreateOptions::new())
        .unwrap();

    let once = reducer.apply_operation(&state, &op);
    let twice = reducer.apply_operation(&once, &op);
    assert_eq!(once.slice("User").unwrap().len(), 1);
    assert_eq!(once, twice);
}

#[test]
fn create_overwrites_existing_record() {
    let (mut ops, reducer, state) = setup();
    let first = ops
        .create_one("User", json!({"id": "1", "name": "a", "bio": "b"}), CreateOptions::new())
        .unwrap();
    let second = ops
        .create_one("User", json!({"id": "1", "name": "z"}), CreateOptions::new())
        .unwrap();

    let state = reducer.apply_batch(&state, [&first, &second]);
    let user = state.get("User", "1").unwrap();
    assert_eq!(user.get("name"), Some(&json!("z")));
    assert!(!user.contains("bio"));
}

#[test]
fn create_many_normalizes_nested_entities() {
    let (mut ops, reducer, state) = setup();
    let op = ops
        .create_many(
            "Post",
            json!([
                {"id": "p1", "title": "one", "author": {"id": "u1", "name": "Ada"}},
                {"id": "p2", "title": "two", "author": {"id": "u1", "name": "Ada L."}},
                {"title": "three", "author": "u2"}
            ]),
            CreateOptions::new(),
        )
        .unwrap();
    let state = reducer.apply_operation(&state, &op);

    assert_eq!(state.slice("Post").unwrap().len(), 3);
    assert_eq!(state.get("Post", "gen-1").unwrap().get("author"), Some(&json!("u2")));
    assert_eq!(state.get("User", "u1").unwrap().get("name"), Some(&json!("Ada L.")));
    assert!(state.get("User", "u2").is_none());
}

#[test]
fn skip_normalization_stores_input_verbatim() {
    let (mut ops, reducer, state) = setup();
    let op = ops
        .create_one(
            "Post",
            json!({"id": "p1", "author": {"id": "u1"}}),
            CreateOptions::new().with_skip_normalization(true),
        )
        .unwrap();
    let state = reducer.apply_operation(&state, &op);

    assert_eq!(state.get("Post", "p1").unwrap().get("author"), Some(&json!({"id": "u1"})));
    assert!(state.slice("User").unwrap().is_empty());
}

// =============================================================================
// Update
// =============================================================================

#[test]
fn update_merges_by_default() {
    let (mut ops, reducer, state) = setup();
    let create = ops
        .create_one("User", json!({"id": "1", "name": "a", "role": "admin"}), CreateOptions::new())
        .unwrap();
    let update = ops.update_one("User", "1", json!({"name": "b"}), false).unwrap();

    let state = reducer.apply_batch(&state, [&create, &update]);
    let user = state.get("User", "1").unwrap();
    assert_eq!(user.id().as_str(), "1");
    assert_eq!(user.get("name"), Some(&json!("b")));
    assert_eq!(user.get("role"), Some(&json!("admin")));
}

#[test]
fn update_with_defaults_resets_other_attributes() {
    let (mut ops, reducer, state) = setup();
    let create = ops
        .create_one(
            "User",
            json!({"id": "1", "name": "a", "role": "admin", "active": false, "bio": "hi"}),
            CreateOptions::new(),
        )
        .unwrap();
    let update = ops.update_one("User", "1", json!({"name": "c"}), true).unwrap();

    let state = reducer.apply_batch(&state, [&create, &update]);
    let user = state.get("User", "1").unwrap();
    assert_eq!(user.get("name"), Some(&json!("c")));
    assert_eq!(user.get("role"), Some(&json!("member")));
    assert_eq!(user.get("active"), Some(&json!(true)));
    assert!(!user.contains("bio"));
}

#[test]
fn update_of_missing_id_upserts() {
    let (ops, reducer, state) = setup();
    let update = ops.update_one("User", "9", json!({"name": "late"}), false).unwrap();
    let state = reducer.apply_operation(&state, &update);
    assert_eq!(state.get("User", "9").unwrap().get("name"), Some(&json!("late")));
}

#[test]
fn update_cascades_into_related_slices() {
    let (ops, reducer, state) = setup();
    let update = ops
        .update_one("Post", "p1", json!({"author": {"id": "u1", "name": "Ada"}}), false)
        .unwrap();
    let state = reducer.apply_operation(&state, &update);

    assert_eq!(state.get("Post", "p1").unwrap().get("author"), Some(&json!("u1")));
    assert_eq!(state.get("User", "u1").unwrap().get("name"), Some(&json!("Ada")));
}

#[test]
fn update_many_merges_each_id() {
    let (mut ops, reducer, state) = setup();
    let create = ops
        .create_many(
            "User",
            json!([{"id": "1", "name": "a"}, {"id": "2", "name": "b"}]),
            CreateOptions::new(),
        )
        .unwrap();
    let update = ops.update_many("User", ["1", "2", "3"], json!({"role": "admin"})).unwrap();
    let Payload::UpdateMany { ids, .. } = update.payload() else {
        panic!("expected an update-many payload");
    };
    assert_eq!(ids.len(), 3);

    let state = reducer.apply_batch(&state, [&create, &update]);
    for id in ["1", "2", "3"] {
        assert_eq!(state.get("User", id).unwrap().get("role"), Some(&json!("admin")));
    }
    assert_eq!(state.get("User", "2").unwrap().get("name"), Some(&json!("b")));
}

// =============================================================================
// Rename and Delete
// =============================================================================

#[test]
fn rename_moves_record_to_new_key() {
    let (mut ops, reducer, state) = setup();
    let create = ops
        .create_one("User", json!({"id": "1", "name": "a"}), CreateOptions::new())
        .unwrap();
    let rename = ops.rename_id("User", "1", "2").unwrap();

    let state = reducer.apply_batch(&state, [&create, &rename]);
    let users = state.slice("User").unwrap();
    assert!(users.get("1").is_none());
    let user = users.get("2").unwrap();
    assert_eq!(user.id().as_str(), "2");
    assert_eq!(user.get("name"), Some(&json!("a")));
}

#[test]
fn rename_does_not_rewrite_references() {
    let (mut ops, reducer, state) = setup();
    let create = ops
        .create_one(
            "Post",
            json!({"id": "p1", "author": {"id": "tmp", "name": "a"}}),
            CreateOptions::new(),
        )
        .unwrap();
    let rename = ops.rename_id("User", "tmp", "u1").unwrap();

    let state = reducer.apply_batch(&state, [&create, &rename]);
    assert!(state.get("User", "u1").is_some());
    assert_eq!(state.get("Post", "p1").unwrap().get("author"), Some(&json!("tmp")));
}

#[test]
fn delete_removes_record() {
    let (mut ops, reducer, state) = setup();
    let create = ops
        .create_one("User", json!({"id": "1"}), CreateOptions::new())
        .unwrap();
    let delete = ops.delete_one("User", json!({"id": "1", "name": "ignored"})).unwrap();

    let state = reducer.apply_batch(&state, [&create, &delete]);
    assert!(state.get("User", "1").is_none());
}

#[test]
fn delete_of_missing_id_is_noop() {
    let (ops, reducer, state) = setup();
    let delete = ops.delete_one("User", "1").unwrap();
    let next = reducer.apply_operation(&state, &delete);
    assert!(next.ptr_eq(&state));
}

#[test]
fn delete_does_not_cascade() {
    let (mut ops, reducer, state) = setup();
    let create = ops
        .create_one("Post", json!({"id": "p1", "author": {"id": "u1"}}), CreateOptions::new())
        .unwrap();
    let delete = ops.delete_one("User", "u1").unwrap();

    let state = reducer.apply_batch(&state, [&create, &delete]);
    assert!(state.get("Post", "p1").is_some());
}
