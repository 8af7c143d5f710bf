//! Integration tests for atomic batches
//!
//! Batches must equal sequential application of their members.

use normstore_storage::{Action, CreateOptions, Operation, OperationKind};
use proptest::prelude::*;
use serde_json::json;

use crate::{Builder, setup};

/// A randomly chosen operation over a small id space.
#[derive(Clone, Debug)]
enum Step {
    Create(u8, String),
    Update(u8, String, bool),
    Rename(u8, u8),
    Delete(u8),
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        (0..4u8, "[a-z]{1,4}").prop_map(|(id, name)| Step::Create(id, name)),
        (0..4u8, "[a-z]{1,4}", any::<bool>()).prop_map(|(id, name, d)| Step::Update(id, name, d)),
        (0..4u8, 0..4u8).prop_map(|(old, new)| Step::Rename(old, new)),
        (0..4u8).prop_map(Step::Delete),
    ]
}

fn build(ops: &mut Builder, step: &Step) -> Operation {
    match step {
        Step::Create(id, name) => ops
            .create_one(
                "User",
                json!({"id": id.to_string(), "name": name, "posts": [{"id": format!("p{id}")}]}),
                CreateOptions::new(),
            )
            .unwrap(),
        Step::Update(id, name, use_defaults) => ops
            .update_one("User", id.to_string(), json!({"name": name}), *use_defaults)
            .unwrap(),
        Step::Rename(old, new) => ops.rename_id("User", old.to_string(), new.to_string()).unwrap(),
        Step::Delete(id) => ops.delete_one("User", id.to_string()).unwrap(),
    }
}

proptest! {
    #[test]
    fn batch_equals_sequential_application(steps in prop::collection::vec(step(), 0..12)) {
        let (mut ops, reducer, state) = setup();
        let operations: Vec<Operation> = steps.iter().map(|s| build(&mut ops, s)).collect();

        let sequential = operations
            .iter()
            .fold(state.clone(), |s, op| reducer.apply_operation(&s, op));
        let batched = reducer.apply_batch(&state, &operations);
        let dispatched = reducer.reduce(&state, &Action::batch(operations.clone()));

        prop_assert_eq!(&batched, &sequential);
        prop_assert_eq!(&dispatched, &sequential);
    }

    #[test]
    fn create_is_idempotent(name in "[a-z]{1,8}") {
        let (mut ops, reducer, state) = setup();
        let op = ops
            .create_one("User", json!({"id": "1", "name": name}), CreateOptions::new())
            .unwrap();

        let once = reducer.apply_operation(&state, &op);
        let twice = reducer.apply_operation(&once, &op);
        prop_assert_eq!(once, twice);
    }
}

#[test]
fn nested_batches_flatten() {
    let (mut ops, reducer, state) = setup();
    let a = build(&mut ops, &Step::Create(1, "a".into()));
    let b = build(&mut ops, &Step::Rename(1, 2));
    let c = build(&mut ops, &Step::Update(2, "c".into(), false));

    let nested = Action::Batch(vec![
        Action::from(a.clone()),
        Action::batch([b.clone(), c.clone()]),
        Action::Foreign("router/navigate".into()),
    ]);
    let flat = reducer.apply_batch(&state, [&a, &b, &c]);
    assert_eq!(reducer.reduce(&state, &nested), flat);
    assert_eq!(flat.get("User", "2").unwrap().get("name"), Some(&json!("c")));
}

#[test]
fn batch_marks_members_atomic() {
    let (mut ops, _, _) = setup();
    let create = build(&mut ops, &Step::Create(1, "a".into()));
    assert_eq!(create.kind(), OperationKind::CreateOne);

    let Action::Batch(members) = Action::batch([create]) else {
        panic!("expected a batch");
    };
    assert!(members.iter().all(|m| matches!(m, Action::Entity(op) if op.meta().atomic)));
}

#[test]
fn empty_batch_is_identity() {
    let (_, reducer, state) = setup();
    assert!(reducer.reduce(&state, &Action::batch(Vec::new())).ptr_eq(&state));
}
