//! Integration tests for the store container
//!
//! Tests subscriber notification counts, history, and undo.

use std::cell::RefCell;
use std::rc::Rc;

use normstore_storage::{Action, CreateOptions, Store, StoreConfig, StoreState};
use serde_json::json;

use crate::setup;

fn recording_store(config: StoreConfig) -> (crate::Builder, Store, Rc<RefCell<Vec<StoreState>>>) {
    let (ops, reducer, _) = setup();
    let mut store = Store::new(reducer, config);
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    store.subscribe(move |state| sink.borrow_mut().push(state.clone()));
    (ops, store, seen)
}

#[test]
fn batch_is_observed_as_one_state() {
    let (mut ops, mut store, seen) = recording_store(StoreConfig::default());
    let create = ops
        .create_one("User", json!({"name": "tmp"}), CreateOptions::new())
        .unwrap();
    let rename = ops.rename_id("User", "gen-1", "u1").unwrap();
    let update = ops.update_one("User", "u1", json!({"name": "Ada"}), false).unwrap();

    store.dispatch(Action::batch([create, rename, update]));

    let seen = seen.borrow();
    assert_eq!(seen.len(), 1);
    assert!(seen[0].get("User", "gen-1").is_none());
    assert_eq!(seen[0].get("User", "u1").unwrap().get("name"), Some(&json!("Ada")));
}

#[test]
fn each_dispatch_notifies_once() {
    let (mut ops, mut store, seen) = recording_store(StoreConfig::default());
    for i in 0..3 {
        store.dispatch(
            ops.create_one("User", json!({"id": i.to_string()}), CreateOptions::new())
                .unwrap(),
        );
    }
    assert_eq!(seen.borrow().len(), 3);
    assert_eq!(store.state().slice("User").unwrap().len(), 3);
}

#[test]
fn foreign_actions_do_not_notify() {
    let (_, mut store, seen) = recording_store(StoreConfig::default());
    let before = store.state().clone();
    store.dispatch(Action::Foreign("session/refresh".into()));

    assert!(seen.borrow().is_empty());
    assert!(store.state().ptr_eq(&before));
}

#[test]
fn notify_unchanged_reports_every_dispatch() {
    let (_, mut store, seen) =
        recording_store(StoreConfig::default().with_notify_unchanged(true));
    store.dispatch(Action::Foreign("session/refresh".into()));
    assert_eq!(seen.borrow().len(), 1);
}

#[test]
fn history_is_bounded() {
    let (mut ops, mut store, _) = recording_store(StoreConfig::default().with_history_size(2));
    for i in 0..5 {
        store.dispatch(
            ops.create_one("User", json!({"id": i.to_string()}), CreateOptions::new())
                .unwrap(),
        );
    }
    assert_eq!(store.history_len(), 2);
    assert_eq!(store.previous().unwrap().slice("User").unwrap().len(), 4);

    assert!(store.undo());
    assert!(store.undo());
    assert!(!store.undo());
    assert_eq!(store.state().slice("User").unwrap().len(), 3);
}

#[test]
fn undo_notifies_subscribers() {
    let (mut ops, mut store, seen) = recording_store(StoreConfig::default());
    store.dispatch(ops.create_one("User", json!({"id": "1"}), CreateOptions::new()).unwrap());
    store.undo();

    let seen = seen.borrow();
    assert_eq!(seen.len(), 2);
    assert!(seen[1].get("User", "1").is_none());
}
