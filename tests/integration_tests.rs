//! Integration tests for Tether

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;
use tether::{
    ListenerOptions, ObservableValue, Reason, Record, Schema, SetOptions, Store, StoreError,
};

#[test]
fn observable_integration() {
    let value = ObservableValue::new("count", 0);

    // Test read
    assert_eq!(value.get(), 0);

    // Equal writes are suppressed unless forced
    assert!(value.notify(42, SetOptions::new()));
    assert!(!value.notify(42, SetOptions::new()));
    assert!(value.notify(42, SetOptions::forced()));
    assert_eq!(value.get(), 42);
}

#[test]
fn store_integration() {
    let store = Store::new(Record::new().with("count", 0).with("name", 1));

    // Test get
    assert_eq!(store.get("count"), Ok(0));

    // Test update
    store.update("count", |count| count + 42).unwrap();
    assert_eq!(store.get("count"), Ok(42));

    // Test whole-state write
    store.set_state(&Record::new().with("count", 100).with("name", 2));
    assert_eq!(store.get_state(), Record::new().with("count", 100).with("name", 2));

    // Undeclared keys fail fast
    assert_eq!(store.get("missing"), Err(StoreError::unknown_key("missing")));
}

#[test]
fn listeners_are_per_key() {
    let store = Store::new(Record::new().with("a", 0).with("b", 0));
    let seen = Rc::new(RefCell::new(Vec::new()));

    let sink = Rc::clone(&seen);
    store
        .add_listener(
            "a",
            move |key, value, _| sink.borrow_mut().push(format!("{key}={value}")),
            ListenerOptions::new(),
        )
        .unwrap();

    store.set("b", 1).unwrap();
    store.set("a", 2).unwrap();
    store.set("a", 2).unwrap();
    assert_eq!(*seen.borrow(), vec!["a=2"]);
}

#[test]
fn auto_call_listener_sees_current_value() {
    let store = Store::new(Record::new().with("count", 7));
    let seen = Rc::new(RefCell::new(Vec::new()));

    let sink = Rc::clone(&seen);
    let _subscription = store
        .subscribe(
            "count",
            move |_, value, options| sink.borrow_mut().push((*value, options.reason)),
            ListenerOptions::auto_call(),
        )
        .unwrap();

    store.set("count", 8).unwrap();
    assert_eq!(
        *seen.borrow(),
        vec![(7, Some(Reason::AutoCall)), (8, None)]
    );
}

#[test]
fn listener_may_write_back_to_its_own_field() {
    let store = Store::new(Record::new().with("count", 0));
    let clamp = store.clone();
    store
        .add_listener(
            "count",
            move |_, value, _| {
                if *value > 10 {
                    clamp.set("count", 10).unwrap();
                }
            },
            ListenerOptions::new(),
        )
        .unwrap();

    store.set("count", 50).unwrap();
    assert_eq!(store.get("count"), Ok(10));
}

#[test]
fn schema_store_over_json() {
    let schema = Schema::new(["id", "title"]).unwrap();
    let initial = Record::from_json(json!({ "id": 1, "title": "draft", "extra": true })).unwrap();
    let store = Store::from_schema(schema, &initial).unwrap();

    store.set("title", json!("final")).unwrap();
    assert_eq!(
        store.get_state().into_json(),
        json!({ "id": 1, "title": "final" })
    );
    assert_eq!(
        Schema::new(["id", "id"]).unwrap_err(),
        StoreError::duplicate_key("id")
    );
}
