//! Integration tests for reflective operations over whole graphs.

use on_change_model::{
    assign, deep_equal, keys, shallow_clone, ModelError, Object, PropertyDescriptor, Value,
};
use serde_json::json;

fn graph(json: serde_json::Value) -> Value {
    Value::from(json)
}

#[test]
fn nested_reads_and_writes() {
    let root = graph(json!({"a": {"b": [1, 2, {"c": 0}]}}));
    let c_holder = root.get("a").unwrap().get("b").unwrap().get(2).unwrap();
    assert!(c_holder.set("c", 5).unwrap());
    assert_eq!(root.to_json().unwrap(), json!({"a": {"b": [1, 2, {"c": 5}]}}));
}

#[test]
fn methods_are_inherited_not_owned() {
    let list = graph(json!([3, 1, 2]));
    assert!(list.has("push").unwrap());
    assert!(list.get_own_property(&"push".into()).unwrap().is_none());
    let ctor = list.get("constructor").unwrap();
    assert!(ctor.is_callable());
    let fresh = ctor.call(&Value::Undefined, &[Value::from(1)]).unwrap();
    assert_eq!(fresh.to_json().unwrap(), json!([1]));
}

#[test]
fn assign_and_keys_see_enumerable_properties_only() {
    let target = graph(json!({"x": 1}));
    let source = graph(json!({"y": 2}));
    source
        .define_property("hidden", PropertyDescriptor::data(3))
        .unwrap();
    assign(&target, &[source]).unwrap();
    let names: Vec<String> = keys(&target).unwrap().iter().map(|k| k.to_string()).collect();
    assert_eq!(names, vec!["x", "y"]);
}

#[test]
fn shallow_clone_then_deep_compare() {
    let original = graph(json!({"list": [1, 2], "n": 1}));
    let copy = shallow_clone(&original).unwrap();
    assert!(deep_equal(&original, &copy));
    copy.set("n", 2).unwrap();
    assert!(!deep_equal(&original, &copy));
    assert_eq!(original.get("n").unwrap(), Value::from(1));
}

#[test]
fn user_errors_propagate_through_getters() {
    let obj = Object::new();
    let getter = Object::function("boom", |_, _| Err(ModelError::thrown("getter failed")));
    Value::from(&obj)
        .define_property("x", PropertyDescriptor::accessor(Some(getter.into()), None))
        .unwrap();
    let err = Value::from(&obj).get("x").unwrap_err();
    assert_eq!(err.to_string(), "getter failed");
}

#[test]
fn sealed_objects_keep_values_writable() {
    let obj = Object::new().with("x", 1);
    obj.seal();
    let value = Value::from(&obj);
    assert!(value.set("x", 2).unwrap());
    assert!(!value.set("y", 2).unwrap());
    assert!(!value.delete("x").unwrap());
    assert!(!obj.is_frozen());
}
