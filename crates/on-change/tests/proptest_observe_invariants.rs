//! Property-based invariant tests for observed graphs.
//!
//! 1. Writing a value a property already holds is silent
//! 2. Deleting a missing key is silent
//! 3. A nested write reports the exact key path it went through
//! 4. Every mutating method call reports at most one event, whose previous
//!    value is the receiver as it was before the call
//! 5. The graph behind a handle ends up where the same operations would
//!    leave an unobserved copy

mod common;

use common::{observe_recorded, to_json};
use on_change::{Object, Options, PropertyKey, Value};
use proptest::prelude::*;

// ── Helpers ──────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
enum Op {
    Push(u8),
    Pop,
    Shift,
    Unshift(u8),
    Reverse,
    Sort,
    Write(usize, u8),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0u8..6).prop_map(Op::Push),
        Just(Op::Pop),
        Just(Op::Shift),
        (0u8..6).prop_map(Op::Unshift),
        Just(Op::Reverse),
        Just(Op::Sort),
        (0usize..8, 0u8..6).prop_map(|(i, v)| Op::Write(i, v)),
    ]
}

fn array_of(items: &[u8]) -> Value {
    Value::from(Object::array(items.iter().map(|&n| Value::from(n as u32)).collect()))
}

/// Applies `op` to `list`, which may be a handle or a raw array.
fn apply(list: &Value, op: &Op) {
    let result = match op {
        Op::Push(v) => list.invoke("push", &[Value::from(*v as u32)]).map(drop),
        Op::Pop => list.invoke("pop", &[]).map(drop),
        Op::Shift => list.invoke("shift", &[]).map(drop),
        Op::Unshift(v) => list.invoke("unshift", &[Value::from(*v as u32)]).map(drop),
        Op::Reverse => list.invoke("reverse", &[]).map(drop),
        Op::Sort => list.invoke("sort", &[]).map(drop),
        Op::Write(i, v) => {
            let len = list.length().unwrap();
            list.set(i % (len + 1), *v as u32).map(drop)
        }
    };
    result.unwrap();
}

// ═════════════════════════════════════════════════════════════════════════
// 1. Idempotent writes
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn repeated_write_is_silent(key in "[a-d]", first in 0u32..4, second in 0u32..4) {
        let root = Value::from(Object::new().with("a", 0).with("b", 1));
        let (handle, rec) = observe_recorded(&root, Options::default());

        handle.set(key.as_str(), first).unwrap();
        let after_first = rec.count();
        prop_assert!(after_first <= 1);

        handle.set(key.as_str(), first).unwrap();
        prop_assert_eq!(rec.count(), after_first);

        handle.set(key.as_str(), second).unwrap();
        let expected = after_first + usize::from(first != second);
        prop_assert_eq!(rec.count(), expected);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Deleting missing keys
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn deleting_missing_keys_is_silent(keys in proptest::collection::vec("[e-h]{1,3}", 0..6)) {
        let root = Value::from(Object::new().with("a", 0));
        let (handle, rec) = observe_recorded(&root, Options::default());
        for key in &keys {
            prop_assert!(handle.delete(key.as_str()).unwrap());
        }
        prop_assert_eq!(rec.count(), 0);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Path fidelity
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn nested_write_reports_its_path(keys in proptest::collection::vec("[a-c0-2]{0,2}", 1..5)) {
        let mut node = Object::new().with("leaf", 0);
        for key in keys.iter().rev() {
            node = Object::new().with(key.as_str(), node);
        }
        let root = Value::from(node);
        let (handle, rec) = observe_recorded(&root, Options::default());

        let mut current = handle.to_value();
        for key in &keys {
            current = current.get(key.as_str()).unwrap();
        }
        current.set("leaf", 1).unwrap();

        prop_assert_eq!(rec.count(), 1);
        let mut expected: Vec<PropertyKey> = keys.iter().map(PropertyKey::from).collect();
        expected.push(PropertyKey::from("leaf"));
        let last = rec.last();
        prop_assert_eq!(last.path.keys(), expected.as_slice());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4–5. Batch collapse and transparency
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn method_calls_collapse_into_one_event(
        initial in proptest::collection::vec(0u8..6, 0..6),
        ops in proptest::collection::vec(arb_op(), 1..12),
    ) {
        let root = Value::from(Object::new().with("list", array_of(&initial)));
        let mirror = array_of(&initial);
        let (handle, rec) = observe_recorded(&root, Options::default());
        let list = handle.get("list").unwrap();

        for op in &ops {
            let before = to_json(&root.get("list").unwrap());
            let count = rec.count();
            apply(&list, op);
            apply(&mirror, op);
            let after = to_json(&root.get("list").unwrap());
            prop_assert_eq!(&after, &to_json(&mirror));

            if before == after {
                prop_assert_eq!(rec.count(), count, "{:?} changed nothing", op);
                continue;
            }
            prop_assert_eq!(rec.count(), count + 1, "{:?}", op);
            let last = rec.last();
            if let Op::Write(..) = op {
                prop_assert_eq!(last.path.len(), 2);
            } else {
                prop_assert!(last.path == ["list"]);
                prop_assert_eq!(to_json(&last.previous), before);
                prop_assert_eq!(to_json(&last.value), after);
            }
        }
    }
}
