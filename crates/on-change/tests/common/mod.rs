#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use on_change::{observe, ChangeEvent, ChangeKind, Handle, Options, Path, PropertyKey, Value};
use on_change_model::deep_equal;

/// One callback invocation.
#[derive(Clone, Debug)]
pub struct Recorded {
    pub this: Handle,
    pub path: Path,
    pub previous: Value,
    pub value: Value,
    pub kind: ChangeKind,
}

/// Collects every event a session reports.
#[derive(Clone, Default)]
pub struct Recorder {
    events: Rc<RefCell<Vec<Recorded>>>,
}

impl Recorder {
    pub fn record(&self, this: &Handle, event: &ChangeEvent) {
        self.events.borrow_mut().push(Recorded {
            this: this.clone(),
            path: event.path.clone(),
            previous: event.previous.clone(),
            value: event.value.clone(),
            kind: event.kind,
        });
    }

    pub fn count(&self) -> usize {
        self.events.borrow().len()
    }

    pub fn last(&self) -> Recorded {
        self.events
            .borrow()
            .last()
            .cloned()
            .unwrap_or_else(|| panic!("no event was recorded"))
    }

    pub fn reset(&self) {
        self.events.borrow_mut().clear();
    }

    /// Asserts the number of events so far and the contents of the last one.
    /// `previous` and `value` are compared structurally.
    pub fn verify(
        &self,
        handle: &Handle,
        count: usize,
        path: &[&str],
        previous: impl Into<Value>,
        value: impl Into<Value>,
    ) {
        let keys = path.iter().map(|key| PropertyKey::from(*key)).collect();
        self.verify_keys(handle, count, keys, previous, value);
    }

    pub fn verify_keys(
        &self,
        handle: &Handle,
        count: usize,
        path: Vec<PropertyKey>,
        previous: impl Into<Value>,
        value: impl Into<Value>,
    ) {
        assert_eq!(self.count(), count, "event count");
        let last = self.last();
        assert!(Handle::ptr_eq(&last.this, handle), "callback receiver is the root handle");
        assert_eq!(last.path, Path::from(path), "path");
        let previous = previous.into();
        let value = value.into();
        assert!(
            deep_equal(&last.previous, &previous),
            "previous: expected {:?}, got {:?}",
            previous,
            last.previous
        );
        assert!(
            deep_equal(&last.value, &value),
            "value: expected {:?}, got {:?}",
            value,
            last.value
        );
    }

    pub fn verify_none(&self) {
        assert_eq!(self.count(), 0, "no events expected, got {:?}", self.events.borrow());
    }
}

/// Observes `root` with a recording callback.
pub fn observe_recorded(root: &Value, options: Options) -> (Handle, Recorder) {
    let recorder = Recorder::default();
    let sink = recorder.clone();
    let handle = observe(
        root,
        move |this, event| {
            sink.record(this, event);
            Ok(())
        },
        options,
    )
    .expect("roots in tests are objects");
    (handle, recorder)
}

pub fn json(value: serde_json::Value) -> Value {
    Value::from(value)
}

pub fn to_json(value: &Value) -> serde_json::Value {
    value.to_json().expect("graph serializes")
}
