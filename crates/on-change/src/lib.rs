//! Deep change observation for mutable object graphs.
//!
//! [`observe`] wraps a root value in a [`Handle`]. Everything reachable
//! through that handle is wrapped lazily as it is read, and every mutation
//! made through any of those handles (assignment, property definition,
//! deletion, or a method call that mutates its receiver) is reported to a
//! single callback with the path from the root, the previous value and the
//! new value.
//!
//! # Example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use on_change::{observe, Options, Value};
//! use serde_json::json;
//!
//! let log = Rc::new(RefCell::new(Vec::new()));
//! let sink = Rc::clone(&log);
//! let root = Value::from(json!({"a": {"b": [1, 2, {"c": 0}]}}));
//! let handle = observe(
//!     &root,
//!     move |_, event| {
//!         sink.borrow_mut().push(event.path.to_pointer());
//!         Ok(())
//!     },
//!     Options::default(),
//! )
//! .unwrap();
//!
//! let list = handle.get("a").unwrap().get("b").unwrap();
//! list.get(2).unwrap().set("c", 1).unwrap();
//! list.invoke("push", &[Value::from(3)]).unwrap();
//!
//! assert_eq!(*log.borrow(), vec!["/a/b/2/c", "/a/b"]);
//! ```
//!
//! Callbacks receive the root handle as their first argument; use it rather
//! than capturing the handle returned by [`observe`], which would keep the
//! session alive through its own callback.

mod cache;
mod events;
mod handle;
mod options;
mod path;
mod session;

use tracing::debug;

pub use events::{ChangeEvent, ChangeKind};
pub use handle::{observed, Handle};
pub use on_change_model::{ModelError, Object, PropertyDescriptor, PropertyKey, Symbol, Value};
pub use options::{EqualsFn, Options};
pub use path::Path;
pub use session::Callback;

use session::Session;

/// Starts observing `root` and returns its handle.
///
/// `root` must be an object; primitives are rejected with a `TypeError`.
/// The callback runs synchronously after each change has been applied. An
/// error it returns propagates out of the operation that caused the change.
pub fn observe<F>(
    root: impl Into<Value>,
    callback: F,
    options: Options,
) -> Result<Handle, ModelError>
where
    F: Fn(&Handle, &ChangeEvent) -> Result<(), ModelError> + 'static,
{
    let root = root.into();
    if root.is_primitive() {
        debug!(kind = root.type_name(), "refusing to observe a primitive");
        return Err(ModelError::TypeError(format!(
            "cannot observe a {}",
            root.type_name()
        )));
    }
    let session = Session::start(root, Box::new(callback), options);
    Ok(session.root())
}

/// Ends the session `value` is the root handle of and returns the root
/// value. Anything else is returned unchanged.
pub fn unobserve(value: &Value) -> Value {
    match Handle::from_value(value) {
        Some(handle) => handle.unobserve(),
        None => value.clone(),
    }
}
