//! A dynamic, reference-counted object graph.
//!
//! Values are plain records, arrays, dates and functions with prototype
//! chains, property descriptors and reflective get/set/define/delete
//! operations that report refusal instead of failing. Any operation on a
//! [`Value`] may also be served by an [`ExoticObject`], which is how a
//! façade can stand in for an object and intercept everything done to it,
//! built-in methods included.
//!
//! # Example
//!
//! ```
//! use on_change_model::{Object, Value};
//!
//! let list = Value::from(Object::array(vec![Value::from(2), Value::from(1)]));
//! list.invoke("push", &[Value::from(3)]).unwrap();
//! list.invoke("sort", &[]).unwrap();
//! assert_eq!(list.to_json().unwrap(), serde_json::json!([1, 2, 3]));
//! ```

pub mod builtins;
mod clone;
pub mod equality;
mod error;
mod exotic;
mod json;
mod key;
mod object;
mod value;

pub use builtins::object::{assign, keys};
pub use clone::{own_enumerable_keys, shallow_clone};
pub use equality::{deep_equal, same_value, same_value_zero, strict_equals};
pub use error::ModelError;
pub use exotic::ExoticObject;
pub use key::{PropertyKey, Symbol};
pub use object::{NativeFunction, Object, ObjectClass, Property, PropertyDescriptor};
pub use value::{Value, WeakValue};
