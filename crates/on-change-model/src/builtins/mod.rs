//! Built-in prototypes and their methods.
//!
//! Methods are generic over their receiver: they only ever touch `this`
//! through [`Value`] get/set/has/delete, so a method invoked on an exotic
//! receiver sees every one of its reads and writes go through that receiver.

pub mod array;
pub mod date;
pub mod object;

use crate::error::ModelError;
use crate::key::PropertyKey;
use crate::object::{Object, ObjectKind, PropertyDescriptor};
use crate::value::Value;

struct Intrinsics {
    object_prototype: Object,
    array_prototype: Object,
    date_prototype: Object,
}

impl Intrinsics {
    fn new() -> Self {
        let object_prototype = Object::raw(ObjectKind::Ordinary, None);
        let array_prototype = Object::raw(ObjectKind::Ordinary, Some(object_prototype.clone()));
        let date_prototype = Object::raw(ObjectKind::Ordinary, Some(object_prototype.clone()));
        object::install(&object_prototype);
        array::install(&array_prototype);
        date::install(&date_prototype);
        Intrinsics {
            object_prototype,
            array_prototype,
            date_prototype,
        }
    }
}

thread_local! {
    static INTRINSICS: Intrinsics = Intrinsics::new();
}

pub(crate) fn object_prototype() -> Object {
    INTRINSICS.with(|i| i.object_prototype.clone())
}

pub(crate) fn array_prototype() -> Object {
    INTRINSICS.with(|i| i.array_prototype.clone())
}

pub(crate) fn date_prototype() -> Object {
    INTRINSICS.with(|i| i.date_prototype.clone())
}

/// Installs a non-enumerable method, the way built-in prototypes carry them.
pub(crate) fn define_method<F>(target: &Object, name: &str, func: F)
where
    F: Fn(&Value, &[Value]) -> Result<Value, ModelError> + 'static,
{
    let method = Object::function(name, func);
    let desc = PropertyDescriptor::data(method)
        .with_writable(true)
        .with_enumerable(false)
        .with_configurable(true);
    // Fresh prototypes are extensible and the key is new.
    let _ = target.ordinary_define_own_property(&PropertyKey::from(name), desc);
}

pub(crate) fn arg(args: &[Value], index: usize) -> Value {
    args.get(index).cloned().unwrap_or_default()
}

/// Assignment as performed by built-in methods: a refused write is an error.
pub(crate) fn put(
    this: &Value,
    key: impl Into<PropertyKey>,
    value: impl Into<Value>,
) -> Result<(), ModelError> {
    let key = key.into();
    if this.set_property(&key, value.into(), this)? {
        Ok(())
    } else {
        Err(ModelError::TypeError(format!(
            "cannot assign to read only property '{}'",
            key
        )))
    }
}

/// Deletion as performed by built-in methods: a refused delete is an error.
pub(crate) fn remove(this: &Value, key: impl Into<PropertyKey>) -> Result<(), ModelError> {
    let key = key.into();
    if this.delete_property(&key)? {
        Ok(())
    } else {
        Err(ModelError::TypeError(format!(
            "cannot delete property '{}'",
            key
        )))
    }
}
