use crate::builtins::{arg, define_method, put};
use crate::error::ModelError;
use crate::key::PropertyKey;
use crate::object::{Object, PropertyDescriptor};
use crate::value::Value;

pub(crate) fn install(proto: &Object) {
    define_method(proto, "hasOwnProperty", |this, args| {
        let key = to_property_key(&arg(args, 0))?;
        Ok(Value::Bool(this.get_own_property(&key)?.is_some()))
    });
    define_method(proto, "constructor", |_, args| match arg(args, 0) {
        value if value.is_object() => Ok(value),
        _ => Ok(Value::Object(Object::new())),
    });
    if let Some(ctor) = proto.ordinary_get_own_property(&PropertyKey::from("constructor")) {
        if let Some(Value::Object(ctor)) = ctor.value {
            let _ = ctor.ordinary_define_own_property(
                &PropertyKey::from("prototype"),
                PropertyDescriptor::data(proto),
            );
        }
    }
}

pub(crate) fn to_property_key(value: &Value) -> Result<PropertyKey, ModelError> {
    match value {
        Value::Symbol(sym) => Ok(PropertyKey::from(sym)),
        other => Ok(PropertyKey::from(other.to_display_string()?)),
    }
}

/// Own enumerable string keys, in property order.
pub fn keys(target: &Value) -> Result<Vec<PropertyKey>, ModelError> {
    let mut keys = Vec::new();
    for key in target.own_keys()? {
        if key.is_symbol() {
            continue;
        }
        if let Some(desc) = target.get_own_property(&key)? {
            if desc.enumerable == Some(true) {
                keys.push(key);
            }
        }
    }
    Ok(keys)
}

/// Copies every own enumerable property of each source onto `target` with
/// plain assignment, so a `target` that intercepts writes sees each one.
pub fn assign(target: &Value, sources: &[Value]) -> Result<Value, ModelError> {
    for source in sources {
        if source.is_primitive() {
            continue;
        }
        for key in source.own_keys()? {
            let enumerable = source
                .get_own_property(&key)?
                .is_some_and(|desc| desc.enumerable == Some(true));
            if enumerable {
                let value = source.get_property(&key, source)?;
                put(target, key, value)?;
            }
        }
    }
    Ok(target.clone())
}
