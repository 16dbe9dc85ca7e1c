use crate::builtins::object::keys;
use crate::error::ModelError;
use crate::object::{Object, ObjectClass};
use crate::value::Value;

/// One-level copy of an object-typed value.
///
/// Arrays copy their elements into a fresh array, dates copy their time
/// value, anything else copies its own enumerable properties into a fresh
/// plain record. Nested objects are shared, not copied. Primitives are
/// returned as they are.
pub fn shallow_clone(value: &Value) -> Result<Value, ModelError> {
    match value.object_class() {
        None => Ok(value.clone()),
        Some(ObjectClass::Array) => {
            let len = value.length()?;
            let mut items = Vec::with_capacity(len);
            for k in 0..len {
                items.push(value.get(k)?);
            }
            Ok(Value::Object(Object::array(items)))
        }
        Some(ObjectClass::Date) => Ok(Value::Object(Object::date(
            value.primitive_value().unwrap_or(f64::NAN),
        ))),
        Some(_) => {
            let copy = Object::new();
            for key in value.own_keys()? {
                let enumerable = value
                    .get_own_property(&key)?
                    .is_some_and(|desc| desc.enumerable == Some(true));
                if enumerable {
                    copy.insert(key.clone(), value.get_property(&key, value)?);
                }
            }
            Ok(Value::Object(copy))
        }
    }
}

/// Own enumerable string keys of a value, as `Object.keys` reports them.
pub fn own_enumerable_keys(value: &Value) -> Result<Vec<String>, ModelError> {
    Ok(keys(value)?.iter().map(ToString::to_string).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::equality::same_value;

    #[test]
    fn clones_are_fresh_but_share_children() {
        let child = Object::new();
        let original = Value::from(Object::new().with("a", 1).with("child", &child));
        let copy = shallow_clone(&original).unwrap();
        assert!(!same_value(&copy, &original));
        assert!(same_value(&copy.get("child").unwrap(), &Value::from(&child)));
        copy.set("a", 2).unwrap();
        assert_eq!(original.get("a").unwrap(), Value::from(1));
    }

    #[test]
    fn dates_and_arrays_keep_their_class() {
        let date = shallow_clone(&Value::from(Object::date(42.0))).unwrap();
        assert_eq!(date.primitive_value(), Some(42.0));
        let arr = shallow_clone(&Value::from(Object::array(vec![Value::from(1)]))).unwrap();
        assert!(arr.is_array());
        assert_eq!(own_enumerable_keys(&arr).unwrap(), vec!["0"]);
    }
}
