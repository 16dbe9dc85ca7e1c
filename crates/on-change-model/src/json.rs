//! Conversion between object graphs and `serde_json` values.

use serde_json::{Map, Number};

use crate::error::ModelError;
use crate::object::{Object, ObjectClass};
use crate::value::Value;

impl From<&serde_json::Value> for Value {
    fn from(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::from(s.as_str()),
            serde_json::Value::Array(items) => {
                Value::Object(Object::array(items.iter().map(Value::from).collect()))
            }
            serde_json::Value::Object(map) => {
                let obj = Object::new();
                for (key, value) in map {
                    obj.insert(key, Value::from(value));
                }
                Value::Object(obj)
            }
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::from(&json)
    }
}

impl Value {
    /// Serializes the graph reachable from this value.
    ///
    /// Follows `JSON.stringify`: record properties holding `undefined`,
    /// functions or symbols are skipped, the same values inside arrays become
    /// `null`, non-finite numbers become `null`, dates and boxed numbers
    /// serialize as their primitive value. A cycle is a `TypeError`.
    pub fn to_json(&self) -> Result<serde_json::Value, ModelError> {
        let mut stack = Vec::new();
        Ok(to_json_inner(self, &mut stack)?.unwrap_or(serde_json::Value::Null))
    }
}

fn number(n: f64) -> serde_json::Value {
    if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
        serde_json::Value::Number(Number::from(n as i64))
    } else {
        Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null)
    }
}

fn to_json_inner(
    value: &Value,
    stack: &mut Vec<usize>,
) -> Result<Option<serde_json::Value>, ModelError> {
    let json = match value {
        Value::Undefined | Value::Symbol(_) => return Ok(None),
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Number(n) => number(*n),
        Value::String(s) => serde_json::Value::String(s.to_string()),
        Value::Object(_) | Value::Exotic(_) => match value.object_class() {
            Some(ObjectClass::Function) => return Ok(None),
            Some(ObjectClass::Date) | Some(ObjectClass::Number) => {
                number(value.primitive_value().unwrap_or(f64::NAN))
            }
            Some(ObjectClass::RegExp) => serde_json::Value::Object(Map::new()),
            _ => {
                let id = value.identity().unwrap_or(0);
                if stack.contains(&id) {
                    return Err(ModelError::type_error(
                        "converting circular structure to JSON",
                    ));
                }
                stack.push(id);
                let json = if value.is_array() {
                    let len = value.length()?;
                    let mut items = Vec::with_capacity(len);
                    for k in 0..len {
                        let item = to_json_inner(&value.get(k)?, stack)?;
                        items.push(item.unwrap_or(serde_json::Value::Null));
                    }
                    serde_json::Value::Array(items)
                } else {
                    let mut map = Map::new();
                    for key in crate::builtins::object::keys(value)? {
                        if let Some(item) = to_json_inner(&value.get_property(&key, value)?, stack)? {
                            map.insert(key.to_string(), item);
                        }
                    }
                    serde_json::Value::Object(map)
                };
                stack.pop();
                json
            }
        },
    };
    Ok(Some(json))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_round_trip_keeps_order_and_shape() {
        let json = json!({"b": [1, 2.5, null], "a": {"c": "x"}, "t": true});
        let value = Value::from(&json);
        assert!(value.get("b").unwrap().is_array());
        assert_eq!(value.to_json().unwrap(), json);
    }

    #[test]
    fn undefined_and_functions_follow_stringify_rules() {
        let func = Object::function("f", |_, _| Ok(Value::Undefined));
        let value = Value::from(
            Object::new()
                .with("u", Value::Undefined)
                .with("f", &func)
                .with("list", Object::array(vec![Value::Undefined, Value::from(&func)]))
                .with("nan", f64::NAN),
        );
        assert_eq!(value.to_json().unwrap(), json!({"list": [null, null], "nan": null}));
    }

    #[test]
    fn cycles_are_type_errors() {
        let obj = Object::new();
        obj.insert("me", &obj);
        assert!(matches!(Value::from(&obj).to_json(), Err(ModelError::TypeError(_))));
    }
}
