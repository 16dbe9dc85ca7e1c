//! Value comparison.

use crate::builtins::object::keys;
use crate::error::ModelError;
use crate::object::ObjectClass;
use crate::value::Value;

/// `SameValue`: identity for objects and symbols, `+0` and `-0` differ and
/// `NaN` equals itself.
pub fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            (x.is_nan() && y.is_nan()) || (x == y && x.is_sign_negative() == y.is_sign_negative())
        }
        _ => primitive_or_identity_equal(a, b),
    }
}

/// `===`: `NaN` differs from itself, `+0` equals `-0`.
pub fn strict_equals(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x == y,
        _ => primitive_or_identity_equal(a, b),
    }
}

/// `SameValueZero`: like [`same_value`] but `+0` equals `-0`.
pub fn same_value_zero(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => (x.is_nan() && y.is_nan()) || x == y,
        _ => primitive_or_identity_equal(a, b),
    }
}

fn primitive_or_identity_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::Symbol(x), Value::Symbol(y)) => x == y,
        _ if a.is_object() && b.is_object() => a.identity() == b.identity(),
        _ => false,
    }
}

/// Structural equality over object graphs.
///
/// Records and arrays compare their own enumerable string-keyed properties,
/// dates and boxed numbers their primitive value, everything else falls back
/// to [`same_value`]. Pairs already under comparison are assumed equal, so
/// cyclic graphs terminate. A getter that fails makes the values unequal.
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    let mut seen = Vec::new();
    deep_equal_inner(a, b, &mut seen).unwrap_or(false)
}

fn deep_equal_inner(
    a: &Value,
    b: &Value,
    seen: &mut Vec<(usize, usize)>,
) -> Result<bool, ModelError> {
    if same_value(a, b) {
        return Ok(true);
    }
    let (Some(id_a), Some(id_b)) = (a.identity(), b.identity()) else {
        return Ok(false);
    };
    let class = a.object_class();
    if class != b.object_class() {
        return Ok(false);
    }
    match class {
        Some(ObjectClass::Date) | Some(ObjectClass::Number) => {
            return Ok(same_value(
                &Value::from(a.primitive_value()),
                &Value::from(b.primitive_value()),
            ))
        }
        Some(ObjectClass::RegExp) => return Ok(a.to_display_string()? == b.to_display_string()?),
        Some(ObjectClass::Function) => return Ok(false),
        _ => {}
    }
    if seen.contains(&(id_a, id_b)) {
        return Ok(true);
    }
    if class == Some(ObjectClass::Array) && a.length()? != b.length()? {
        return Ok(false);
    }
    let keys_a = keys(a)?;
    let keys_b = keys(b)?;
    if keys_a.len() != keys_b.len() {
        return Ok(false);
    }
    seen.push((id_a, id_b));
    for key in &keys_a {
        if !keys_b.contains(key) {
            return Ok(false);
        }
        let value_a = a.get_property(key, a)?;
        let value_b = b.get_property(key, b)?;
        if !deep_equal_inner(&value_a, &value_b, seen)? {
            return Ok(false);
        }
    }
    seen.pop();
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Object, Symbol};

    #[test]
    fn same_value_distinguishes_zeros_and_equates_nan() {
        assert!(same_value(&Value::from(f64::NAN), &Value::from(f64::NAN)));
        assert!(!same_value(&Value::from(0.0), &Value::from(-0.0)));
        assert!(strict_equals(&Value::from(0.0), &Value::from(-0.0)));
        assert!(!strict_equals(&Value::from(f64::NAN), &Value::from(f64::NAN)));
        assert!(same_value_zero(&Value::from(0.0), &Value::from(-0.0)));
        assert!(!same_value(&Value::from(1), &Value::from("1")));
    }

    #[test]
    fn objects_and_symbols_compare_by_identity() {
        let obj = Object::new();
        assert!(same_value(&Value::from(&obj), &Value::from(&obj)));
        assert!(!same_value(&Value::from(Object::new()), &Value::from(Object::new())));
        let sym = Symbol::new("x");
        assert!(same_value(&Value::from(sym.clone()), &Value::from(sym)));
    }

    #[test]
    fn deep_equal_compares_structure() {
        let a = Value::from(Object::new().with("x", Object::array(vec![Value::from(1)])));
        let b = Value::from(Object::new().with("x", Object::array(vec![Value::from(1)])));
        let c = Value::from(Object::new().with("x", Object::array(vec![Value::from(2)])));
        assert!(deep_equal(&a, &b));
        assert!(!deep_equal(&a, &c));
        assert!(deep_equal(&Value::from(Object::date(5.0)), &Value::from(Object::date(5.0))));
        assert!(!deep_equal(&Value::from(Object::array(vec![])), &Value::from(Object::new())));
    }

    #[test]
    fn deep_equal_terminates_on_cycles() {
        let a = Object::new();
        a.insert("self", &a);
        let b = Object::new();
        b.insert("self", &b);
        assert!(deep_equal(&Value::from(&a), &Value::from(&b)));
    }
}
