use std::fmt;
use std::rc::{Rc, Weak};

use crate::equality::same_value;
use crate::error::ModelError;
use crate::exotic::ExoticObject;
use crate::key::{PropertyKey, Symbol};
use crate::object::{Object, ObjectClass, ObjectData, PropertyDescriptor};

/// Any value reachable in an object graph.
///
/// `Object` and `Exotic` are the object-typed variants; everything else is a
/// primitive. Cloning a `Value` never copies an object, only its reference.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Rc<str>),
    Symbol(Symbol),
    Object(Object),
    Exotic(Rc<dyn ExoticObject>),
}

/// Non-owning reference to an object-typed [`Value`].
#[derive(Clone)]
pub enum WeakValue {
    Object(Weak<std::cell::RefCell<ObjectData>>),
    Exotic(Weak<dyn ExoticObject>),
}

impl WeakValue {
    pub fn upgrade(&self) -> Option<Value> {
        match self {
            WeakValue::Object(weak) => weak.upgrade().map(|rc| Value::Object(Object::from_rc(rc))),
            WeakValue::Exotic(weak) => weak.upgrade().map(Value::Exotic),
        }
    }

    pub fn is_alive(&self) -> bool {
        match self {
            WeakValue::Object(weak) => weak.strong_count() > 0,
            WeakValue::Exotic(weak) => weak.strong_count() > 0,
        }
    }
}

impl Value {
    pub fn string(s: impl AsRef<str>) -> Self {
        Value::String(Rc::from(s.as_ref()))
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn is_primitive(&self) -> bool {
        !self.is_object()
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_) | Value::Exotic(_))
    }

    pub fn is_callable(&self) -> bool {
        self.object_class() == Some(ObjectClass::Function)
    }

    pub fn is_array(&self) -> bool {
        self.object_class() == Some(ObjectClass::Array)
    }

    pub fn object_class(&self) -> Option<ObjectClass> {
        match self {
            Value::Object(obj) => Some(obj.class()),
            Value::Exotic(ex) => Some(ex.class()),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_exotic(&self) -> Option<&Rc<dyn ExoticObject>> {
        match self {
            Value::Exotic(ex) => Some(ex),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Time value of a date, or the number inside a boxed number.
    pub fn primitive_value(&self) -> Option<f64> {
        match self {
            Value::Object(obj) => obj.primitive_value(),
            Value::Exotic(ex) => ex.primitive_value(),
            _ => None,
        }
    }

    /// Address-based identity of an object-typed value.
    pub fn identity(&self) -> Option<usize> {
        match self {
            Value::Object(obj) => Some(obj.addr()),
            Value::Exotic(ex) => Some(Rc::as_ptr(ex) as *const () as usize),
            _ => None,
        }
    }

    pub fn downgrade(&self) -> Option<WeakValue> {
        match self {
            Value::Object(obj) => Some(WeakValue::Object(obj.downgrade())),
            Value::Exotic(ex) => Some(WeakValue::Exotic(Rc::downgrade(ex))),
            _ => None,
        }
    }

    // ----------------------------------------------------------- Reflection

    pub fn get_property(&self, key: &PropertyKey, receiver: &Value) -> Result<Value, ModelError> {
        match self {
            Value::Object(obj) => obj.ordinary_get(key, receiver),
            Value::Exotic(ex) => ex.get(key, receiver),
            Value::Undefined | Value::Null => Err(ModelError::TypeError(format!(
                "cannot read properties of {} (reading '{}')",
                self.type_name(),
                key
            ))),
            _ => Ok(Value::Undefined),
        }
    }

    pub fn set_property(
        &self,
        key: &PropertyKey,
        value: Value,
        receiver: &Value,
    ) -> Result<bool, ModelError> {
        match self {
            Value::Object(obj) => obj.ordinary_set(key, value, receiver),
            Value::Exotic(ex) => ex.set(key, value, receiver),
            Value::Undefined | Value::Null => Err(ModelError::TypeError(format!(
                "cannot set properties of {} (setting '{}')",
                self.type_name(),
                key
            ))),
            _ => Ok(false),
        }
    }

    pub fn define_own_property(
        &self,
        key: &PropertyKey,
        desc: PropertyDescriptor,
    ) -> Result<bool, ModelError> {
        match self {
            Value::Object(obj) => obj.ordinary_define_own_property(key, desc),
            Value::Exotic(ex) => ex.define_own_property(key, desc),
            _ => Err(ModelError::type_error("cannot define a property on a primitive")),
        }
    }

    pub fn delete_property(&self, key: &PropertyKey) -> Result<bool, ModelError> {
        match self {
            Value::Object(obj) => Ok(obj.ordinary_delete(key)),
            Value::Exotic(ex) => ex.delete(key),
            Value::Undefined | Value::Null => Err(ModelError::TypeError(format!(
                "cannot delete properties of {}",
                self.type_name()
            ))),
            _ => Ok(true),
        }
    }

    pub fn has_property(&self, key: &PropertyKey) -> Result<bool, ModelError> {
        match self {
            Value::Object(obj) => Ok(obj.ordinary_has_property(key)),
            Value::Exotic(ex) => ex.has_property(key),
            _ => Err(ModelError::type_error("cannot use 'in' on a primitive")),
        }
    }

    pub fn get_own_property(
        &self,
        key: &PropertyKey,
    ) -> Result<Option<PropertyDescriptor>, ModelError> {
        match self {
            Value::Object(obj) => Ok(obj.ordinary_get_own_property(key)),
            Value::Exotic(ex) => ex.get_own_property(key),
            _ => Ok(None),
        }
    }

    pub fn own_keys(&self) -> Result<Vec<PropertyKey>, ModelError> {
        match self {
            Value::Object(obj) => Ok(obj.ordinary_own_keys()),
            Value::Exotic(ex) => ex.own_keys(),
            _ => Ok(Vec::new()),
        }
    }

    pub fn call(&self, this: &Value, args: &[Value]) -> Result<Value, ModelError> {
        match self {
            Value::Object(obj) => obj.call(this, args),
            Value::Exotic(ex) => ex.call(this, args),
            _ => Err(ModelError::NotCallable(self.type_name().to_string())),
        }
    }

    // ------------------------------------------------------ Convenience API

    pub fn get(&self, key: impl Into<PropertyKey>) -> Result<Value, ModelError> {
        self.get_property(&key.into(), self)
    }

    pub fn set(&self, key: impl Into<PropertyKey>, value: impl Into<Value>) -> Result<bool, ModelError> {
        self.set_property(&key.into(), value.into(), self)
    }

    pub fn define_property(
        &self,
        key: impl Into<PropertyKey>,
        desc: PropertyDescriptor,
    ) -> Result<bool, ModelError> {
        self.define_own_property(&key.into(), desc)
    }

    pub fn delete(&self, key: impl Into<PropertyKey>) -> Result<bool, ModelError> {
        self.delete_property(&key.into())
    }

    pub fn has(&self, key: impl Into<PropertyKey>) -> Result<bool, ModelError> {
        self.has_property(&key.into())
    }

    /// Looks up `key` and calls the result with `self` as the receiver.
    pub fn invoke(&self, key: impl Into<PropertyKey>, args: &[Value]) -> Result<Value, ModelError> {
        let key = key.into();
        let method = self.get_property(&key, self)?;
        if !method.is_callable() {
            return Err(ModelError::NotCallable(key.to_string()));
        }
        method.call(self, args)
    }

    /// The `length` property converted to an index-sized integer.
    pub fn length(&self) -> Result<usize, ModelError> {
        let len = self.get("length")?.to_number();
        if len.is_nan() || len <= 0.0 {
            return Ok(0);
        }
        Ok(len.min(u32::MAX as f64) as usize)
    }

    // ---------------------------------------------------------- Conversions

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::Object(_) | Value::Exotic(_) => {
                if self.is_callable() {
                    "function"
                } else {
                    "object"
                }
            }
        }
    }

    pub fn to_boolean(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => !(*n == 0.0 || n.is_nan()),
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return 0.0;
                }
                match trimmed {
                    "Infinity" | "+Infinity" => f64::INFINITY,
                    "-Infinity" => f64::NEG_INFINITY,
                    _ => trimmed.parse::<f64>().unwrap_or(f64::NAN),
                }
            }
            Value::Symbol(_) => f64::NAN,
            Value::Object(_) | Value::Exotic(_) => self.primitive_value().unwrap_or(f64::NAN),
        }
    }

    /// `ToIntegerOrInfinity`: NaN becomes 0, fractions truncate toward zero.
    pub fn to_integer(&self) -> f64 {
        let n = self.to_number();
        if n.is_nan() {
            0.0
        } else {
            n.trunc()
        }
    }

    /// String conversion used by `join` and the default `sort` order.
    pub fn to_display_string(&self) -> Result<String, ModelError> {
        Ok(match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => number_to_string(*n),
            Value::String(s) => s.to_string(),
            Value::Symbol(sym) => sym.to_string(),
            Value::Object(_) | Value::Exotic(_) => match self.object_class() {
                Some(ObjectClass::Array) => crate::builtins::array::join_values(self, ",")?,
                Some(ObjectClass::Number) | Some(ObjectClass::Date) => {
                    number_to_string(self.to_number())
                }
                Some(ObjectClass::RegExp) => match self {
                    Value::Object(obj) => format!("/{}/", obj.regexp_source().unwrap_or_default()),
                    _ => "/(?:)/".to_string(),
                },
                Some(ObjectClass::Function) => "function () { [native code] }".to_string(),
                _ => "[object Object]".to_string(),
            },
        })
    }
}

pub(crate) fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let s = if n > 0.0 { "Infinity" } else { "-Infinity" };
        s.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.fract() == 0.0 && n.abs() < 1e21 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        same_value(self, other)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined => f.write_str("undefined"),
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => f.write_str(&number_to_string(*n)),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Symbol(sym) => write!(f, "{:?}", sym),
            Value::Object(obj) => write!(f, "{:?}", obj),
            Value::Exotic(ex) => write!(f, "Exotic({:?})", ex.class()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n as f64)
    }
}

impl From<usize> for Value {
    fn from(n: usize) -> Self {
        Value::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Rc::from(s))
    }
}

impl From<Symbol> for Value {
    fn from(sym: Symbol) -> Self {
        Value::Symbol(sym)
    }
}

impl From<Object> for Value {
    fn from(obj: Object) -> Self {
        Value::Object(obj)
    }
}

impl From<&Object> for Value {
    fn from(obj: &Object) -> Self {
        Value::Object(obj.clone())
    }
}

impl From<&Value> for Value {
    fn from(value: &Value) -> Self {
        value.clone()
    }
}

impl From<PropertyKey> for Value {
    fn from(key: PropertyKey) -> Self {
        match key {
            PropertyKey::String(s) => Value::String(s),
            PropertyKey::Symbol(sym) => Value::Symbol(sym),
        }
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Undefined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitive_classification() {
        assert!(Value::Undefined.is_primitive());
        assert!(Value::Null.is_primitive());
        assert!(Value::from("a").is_primitive());
        assert!(Value::from(Symbol::new("s")).is_primitive());
        assert!(!Value::from(Object::new()).is_primitive());
        assert!(Value::from(Object::array(vec![])).is_array());
    }

    #[test]
    fn number_conversion() {
        assert!(Value::Undefined.to_number().is_nan());
        assert_eq!(Value::Null.to_number(), 0.0);
        assert_eq!(Value::from(" 12 ").to_number(), 12.0);
        assert_eq!(Value::from("").to_number(), 0.0);
        assert!(Value::from("abc").to_number().is_nan());
        assert_eq!(Value::from(Object::number_box(3.0)).to_number(), 3.0);
    }

    #[test]
    fn number_formatting() {
        assert_eq!(number_to_string(1.0), "1");
        assert_eq!(number_to_string(-0.0), "0");
        assert_eq!(number_to_string(1.5), "1.5");
        assert_eq!(number_to_string(f64::INFINITY), "Infinity");
        assert_eq!(number_to_string(f64::NAN), "NaN");
    }

    #[test]
    fn reading_from_nullish_is_a_type_error() {
        assert!(matches!(Value::Undefined.get("a"), Err(ModelError::TypeError(_))));
        assert!(matches!(Value::from(1).get("a"), Ok(Value::Undefined)));
    }
}
