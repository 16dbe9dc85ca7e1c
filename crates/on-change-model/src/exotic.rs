//! The object protocol for values that are not ordinary objects.
//!
//! Every operation on [`Value`] dispatches either to the ordinary algorithms
//! in [`crate::object`] or to an [`ExoticObject`] implementation. Code written
//! against `Value` (the built-in methods included) therefore runs unchanged
//! against a façade that intercepts some or all of these operations.

use std::any::Any;
use std::rc::Rc;

use crate::error::ModelError;
use crate::key::PropertyKey;
use crate::object::{ObjectClass, PropertyDescriptor};
use crate::value::Value;

pub trait ExoticObject: Any {
    /// The class of the object this one presents itself as.
    fn class(&self) -> ObjectClass;

    /// Internal time value (dates) or boxed number, if any.
    fn primitive_value(&self) -> Option<f64>;

    fn get_own_property(&self, key: &PropertyKey)
        -> Result<Option<PropertyDescriptor>, ModelError>;

    fn has_property(&self, key: &PropertyKey) -> Result<bool, ModelError>;

    fn get(&self, key: &PropertyKey, receiver: &Value) -> Result<Value, ModelError>;

    fn set(&self, key: &PropertyKey, value: Value, receiver: &Value) -> Result<bool, ModelError>;

    fn define_own_property(
        &self,
        key: &PropertyKey,
        desc: PropertyDescriptor,
    ) -> Result<bool, ModelError>;

    fn delete(&self, key: &PropertyKey) -> Result<bool, ModelError>;

    fn own_keys(&self) -> Result<Vec<PropertyKey>, ModelError>;

    fn call(&self, this: &Value, args: &[Value]) -> Result<Value, ModelError>;

    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;
}
