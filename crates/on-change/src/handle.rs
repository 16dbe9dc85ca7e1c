//! Wrapped handles and the trap set behind them.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use on_change_model::{
    keys, same_value, ExoticObject, ModelError, ObjectClass, PropertyDescriptor, PropertyKey,
    Value,
};

use crate::events::ChangeKind;
use crate::path::Path;
use crate::session::Session;

pub(crate) struct HandleInner {
    session: Rc<Session>,
    target: Value,
}

impl HandleInner {
    pub(crate) fn new(session: Rc<Session>, target: Value) -> Self {
        Self { session, target }
    }

    pub(crate) fn target(&self) -> &Value {
        &self.target
    }

    fn path(&self) -> Path {
        self.session.path_of(&self.target).unwrap_or_default()
    }
}

/// Stand-in for one underlying value of an observed graph.
///
/// A handle answers every operation its target supports. Reads of nested
/// objects return further handles; writes, definitions, deletions and method
/// calls made through it are reported to the session's callback. Clones are
/// the same handle. Use [`Handle::to_value`] to pass a handle wherever a
/// [`Value`] is expected, e.g. as an argument to a method.
#[derive(Clone)]
pub struct Handle(pub(crate) Rc<HandleInner>);

impl Handle {
    /// Recovers the handle behind a value, if it is one.
    pub fn from_value(value: &Value) -> Option<Handle> {
        let exotic = Rc::clone(value.as_exotic()?);
        exotic.into_any().downcast::<HandleInner>().ok().map(Handle)
    }

    pub fn to_value(&self) -> Value {
        let exotic: Rc<dyn ExoticObject> = self.0.clone();
        Value::Exotic(exotic)
    }

    pub fn ptr_eq(a: &Handle, b: &Handle) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    pub(crate) fn session(&self) -> &Rc<Session> {
        &self.0.session
    }

    /// The underlying value, without interception.
    pub fn target(&self) -> &Value {
        &self.0.target
    }

    /// Same as [`Handle::target`], owned.
    pub fn observed(&self) -> Value {
        self.0.target.clone()
    }

    /// Where the session last saw the target, relative to the root.
    pub fn path(&self) -> Path {
        self.0.path()
    }

    pub fn is_root(&self) -> bool {
        !self.0.session.is_unobserved()
            && self
                .0
                .session
                .path_of(&self.0.target)
                .is_some_and(|path| path.is_root())
    }

    /// Ends the session and returns the root value. On any handle other
    /// than the root of a live session this does nothing and returns the
    /// handle itself.
    pub fn unobserve(&self) -> Value {
        if !self.is_root() {
            return self.to_value();
        }
        self.0.session.shutdown();
        self.0.target.clone()
    }

    pub fn get(&self, key: impl Into<PropertyKey>) -> Result<Value, ModelError> {
        self.to_value().get(key)
    }

    pub fn set(
        &self,
        key: impl Into<PropertyKey>,
        value: impl Into<Value>,
    ) -> Result<bool, ModelError> {
        self.to_value().set(key, value)
    }

    pub fn define_property(
        &self,
        key: impl Into<PropertyKey>,
        desc: PropertyDescriptor,
    ) -> Result<bool, ModelError> {
        self.to_value().define_property(key, desc)
    }

    pub fn delete(&self, key: impl Into<PropertyKey>) -> Result<bool, ModelError> {
        self.to_value().delete(key)
    }

    pub fn has(&self, key: impl Into<PropertyKey>) -> Result<bool, ModelError> {
        self.to_value().has(key)
    }

    /// Calls the method stored under `key` with this handle as receiver.
    pub fn invoke(
        &self,
        key: impl Into<PropertyKey>,
        args: &[Value],
    ) -> Result<Value, ModelError> {
        self.to_value().invoke(key, args)
    }

    pub fn length(&self) -> Result<usize, ModelError> {
        self.to_value().length()
    }

    pub fn own_keys(&self) -> Result<Vec<PropertyKey>, ModelError> {
        self.to_value().own_keys()
    }

    pub fn keys(&self) -> Result<Vec<PropertyKey>, ModelError> {
        keys(&self.to_value())
    }

    pub fn to_json(&self) -> Result<serde_json::Value, ModelError> {
        self.to_value().to_json()
    }
}

impl PartialEq for Handle {
    fn eq(&self, other: &Self) -> bool {
        Handle::ptr_eq(self, other)
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("session", &self.0.session.id())
            .field("path", &self.path())
            .field("target", &self.0.target)
            .finish()
    }
}

impl From<Handle> for Value {
    fn from(handle: Handle) -> Self {
        handle.to_value()
    }
}

impl From<&Handle> for Value {
    fn from(handle: &Handle) -> Self {
        handle.to_value()
    }
}

/// Unwraps a handle one level; any other value is returned as is.
pub fn observed(value: &Value) -> Value {
    match Handle::from_value(value) {
        Some(handle) => handle.observed(),
        None => value.clone(),
    }
}

/// Descriptor equality with absent flags read as `false`. Values and
/// accessor functions compare by identity.
fn same_descriptor(a: &PropertyDescriptor, b: &PropertyDescriptor) -> bool {
    fn field(value: &Option<Value>) -> Value {
        value.clone().unwrap_or_default()
    }
    same_value(&field(&a.value), &field(&b.value))
        && a.writable.unwrap_or(false) == b.writable.unwrap_or(false)
        && a.enumerable.unwrap_or(false) == b.enumerable.unwrap_or(false)
        && a.configurable.unwrap_or(false) == b.configurable.unwrap_or(false)
        && same_value(&field(&a.get), &field(&b.get))
        && same_value(&field(&a.set), &field(&b.set))
}

impl ExoticObject for HandleInner {
    fn class(&self) -> ObjectClass {
        self.target.object_class().unwrap_or(ObjectClass::Ordinary)
    }

    fn primitive_value(&self) -> Option<f64> {
        self.target.primitive_value()
    }

    fn get_own_property(
        &self,
        key: &PropertyKey,
    ) -> Result<Option<PropertyDescriptor>, ModelError> {
        self.target.get_own_property(key)
    }

    fn has_property(&self, key: &PropertyKey) -> Result<bool, ModelError> {
        self.target.has_property(key)
    }

    fn get(&self, key: &PropertyKey, receiver: &Value) -> Result<Value, ModelError> {
        let session = &self.session;
        let value = self.target.get_property(key, receiver)?;
        if value.is_primitive()
            || matches!(
                value.object_class(),
                Some(ObjectClass::RegExp | ObjectClass::Number)
            )
            || *key == "constructor"
            || session.options().shallow
            || session.is_ignored(key)
        {
            return Ok(value);
        }
        if let Some(desc) = self.target.get_own_property(key)? {
            if desc.configurable == Some(false) {
                if desc.setter().is_some() && desc.getter().is_none() {
                    return Ok(Value::Undefined);
                }
                if desc.writable == Some(false) {
                    return Ok(value);
                }
            }
        }
        let value = match Handle::from_value(&value) {
            Some(handle) if Rc::ptr_eq(handle.session(), session) => handle.observed(),
            _ => value,
        };
        Ok(session.wrap(value, self.path().child(key.clone())))
    }

    fn set(&self, key: &PropertyKey, value: Value, receiver: &Value) -> Result<bool, ModelError> {
        let session = &self.session;
        let value = observed(&value);
        let descriptor = self.target.get_own_property(key)?;
        let previous = self.target.get_property(key, receiver)?;
        let changed =
            !self.target.has_property(key)? || !(session.options().equals)(&previous, &value);

        if let Some(setter) = descriptor.as_ref().and_then(PropertyDescriptor::setter) {
            setter.call(receiver, &[value])?;
            return Ok(true);
        }
        if !changed {
            return Ok(true);
        }
        let ok = self.target.set_property(key, value.clone(), &self.target)?;
        if ok && !session.is_ignored(key) {
            session.handle_change(self.path(), key, &previous, &value, ChangeKind::Set)?;
        }
        Ok(ok)
    }

    fn define_own_property(
        &self,
        key: &PropertyKey,
        mut desc: PropertyDescriptor,
    ) -> Result<bool, ModelError> {
        let session = &self.session;
        desc.value = desc.value.as_ref().map(observed);
        let current = self.target.get_own_property(key)?;
        if current.is_some_and(|current| same_descriptor(&desc, &current)) {
            return Ok(true);
        }
        let value = desc.value.clone().unwrap_or_default();
        let ok = self.target.define_own_property(key, desc)?;
        if ok && !session.is_ignored(key) {
            session.handle_change(
                self.path(),
                key,
                &Value::Undefined,
                &value,
                ChangeKind::Define,
            )?;
        }
        Ok(ok)
    }

    fn delete(&self, key: &PropertyKey) -> Result<bool, ModelError> {
        let session = &self.session;
        if self.target.get_own_property(key)?.is_none() {
            return Ok(true);
        }
        let previous = self.target.get_property(key, &self.target)?;
        let ok = self.target.delete_property(key)?;
        if ok && !session.is_ignored(key) {
            session.handle_change(
                self.path(),
                key,
                &previous,
                &Value::Undefined,
                ChangeKind::Delete,
            )?;
        }
        Ok(ok)
    }

    fn own_keys(&self) -> Result<Vec<PropertyKey>, ModelError> {
        self.target.own_keys()
    }

    fn call(&self, this: &Value, args: &[Value]) -> Result<Value, ModelError> {
        self.session.apply(&self.target, this, args)
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}
