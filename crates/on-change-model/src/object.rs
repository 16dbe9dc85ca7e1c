//! Ordinary objects and their reflective algorithms.
//!
//! An [`Object`] is a shared, interior-mutable property bag with a class tag
//! and an optional prototype. The `ordinary_*` methods implement the
//! get/set/define/delete semantics that the rest of the crate (and any
//! [`ExoticObject`](crate::ExoticObject) wrapping an object) relies on:
//! refused operations return `Ok(false)`, user code (getters, setters,
//! functions) may fail with a [`ModelError`].
//!
//! No `RefCell` borrow is held while user code runs, so getters, setters and
//! methods can freely reenter the object they belong to.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use crate::builtins;
use crate::equality::same_value;
use crate::error::ModelError;
use crate::key::PropertyKey;
use crate::value::Value;

/// What kind of object a value is, as far as built-in behavior goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectClass {
    /// A plain record or an instance of a user-defined prototype.
    Ordinary,
    Array,
    Function,
    /// Carries a mutable time value changed only through its methods.
    Date,
    /// Has no mutating methods.
    RegExp,
    /// A boxed number. Has no mutating methods.
    Number,
}

pub type NativeFn = dyn Fn(&Value, &[Value]) -> Result<Value, ModelError>;

/// A callable body: receives the receiver (`this`) and the arguments.
#[derive(Clone)]
pub struct NativeFunction {
    name: Rc<str>,
    func: Rc<NativeFn>,
}

impl NativeFunction {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Function: {}]", self.name)
    }
}

#[derive(Debug, Clone)]
pub(crate) enum ObjectKind {
    Ordinary,
    Array,
    Function(NativeFunction),
    Date(f64),
    RegExp(Rc<str>),
    Number(f64),
}

impl ObjectKind {
    fn class(&self) -> ObjectClass {
        match self {
            ObjectKind::Ordinary => ObjectClass::Ordinary,
            ObjectKind::Array => ObjectClass::Array,
            ObjectKind::Function(_) => ObjectClass::Function,
            ObjectKind::Date(_) => ObjectClass::Date,
            ObjectKind::RegExp(_) => ObjectClass::RegExp,
            ObjectKind::Number(_) => ObjectClass::Number,
        }
    }
}

/// A stored property.
#[derive(Debug, Clone)]
pub enum Property {
    Data {
        value: Value,
        writable: bool,
        enumerable: bool,
        configurable: bool,
    },
    Accessor {
        get: Option<Value>,
        set: Option<Value>,
        enumerable: bool,
        configurable: bool,
    },
}

impl Property {
    pub fn enumerable(&self) -> bool {
        match self {
            Property::Data { enumerable, .. } | Property::Accessor { enumerable, .. } => *enumerable,
        }
    }

    pub fn configurable(&self) -> bool {
        match self {
            Property::Data { configurable, .. } | Property::Accessor { configurable, .. } => {
                *configurable
            }
        }
    }

    pub fn is_accessor(&self) -> bool {
        matches!(self, Property::Accessor { .. })
    }

    fn to_descriptor(&self) -> PropertyDescriptor {
        match self {
            Property::Data {
                value,
                writable,
                enumerable,
                configurable,
            } => PropertyDescriptor {
                value: Some(value.clone()),
                writable: Some(*writable),
                get: None,
                set: None,
                enumerable: Some(*enumerable),
                configurable: Some(*configurable),
            },
            Property::Accessor {
                get,
                set,
                enumerable,
                configurable,
            } => PropertyDescriptor {
                value: None,
                writable: None,
                get: Some(get.clone().unwrap_or_default()),
                set: Some(set.clone().unwrap_or_default()),
                enumerable: Some(*enumerable),
                configurable: Some(*configurable),
            },
        }
    }
}

/// A possibly partial property descriptor.
///
/// Descriptors returned by `get_own_property` are complete: data descriptors
/// carry `value`/`writable`, accessor descriptors carry `get`/`set` (with
/// `Value::Undefined` standing for a missing function). Absent flags in a
/// descriptor passed to `define_property` default to `false` when a new
/// property is created and leave the current flag untouched otherwise.
#[derive(Debug, Clone, Default)]
pub struct PropertyDescriptor {
    pub value: Option<Value>,
    pub writable: Option<bool>,
    pub get: Option<Value>,
    pub set: Option<Value>,
    pub enumerable: Option<bool>,
    pub configurable: Option<bool>,
}

impl PropertyDescriptor {
    pub fn data(value: impl Into<Value>) -> Self {
        PropertyDescriptor {
            value: Some(value.into()),
            ..Default::default()
        }
    }

    /// A writable, enumerable, configurable data descriptor: what a plain
    /// assignment creates.
    pub fn plain(value: impl Into<Value>) -> Self {
        PropertyDescriptor::data(value)
            .with_writable(true)
            .with_enumerable(true)
            .with_configurable(true)
    }

    pub fn accessor(get: Option<Value>, set: Option<Value>) -> Self {
        PropertyDescriptor {
            get: Some(get.unwrap_or_default()),
            set: Some(set.unwrap_or_default()),
            ..Default::default()
        }
    }

    pub fn with_writable(mut self, writable: bool) -> Self {
        self.writable = Some(writable);
        self
    }

    pub fn with_enumerable(mut self, enumerable: bool) -> Self {
        self.enumerable = Some(enumerable);
        self
    }

    pub fn with_configurable(mut self, configurable: bool) -> Self {
        self.configurable = Some(configurable);
        self
    }

    pub fn is_accessor(&self) -> bool {
        self.get.is_some() || self.set.is_some()
    }

    pub fn is_data(&self) -> bool {
        self.value.is_some() || self.writable.is_some()
    }

    pub fn is_generic(&self) -> bool {
        !self.is_accessor() && !self.is_data()
    }

    pub fn getter(&self) -> Option<&Value> {
        self.get.as_ref().filter(|g| !g.is_undefined())
    }

    pub fn setter(&self) -> Option<&Value> {
        self.set.as_ref().filter(|s| !s.is_undefined())
    }
}

pub struct ObjectData {
    kind: ObjectKind,
    properties: IndexMap<PropertyKey, Property>,
    prototype: Option<Object>,
    extensible: bool,
}

/// A reference to an ordinary object. Clones share the same object.
#[derive(Clone)]
pub struct Object(Rc<RefCell<ObjectData>>);

impl Default for Object {
    fn default() -> Self {
        Object::new()
    }
}

impl Object {
    pub(crate) fn raw(kind: ObjectKind, prototype: Option<Object>) -> Self {
        Object(Rc::new(RefCell::new(ObjectData {
            kind,
            properties: IndexMap::new(),
            prototype,
            extensible: true,
        })))
    }

    pub(crate) fn from_rc(rc: Rc<RefCell<ObjectData>>) -> Self {
        Object(rc)
    }

    /// A plain record inheriting the shared object prototype.
    pub fn new() -> Self {
        Object::raw(ObjectKind::Ordinary, Some(builtins::object_prototype()))
    }

    /// A record with an explicit prototype, e.g. an instance of a
    /// user-defined "class" whose methods live on `prototype`.
    pub fn with_prototype(prototype: Option<&Object>) -> Self {
        Object::raw(ObjectKind::Ordinary, prototype.cloned())
    }

    pub fn array(values: Vec<Value>) -> Self {
        let array = Object::raw(ObjectKind::Array, Some(builtins::array_prototype()));
        {
            let mut data = array.0.borrow_mut();
            let len = values.len();
            for (index, value) in values.into_iter().enumerate() {
                data.properties.insert(
                    PropertyKey::from(index),
                    Property::Data {
                        value,
                        writable: true,
                        enumerable: true,
                        configurable: true,
                    },
                );
            }
            data.properties.insert(
                PropertyKey::from("length"),
                Property::Data {
                    value: Value::from(len),
                    writable: true,
                    enumerable: false,
                    configurable: false,
                },
            );
        }
        array
    }

    /// A date holding `time` milliseconds since the Unix epoch (UTC).
    pub fn date(time: f64) -> Self {
        Object::raw(ObjectKind::Date(time), Some(builtins::date_prototype()))
    }

    pub fn regexp(source: &str) -> Self {
        Object::raw(ObjectKind::RegExp(Rc::from(source)), Some(builtins::object_prototype()))
    }

    pub fn number_box(n: f64) -> Self {
        Object::raw(ObjectKind::Number(n), Some(builtins::object_prototype()))
    }

    pub fn function<F>(name: &str, func: F) -> Self
    where
        F: Fn(&Value, &[Value]) -> Result<Value, ModelError> + 'static,
    {
        Object::raw(
            ObjectKind::Function(NativeFunction {
                name: Rc::from(name),
                func: Rc::new(func),
            }),
            None,
        )
    }

    /// Adds (or overwrites) a plain data property and returns the object,
    /// for building graphs.
    pub fn with(self, key: impl Into<PropertyKey>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Defines a plain writable, enumerable, configurable data property.
    /// Returns whether the definition succeeded.
    pub fn insert(&self, key: impl Into<PropertyKey>, value: impl Into<Value>) -> bool {
        self.ordinary_define_own_property(&key.into(), PropertyDescriptor::plain(value))
            .unwrap_or(false)
    }

    pub fn class(&self) -> ObjectClass {
        self.0.borrow().kind.class()
    }

    pub fn ptr_eq(a: &Object, b: &Object) -> bool {
        Rc::ptr_eq(&a.0, &b.0)
    }

    pub(crate) fn addr(&self) -> usize {
        Rc::as_ptr(&self.0) as *const () as usize
    }

    pub(crate) fn downgrade(&self) -> Weak<RefCell<ObjectData>> {
        Rc::downgrade(&self.0)
    }

    pub fn prototype(&self) -> Option<Object> {
        self.0.borrow().prototype.clone()
    }

    pub fn primitive_value(&self) -> Option<f64> {
        match self.0.borrow().kind {
            ObjectKind::Date(t) | ObjectKind::Number(t) => Some(t),
            _ => None,
        }
    }

    pub fn date_value(&self) -> Option<f64> {
        match self.0.borrow().kind {
            ObjectKind::Date(t) => Some(t),
            _ => None,
        }
    }

    /// Replaces the time value of a date. Returns `false` for non-dates.
    pub fn set_date_value(&self, time: f64) -> bool {
        match &mut self.0.borrow_mut().kind {
            ObjectKind::Date(t) => {
                *t = time;
                true
            }
            _ => false,
        }
    }

    pub fn regexp_source(&self) -> Option<String> {
        match &self.0.borrow().kind {
            ObjectKind::RegExp(source) => Some(source.to_string()),
            _ => None,
        }
    }

    pub fn function_name(&self) -> Option<String> {
        match &self.0.borrow().kind {
            ObjectKind::Function(f) => Some(f.name().to_string()),
            _ => None,
        }
    }

    pub fn call(&self, this: &Value, args: &[Value]) -> Result<Value, ModelError> {
        let func = match &self.0.borrow().kind {
            ObjectKind::Function(f) => Rc::clone(&f.func),
            _ => return Err(ModelError::NotCallable(format!("{:?}", self))),
        };
        func(this, args)
    }

    // --------------------------------------------------- Integrity levels

    pub fn is_extensible(&self) -> bool {
        self.0.borrow().extensible
    }

    pub fn prevent_extensions(&self) {
        self.0.borrow_mut().extensible = false;
    }

    pub fn seal(&self) {
        let mut data = self.0.borrow_mut();
        data.extensible = false;
        for prop in data.properties.values_mut() {
            match prop {
                Property::Data { configurable, .. } | Property::Accessor { configurable, .. } => {
                    *configurable = false
                }
            }
        }
    }

    pub fn freeze(&self) {
        let mut data = self.0.borrow_mut();
        data.extensible = false;
        for prop in data.properties.values_mut() {
            match prop {
                Property::Data {
                    writable,
                    configurable,
                    ..
                } => {
                    *writable = false;
                    *configurable = false;
                }
                Property::Accessor { configurable, .. } => *configurable = false,
            }
        }
    }

    pub fn is_frozen(&self) -> bool {
        let data = self.0.borrow();
        !data.extensible
            && data.properties.values().all(|prop| match prop {
                Property::Data {
                    writable,
                    configurable,
                    ..
                } => !writable && !configurable,
                Property::Accessor { configurable, .. } => !configurable,
            })
    }

    // ------------------------------------------------- Ordinary algorithms

    fn own_property(&self, key: &PropertyKey) -> Option<Property> {
        self.0.borrow().properties.get(key).cloned()
    }

    pub fn ordinary_get_own_property(&self, key: &PropertyKey) -> Option<PropertyDescriptor> {
        self.0.borrow().properties.get(key).map(Property::to_descriptor)
    }

    pub fn ordinary_has_property(&self, key: &PropertyKey) -> bool {
        let proto = {
            let data = self.0.borrow();
            if data.properties.contains_key(key) {
                return true;
            }
            data.prototype.clone()
        };
        proto.is_some_and(|p| p.ordinary_has_property(key))
    }

    pub fn ordinary_get(&self, key: &PropertyKey, receiver: &Value) -> Result<Value, ModelError> {
        let (own, proto) = {
            let data = self.0.borrow();
            (data.properties.get(key).cloned(), data.prototype.clone())
        };
        match own {
            Some(Property::Data { value, .. }) => Ok(value),
            Some(Property::Accessor { get: Some(getter), .. }) => getter.call(receiver, &[]),
            Some(Property::Accessor { get: None, .. }) => Ok(Value::Undefined),
            None => match proto {
                Some(parent) => parent.ordinary_get(key, receiver),
                None => Ok(Value::Undefined),
            },
        }
    }

    pub fn ordinary_set(
        &self,
        key: &PropertyKey,
        value: Value,
        receiver: &Value,
    ) -> Result<bool, ModelError> {
        let own = match self.own_property(key) {
            Some(prop) => prop,
            None => match self.prototype() {
                Some(parent) => return parent.ordinary_set(key, value, receiver),
                None => Property::Data {
                    value: Value::Undefined,
                    writable: true,
                    enumerable: true,
                    configurable: true,
                },
            },
        };
        match own {
            Property::Data { writable, .. } => {
                if !writable || !receiver.is_object() {
                    return Ok(false);
                }
                match receiver.get_own_property(key)? {
                    Some(existing) => {
                        if existing.is_accessor() || existing.writable == Some(false) {
                            return Ok(false);
                        }
                        receiver.define_own_property(key, PropertyDescriptor::data(value))
                    }
                    None => receiver.define_own_property(key, PropertyDescriptor::plain(value)),
                }
            }
            Property::Accessor { set: Some(setter), .. } => {
                setter.call(receiver, &[value])?;
                Ok(true)
            }
            Property::Accessor { set: None, .. } => Ok(false),
        }
    }

    pub fn ordinary_define_own_property(
        &self,
        key: &PropertyKey,
        desc: PropertyDescriptor,
    ) -> Result<bool, ModelError> {
        if self.class() == ObjectClass::Array {
            if key == "length" {
                return self.array_set_length(desc);
            }
            if let Some(index) = key.as_array_index() {
                let index = index as usize;
                let (len, len_writable) = self.array_length();
                if index >= len && !len_writable {
                    return Ok(false);
                }
                if !self.validate_and_apply(key, desc) {
                    return Ok(false);
                }
                if index >= len {
                    self.write_array_length(index + 1);
                }
                return Ok(true);
            }
        }
        Ok(self.validate_and_apply(key, desc))
    }

    pub fn ordinary_delete(&self, key: &PropertyKey) -> bool {
        let mut data = self.0.borrow_mut();
        let configurable = match data.properties.get(key) {
            None => return true,
            Some(prop) => prop.configurable(),
        };
        if configurable {
            data.properties.shift_remove(key);
        }
        configurable
    }

    /// Own keys: array indices ascending, then strings and symbols in
    /// insertion order.
    pub fn ordinary_own_keys(&self) -> Vec<PropertyKey> {
        let data = self.0.borrow();
        let mut indices: Vec<(u32, PropertyKey)> = Vec::new();
        let mut strings = Vec::new();
        let mut symbols = Vec::new();
        for key in data.properties.keys() {
            match key {
                PropertyKey::Symbol(_) => symbols.push(key.clone()),
                PropertyKey::String(_) => match key.as_array_index() {
                    Some(index) => indices.push((index, key.clone())),
                    None => strings.push(key.clone()),
                },
            }
        }
        indices.sort_by_key(|(index, _)| *index);
        indices
            .into_iter()
            .map(|(_, key)| key)
            .chain(strings)
            .chain(symbols)
            .collect()
    }

    fn validate_and_apply(&self, key: &PropertyKey, desc: PropertyDescriptor) -> bool {
        let mut guard = self.0.borrow_mut();
        let data = &mut *guard;
        if !data.properties.contains_key(key) {
            if !data.extensible {
                return false;
            }
            let prop = if desc.is_accessor() {
                Property::Accessor {
                    get: desc.get.filter(|g| !g.is_undefined()),
                    set: desc.set.filter(|s| !s.is_undefined()),
                    enumerable: desc.enumerable.unwrap_or(false),
                    configurable: desc.configurable.unwrap_or(false),
                }
            } else {
                Property::Data {
                    value: desc.value.unwrap_or_default(),
                    writable: desc.writable.unwrap_or(false),
                    enumerable: desc.enumerable.unwrap_or(false),
                    configurable: desc.configurable.unwrap_or(false),
                }
            };
            data.properties.insert(key.clone(), prop);
            return true;
        }
        let Some(current) = data.properties.get_mut(key) else {
            return false;
        };

        let kind_change = !desc.is_generic() && desc.is_accessor() != current.is_accessor();
        if !current.configurable() {
            if desc.configurable == Some(true) {
                return false;
            }
            if desc.enumerable.is_some_and(|e| e != current.enumerable()) {
                return false;
            }
            if kind_change {
                return false;
            }
            match &*current {
                Property::Data {
                    value,
                    writable: false,
                    ..
                } => {
                    if desc.writable == Some(true) {
                        return false;
                    }
                    if desc.value.as_ref().is_some_and(|v| !same_value(v, value)) {
                        return false;
                    }
                }
                Property::Accessor { get, set, .. } => {
                    let current_get = get.clone().unwrap_or_default();
                    let current_set = set.clone().unwrap_or_default();
                    if desc.get.as_ref().is_some_and(|g| !same_value(g, &current_get)) {
                        return false;
                    }
                    if desc.set.as_ref().is_some_and(|s| !same_value(s, &current_set)) {
                        return false;
                    }
                }
                Property::Data { .. } => {}
            }
        }

        if kind_change {
            let enumerable = current.enumerable();
            let configurable = current.configurable();
            *current = if desc.is_accessor() {
                Property::Accessor {
                    get: None,
                    set: None,
                    enumerable,
                    configurable,
                }
            } else {
                Property::Data {
                    value: Value::Undefined,
                    writable: false,
                    enumerable,
                    configurable,
                }
            };
        }

        match current {
            Property::Data {
                value,
                writable,
                enumerable,
                configurable,
            } => {
                if let Some(v) = desc.value {
                    *value = v;
                }
                if let Some(w) = desc.writable {
                    *writable = w;
                }
                if let Some(e) = desc.enumerable {
                    *enumerable = e;
                }
                if let Some(c) = desc.configurable {
                    *configurable = c;
                }
            }
            Property::Accessor {
                get,
                set,
                enumerable,
                configurable,
            } => {
                if let Some(g) = desc.get {
                    *get = (!g.is_undefined()).then_some(g);
                }
                if let Some(s) = desc.set {
                    *set = (!s.is_undefined()).then_some(s);
                }
                if let Some(e) = desc.enumerable {
                    *enumerable = e;
                }
                if let Some(c) = desc.configurable {
                    *configurable = c;
                }
            }
        }
        true
    }

    // -------------------------------------------------------- Array length

    fn array_length(&self) -> (usize, bool) {
        match self.0.borrow().properties.get(&PropertyKey::from("length")) {
            Some(Property::Data {
                value, writable, ..
            }) => (value.to_number().max(0.0) as usize, *writable),
            _ => (0, true),
        }
    }

    fn write_array_length(&self, len: usize) {
        if let Some(Property::Data { value, .. }) =
            self.0.borrow_mut().properties.get_mut(&PropertyKey::from("length"))
        {
            *value = Value::from(len);
        }
    }

    fn array_set_length(&self, mut desc: PropertyDescriptor) -> Result<bool, ModelError> {
        let length_key = PropertyKey::from("length");
        let Some(value) = desc.value.take() else {
            return Ok(self.validate_and_apply(&length_key, desc));
        };
        let number = value.to_number();
        if number.is_nan() || number < 0.0 || number.fract() != 0.0 || number >= u32::MAX as f64 {
            return Err(ModelError::RangeError("invalid array length".to_string()));
        }
        let new_len = number as usize;
        desc.value = Some(Value::from(new_len));

        let (old_len, writable) = self.array_length();
        if new_len >= old_len {
            return Ok(self.validate_and_apply(&length_key, desc));
        }
        if !writable {
            return Ok(false);
        }
        let mut doomed: Vec<(usize, PropertyKey)> = self
            .0
            .borrow()
            .properties
            .keys()
            .filter_map(|key| {
                key.as_array_index()
                    .map(|index| index as usize)
                    .filter(|index| *index >= new_len)
                    .map(|index| (index, key.clone()))
            })
            .collect();
        doomed.sort_by(|a, b| b.0.cmp(&a.0));
        for (index, key) in doomed {
            if !self.ordinary_delete(&key) {
                self.write_array_length(index + 1);
                return Ok(false);
            }
        }
        Ok(self.validate_and_apply(&length_key, desc))
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.0.borrow();
        match &data.kind {
            ObjectKind::Function(func) => write!(f, "{:?}", func),
            ObjectKind::Date(t) => write!(f, "Date({})", t),
            ObjectKind::RegExp(source) => write!(f, "/{}/", source),
            ObjectKind::Number(n) => write!(f, "Number({})", n),
            kind => write!(
                f,
                "{:?}@{:#x} ({} own keys)",
                kind.class(),
                Rc::as_ptr(&self.0) as usize,
                data.properties.len()
            ),
        }
    }
}
