use std::fmt;
use std::rc::Rc;

use on_change_model::{same_value, PropertyKey, Value};

pub type EqualsFn = dyn Fn(&Value, &Value) -> bool;

/// Settings for one observation session.
#[derive(Clone)]
pub struct Options {
    /// Decides whether a write changes a property. Default is
    /// [`same_value`].
    pub equals: Rc<EqualsFn>,
    /// Only intercept the root's own properties. Default is `false`.
    pub shallow: bool,
    /// Neither wrap nor report symbol-keyed properties. Default is `false`.
    pub ignore_symbols: bool,
    /// Neither wrap nor report keys starting with `_`. Default is `false`.
    pub ignore_underscores: bool,
    /// Keys that are neither wrapped nor reported.
    pub ignore_keys: Vec<PropertyKey>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            equals: Rc::new(same_value),
            shallow: false,
            ignore_symbols: false,
            ignore_underscores: false,
            ignore_keys: Vec::new(),
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn equals<F>(mut self, equals: F) -> Self
    where
        F: Fn(&Value, &Value) -> bool + 'static,
    {
        self.equals = Rc::new(equals);
        self
    }

    pub fn shallow(mut self, shallow: bool) -> Self {
        self.shallow = shallow;
        self
    }

    pub fn ignore_symbols(mut self, ignore: bool) -> Self {
        self.ignore_symbols = ignore;
        self
    }

    pub fn ignore_underscores(mut self, ignore: bool) -> Self {
        self.ignore_underscores = ignore;
        self
    }

    pub fn ignore_keys<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<PropertyKey>,
    {
        self.ignore_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub(crate) fn is_ignored(&self, key: &PropertyKey) -> bool {
        match key {
            PropertyKey::Symbol(_) if self.ignore_symbols => true,
            PropertyKey::String(s) if self.ignore_underscores && s.starts_with('_') => true,
            _ => self.ignore_keys.contains(key),
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("shallow", &self.shallow)
            .field("ignore_symbols", &self.ignore_symbols)
            .field("ignore_underscores", &self.ignore_underscores)
            .field("ignore_keys", &self.ignore_keys)
            .finish_non_exhaustive()
    }
}
