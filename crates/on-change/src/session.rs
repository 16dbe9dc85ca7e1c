//! Per-observation state: options, callback, caches and batch bookkeeping.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

use on_change_model::{shallow_clone, ModelError, ObjectClass, PropertyKey, Value};
use tracing::{debug, trace};

use crate::cache::IdentityMap;
use crate::events::{ChangeEvent, ChangeKind};
use crate::handle::{observed, Handle, HandleInner};
use crate::options::Options;
use crate::path::Path;

pub type Callback = dyn Fn(&Handle, &ChangeEvent) -> Result<(), ModelError>;

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

struct Caches {
    handles: IdentityMap<Weak<HandleInner>>,
    paths: IdentityMap<Path>,
}

/// State of the method call currently being collapsed into one event.
struct Batch {
    /// Path of the receiver.
    path: Path,
    /// Copy of the receiver taken before the call, patched with the values
    /// that writes beneath the receiver overwrote.
    snapshot: Value,
    /// Locations (relative to the receiver) already patched.
    restored: Vec<Vec<PropertyKey>>,
}

impl Batch {
    fn restore(
        &mut self,
        path: &Path,
        key: &PropertyKey,
        previous: &Value,
    ) -> Result<(), ModelError> {
        let Some(relative) = path.strip_prefix(&self.path) else {
            return Ok(());
        };
        let mut location = relative.to_vec();
        location.push(key.clone());
        if self.restored.contains(&location) {
            return Ok(());
        }

        let mut item = self.snapshot.clone();
        for step in relative {
            if item.is_primitive() {
                return Ok(());
            }
            let child = item.get(step)?;
            if child.is_primitive() {
                return Ok(());
            }
            let copy = shallow_clone(&child)?;
            item.set(step, copy.clone())?;
            item = copy;
        }
        if item.is_object() {
            item.set(key, previous.clone())?;
            self.restored.push(location);
        }
        Ok(())
    }
}

pub(crate) struct Session {
    id: u64,
    options: Options,
    callback: Box<Callback>,
    root: Value,
    caches: RefCell<Caches>,
    unobserved: Cell<bool>,
    in_apply: Cell<bool>,
    changed: Cell<bool>,
    batch: RefCell<Option<Batch>>,
}

impl Session {
    pub fn start(root: Value, callback: Box<Callback>, options: Options) -> Rc<Self> {
        let id = NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed);
        debug!(session = id, ?options, "observation started");
        Rc::new(Session {
            id,
            options,
            callback,
            root,
            caches: RefCell::new(Caches {
                handles: IdentityMap::new(),
                paths: IdentityMap::new(),
            }),
            unobserved: Cell::new(false),
            in_apply: Cell::new(false),
            changed: Cell::new(false),
            batch: RefCell::new(None),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn is_unobserved(&self) -> bool {
        self.unobserved.get()
    }

    pub fn is_ignored(&self, key: &PropertyKey) -> bool {
        self.unobserved.get() || self.options.is_ignored(key)
    }

    pub fn path_of(&self, target: &Value) -> Option<Path> {
        self.caches.borrow().paths.get(target).cloned()
    }

    /// Records `path` for `value` and returns the session's handle for it.
    /// Primitives, and everything once the session has ended, pass through.
    pub fn wrap(self: &Rc<Self>, value: Value, path: Path) -> Value {
        if self.unobserved.get() || value.is_primitive() {
            return value;
        }
        let cached = {
            let mut caches = self.caches.borrow_mut();
            caches.paths.insert(&value, path);
            caches.handles.get(&value).and_then(Weak::upgrade)
        };
        let inner = match cached {
            Some(inner) => inner,
            None => self.new_handle(value),
        };
        Handle(inner).to_value()
    }

    fn new_handle(self: &Rc<Self>, target: Value) -> Rc<HandleInner> {
        let inner = Rc::new(HandleInner::new(Rc::clone(self), target));
        let mut caches = self.caches.borrow_mut();
        caches.handles.insert(inner.target(), Rc::downgrade(&inner));
        trace!(session = self.id, handles = caches.handles.len(), "handle created");
        inner
    }

    fn root_handle(self: &Rc<Self>) -> Handle {
        let cached = self
            .caches
            .borrow()
            .handles
            .get(&self.root)
            .and_then(Weak::upgrade);
        Handle(cached.unwrap_or_else(|| self.new_handle(self.root.clone())))
    }

    pub fn root(self: &Rc<Self>) -> Handle {
        self.caches.borrow_mut().paths.insert(&self.root, Path::root());
        self.root_handle()
    }

    /// Reports a successful write of `key` on the value at `path`. Inside a
    /// batched call the write only marks the batch as changed.
    pub fn handle_change(
        self: &Rc<Self>,
        path: Path,
        key: &PropertyKey,
        previous: &Value,
        value: &Value,
        kind: ChangeKind,
    ) -> Result<(), ModelError> {
        if self.unobserved.get() {
            return Ok(());
        }
        if !self.in_apply.get() {
            return self.notify(ChangeEvent {
                path: path.child(key.clone()),
                previous: previous.clone(),
                value: value.clone(),
                kind,
            });
        }
        if !previous.is_undefined() && !value.is_undefined() && key != "length" {
            self.restore_snapshot(&path, key, previous)?;
        }
        self.changed.set(true);
        Ok(())
    }

    fn restore_snapshot(
        &self,
        path: &Path,
        key: &PropertyKey,
        previous: &Value,
    ) -> Result<(), ModelError> {
        let Some(mut batch) = self.batch.borrow_mut().take() else {
            return Ok(());
        };
        let result = batch.restore(path, key, previous);
        *self.batch.borrow_mut() = Some(batch);
        result
    }

    fn notify(self: &Rc<Self>, event: ChangeEvent) -> Result<(), ModelError> {
        debug!(
            session = self.id,
            path = %event.path,
            kind = ?event.kind,
            "change"
        );
        let root = self.root_handle();
        (self.callback)(&root, &event)
    }

    /// Calls `function` and reports everything it changed as one event.
    ///
    /// Only the outermost call is instrumented; calls made while one is in
    /// flight (by the function itself or by its callees) run plainly and
    /// fold their writes into the outer batch.
    pub fn apply(
        self: &Rc<Self>,
        function: &Value,
        this: &Value,
        args: &[Value],
    ) -> Result<Value, ModelError> {
        let compare = this.object_class() == Some(ObjectClass::Date);
        let this = if compare { observed(this) } else { this.clone() };
        if self.in_apply.get() || self.unobserved.get() {
            return function.call(&this, args);
        }

        let receiver = observed(&this);
        let snapshot = match this.object_class() {
            Some(ObjectClass::Date | ObjectClass::Array | ObjectClass::Ordinary) => {
                shallow_clone(&receiver)?
            }
            _ => Value::Undefined,
        };
        let path = self.path_of(function).unwrap_or_default().parent();
        trace!(session = self.id, path = %path, "batch started");

        self.in_apply.set(true);
        *self.batch.borrow_mut() = Some(Batch {
            path,
            snapshot,
            restored: Vec::new(),
        });
        let result = function.call(&this, args);
        self.in_apply.set(false);
        let batch = self.batch.borrow_mut().take();
        let changed = self.changed.replace(false);

        let result = result?;
        let Some(batch) = batch else {
            return Ok(result);
        };
        let date_changed = compare
            && !(self.options.equals)(
                &Value::from(batch.snapshot.primitive_value()),
                &Value::from(receiver.primitive_value()),
            );
        trace!(session = self.id, changed, date_changed, "batch finished");
        if (changed || date_changed) && !self.unobserved.get() {
            self.notify(ChangeEvent {
                path: batch.path,
                previous: batch.snapshot,
                value: receiver,
                kind: ChangeKind::Apply,
            })?;
        }
        Ok(result)
    }

    /// Ends the session: every handle it issued becomes a pass-through.
    pub fn shutdown(&self) {
        self.unobserved.set(true);
        self.in_apply.set(false);
        self.changed.set(false);
        self.batch.borrow_mut().take();
        let mut caches = self.caches.borrow_mut();
        caches.handles.clear();
        caches.paths.clear();
        debug!(session = self.id, "observation stopped");
    }
}
