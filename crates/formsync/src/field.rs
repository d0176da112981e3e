#![forbid(unsafe_code)]

//! Field accessors: one staged, observable value per domain-object property.
//!
//! A [`Field<M, T>`] binds one property of a domain object `M` and keeps three
//! values apart:
//!
//! - `current`: the staged edit, exposed as an [`Observable`];
//! - `committed`: the value known to match the domain object as of the last
//!   commit or reload;
//! - `default`: the value restored by [`reset`](Field::reset).
//!
//! The write path is chosen at registration and never changes:
//!
//! - **setter** (`Fn(&mut M, T)`): the object is edited in place;
//! - **wither** (`Fn(&M, T) -> M`): a new object is produced and the input is
//!   left untouched.
//!
//! # Invariants
//!
//! 1. `committed` changes only in [`commit`](Field::commit) and
//!    [`reload`](Field::reload). Editing `current` never touches it. It is
//!    an [`Observable`] too, so an owning wrapper sees field-level commits
//!    and reloads even when the staged value stays the same.
//! 2. `reset` writes `current` only.
//! 3. Neither `set_value` nor `reset` touches the domain object.
//!
//! # Equality
//!
//! Dirty and different checks use `T: PartialEq`. For list fields this is
//! element-wise comparison. Types whose `PartialEq` compares identity (for
//! example a newtype over `Rc::ptr_eq`) get identity semantics, and edits that
//! keep the identity are not detected.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::reactive::{BindingScope, Mirror, Observable, TwoWayBinding};

pub(crate) type Getter<M, T> = Box<dyn Fn(&M) -> T>;
pub(crate) type PropertyAccessor<M, T> = Rc<dyn Fn(&M) -> Observable<T>>;

/// How a staged value is written into the domain object.
pub(crate) enum Writer<M, T> {
    Setter(Box<dyn Fn(&mut M, T)>),
    Wither(Box<dyn Fn(&M, T) -> M>),
}

/// Everything needed to create a field.
pub(crate) struct FieldParts<M, T> {
    pub(crate) getter: Getter<M, T>,
    pub(crate) writer: Writer<M, T>,
    pub(crate) property: Option<PropertyAccessor<M, T>>,
    pub(crate) key: Option<String>,
    pub(crate) default_value: Option<T>,
}

struct FieldInner<M, T> {
    key: Option<String>,
    getter: Getter<M, T>,
    writer: Writer<M, T>,
    current: Observable<T>,
    committed: Observable<T>,
    default_value: RefCell<T>,
    property: Option<PropertyAccessor<M, T>>,
    mirror: RefCell<Option<Mirror<T>>>,
}

/// Staged, observable proxy for one property of a domain object `M`.
///
/// Cloning a `Field` creates another handle to the **same** accessor.
pub struct Field<M, T> {
    inner: Rc<FieldInner<M, T>>,
}

impl<M, T> Clone for Field<M, T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<M, T: fmt::Debug> fmt::Debug for Field<M, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Field")
            .field("key", &self.inner.key)
            .field("current", &self.inner.current)
            .field("committed", &self.inner.committed)
            .field("default", &self.inner.default_value.borrow())
            .field("immutable", &matches!(self.inner.writer, Writer::Wither(_)))
            .field("mirrored", &self.inner.property.is_some())
            .finish()
    }
}

impl<M: 'static, T: Clone + PartialEq + Default + 'static> Field<M, T> {
    /// Build a field. With a model the staged and committed values start at
    /// the model's value; without one they start at the default.
    pub(crate) fn from_parts(parts: FieldParts<M, T>, model: Option<&M>) -> Self {
        let FieldParts {
            getter,
            writer,
            property,
            key,
            default_value,
        } = parts;
        let default_value = default_value.unwrap_or_default();
        let initial = match model {
            Some(model) => getter(model),
            None => default_value.clone(),
        };
        let current = match &key {
            Some(key) => Observable::named(key.clone(), initial.clone()),
            None => Observable::new(initial.clone()),
        };
        let field = Self {
            inner: Rc::new(FieldInner {
                key,
                getter,
                writer,
                current,
                committed: Observable::new(initial),
                default_value: RefCell::new(default_value),
                property,
                mirror: RefCell::new(None),
            }),
        };
        field.attach(model);
        field
    }

    /// The staged value.
    #[must_use]
    pub fn value(&self) -> T {
        self.inner.current.get()
    }

    /// Stage an edit. The domain object is not touched.
    pub fn set_value(&self, value: T) {
        self.inner.current.set(value);
    }

    /// Handle to the observable holding the staged value.
    #[must_use]
    pub fn observable(&self) -> Observable<T> {
        self.inner.current.clone()
    }

    /// Registration key, if the field was registered with one.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.inner.key.as_deref()
    }

    #[must_use]
    pub fn default_value(&self) -> T {
        self.inner.default_value.borrow().clone()
    }

    /// Value recorded by the last commit or reload.
    #[must_use]
    pub fn committed_value(&self) -> T {
        self.inner.committed.get()
    }

    /// Whether this field uses the copy-producing write path.
    #[must_use]
    pub fn is_immutable(&self) -> bool {
        matches!(self.inner.writer, Writer::Wither(_))
    }

    /// Write the staged value into `model` and record it as committed.
    ///
    /// Setter fields edit `model` and return it; wither fields return a new
    /// object.
    pub fn commit(&self, model: M) -> M {
        let value = self.value();
        let model = self.write(model, value.clone());
        self.inner.committed.set(value);
        model
    }

    /// Write the staged value into `model` without recording a commit.
    pub fn write_to(&self, model: M) -> M {
        self.write(model, self.value())
    }

    fn write(&self, mut model: M, value: T) -> M {
        match &self.inner.writer {
            Writer::Setter(setter) => {
                setter(&mut model, value);
                model
            }
            Writer::Wither(wither) => wither(&model, value),
        }
    }

    /// Drop the staged edit: staged and committed both take the live value.
    pub fn reload(&self, model: &M) {
        let live = (self.inner.getter)(model);
        self.inner.committed.set(live.clone());
        self.inner.current.set(live);
    }

    /// Stage the default value.
    pub fn reset(&self) {
        let default_value = self.default_value();
        self.inner.current.set(default_value);
    }

    /// Staged value differs from the last committed value.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.inner
            .committed
            .with(|committed| self.inner.current.with(|current| current != committed))
    }

    /// Staged value differs from what `model` currently holds.
    #[must_use]
    pub fn is_different(&self, model: &M) -> bool {
        let live = (self.inner.getter)(model);
        self.inner.current.with(|current| *current != live)
    }

    /// Remember the staged value as the new default.
    pub fn use_current_as_default(&self) {
        let current = self.value();
        *self.inner.default_value.borrow_mut() = current;
    }

    /// Keep `other` and the staged value equal in both directions. `other`
    /// takes the staged value immediately.
    pub fn bind_bidirectional(&self, other: &Observable<T>) -> TwoWayBinding<T> {
        TwoWayBinding::new(&self.inner.current, other)
    }

    /// Whether both handles refer to the same accessor.
    #[must_use]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }

    /// Point the property mirror at `model`. Fields registered without a
    /// property accessor ignore this.
    pub(crate) fn attach(&self, model: Option<&M>) {
        let Some(property) = &self.inner.property else {
            return;
        };
        let mirror = model.map(|model| Mirror::new(&property(model), &self.inner.current));
        *self.inner.mirror.borrow_mut() = mirror;
    }
}

/// Type-erased view of a field, as stored by the wrapper.
pub(crate) trait FieldSlot<M> {
    fn commit_into(&self, model: M) -> M;
    fn write_into(&self, model: M) -> M;
    fn reload_from(&self, model: &M);
    fn reset_to_default(&self);
    fn dirty(&self) -> bool;
    fn differs_from(&self, model: &M) -> bool;
    fn adopt_current_as_default(&self);
    fn attach_to(&self, model: Option<&M>);
    /// Call `on_change` whenever the staged value or the committed snapshot
    /// changes, for as long as `scope` holds the subscriptions.
    fn watch(&self, on_change: Rc<dyn Fn()>, scope: &mut BindingScope);
    fn as_any(&self) -> &dyn Any;
}

impl<M: 'static, T: Clone + PartialEq + Default + 'static> FieldSlot<M> for Field<M, T> {
    fn commit_into(&self, model: M) -> M {
        self.commit(model)
    }

    fn write_into(&self, model: M) -> M {
        self.write_to(model)
    }

    fn reload_from(&self, model: &M) {
        self.reload(model);
    }

    fn reset_to_default(&self) {
        self.reset();
    }

    fn dirty(&self) -> bool {
        self.is_dirty()
    }

    fn differs_from(&self, model: &M) -> bool {
        self.is_different(model)
    }

    fn adopt_current_as_default(&self) {
        self.use_current_as_default();
    }

    fn attach_to(&self, model: Option<&M>) {
        self.attach(model);
    }

    fn watch(&self, on_change: Rc<dyn Fn()>, scope: &mut BindingScope) {
        let staged = Rc::clone(&on_change);
        scope
            .subscribe(&self.inner.current, move |_| staged())
            .subscribe(&self.inner.committed, move |_| on_change());
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
