#![forbid(unsafe_code)]

//! The model wrapper: staged editing of a whole domain object.
//!
//! A [`ModelWrapper<M>`] holds one domain-object slot (`Option<M>`) and the
//! fields registered against it. Bulk operations cover every field at once:
//!
//! | Operation | Staged values | Committed snapshots | Domain object |
//! |-----------|---------------|---------------------|---------------|
//! | `commit` | unchanged | take staged values | receives staged values |
//! | `reload` | take live values | take live values | unchanged |
//! | `reset` | take defaults | unchanged | unchanged |
//! | `set` | unchanged | unchanged | replaced |
//!
//! # Commit ordering
//!
//! Fields are folded left to right in registration order over a running
//! object. Wither fields return a new object, and the next field receives it,
//! so every edit lands in the final object.
//!
//! # Flags
//!
//! - `is_dirty()` is evaluated on demand: some staged value differs from its
//!   committed snapshot.
//! - `is_different()` is cached. It is recomputed against the live object
//!   whenever a field's staged value changes and after every bulk operation.
//!   Mutations made directly on the domain object are not observed, so the
//!   flag can be stale until the next recomputation.
//!
//! Both are also published as `Observable<bool>` through
//! [`dirty_flag`](ModelWrapper::dirty_flag) and
//! [`different_flag`](ModelWrapper::different_flag).
//!
//! # Re-entrancy
//!
//! Bulk operations clone the slot and snapshot the field list before calling
//! into user code, so getters, setters and subscribers may call back into the
//! wrapper.

use std::any::type_name;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, trace, warn};

use crate::config::WrapperConfig;
use crate::error::{Result, WrapperError};
use crate::field::{Field, FieldParts, FieldSlot, PropertyAccessor, Writer};
use crate::list_field::ListField;
use crate::reactive::{BindingScope, Observable};
use crate::source::SourceLink;

pub(crate) struct WrapperInner<M> {
    model: RefCell<Option<M>>,
    fields: RefCell<Vec<Rc<dyn FieldSlot<M>>>>,
    keys: RefCell<HashMap<String, usize>>,
    watchers: RefCell<BindingScope>,
    dirty: Observable<bool>,
    different: Observable<bool>,
    batch_depth: Cell<u32>,
    source: RefCell<Option<SourceLink<M>>>,
    config: WrapperConfig,
}

/// Defers flag recomputation until the outermost bulk operation finishes.
struct Batch<'a, M: Clone + 'static> {
    inner: &'a WrapperInner<M>,
}

impl<M: Clone + 'static> Drop for Batch<'_, M> {
    fn drop(&mut self) {
        let depth = self.inner.batch_depth.get() - 1;
        self.inner.batch_depth.set(depth);
        if depth == 0 && !std::thread::panicking() {
            self.inner.refresh_flags();
        }
    }
}

impl<M: Clone + 'static> WrapperInner<M> {
    fn new(model: Option<M>, config: WrapperConfig) -> Self {
        Self {
            model: RefCell::new(model),
            fields: RefCell::new(Vec::new()),
            keys: RefCell::new(HashMap::new()),
            watchers: RefCell::new(BindingScope::new()),
            dirty: Observable::new(false),
            different: Observable::new(false),
            batch_depth: Cell::new(0),
            source: RefCell::new(None),
            config,
        }
    }

    pub(crate) fn label(&self) -> &str {
        self.config.label()
    }

    fn batch(&self) -> Batch<'_, M> {
        self.batch_depth.set(self.batch_depth.get() + 1);
        Batch { inner: self }
    }

    fn snapshot(&self) -> (Option<M>, Vec<Rc<dyn FieldSlot<M>>>) {
        let model = self.model.borrow().clone();
        let fields = self.fields.borrow().clone();
        (model, fields)
    }

    fn on_field_changed(&self) {
        if self.batch_depth.get() == 0 {
            self.refresh_flags();
        }
    }

    fn refresh_flags(&self) {
        let (model, fields) = self.snapshot();
        let dirty = fields.iter().any(|field| field.dirty());
        let different = model
            .as_ref()
            .is_some_and(|model| fields.iter().any(|field| field.differs_from(model)));
        trace!(
            wrapper = self.config.label(),
            dirty, different, "flags recomputed"
        );
        self.dirty.set(dirty);
        self.different.set(different);
    }

    fn commit(&self) -> Option<M> {
        let _batch = self.batch();
        let (model, fields) = self.snapshot();
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!(
            "wrapper_commit",
            wrapper = self.config.label(),
            fields = fields.len()
        )
        .entered();
        let Some(model) = model else {
            debug!(wrapper = self.config.label(), "commit skipped: no model");
            return None;
        };
        let model = fields
            .iter()
            .fold(model, |running, field| field.commit_into(running));
        *self.model.borrow_mut() = Some(model.clone());
        debug!(
            wrapper = self.config.label(),
            fields = fields.len(),
            "staged values committed"
        );
        Some(model)
    }

    pub(crate) fn reload(&self) {
        let _batch = self.batch();
        let (model, fields) = self.snapshot();
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!(
            "wrapper_reload",
            wrapper = self.config.label(),
            fields = fields.len()
        )
        .entered();
        let Some(model) = model else {
            debug!(wrapper = self.config.label(), "reload skipped: no model");
            return;
        };
        for field in &fields {
            field.reload_from(&model);
        }
        debug!(
            wrapper = self.config.label(),
            fields = fields.len(),
            "fields reloaded"
        );
    }

    fn reset(&self) {
        let _batch = self.batch();
        let (_, fields) = self.snapshot();
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!(
            "wrapper_reset",
            wrapper = self.config.label(),
            fields = fields.len()
        )
        .entered();
        for field in &fields {
            field.reset_to_default();
        }
        debug!(
            wrapper = self.config.label(),
            fields = fields.len(),
            "fields reset to defaults"
        );
    }

    pub(crate) fn set_model(&self, model: Option<M>) {
        let _batch = self.batch();
        *self.model.borrow_mut() = model.clone();
        let (_, fields) = self.snapshot();
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!(
            "wrapper_set",
            wrapper = self.config.label(),
            present = model.is_some()
        )
        .entered();
        for field in &fields {
            field.attach_to(model.as_ref());
        }
        debug!(
            wrapper = self.config.label(),
            present = model.is_some(),
            "model replaced"
        );
    }

    /// Called by the source binding when the tracked reference changes.
    pub(crate) fn source_changed(&self, model: Option<M>) {
        let _batch = self.batch();
        self.set_model(model);
        if self.config.reload_on_source_change {
            self.reload();
        }
    }

    fn write_back(&self, model: M) {
        if !self.config.write_back_commits {
            return;
        }
        let write_back = self.source.borrow().as_ref().map(SourceLink::write_back);
        if let Some(write_back) = write_back {
            write_back(model);
        }
    }
}

/// Staged editing session over one domain object.
///
/// Cloning a `ModelWrapper` creates another handle to the **same** session.
/// All operations take `&self`; state lives behind `RefCell`s and the type is
/// single-threaded.
pub struct ModelWrapper<M: Clone + 'static> {
    inner: Rc<WrapperInner<M>>,
}

impl<M: Clone + 'static> Clone for ModelWrapper<M> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<M: Clone + 'static> Default for ModelWrapper<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Clone + fmt::Debug + 'static> fmt::Debug for ModelWrapper<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelWrapper")
            .field("label", &self.inner.config.label())
            .field("model", &self.inner.model.borrow())
            .field("fields", &self.inner.fields.borrow().len())
            .field("source_bound", &self.inner.source.borrow().is_some())
            .finish()
    }
}

impl<M: Clone + 'static> ModelWrapper<M> {
    /// Wrapper with no domain object yet.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(None, WrapperConfig::default())
    }

    /// Wrapper over a fixed domain object.
    #[must_use]
    pub fn with_model(model: M) -> Self {
        Self::with_config(Some(model), WrapperConfig::default())
    }

    #[must_use]
    pub fn with_config(model: Option<M>, config: WrapperConfig) -> Self {
        Self {
            inner: Rc::new(WrapperInner::new(model, config)),
        }
    }

    pub(crate) fn inner(&self) -> &Rc<WrapperInner<M>> {
        &self.inner
    }

    pub(crate) fn attach_source(&self, link: SourceLink<M>) {
        *self.inner.source.borrow_mut() = Some(link);
    }

    /// Whether the wrapper tracks an observable model source.
    #[must_use]
    pub fn is_source_bound(&self) -> bool {
        self.inner.source.borrow().is_some()
    }

    #[must_use]
    pub fn config(&self) -> &WrapperConfig {
        &self.inner.config
    }

    /// Register a field edited through a setter (`Fn(&mut M, T)`).
    pub fn field<T, G, S>(&self, getter: G, setter: S) -> FieldBuilder<'_, M, T>
    where
        T: Clone + PartialEq + Default + 'static,
        G: Fn(&M) -> T + 'static,
        S: Fn(&mut M, T) + 'static,
    {
        FieldBuilder::new(self, Box::new(getter), Writer::Setter(Box::new(setter)), None)
    }

    /// Register a field whose writes produce a new object (`Fn(&M, T) -> M`).
    pub fn immutable_field<T, G, W>(&self, getter: G, wither: W) -> FieldBuilder<'_, M, T>
    where
        T: Clone + PartialEq + Default + 'static,
        G: Fn(&M) -> T + 'static,
        W: Fn(&M, T) -> M + 'static,
    {
        FieldBuilder::new(self, Box::new(getter), Writer::Wither(Box::new(wither)), None)
    }

    /// Register a field backed by an observable cell on the domain object.
    ///
    /// Reads and writes go through the cell returned by `accessor`. In
    /// addition, changes made to that cell outside the wrapper are mirrored
    /// into the staged value immediately. The mirror follows the object when
    /// the wrapper's model is replaced.
    pub fn property_field<T, A>(&self, accessor: A) -> FieldBuilder<'_, M, T>
    where
        T: Clone + PartialEq + Default + 'static,
        A: Fn(&M) -> Observable<T> + 'static,
    {
        let accessor: PropertyAccessor<M, T> = Rc::new(accessor);
        let read = Rc::clone(&accessor);
        let write = Rc::clone(&accessor);
        FieldBuilder::new(
            self,
            Box::new(move |model: &M| read(model).get()),
            Writer::Setter(Box::new(move |model: &mut M, value: T| {
                write(model).set(value);
            })),
            Some(accessor),
        )
    }

    fn register<T>(&self, parts: FieldParts<M, T>) -> Result<Field<M, T>>
    where
        T: Clone + PartialEq + Default + 'static,
    {
        if let Some(key) = parts.key.as_deref() {
            if let Some(existing) = self.lookup::<T>(key)? {
                return Ok(existing);
            }
        }

        let key = parts.key.clone();
        let model = self.inner.model.borrow().clone();
        let field = Field::from_parts(parts, model.as_ref());

        let weak = Rc::downgrade(&self.inner);
        FieldSlot::watch(
            &field,
            Rc::new(move || {
                if let Some(inner) = weak.upgrade() {
                    inner.on_field_changed();
                }
            }),
            &mut self.inner.watchers.borrow_mut(),
        );

        let index = {
            let mut fields = self.inner.fields.borrow_mut();
            fields.push(Rc::new(field.clone()));
            fields.len() - 1
        };
        if let Some(key) = key {
            self.inner.keys.borrow_mut().insert(key, index);
        }
        trace!(
            wrapper = self.inner.config.label(),
            key = field.key(),
            index,
            "field registered"
        );
        self.inner.on_field_changed();
        Ok(field)
    }

    fn lookup<T>(&self, key: &str) -> Result<Option<Field<M, T>>>
    where
        T: Clone + PartialEq + Default + 'static,
    {
        let Some(index) = self.inner.keys.borrow().get(key).copied() else {
            return Ok(None);
        };
        let slot = Rc::clone(&self.inner.fields.borrow()[index]);
        match slot.as_any().downcast_ref::<Field<M, T>>() {
            Some(field) => Ok(Some(field.clone())),
            None => {
                warn!(
                    wrapper = self.inner.config.label(),
                    key,
                    requested = type_name::<T>(),
                    "field key reused with a different value type"
                );
                Err(WrapperError::key_mismatch::<T>(key))
            }
        }
    }

    /// Write every staged value into the domain object.
    ///
    /// For wither fields the resulting object replaces the wrapper's model.
    /// When the wrapper tracks a model source (and write-back is enabled) the
    /// committed object is also written into the source. Without a model this
    /// does nothing.
    pub fn commit(&self) {
        if let Some(model) = self.inner.commit() {
            self.inner.write_back(model);
        }
    }

    /// Drop all staged edits and take the live values. Without a model this
    /// does nothing.
    pub fn reload(&self) {
        self.inner.reload();
    }

    /// Stage every field's default value. Neither the domain object nor the
    /// committed snapshots change.
    pub fn reset(&self) {
        self.inner.reset();
    }

    /// Replace the domain object. Staged values are left alone; follow with
    /// [`reload`](Self::reload) or [`reset`](Self::reset) as needed.
    pub fn set(&self, model: impl Into<Option<M>>) {
        self.inner.set_model(model.into());
    }

    /// Drop the domain object.
    pub fn clear(&self) {
        self.inner.set_model(None);
    }

    /// Current domain object. For wither fields this is the object produced
    /// by the last commit.
    #[must_use]
    pub fn get(&self) -> Option<M> {
        self.inner.model.borrow().clone()
    }

    #[must_use]
    pub fn has_model(&self) -> bool {
        self.inner.model.borrow().is_some()
    }

    /// Make every field's staged value its new default.
    pub fn use_current_values_as_defaults(&self) {
        let _batch = self.inner.batch();
        let (_, fields) = self.inner.snapshot();
        for field in &fields {
            field.adopt_current_as_default();
        }
    }

    /// Write every staged value into `target`, leaving the wrapper untouched.
    pub fn copy_values_to(&self, target: M) -> M {
        let (_, fields) = self.inner.snapshot();
        fields
            .iter()
            .fold(target, |running, field| field.write_into(running))
    }

    /// Some staged value differs from its last committed value.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        let (_, fields) = self.inner.snapshot();
        fields.iter().any(|field| field.dirty())
    }

    /// Some staged value differed from the live object at the last
    /// recomputation. `false` without a model.
    #[must_use]
    pub fn is_different(&self) -> bool {
        self.inner.different.get()
    }

    /// Observable mirror of [`is_dirty`](Self::is_dirty), refreshed on every
    /// field change and bulk operation.
    #[must_use]
    pub fn dirty_flag(&self) -> Observable<bool> {
        self.inner.dirty.clone()
    }

    /// Observable form of [`is_different`](Self::is_different).
    #[must_use]
    pub fn different_flag(&self) -> Observable<bool> {
        self.inner.different.clone()
    }

    #[must_use]
    pub fn field_count(&self) -> usize {
        self.inner.fields.borrow().len()
    }
}

/// Options for a field registration, finished by [`build`](Self::build).
#[must_use = "a field is only registered when `build` is called"]
pub struct FieldBuilder<'w, M: Clone + 'static, T> {
    wrapper: &'w ModelWrapper<M>,
    parts: FieldParts<M, T>,
}

impl<'w, M, T> FieldBuilder<'w, M, T>
where
    M: Clone + 'static,
    T: Clone + PartialEq + Default + 'static,
{
    fn new(
        wrapper: &'w ModelWrapper<M>,
        getter: Box<dyn Fn(&M) -> T>,
        writer: Writer<M, T>,
        property: Option<PropertyAccessor<M, T>>,
    ) -> Self {
        Self {
            wrapper,
            parts: FieldParts {
                getter,
                writer,
                property,
                key: None,
                default_value: None,
            },
        }
    }

    /// Identify the field. Registering the same key again returns the same
    /// accessor, and the field's observable is named after the key.
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.parts.key = Some(key.into());
        self
    }

    /// Value staged by `reset`. Defaults to `T::default()`.
    pub fn default_value(mut self, value: T) -> Self {
        self.parts.default_value = Some(value);
        self
    }

    /// Register the field, or fetch the one already registered under the
    /// same key.
    ///
    /// # Errors
    ///
    /// [`WrapperError::KeyTypeMismatch`] if the key is already registered
    /// with a different value type.
    pub fn build(self) -> Result<Field<M, T>> {
        self.wrapper.register(self.parts)
    }
}

impl<M, E> FieldBuilder<'_, M, Vec<E>>
where
    M: Clone + 'static,
    E: Clone + PartialEq + 'static,
{
    /// Register a list field.
    ///
    /// # Errors
    ///
    /// [`WrapperError::KeyTypeMismatch`] if the key is already registered
    /// with a different value type.
    pub fn build_list(self) -> Result<ListField<M, E>> {
        self.build().map(ListField::from)
    }
}
