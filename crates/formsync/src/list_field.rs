#![forbid(unsafe_code)]

//! List-valued field accessors.
//!
//! [`ListField<M, E>`] is a [`Field<M, Vec<E>>`] with in-place list editing.
//! Every edit goes through [`Observable::update`](crate::reactive::Observable::update),
//! so the owning wrapper sees it and subscribers are only notified when the
//! list actually changed. Dirty and different checks compare element-wise.
//!
//! # Blind spot
//!
//! The wrapper can only react to edits made through this accessor. If code
//! mutates the list held by the domain object directly, the wrapper's
//! different flag keeps its previous value until some field edit or bulk
//! operation recomputes it. Lists are not deep-watched.

use std::fmt;

use crate::field::Field;
use crate::reactive::{Observable, TwoWayBinding};

/// Staged, observable proxy for a list-valued property.
pub struct ListField<M, E> {
    field: Field<M, Vec<E>>,
}

impl<M, E> Clone for ListField<M, E> {
    fn clone(&self) -> Self {
        Self {
            field: self.field.clone(),
        }
    }
}

impl<M, E: fmt::Debug> fmt::Debug for ListField<M, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ListField").field(&self.field).finish()
    }
}

impl<M, E> From<Field<M, Vec<E>>> for ListField<M, E> {
    fn from(field: Field<M, Vec<E>>) -> Self {
        Self { field }
    }
}

impl<M: 'static, E: Clone + PartialEq + 'static> ListField<M, E> {
    /// The underlying field accessor.
    #[must_use]
    pub fn field(&self) -> &Field<M, Vec<E>> {
        &self.field
    }

    #[must_use]
    pub fn into_field(self) -> Field<M, Vec<E>> {
        self.field
    }

    #[must_use]
    pub fn value(&self) -> Vec<E> {
        self.field.value()
    }

    pub fn set_value(&self, value: Vec<E>) {
        self.field.set_value(value);
    }

    #[must_use]
    pub fn observable(&self) -> Observable<Vec<E>> {
        self.field.observable()
    }

    #[must_use]
    pub fn key(&self) -> Option<&str> {
        self.field.key()
    }

    /// Read the staged list without cloning it.
    ///
    /// The list stays borrowed while `f` runs: reading this accessor from
    /// inside `f` is fine, editing it panics (re-entrant `RefCell` borrow).
    pub fn with<R>(&self, f: impl FnOnce(&[E]) -> R) -> R {
        self.field.observable().with(|list| f(list))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.with(<[E]>::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.with(<[E]>::is_empty)
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<E> {
        self.with(|list| list.get(index).cloned())
    }

    #[must_use]
    pub fn contains(&self, item: &E) -> bool {
        self.with(|list| list.contains(item))
    }

    pub fn push(&self, item: E) {
        self.field.observable().update(|list| list.push(item));
    }

    /// Insert at `index`, clamped to the list length.
    pub fn insert(&self, index: usize, item: E) {
        self.field.observable().update(|list| {
            let index = index.min(list.len());
            list.insert(index, item);
        });
    }

    /// Remove and return the element at `index`, if any.
    pub fn remove(&self, index: usize) -> Option<E> {
        let mut removed = None;
        self.field.observable().update(|list| {
            if index < list.len() {
                removed = Some(list.remove(index));
            }
        });
        removed
    }

    /// Remove the first element equal to `item`. Returns whether one was found.
    pub fn remove_item(&self, item: &E) -> bool {
        let mut found = false;
        self.field.observable().update(|list| {
            if let Some(index) = list.iter().position(|e| e == item) {
                list.remove(index);
                found = true;
            }
        });
        found
    }

    /// Keep only the elements `keep` accepts. `keep` runs on a copy of the
    /// list, so it may read this accessor.
    pub fn retain(&self, keep: impl FnMut(&E) -> bool) {
        let mut list = self.value();
        list.retain(keep);
        self.set_value(list);
    }

    pub fn extend(&self, items: impl IntoIterator<Item = E>) {
        self.field.observable().update(|list| list.extend(items));
    }

    pub fn clear(&self) {
        self.field.observable().update(Vec::clear);
    }

    pub fn commit(&self, model: M) -> M {
        self.field.commit(model)
    }

    pub fn reload(&self, model: &M) {
        self.field.reload(model);
    }

    pub fn reset(&self) {
        self.field.reset();
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.field.is_dirty()
    }

    #[must_use]
    pub fn is_different(&self, model: &M) -> bool {
        self.field.is_different(model)
    }

    pub fn use_current_as_default(&self) {
        self.field.use_current_as_default();
    }

    #[must_use]
    pub fn default_value(&self) -> Vec<E> {
        self.field.default_value()
    }

    #[must_use]
    pub fn committed_value(&self) -> Vec<E> {
        self.field.committed_value()
    }

    pub fn bind_bidirectional(&self, other: &Observable<Vec<E>>) -> TwoWayBinding<Vec<E>> {
        self.field.bind_bidirectional(other)
    }

    #[must_use]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Field::ptr_eq(&a.field, &b.field)
    }
}
