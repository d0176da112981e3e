#![forbid(unsafe_code)]

//! Connections between [`Observable`] cells.
//!
//! - [`Mirror<T>`] forwards every change of a source into a target. It does
//!   not copy the source's current value at construction, so attaching a
//!   mirror never disturbs a value that was staged in the target.
//! - [`TwoWayBinding<T>`] keeps two cells equal in both directions. The
//!   target takes the source's value when the binding is created.
//! - [`BindingScope`] owns a group of subscriptions for a logical scope and
//!   releases all of them when dropped.
//!
//! # Invariants
//!
//! 1. A `Mirror` never writes to its source.
//! 2. `TwoWayBinding` cannot loop: a re-entrancy guard drops the echo.
//! 3. Dropping a `Mirror`, `TwoWayBinding` or `BindingScope` disconnects
//!    everything it holds before the next notification cycle.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use super::observable::{Observable, Subscription};

/// One-way forwarding from a source cell into a target cell.
pub struct Mirror<T> {
    _subscription: Subscription,
    _phantom: std::marker::PhantomData<T>,
}

impl<T: Clone + PartialEq + 'static> Mirror<T> {
    /// Forward future changes of `source` into `target`.
    pub fn new(source: &Observable<T>, target: &Observable<T>) -> Self {
        let target = target.clone();
        let subscription = source.subscribe(move |value| {
            target.set(value.clone());
        });
        Self {
            _subscription: subscription,
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<T> fmt::Debug for Mirror<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mirror").finish_non_exhaustive()
    }
}

/// Bidirectional binding between two [`Observable`]s of the same type.
///
/// Drop the binding to disconnect both directions.
pub struct TwoWayBinding<T: Clone + PartialEq + 'static> {
    _forward: Subscription,
    _backward: Subscription,
    _phantom: std::marker::PhantomData<T>,
}

impl<T: Clone + PartialEq + 'static> TwoWayBinding<T> {
    /// Bind `source` and `target`. `target` takes `source`'s current value.
    pub fn new(source: &Observable<T>, target: &Observable<T>) -> Self {
        target.set(source.get());

        let syncing = Rc::new(Cell::new(false));

        let to_target = target.clone();
        let guard = Rc::clone(&syncing);
        let forward = source.subscribe(move |value| {
            if !guard.replace(true) {
                to_target.set(value.clone());
                guard.set(false);
            }
        });

        let to_source = source.clone();
        let guard = Rc::clone(&syncing);
        let backward = target.subscribe(move |value| {
            if !guard.replace(true) {
                to_source.set(value.clone());
                guard.set(false);
            }
        });

        Self {
            _forward: forward,
            _backward: backward,
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<T: Clone + PartialEq + 'static> fmt::Debug for TwoWayBinding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwoWayBinding").finish_non_exhaustive()
    }
}

/// Holds subscriptions for a logical scope.
///
/// All held subscriptions are released when the scope is dropped or
/// [`clear`](Self::clear) is called.
#[derive(Default)]
pub struct BindingScope {
    subscriptions: Vec<Subscription>,
}

impl BindingScope {
    /// Create an empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `subscription` alive for the lifetime of this scope.
    pub fn hold(&mut self, subscription: Subscription) {
        self.subscriptions.push(subscription);
    }

    /// Subscribe to `source` within this scope.
    pub fn subscribe<T: Clone + PartialEq + 'static>(
        &mut self,
        source: &Observable<T>,
        callback: impl Fn(&T) + 'static,
    ) -> &mut Self {
        let subscription = source.subscribe(callback);
        self.subscriptions.push(subscription);
        self
    }

    /// Number of held subscriptions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Release every held subscription. The scope stays usable.
    pub fn clear(&mut self) {
        self.subscriptions.clear();
    }
}

impl fmt::Debug for BindingScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingScope")
            .field("len", &self.subscriptions.len())
            .finish()
    }
}
