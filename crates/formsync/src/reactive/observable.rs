#![forbid(unsafe_code)]

//! Shared, version-tracked value cells with change notification.
//!
//! # Design
//!
//! [`Observable<T>`] stores its value, a version counter, an optional name and
//! the subscriber list behind one `Rc<RefCell<..>>`. Cloning an `Observable`
//! creates another handle to the **same** cell.
//!
//! Subscribers are held as `Weak` callbacks; the strong reference lives in the
//! [`Subscription`] guard returned by [`Observable::subscribe`]. Dead entries
//! are pruned lazily during notification.
//!
//! # Invariants
//!
//! 1. `version` increments exactly once per mutation that changes the value.
//! 2. Setting a value equal to the current value is a no-op.
//! 3. Subscribers are notified in registration order.
//! 4. No internal borrow is held while callbacks run, so a callback may read
//!    or write the observable that notified it.
//!
//! # Failure Modes
//!
//! - **Callback panics**: the value has already been stored and the version
//!   bumped; later subscribers in the same cycle are skipped.
//! - **Borrow inside `with`**: calling `set` on the same observable from inside
//!   a [`with`](Observable::with) closure panics (re-entrant `RefCell` borrow).

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

type Callback<T> = dyn Fn(&T);

struct ObservableInner<T> {
    value: T,
    version: u64,
    name: Option<Rc<str>>,
    subscribers: Vec<Weak<Callback<T>>>,
}

/// A shared value cell that notifies subscribers when its value changes.
pub struct Observable<T> {
    inner: Rc<RefCell<ObservableInner<T>>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Observable")
            .field("name", &inner.name)
            .field("value", &inner.value)
            .field("version", &inner.version)
            .finish()
    }
}

impl<T: Default + Clone + PartialEq + 'static> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + PartialEq + 'static> Observable<T> {
    /// Create an unnamed observable holding `value`.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self::with_name(None, value)
    }

    /// Create an observable carrying a display name.
    #[must_use]
    pub fn named(name: impl Into<String>, value: T) -> Self {
        let name: String = name.into();
        Self::with_name(Some(Rc::from(name)), value)
    }

    fn with_name(name: Option<Rc<str>>, value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(ObservableInner {
                value,
                version: 0,
                name,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Access the current value by reference.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Replace the value. Returns `true` if the value changed.
    pub fn set(&self, value: T) -> bool {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                return false;
            }
            inner.value = value;
            inner.version += 1;
        }
        self.notify();
        true
    }

    /// Mutate the value in place. Subscribers are notified only if the value
    /// differs from what it was before `f` ran.
    pub fn update(&self, f: impl FnOnce(&mut T)) -> bool {
        {
            let mut inner = self.inner.borrow_mut();
            let before = inner.value.clone();
            f(&mut inner.value);
            if inner.value == before {
                return false;
            }
            inner.version += 1;
        }
        self.notify();
        true
    }

    /// Register a change callback. The callback stays registered for as long
    /// as the returned [`Subscription`] is alive.
    #[must_use = "dropping the subscription immediately unsubscribes"]
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let strong: Rc<Callback<T>> = Rc::new(callback);
        self.inner
            .borrow_mut()
            .subscribers
            .push(Rc::downgrade(&strong));
        Subscription {
            _callback: Box::new(strong),
        }
    }

    fn notify(&self) {
        let (value, callbacks) = {
            let mut inner = self.inner.borrow_mut();
            inner.subscribers.retain(|weak| weak.strong_count() > 0);
            let callbacks: Vec<Rc<Callback<T>>> =
                inner.subscribers.iter().filter_map(Weak::upgrade).collect();
            (inner.value.clone(), callbacks)
        };
        for callback in callbacks {
            callback(&value);
        }
    }
}

impl<T> Observable<T> {
    /// Number of successful value changes so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Name given at construction, if any.
    #[must_use]
    pub fn name(&self) -> Option<String> {
        self.inner.borrow().name.as_deref().map(str::to_owned)
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .borrow()
            .subscribers
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    /// Whether two handles point at the same cell.
    #[must_use]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }
}

/// RAII guard for an [`Observable`] callback. Dropping it unsubscribes.
pub struct Subscription {
    _callback: Box<dyn Any>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn set_bumps_version_and_notifies() {
        let obs = Observable::new(1);
        let seen = Rc::new(Cell::new(0));
        let s = Rc::clone(&seen);
        let _sub = obs.subscribe(move |v| s.set(*v));

        assert!(obs.set(5));
        assert_eq!(obs.get(), 5);
        assert_eq!(obs.version(), 1);
        assert_eq!(seen.get(), 5);
    }

    #[test]
    fn equal_set_is_noop() {
        let obs = Observable::new(7);
        let calls = Rc::new(Cell::new(0));
        let c = Rc::clone(&calls);
        let _sub = obs.subscribe(move |_| c.set(c.get() + 1));

        assert!(!obs.set(7));
        assert_eq!(obs.version(), 0);
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn update_notifies_only_on_change() {
        let obs = Observable::new(vec!["a".to_string()]);
        let calls = Rc::new(Cell::new(0));
        let c = Rc::clone(&calls);
        let _sub = obs.subscribe(move |_| c.set(c.get() + 1));

        assert!(obs.update(|v| v.push("b".into())));
        assert!(!obs.update(|v| v.retain(|_| true)));
        assert_eq!(calls.get(), 1);
        assert_eq!(obs.get(), vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn dropping_subscription_detaches() {
        let obs = Observable::new(0);
        let seen = Rc::new(Cell::new(0));
        let s = Rc::clone(&seen);
        let sub = obs.subscribe(move |v| s.set(*v));
        assert_eq!(obs.subscriber_count(), 1);

        drop(sub);
        obs.set(3);
        assert_eq!(seen.get(), 0);
        assert_eq!(obs.subscriber_count(), 0);
    }

    #[test]
    fn subscribers_run_in_registration_order() {
        let obs = Observable::new(0);
        let log = Rc::new(RefCell::new(Vec::new()));
        let l1 = Rc::clone(&log);
        let l2 = Rc::clone(&log);
        let _a = obs.subscribe(move |_| l1.borrow_mut().push("first"));
        let _b = obs.subscribe(move |_| l2.borrow_mut().push("second"));

        obs.set(1);
        assert_eq!(*log.borrow(), vec!["first", "second"]);
    }

    #[test]
    fn callback_may_write_back() {
        let obs = Observable::new(0);
        let handle = obs.clone();
        // Clamp to 10.
        let _sub = obs.subscribe(move |v| {
            if *v > 10 {
                handle.set(10);
            }
        });

        obs.set(42);
        assert_eq!(obs.get(), 10);
    }

    #[test]
    fn name_and_identity() {
        let a = Observable::named("age", 32);
        let b = a.clone();
        let c = Observable::new(32);

        assert_eq!(a.name().as_deref(), Some("age"));
        assert_eq!(c.name(), None);
        assert!(Observable::ptr_eq(&a, &b));
        assert!(!Observable::ptr_eq(&a, &c));
    }

    #[test]
    fn debug_format() {
        let obs = Observable::named("n", 42);
        let dbg = format!("{obs:?}");
        assert!(dbg.contains("Observable"));
        assert!(dbg.contains("42"));
    }
}
