#![forbid(unsafe_code)]

//! Observable cells for staged field editing.
//!
//! - [`Observable`]: a shared, version-tracked value with change notification.
//! - [`Subscription`]: RAII guard that unsubscribes on drop.
//! - [`Mirror`]: one-way forwarding between two cells.
//! - [`TwoWayBinding`]: bidirectional sync with a re-entrancy guard.
//! - [`BindingScope`]: owner of a group of subscriptions.
//!
//! # Architecture
//!
//! Everything here is single-threaded: `Observable<T>` uses
//! `Rc<RefCell<..>>` and callbacks are `Fn`, not `Send`. Subscribers are
//! stored as `Weak` callbacks and pruned lazily during notification.

pub mod binding;
pub mod observable;

pub use binding::{BindingScope, Mirror, TwoWayBinding};
pub use observable::{Observable, Subscription};
