#![forbid(unsafe_code)]

//! Tracking an observable model source.
//!
//! A wrapper built with [`ModelWrapper::from_source`] follows an
//! `Observable<S>` that holds the domain object (usually `S = Option<M>`).
//! Whenever the source changes the wrapper replaces its model and, unless
//! disabled in [`WrapperConfig`], reloads every field. Manual
//! [`ModelWrapper::set`] calls never reload.
//!
//! After a commit the committed object is written back into the source
//! (again configurable). The write-back is an ordinary `set`, so an equal
//! value does not notify anyone.
//!
//! The subscription is owned by the wrapper and ends when the last wrapper
//! handle is dropped.

use std::rc::Rc;

use tracing::debug;

use crate::config::WrapperConfig;
use crate::reactive::{Observable, Subscription};
use crate::wrapper::ModelWrapper;

pub(crate) struct SourceLink<M> {
    _subscription: Subscription,
    write_back: Rc<dyn Fn(M)>,
}

impl<M> SourceLink<M> {
    pub(crate) fn write_back(&self) -> Rc<dyn Fn(M)> {
        Rc::clone(&self.write_back)
    }
}

impl<M: Clone + 'static> ModelWrapper<M> {
    /// Wrapper that follows `source` with the default configuration.
    #[must_use]
    pub fn from_source<S>(source: &Observable<S>) -> Self
    where
        S: Clone + PartialEq + Into<Option<M>> + From<M> + 'static,
    {
        Self::from_source_with_config(source, WrapperConfig::default())
    }

    #[must_use]
    pub fn from_source_with_config<S>(source: &Observable<S>, config: WrapperConfig) -> Self
    where
        S: Clone + PartialEq + Into<Option<M>> + From<M> + 'static,
    {
        let wrapper = Self::with_config(source.get().into(), config);

        let weak = Rc::downgrade(wrapper.inner());
        let subscription = source.subscribe(move |value: &S| {
            let Some(inner) = weak.upgrade() else {
                return;
            };
            debug!(wrapper = inner.label(), "model source changed");
            inner.source_changed(value.clone().into());
        });

        let target = source.clone();
        let write_back: Rc<dyn Fn(M)> = Rc::new(move |model: M| {
            target.set(S::from(model));
        });

        wrapper.attach_source(SourceLink {
            _subscription: subscription,
            write_back,
        });
        wrapper
    }
}
