#![forbid(unsafe_code)]

//! Staged field editing over domain objects.
//!
//! This crate provides:
//! - [`ModelWrapper`] for editing a whole domain object through staged
//!   fields, with bulk commit, reload and reset
//! - [`Field`] and [`ListField`] accessors that proxy one property each
//! - [`reactive`] observable cells the accessors are built on
//!
//! ```
//! use formsync::ModelWrapper;
//!
//! #[derive(Clone, Default)]
//! struct Person {
//!     name: String,
//! }
//!
//! let wrapper = ModelWrapper::with_model(Person { name: "horst".into() });
//! let name = wrapper
//!     .field(|p: &Person| p.name.clone(), |p: &mut Person, v| p.name = v)
//!     .build()?;
//!
//! name.set_value("hugo".into());
//! assert!(wrapper.is_dirty());
//! assert_eq!(wrapper.get().map(|p| p.name).as_deref(), Some("horst"));
//!
//! wrapper.commit();
//! assert_eq!(wrapper.get().map(|p| p.name).as_deref(), Some("hugo"));
//! # Ok::<(), formsync::WrapperError>(())
//! ```

pub mod config;
pub mod error;
pub mod field;
pub mod list_field;
pub mod reactive;
pub mod source;
pub mod wrapper;

pub use config::WrapperConfig;
pub use error::{Result, WrapperError};
pub use field::Field;
pub use list_field::ListField;
pub use reactive::{Observable, Subscription, TwoWayBinding};
pub use wrapper::{FieldBuilder, ModelWrapper};
