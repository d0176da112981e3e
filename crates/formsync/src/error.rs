#![forbid(unsafe_code)]

//! Error type for field registration and configuration loading.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, WrapperError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WrapperError {
    /// A key was registered again with a different value type.
    #[error("field key {key:?} is already registered with a different value type (requested {requested})")]
    KeyTypeMismatch { key: String, requested: &'static str },

    #[error("invalid wrapper config: {message}")]
    Config { message: String },
}

impl WrapperError {
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn key_mismatch<T>(key: impl Into<String>) -> Self {
        Self::KeyTypeMismatch {
            key: key.into(),
            requested: std::any::type_name::<T>(),
        }
    }
}
