#![forbid(unsafe_code)]

//! Model wrapper configuration.
//!
//! [`WrapperConfig`] is a plain value with builder-style setters. With the
//! `config-file` feature it can also be read from TOML or JSON; absent keys
//! keep their defaults.
//!
//! ```toml
//! label = "person-form"
//! reload_on_source_change = true
//! write_back_commits = false
//! ```

#[cfg(feature = "config-file")]
use crate::error::{Result, WrapperError};

/// Behaviour switches for a [`ModelWrapper`](crate::ModelWrapper).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config-file", derive(serde::Deserialize, serde::Serialize))]
#[cfg_attr(feature = "config-file", serde(default))]
pub struct WrapperConfig {
    /// Reload every field when a tracked model source changes.
    pub reload_on_source_change: bool,
    /// Push the committed object back into a tracked model source.
    pub write_back_commits: bool,
    /// Name attached to log events.
    pub label: Option<String>,
}

impl Default for WrapperConfig {
    fn default() -> Self {
        Self {
            reload_on_source_change: true,
            write_back_commits: true,
            label: None,
        }
    }
}

impl WrapperConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_reload_on_source_change(mut self, enabled: bool) -> Self {
        self.reload_on_source_change = enabled;
        self
    }

    #[must_use]
    pub fn with_write_back_commits(mut self, enabled: bool) -> Self {
        self.write_back_commits = enabled;
        self
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub(crate) fn label(&self) -> &str {
        self.label.as_deref().unwrap_or("model")
    }

    /// Parse a TOML document.
    ///
    /// # Errors
    ///
    /// [`WrapperError::Config`] if the document is malformed or a key has the
    /// wrong type.
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(source: &str) -> Result<Self> {
        toml::from_str(source).map_err(|err| WrapperError::config(err.to_string()))
    }

    /// Parse a JSON document.
    ///
    /// # Errors
    ///
    /// [`WrapperError::Config`] if the document is malformed or a key has the
    /// wrong type.
    #[cfg(feature = "config-file")]
    pub fn from_json_str(source: &str) -> Result<Self> {
        serde_json::from_str(source).map_err(|err| WrapperError::config(err.to_string()))
    }
}
