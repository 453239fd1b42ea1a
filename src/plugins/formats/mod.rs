//! Structured readers and writers for the settings formats adapters touch.
//!
//! Both formats follow the same shape: parse the whole document, change one
//! key, serialize the whole document again. Anything the adapter didn't ask
//! to change is carried through untouched.

pub mod ini;
pub mod json;

use std::path::Path;
use thiserror::Error;

use super::PluginError;

/// A settings file could not be understood.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON object at the top level, found {0}")]
    NotAnObject(&'static str),
}

impl FormatError {
    /// Attach the file the error came from.
    pub fn at(self, path: &Path) -> PluginError {
        PluginError::Malformed {
            path: crate::common::utils::private_path(path),
            reason: self.to_string(),
        }
    }
}
