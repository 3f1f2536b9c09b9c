//! Core error types for rostersync.
//!
//! Every configuration problem is surfaced as a typed, recoverable error so the
//! binary can report it before any team is touched.

use std::path::PathBuf;

use thiserror::Error;

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type.
#[derive(Debug, Error)]
pub enum Error {
    // Role parsing
    #[error("invalid role '{value}': expected 'member' or 'maintainer'")]
    InvalidRole { value: String },

    #[error("invalid role '{value}' for '{identity}' in '{path}': expected 'member' or 'maintainer'")]
    InvalidTargetRole {
        path: PathBuf,
        identity: String,
        value: String,
    },

    // I/O errors
    #[error("failed to read directory '{path}': {reason}")]
    DirectoryReadFailed { path: PathBuf, reason: String },

    #[error("failed to read file '{path}': {reason}")]
    FileReadFailed { path: PathBuf, reason: String },

    // Parsing errors
    #[error("failed to parse YAML in '{path}': {reason}")]
    YamlParseFailed { path: PathBuf, reason: String },

    #[error("failed to parse TOML in '{path}': {reason}")]
    TomlParseFailed { path: PathBuf, reason: String },

    // Settings validation
    #[error("invalid settings: {reason}")]
    InvalidSettings { reason: String },
}

impl Error {
    /// Create an invalid role error.
    pub fn invalid_role(value: impl Into<String>) -> Self {
        Self::InvalidRole {
            value: value.into(),
        }
    }

    /// Create an invalid role error scoped to a target file entry.
    pub fn invalid_target_role(
        path: impl Into<PathBuf>,
        identity: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::InvalidTargetRole {
            path: path.into(),
            identity: identity.into(),
            value: value.into(),
        }
    }

    /// Create a directory read error.
    pub fn directory_read_failed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::DirectoryReadFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a file read error.
    pub fn file_read_failed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::FileReadFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a YAML parse error.
    pub fn yaml_parse_failed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::YamlParseFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a TOML parse error.
    pub fn toml_parse_failed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::TomlParseFailed {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid settings error.
    pub fn invalid_settings(reason: impl Into<String>) -> Self {
        Self::InvalidSettings {
            reason: reason.into(),
        }
    }
}
