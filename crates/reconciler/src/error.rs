//! Error types for the reconciler crate.

use std::fmt;

use rostersync_core::{GroupRef, Role};
use thiserror::Error;

use crate::types::MembershipOp;

/// Result type alias for reconciler operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Result type alias for directory calls.
pub type DirectoryResult<T> = std::result::Result<T, DirectoryError>;

/// Failure reported by a directory backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    /// The request never produced a response.
    #[error("request failed: {reason}")]
    RequestFailed { reason: String },

    /// The directory answered with a non-success status.
    #[error("directory returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response body could not be understood.
    #[error("invalid response: {reason}")]
    InvalidResponse { reason: String },
}

impl DirectoryError {
    /// Create a request failed error.
    pub fn request_failed(reason: impl Into<String>) -> Self {
        Self::RequestFailed {
            reason: reason.into(),
        }
    }

    /// Create a status error.
    pub fn status(status: u16, body: impl Into<String>) -> Self {
        Self::Status {
            status,
            body: body.into(),
        }
    }

    /// Create an invalid response error.
    pub fn invalid_response(reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            reason: reason.into(),
        }
    }
}

/// Reconciler error types.
#[derive(Debug, Error)]
pub enum Error {
    /// Org admins could not be resolved. Fatal to the team sync.
    #[error("failed to get org admins for {org}: {source}")]
    AdminLookupFailed { org: String, source: DirectoryError },

    /// Current team state could not be listed. Fatal to the team sync.
    #[error("failed to get {role}s for team {group}: {source}")]
    ListFailed {
        group: GroupRef,
        role: Role,
        source: DirectoryError,
    },

    /// A single membership change failed.
    #[error("failed to {} in {group}: {source}", .op.summary())]
    OperationFailed {
        group: GroupRef,
        op: MembershipOp,
        source: DirectoryError,
    },

    /// One or more membership changes failed.
    #[error("{0}")]
    OperationsFailed(MultiError),

    /// Invalid configuration.
    #[error("invalid configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl Error {
    /// Create an admin lookup error.
    pub fn admin_lookup_failed(org: impl Into<String>, source: DirectoryError) -> Self {
        Self::AdminLookupFailed {
            org: org.into(),
            source,
        }
    }

    /// Create a listing error.
    pub fn list_failed(group: GroupRef, role: Role, source: DirectoryError) -> Self {
        Self::ListFailed {
            group,
            role,
            source,
        }
    }

    /// Create a failed operation error.
    pub const fn operation_failed(
        group: GroupRef,
        op: MembershipOp,
        source: DirectoryError,
    ) -> Self {
        Self::OperationFailed { group, op, source }
    }

    /// Create an invalid config error.
    pub fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }

    /// Whether the error stopped the team sync before any change was made.
    #[must_use]
    pub const fn is_fatal_to_group(&self) -> bool {
        matches!(self, Self::AdminLookupFailed { .. } | Self::ListFailed { .. })
    }
}

/// Several errors reported as one, one per line.
#[derive(Debug, Default)]
pub struct MultiError(Vec<Error>);

impl MultiError {
    /// Create an empty error list.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Append an error.
    pub fn push(&mut self, error: Error) {
        self.0.push(error);
    }

    /// Number of collected errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether nothing was collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate the collected errors.
    pub fn iter(&self) -> std::slice::Iter<'_, Error> {
        self.0.iter()
    }

    /// `Ok(value)` when empty, otherwise the collected errors.
    ///
    /// # Errors
    ///
    /// Returns `Error::OperationsFailed` when at least one error was collected.
    pub fn into_result<T>(self, value: T) -> Result<T> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(Error::OperationsFailed(self))
        }
    }
}

impl fmt::Display for MultiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, error) in self.0.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for MultiError {}

impl FromIterator<Error> for MultiError {
    fn from_iter<I: IntoIterator<Item = Error>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<Error> for MultiError {
    fn extend<I: IntoIterator<Item = Error>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl IntoIterator for MultiError {
    type Item = Error;
    type IntoIter = std::vec::IntoIter<Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a MultiError {
    type Item = &'a Error;
    type IntoIter = std::slice::Iter<'a, Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
