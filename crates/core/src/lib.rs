//! Core types, errors, and configuration for rostersync.
//!
//! - [`types`]: identities, roles, memberships, and org admin sets
//! - [`config`]: run settings and `<family>.yaml` target loading
//! - [`error`]: typed configuration errors

#![forbid(clippy::unwrap_used)]
#![forbid(clippy::expect_used)]
#![forbid(clippy::panic)]

pub mod config;
pub mod error;
pub mod types;

pub use config::{DEFAULT_IGNORED_ADMINS, Settings, load_target_dir, parse_target};
pub use error::{Error, Result};
pub use types::{GroupRef, Identity, IgnoreList, Membership, OrgAdminSet, Role};
