//! Team membership reconciliation.
//!
//! Given a declared membership for a team, the syncer:
//!
//! 1. Resolves the organization's admins (cached once per run)
//! 2. Reads the team's current members and maintainers
//! 3. Plans adds, role updates and removals, keeping org admins as maintainers
//! 4. Applies the plan, or only reports it in dry-run mode
//!
//! # Key Concepts
//!
//! ## Admin override
//!
//! GitHub upgrades org admins to maintainer on any team they join. Declaring
//! them as plain members would produce the same diff on every run, so the
//! planner targets them as maintainers. Service accounts on the ignore list
//! are exempt.
//!
//! ## Failures
//!
//! A failed lookup or listing aborts the team before anything is changed.
//! Failed individual changes are collected into a [`MultiError`] while the
//! remaining changes still go through.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use rostersync_core::{GroupRef, IgnoreList, Membership};
//! use rostersync_reconciler::{InMemoryDirectory, Syncer};
//!
//! #[tokio::main]
//! async fn main() -> rostersync_reconciler::Result<()> {
//!     let directory = InMemoryDirectory::new_arc();
//!     let syncer = Syncer::builder()
//!         .with_directory(directory)
//!         .with_ignore_list(IgnoreList::new(["googlebot"]))
//!         .dry_run(true)
//!         .build()?;
//!
//!     let report = syncer
//!         .sync(&GroupRef::new("abcxyz", "go-readability"), &Membership::new())
//!         .await?;
//!     println!("{} changes", report.operations.len());
//!     Ok(())
//! }
//! ```

#![forbid(clippy::unwrap_used)]
#![forbid(clippy::expect_used)]
#![forbid(clippy::panic)]

pub mod admin_cache;
pub mod directory;
pub mod error;
pub mod memory;
pub mod progress;
pub mod reconciler;
pub mod types;

// Re-export main types
pub use admin_cache::AdminCache;
pub use directory::DirectoryClient;
pub use error::{DirectoryError, DirectoryResult, Error, MultiError, Result};
pub use memory::{DirectoryCall, InMemoryDirectory};
pub use progress::{ConsoleReporter, ProgressReporter, RecordingReporter};
pub use reconciler::{Syncer, SyncerBuilder, SyncerConfig};
pub use types::{AdminOverride, MembershipOp, SyncPlan, SyncReport, plan};
