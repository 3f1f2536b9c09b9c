#![forbid(clippy::unwrap_used)]
#![forbid(clippy::expect_used)]
#![forbid(clippy::panic)]

//! # rostersync
//!
//! Keeps GitHub team rosters in line with declarative YAML files.
//!
//! The domain types live in `rostersync-core` and the reconciliation engine
//! in `rostersync-reconciler`. This crate adds the GitHub REST client, the run
//! driver that expands team families into teams, and the CLI.

pub mod app;
pub mod cli;
pub mod driver;
pub mod github;

pub use rostersync_core;
pub use rostersync_reconciler;

pub use app::{
    DRY_RUN_BANNER, INTERRUPTED_EXIT_STATUS, Termination, execute, execute_with_reporter,
    run_until_shutdown,
};
pub use cli::Cli;
pub use driver::{FamilyTargets, GroupFailure, RunError, RunSummary, TeamNaming, derive_targets};
pub use github::{DEFAULT_API_URL, GitHubConfig, GitHubDirectory};
