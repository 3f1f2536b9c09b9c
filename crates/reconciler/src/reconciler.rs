//! Team membership reconciler.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use rostersync_core::{GroupRef, IgnoreList, Identity, Membership, Role};
use tracing::{debug, info, instrument, warn};

use crate::admin_cache::AdminCache;
use crate::directory::DirectoryClient;
use crate::error::{Error, MultiError, Result};
use crate::progress::{ConsoleReporter, ProgressReporter};
use crate::types::{MembershipOp, SyncReport, plan};

/// Configuration for the syncer.
#[derive(Debug, Clone)]
pub struct SyncerConfig {
    /// Report changes without applying them.
    pub dry_run: bool,
    /// Maximum membership changes in flight for one team.
    pub max_concurrent_operations: usize,
}

impl Default for SyncerConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            max_concurrent_operations: 4,
        }
    }
}

/// Converges team rosters onto declared memberships.
///
/// Safe to share across tasks: the admin cache is the only mutable state.
pub struct Syncer {
    directory: Arc<dyn DirectoryClient>,
    admins: AdminCache,
    reporter: Arc<dyn ProgressReporter>,
    config: SyncerConfig,
}

impl Syncer {
    /// Create a new syncer.
    #[must_use]
    pub fn new(
        directory: Arc<dyn DirectoryClient>,
        ignore: IgnoreList,
        reporter: Arc<dyn ProgressReporter>,
        config: SyncerConfig,
    ) -> Self {
        let admins = AdminCache::new(Arc::clone(&directory), ignore);
        Self {
            directory,
            admins,
            reporter,
            config,
        }
    }

    /// Start building a syncer.
    #[must_use]
    pub fn builder() -> SyncerBuilder {
        SyncerBuilder::new()
    }

    /// Make `group` match `target` exactly.
    ///
    /// Org admins are always kept as maintainers. Every change is reported
    /// through the progress reporter before it is attempted.
    ///
    /// # Errors
    ///
    /// - `Error::AdminLookupFailed` / `Error::ListFailed` when the current
    ///   state cannot be read; nothing is changed in that case.
    /// - `Error::OperationsFailed` when one or more changes failed; the
    ///   remaining changes were still attempted.
    #[instrument(skip_all, fields(org = %group.org, team = %group.name))]
    pub async fn sync(&self, group: &GroupRef, target: &Membership) -> Result<SyncReport> {
        debug!(target_memberships = ?target, "starting sync");

        let admins = self.admins.org_admins(&group.org).await?;
        let existing = self.existing_membership(group).await?;
        debug!(existing_memberships = ?existing, "upstream team state");

        let plan = plan(&existing, target, &admins);
        for admin in &plan.overrides {
            warn!(
                user = %admin.identity,
                target_role = %admin.requested,
                "upgrading target role to maintainer for org admin"
            );
        }

        let failures = self.apply(group, &plan.operations).await;
        let report = SyncReport::new(group.clone(), plan, self.config.dry_run);

        if report.converged {
            debug!("team already converged");
        } else {
            info!(
                added = report.added(),
                updated = report.updated(),
                removed = report.removed(),
                failed = failures.len(),
                dry_run = report.dry_run,
                "finished sync"
            );
        }

        failures.into_result(report)
    }

    /// Current roster of `group`, merged from the per-role listings.
    ///
    /// # Errors
    ///
    /// Returns `Error::ListFailed` if either listing fails.
    pub async fn existing_membership(&self, group: &GroupRef) -> Result<Membership> {
        let (members, maintainers) = tokio::try_join!(
            self.list(group, Role::Member),
            self.list(group, Role::Maintainer)
        )?;
        Ok(Membership::merge_listings(members, maintainers))
    }

    async fn list(&self, group: &GroupRef, role: Role) -> Result<Vec<Identity>> {
        self.directory
            .list_members(group, role)
            .await
            .map_err(|source| Error::list_failed(group.clone(), role, source))
    }

    /// Apply operations concurrently, collecting every failure.
    async fn apply(&self, group: &GroupRef, operations: &[MembershipOp]) -> MultiError {
        stream::iter(operations)
            .map(|op| self.apply_one(group, op))
            .buffer_unordered(self.config.max_concurrent_operations.max(1))
            .filter_map(|outcome| async move { outcome.err() })
            .collect()
            .await
    }

    async fn apply_one(&self, group: &GroupRef, op: &MembershipOp) -> Result<()> {
        self.reporter.operation(group, op);

        if self.config.dry_run {
            debug!(op = ?op, "dry run, not applying");
            return Ok(());
        }

        let outcome = match op {
            MembershipOp::Add { identity, role }
            | MembershipOp::Update {
                identity, to: role, ..
            } => {
                self.directory
                    .upsert_membership(group, identity, *role)
                    .await
            }
            MembershipOp::Remove { identity, .. } => {
                self.directory.remove_membership(group, identity).await
            }
        };

        outcome.map_err(|source| {
            warn!(op = %op.summary(), error = %source, "membership change failed");
            Error::operation_failed(group.clone(), op.clone(), source)
        })
    }

    /// The shared admin cache.
    #[must_use]
    pub const fn admin_cache(&self) -> &AdminCache {
        &self.admins
    }

    /// Get the configuration.
    #[must_use]
    pub const fn config(&self) -> &SyncerConfig {
        &self.config
    }
}

/// Builder for [`Syncer`].
#[derive(Default)]
pub struct SyncerBuilder {
    directory: Option<Arc<dyn DirectoryClient>>,
    reporter: Option<Arc<dyn ProgressReporter>>,
    ignore: IgnoreList,
    config: SyncerConfig,
}

impl SyncerBuilder {
    /// Create a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the directory client.
    #[must_use]
    pub fn with_directory(mut self, directory: Arc<dyn DirectoryClient>) -> Self {
        self.directory = Some(directory);
        self
    }

    /// Set a custom progress reporter. Defaults to stdout.
    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Set the accounts excluded from the admin override.
    #[must_use]
    pub fn with_ignore_list(mut self, ignore: IgnoreList) -> Self {
        self.ignore = ignore;
        self
    }

    /// Set the configuration.
    #[must_use]
    pub fn with_config(mut self, config: SyncerConfig) -> Self {
        self.config = config;
        self
    }

    /// Enable/disable dry-run.
    #[must_use]
    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.config.dry_run = enabled;
        self
    }

    /// Set max concurrent operations per team.
    #[must_use]
    pub fn max_concurrent_operations(mut self, max: usize) -> Self {
        self.config.max_concurrent_operations = max;
        self
    }

    /// Build the syncer.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidConfig` if no directory was set or the
    /// concurrency bound is zero.
    pub fn build(self) -> Result<Syncer> {
        let directory = self
            .directory
            .ok_or_else(|| Error::invalid_config("directory client is required"))?;

        if self.config.max_concurrent_operations == 0 {
            return Err(Error::invalid_config(
                "max_concurrent_operations must be at least 1",
            ));
        }

        let reporter = self
            .reporter
            .unwrap_or_else(|| Arc::new(ConsoleReporter));

        Ok(Syncer::new(directory, self.ignore, reporter, self.config))
    }
}
