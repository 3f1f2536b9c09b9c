//! Directory capability used by the reconciler.

use async_trait::async_trait;
use rostersync_core::{GroupRef, Identity, Role};

use crate::error::DirectoryResult;

/// Read and write access to team rosters and org admins.
///
/// Every method is a suspension point. Implementations own transport timeouts;
/// dropping the returned future cancels the call.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// Identities holding exactly `role` in `group`.
    async fn list_members(&self, group: &GroupRef, role: Role) -> DirectoryResult<Vec<Identity>>;

    /// Admins of `org`, unfiltered.
    async fn list_org_admins(&self, org: &str) -> DirectoryResult<Vec<Identity>>;

    /// Add `identity` to `group` with `role`, or change its role if present.
    async fn upsert_membership(
        &self,
        group: &GroupRef,
        identity: &Identity,
        role: Role,
    ) -> DirectoryResult<()>;

    /// Remove `identity` from `group`.
    async fn remove_membership(&self, group: &GroupRef, identity: &Identity)
    -> DirectoryResult<()>;
}
