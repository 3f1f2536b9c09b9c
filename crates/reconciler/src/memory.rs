//! In-memory directory for tests and local dry runs.
//!
//! Keeps per-role listings exactly like a remote directory would report them,
//! records every call, and can inject failures.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rostersync_core::{GroupRef, Identity, Membership, Role};
use tokio::sync::RwLock;

use crate::directory::DirectoryClient;
use crate::error::{DirectoryError, DirectoryResult};

/// A call received by [`InMemoryDirectory`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryCall {
    /// `list_members`.
    ListMembers { group: GroupRef, role: Role },
    /// `list_org_admins`.
    ListOrgAdmins { org: String },
    /// `upsert_membership`.
    Upsert {
        group: GroupRef,
        identity: Identity,
        role: Role,
    },
    /// `remove_membership`.
    Remove { group: GroupRef, identity: Identity },
}

impl DirectoryCall {
    /// Whether the call changes a roster.
    #[must_use]
    pub const fn is_mutation(&self) -> bool {
        matches!(self, Self::Upsert { .. } | Self::Remove { .. })
    }
}

#[derive(Debug, Default)]
struct DirectoryState {
    listings: HashMap<GroupRef, BTreeMap<Role, BTreeSet<Identity>>>,
    org_admins: HashMap<String, Vec<Identity>>,
    failing_listings: HashSet<GroupRef>,
    failing_admin_lookups: HashMap<String, usize>,
    failing_identities: HashSet<Identity>,
}

impl DirectoryState {
    fn forget(&mut self, group: &GroupRef, identity: &Identity) {
        if let Some(roles) = self.listings.get_mut(group) {
            for listed in roles.values_mut() {
                listed.remove(identity);
            }
        }
    }
}

/// Directory backed by process memory.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    state: RwLock<DirectoryState>,
    calls: RwLock<Vec<DirectoryCall>>,
    latency: Option<Duration>,
}

impl InMemoryDirectory {
    /// Create an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty directory wrapped in an Arc.
    #[must_use]
    pub fn new_arc() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Delay every call, so concurrent callers overlap.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Replace the roster of `group`.
    pub async fn set_team(&self, group: &GroupRef, membership: &Membership) {
        let mut listings: BTreeMap<Role, BTreeSet<Identity>> = BTreeMap::new();
        for (identity, role) in membership.iter() {
            listings.entry(role).or_default().insert(identity.clone());
        }
        self.state.write().await.listings.insert(group.clone(), listings);
    }

    /// Add `identity` to the `role` listing without touching other listings.
    ///
    /// Lets tests model a directory that reports one identity under two roles.
    pub async fn insert_listing(&self, group: &GroupRef, role: Role, identity: Identity) {
        self.state
            .write()
            .await
            .listings
            .entry(group.clone())
            .or_default()
            .entry(role)
            .or_default()
            .insert(identity);
    }

    /// Replace the admins of `org`.
    pub async fn set_org_admins(&self, org: &str, admins: impl IntoIterator<Item = Identity>) {
        self.state
            .write()
            .await
            .org_admins
            .insert(org.to_string(), admins.into_iter().collect());
    }

    /// Make every listing of `group` fail.
    pub async fn fail_listing(&self, group: &GroupRef) {
        self.state
            .write()
            .await
            .failing_listings
            .insert(group.clone());
    }

    /// Make the next `times` admin lookups for `org` fail.
    pub async fn fail_admin_lookups(&self, org: &str, times: usize) {
        self.state
            .write()
            .await
            .failing_admin_lookups
            .insert(org.to_string(), times);
    }

    /// Make every mutation targeting `identity` fail.
    pub async fn fail_mutations_for(&self, identity: Identity) {
        self.state
            .write()
            .await
            .failing_identities
            .insert(identity);
    }

    /// Current roster of `group`, higher role winning on overlap.
    pub async fn team(&self, group: &GroupRef) -> Membership {
        let state = self.state.read().await;
        let Some(roles) = state.listings.get(group) else {
            return Membership::new();
        };
        let mut membership = Membership::new();
        for (role, listed) in roles {
            for identity in listed {
                membership.promote(identity.clone(), *role);
            }
        }
        membership
    }

    /// Every call received so far, in arrival order.
    pub async fn calls(&self) -> Vec<DirectoryCall> {
        self.calls.read().await.clone()
    }

    /// Mutating calls received so far.
    pub async fn mutations(&self) -> Vec<DirectoryCall> {
        self.calls
            .read()
            .await
            .iter()
            .filter(|call| call.is_mutation())
            .cloned()
            .collect()
    }

    /// Number of admin lookups received for `org`.
    pub async fn admin_lookups(&self, org: &str) -> usize {
        self.calls
            .read()
            .await
            .iter()
            .filter(|call| matches!(call, DirectoryCall::ListOrgAdmins { org: o } if o == org))
            .count()
    }

    async fn record(&self, call: DirectoryCall) {
        self.calls.write().await.push(call);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }

    async fn check_mutation(&self, identity: &Identity) -> DirectoryResult<()> {
        if self.state.read().await.failing_identities.contains(identity) {
            return Err(DirectoryError::status(422, format!("cannot modify {identity}")));
        }
        Ok(())
    }
}

#[async_trait]
impl DirectoryClient for InMemoryDirectory {
    async fn list_members(&self, group: &GroupRef, role: Role) -> DirectoryResult<Vec<Identity>> {
        self.record(DirectoryCall::ListMembers {
            group: group.clone(),
            role,
        })
        .await;

        let state = self.state.read().await;
        if state.failing_listings.contains(group) {
            return Err(DirectoryError::status(500, "listing unavailable"));
        }
        Ok(state
            .listings
            .get(group)
            .and_then(|roles| roles.get(&role))
            .map(|listed| listed.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn list_org_admins(&self, org: &str) -> DirectoryResult<Vec<Identity>> {
        self.record(DirectoryCall::ListOrgAdmins {
            org: org.to_string(),
        })
        .await;

        let mut state = self.state.write().await;
        if let Some(remaining) = state.failing_admin_lookups.get_mut(org) {
            if let Some(left) = remaining.checked_sub(1) {
                *remaining = left;
                return Err(DirectoryError::request_failed("admin lookup unavailable"));
            }
        }
        Ok(state.org_admins.get(org).cloned().unwrap_or_default())
    }

    async fn upsert_membership(
        &self,
        group: &GroupRef,
        identity: &Identity,
        role: Role,
    ) -> DirectoryResult<()> {
        self.record(DirectoryCall::Upsert {
            group: group.clone(),
            identity: identity.clone(),
            role,
        })
        .await;
        self.check_mutation(identity).await?;

        let mut state = self.state.write().await;
        state.forget(group, identity);
        state
            .listings
            .entry(group.clone())
            .or_default()
            .entry(role)
            .or_default()
            .insert(identity.clone());
        Ok(())
    }

    async fn remove_membership(
        &self,
        group: &GroupRef,
        identity: &Identity,
    ) -> DirectoryResult<()> {
        self.record(DirectoryCall::Remove {
            group: group.clone(),
            identity: identity.clone(),
        })
        .await;
        self.check_mutation(identity).await?;

        self.state.write().await.forget(group, identity);
        Ok(())
    }
}
