//! Per-run cache of organization admins.
//!
//! Each organization gets one slot. Slots are created under the write lock and
//! initialized at most once; concurrent misses for the same organization wait
//! on the slot instead of issuing their own lookup. A failed lookup leaves the
//! slot empty so the next caller retries.

use std::collections::HashMap;
use std::sync::Arc;

use itertools::Itertools;
use rostersync_core::{IgnoreList, OrgAdminSet};
use tokio::sync::{OnceCell, RwLock};
use tracing::debug;

use crate::directory::DirectoryClient;
use crate::error::{Error, Result};

type Slot = Arc<OnceCell<Arc<OrgAdminSet>>>;

/// Memoizes [`DirectoryClient::list_org_admins`] per organization.
pub struct AdminCache {
    directory: Arc<dyn DirectoryClient>,
    ignore: IgnoreList,
    slots: RwLock<HashMap<String, Slot>>,
}

impl AdminCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new(directory: Arc<dyn DirectoryClient>, ignore: IgnoreList) -> Self {
        Self {
            directory,
            ignore,
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Admins of `org`, without ignored accounts.
    ///
    /// # Errors
    ///
    /// Returns `Error::AdminLookupFailed` if the directory lookup fails. Nothing
    /// is cached in that case.
    pub async fn org_admins(&self, org: &str) -> Result<Arc<OrgAdminSet>> {
        let slot = self.slot(org).await;

        if let Some(admins) = slot.get() {
            debug!(org, "using cached org admins");
            return Ok(Arc::clone(admins));
        }

        let admins = slot.get_or_try_init(|| self.fetch(org)).await?;
        Ok(Arc::clone(admins))
    }

    /// Organizations with a cached admin set, sorted.
    pub async fn cached_orgs(&self) -> Vec<String> {
        self.slots
            .read()
            .await
            .iter()
            .filter(|(_, slot)| slot.initialized())
            .map(|(org, _)| org.clone())
            .sorted()
            .collect()
    }

    async fn slot(&self, org: &str) -> Slot {
        let cached = self.slots.read().await.get(org).cloned();
        if let Some(slot) = cached {
            return slot;
        }

        let mut slots = self.slots.write().await;
        Arc::clone(slots.entry(org.to_string()).or_default())
    }

    async fn fetch(&self, org: &str) -> Result<Arc<OrgAdminSet>> {
        debug!(org, "looking up org admins");
        let listing = self
            .directory
            .list_org_admins(org)
            .await
            .map_err(|source| Error::admin_lookup_failed(org, source))?;

        let admins = OrgAdminSet::from_listing(listing, &self.ignore);
        debug!(org, admins = ?admins.iter().collect_vec(), "found org admins");
        Ok(Arc::new(admins))
    }
}

impl std::fmt::Debug for AdminCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCache")
            .field("ignore", &self.ignore)
            .finish_non_exhaustive()
    }
}
