//! Lazily populated catalog caches keyed by logical name.
//!
//! The platform lists catalog entities page by page but cannot look one up
//! by name, so a miss triggers a full enumeration of that kind. Entries are
//! snapshots: once a name is cached, later lookups never go back to the
//! platform during this run, and every lookup hands out a copy.

use crate::error::{ProvisionError, ProvisionResult};
use roster_client::models::{Group, PhoneBase, Role, Site};
use roster_client::{AdminApi, CatalogEntity, ReferenceKind};
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Default number of entities requested per catalog page.
pub const DEFAULT_PAGE_SIZE: u32 = 50;

/// Name-keyed cache for one kind of catalog entity.
pub struct ReferenceCache<E: CatalogEntity> {
    api: Arc<dyn AdminApi>,
    page_size: u32,
    entries: RwLock<HashMap<String, E>>,
    /// Serializes enumerations so concurrent misses trigger a single scan.
    populate: Mutex<()>,
    enumerations: AtomicU64,
}

impl<E: CatalogEntity> ReferenceCache<E> {
    #[must_use]
    pub fn new(api: Arc<dyn AdminApi>, page_size: u32) -> Self {
        Self {
            api,
            page_size: page_size.max(1),
            entries: RwLock::new(HashMap::new()),
            populate: Mutex::new(()),
            enumerations: AtomicU64::new(0),
        }
    }

    /// Resolve a logical name (exact, case-sensitive match).
    ///
    /// A miss enumerates the whole catalog once; if the name is still absent
    /// afterwards the lookup fails with [`ProvisionError::ReferenceNotFound`].
    pub async fn resolve(&self, name: &str) -> ProvisionResult<E> {
        if let Some(entry) = self.get(name).await {
            return Ok(entry);
        }

        let _guard = self.populate.lock().await;
        // Another task may have finished a scan while we waited.
        if let Some(entry) = self.get(name).await {
            return Ok(entry);
        }

        self.enumerate().await;

        self.get(name)
            .await
            .ok_or_else(|| ProvisionError::ReferenceNotFound {
                kind: E::KIND,
                name: name.to_string(),
            })
    }

    /// Cached entry for `name`, without touching the platform.
    pub async fn get(&self, name: &str) -> Option<E> {
        self.entries.read().await.get(name).cloned()
    }

    /// Ids of every entry cached so far in this run.
    pub async fn known_ids(&self) -> BTreeSet<String> {
        self.entries
            .read()
            .await
            .values()
            .map(|entry| entry.id().to_string())
            .collect()
    }

    /// Number of full catalog scans performed.
    pub fn enumerations(&self) -> u64 {
        self.enumerations.load(Ordering::Relaxed)
    }

    /// Fetch every page and merge the results, last write wins per name.
    ///
    /// The page count comes from the first response. A failed page is
    /// skipped; a failed first page ends the scan since the page count is
    /// unknown.
    async fn enumerate(&self) {
        self.enumerations.fetch_add(1, Ordering::Relaxed);
        let kind = E::KIND;

        let first = match E::fetch_page(self.api.as_ref(), 1, self.page_size).await {
            Ok(page) => page,
            Err(error) => {
                warn!(%kind, page = 1, error = %error, "Catalog page fetch failed, scan abandoned");
                return;
            }
        };

        let page_count = first.page_count.max(1);
        let mut fetched = first.entities;

        for page_number in 2..=page_count {
            match E::fetch_page(self.api.as_ref(), page_number, self.page_size).await {
                Ok(page) => fetched.extend(page.entities),
                Err(error) => {
                    warn!(%kind, page = page_number, error = %error, "Catalog page fetch failed, skipping");
                }
            }
        }

        let mut entries = self.entries.write().await;
        for entity in fetched {
            debug!(%kind, name = entity.name(), id = entity.id(), "Cached catalog entry");
            entries.insert(entity.name().to_string(), entity);
        }
        info!(%kind, pages = page_count, cached = entries.len(), "Catalog enumerated");
    }
}

/// The four reference caches a provisioning run resolves against.
pub struct Catalog {
    pub groups: ReferenceCache<Group>,
    pub roles: ReferenceCache<Role>,
    pub sites: ReferenceCache<Site>,
    pub phone_bases: ReferenceCache<PhoneBase>,
}

impl Catalog {
    #[must_use]
    pub fn new(api: Arc<dyn AdminApi>, page_size: u32) -> Self {
        Self {
            groups: ReferenceCache::new(Arc::clone(&api), page_size),
            roles: ReferenceCache::new(Arc::clone(&api), page_size),
            sites: ReferenceCache::new(Arc::clone(&api), page_size),
            phone_bases: ReferenceCache::new(api, page_size),
        }
    }

    /// Ids of every entry of `kind` cached so far.
    pub async fn known_ids(&self, kind: ReferenceKind) -> BTreeSet<String> {
        match kind {
            ReferenceKind::Group => self.groups.known_ids().await,
            ReferenceKind::Role => self.roles.known_ids().await,
            ReferenceKind::Site => self.sites.known_ids().await,
            ReferenceKind::PhoneBase => self.phone_bases.known_ids().await,
        }
    }
}
