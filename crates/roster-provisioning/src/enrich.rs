//! Reference resolution for created accounts.

use crate::cache::Catalog;
use crate::error::ProvisionResult;
use crate::record::{EnrichedUser, IdentityRecord};
use std::sync::Arc;
use tracing::debug;

/// Attaches resolved catalog entities to a created account.
#[derive(Clone)]
pub struct Enricher {
    catalog: Arc<Catalog>,
}

impl Enricher {
    #[must_use]
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    /// Resolve the record's group, role, site and phone base.
    ///
    /// The four lookups are independent and run concurrently. The first
    /// unresolvable reference fails the whole record; nothing partial is kept.
    pub async fn enrich(
        &self,
        account_id: String,
        record: IdentityRecord,
    ) -> ProvisionResult<EnrichedUser> {
        let (group, role, site, phone_base) = tokio::try_join!(
            self.catalog.groups.resolve(&record.group),
            self.catalog.roles.resolve(&record.role),
            self.catalog.sites.resolve(&record.site),
            self.catalog.phone_bases.resolve(&record.phone_base),
        )?;

        debug!(
            user_id = %account_id,
            group_id = %group.id,
            role_id = %role.id,
            site_id = %site.id,
            phone_base_id = %phone_base.id,
            "Account enriched"
        );

        Ok(EnrichedUser {
            id: account_id,
            record,
            group,
            role,
            site,
            phone_base,
        })
    }
}
