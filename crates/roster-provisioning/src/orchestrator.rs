//! Batch and single-record provisioning pipelines.
//!
//! A batch is scatter/gather: every incoming record gets its own task
//! (create the account, then enrich it) as soon as it arrives, and the
//! pipeline waits for every task to settle before membership assignment
//! reads the set of enriched users. Failed records are reported and left
//! out of every later stage.

use crate::cache::{Catalog, DEFAULT_PAGE_SIZE};
use crate::creator::AccountCreator;
use crate::enrich::Enricher;
use crate::error::{ProvisionError, ProvisionResult};
use crate::manifest::{
    FailureDetail, OutcomeStatus, PhoneOutcome, ProvisioningManifest, RecordOutcome,
};
use crate::membership::MembershipAssigner;
use crate::record::{field, EnrichedUser, IdentityRecord, RawRecord, FIELD_EMAIL, FIELD_NAME};
use crate::retry::RetryPolicy;
use crate::telephony::TelephonyProvisioner;
use chrono::Utc;
use futures::future::join_all;
use futures::{pin_mut, Stream, StreamExt};
use roster_client::models::Station;
use roster_client::{AdminApi, ReferenceKind};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Tunables for a provisioner.
#[derive(Debug, Clone)]
pub struct ProvisionSettings {
    pub catalog_page_size: u32,
    pub group_retry: RetryPolicy,
    pub role_retry: RetryPolicy,
    pub station_retry: RetryPolicy,
}

impl Default for ProvisionSettings {
    fn default() -> Self {
        Self {
            catalog_page_size: DEFAULT_PAGE_SIZE,
            group_retry: RetryPolicy::group_membership(),
            role_retry: RetryPolicy::role_membership(),
            station_retry: RetryPolicy::station_lookup(),
        }
    }
}

/// Result of the scatter/gather phase.
#[derive(Debug, Default)]
pub struct Gathered {
    /// Records that were created and fully enriched, in input order.
    pub users: Vec<EnrichedUser>,
    /// One outcome per input record. Rejected inputs precede launched ones.
    pub records: Vec<RecordOutcome>,
}

/// A record that did not make it through creation and enrichment.
#[derive(Debug)]
pub struct RecordFailure {
    /// Present when the account was created before the failure.
    pub account_id: Option<String>,
    pub error: ProvisionError,
}

/// Drives the whole provisioning pipeline.
///
/// Cloning is cheap; clones share the platform client and the catalog cache.
#[derive(Clone)]
pub struct Provisioner {
    catalog: Arc<Catalog>,
    creator: AccountCreator,
    enricher: Enricher,
    membership: MembershipAssigner,
    telephony: TelephonyProvisioner,
}

impl Provisioner {
    /// Build a provisioner with a fresh catalog cache.
    #[must_use]
    pub fn new(api: Arc<dyn AdminApi>, settings: ProvisionSettings) -> Self {
        let catalog = Arc::new(Catalog::new(Arc::clone(&api), settings.catalog_page_size));
        Self::with_catalog(api, catalog, settings)
    }

    /// Build a provisioner around an existing catalog cache.
    #[must_use]
    pub fn with_catalog(
        api: Arc<dyn AdminApi>,
        catalog: Arc<Catalog>,
        settings: ProvisionSettings,
    ) -> Self {
        Self {
            creator: AccountCreator::new(Arc::clone(&api)),
            enricher: Enricher::new(Arc::clone(&catalog)),
            membership: MembershipAssigner::new(
                Arc::clone(&api),
                settings.group_retry,
                settings.role_retry,
            ),
            telephony: TelephonyProvisioner::new(api, settings.station_retry),
            catalog,
        }
    }

    #[must_use]
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Create one account and resolve its references.
    pub async fn create_and_enrich(
        &self,
        record: IdentityRecord,
    ) -> Result<EnrichedUser, RecordFailure> {
        let account_id = self
            .creator
            .create(&record)
            .await
            .map_err(|error| RecordFailure {
                account_id: None,
                error,
            })?;

        self.enricher
            .enrich(account_id.clone(), record)
            .await
            .map_err(|error| RecordFailure {
                account_id: Some(account_id),
                error,
            })
    }

    /// Scatter one creation+enrichment task per record, then gather them all.
    ///
    /// Tasks start as records arrive; the input need not be complete first.
    /// Returns only after every launched task has settled.
    pub async fn provision_batch<S>(&self, records: S) -> Gathered
    where
        S: Stream<Item = ProvisionResult<RawRecord>>,
    {
        pin_mut!(records);

        let mut gathered = Gathered::default();
        let mut in_flight = Vec::new();
        let mut index = 0usize;

        while let Some(item) = records.next().await {
            let (name, email) = match &item {
                Ok(raw) => (
                    field(raw, FIELD_NAME).map(str::to_string),
                    field(raw, FIELD_EMAIL).map(str::to_string),
                ),
                Err(_) => (None, None),
            };

            match item.and_then(|raw| IdentityRecord::from_fields(&raw)) {
                Ok(record) => {
                    let this = self.clone();
                    let handle = tokio::spawn(async move { this.create_and_enrich(record).await });
                    in_flight.push((index, name, email, handle));
                }
                Err(error) => {
                    warn!(index, name = ?name, error = %error, "Rejected input record");
                    gathered.records.push(record_outcome(
                        index,
                        name,
                        email,
                        Err(RecordFailure {
                            account_id: None,
                            error,
                        }),
                    ));
                }
            }
            index += 1;
        }

        info!(launched = in_flight.len(), "Waiting for account creation to settle");

        let settled = join_all(in_flight.into_iter().map(
            |(index, name, email, handle)| async move {
                let result = handle.await.unwrap_or_else(|join_error| {
                    Err(RecordFailure {
                        account_id: None,
                        error: ProvisionError::TaskFailed(join_error.to_string()),
                    })
                });
                (index, name, email, result)
            },
        ))
        .await;

        for (index, name, email, result) in settled {
            if let Err(failure) = &result {
                warn!(
                    index,
                    name = ?name,
                    email = ?email,
                    account_id = ?failure.account_id,
                    error = %failure.error,
                    "Record excluded from batch"
                );
            }
            let user = result.as_ref().ok().cloned();
            gathered.records.push(record_outcome(index, name, email, result));
            if let Some(user) = user {
                gathered.users.push(user);
            }
        }

        gathered
    }

    /// Run the full pipeline over a stream of raw records.
    pub async fn run_batch<S>(&self, records: S) -> ProvisioningManifest
    where
        S: Stream<Item = ProvisionResult<RawRecord>>,
    {
        let started = Instant::now();
        let mut manifest = ProvisioningManifest::new(Utc::now());

        info!("Beginning account creation");
        let gathered = self.provision_batch(records).await;
        manifest.records = gathered.records;
        manifest.sort_records();

        self.post_creation(&gathered.users, &mut manifest).await;

        manifest.set_duration(started.elapsed().as_millis() as u64);
        info!(summary = %manifest.summary(), "Batch complete");
        manifest
    }

    /// Run the full pipeline for exactly one record, inline.
    pub async fn provision_one(&self, raw: RawRecord) -> ProvisioningManifest {
        let started = Instant::now();
        let mut manifest = ProvisioningManifest::new(Utc::now());
        let name = field(&raw, FIELD_NAME).map(str::to_string);
        let email = field(&raw, FIELD_EMAIL).map(str::to_string);

        let result = match IdentityRecord::from_fields(&raw) {
            Ok(record) => self.create_and_enrich(record).await,
            Err(error) => Err(RecordFailure {
                account_id: None,
                error,
            }),
        };

        let user = result.as_ref().ok().cloned();
        manifest
            .records
            .push(record_outcome(0, name, email, result));

        if let Some(user) = user {
            self.post_creation(std::slice::from_ref(&user), &mut manifest)
                .await;
        }

        manifest.set_duration(started.elapsed().as_millis() as u64);
        info!(summary = %manifest.summary(), "Single record provisioned");
        manifest
    }

    /// Membership assignment then telephony for the gathered users.
    async fn post_creation(&self, users: &[EnrichedUser], manifest: &mut ProvisioningManifest) {
        if users.is_empty() {
            info!("No enriched users, skipping assignment and telephony");
            return;
        }

        let known_groups = self.catalog.known_ids(ReferenceKind::Group).await;
        manifest.groups = self.membership.assign_groups(users, &known_groups).await;

        let known_roles = self.catalog.known_ids(ReferenceKind::Role).await;
        manifest.roles = self.membership.assign_roles(users, &known_roles).await;

        info!(users = users.len(), "Creating phones for users");
        manifest.phones = join_all(users.iter().map(|user| async move {
            let result = self.telephony.provision_phone(user).await;
            phone_outcome(user, result)
        }))
        .await;
    }
}

fn record_outcome(
    index: usize,
    name: Option<String>,
    email: Option<String>,
    result: Result<EnrichedUser, RecordFailure>,
) -> RecordOutcome {
    match result {
        Ok(user) => RecordOutcome {
            index,
            name,
            email,
            account_id: Some(user.id),
            status: OutcomeStatus::Succeeded,
            error: None,
        },
        Err(failure) => RecordOutcome {
            index,
            name,
            email,
            account_id: failure.account_id,
            status: OutcomeStatus::Failed,
            error: Some(FailureDetail::from(&failure.error)),
        },
    }
}

fn phone_outcome(user: &EnrichedUser, result: ProvisionResult<Station>) -> PhoneOutcome {
    match result {
        Ok(station) => PhoneOutcome {
            user_id: user.id.clone(),
            name: user.name().to_string(),
            station_id: Some(station.id),
            status: OutcomeStatus::Succeeded,
            error: None,
        },
        Err(error) => {
            warn!(user_id = %user.id, error = %error, "Telephony provisioning failed");
            PhoneOutcome {
                user_id: user.id.clone(),
                name: user.name().to_string(),
                station_id: None,
                status: OutcomeStatus::Failed,
                error: Some(FailureDetail::from(&error)),
            }
        }
    }
}
