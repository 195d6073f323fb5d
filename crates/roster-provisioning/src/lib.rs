//! Bulk account provisioning engine.
//!
//! Given a stream of identity records, the engine creates platform accounts,
//! resolves each record's group, role, site and phone-base names against a
//! lazily populated catalog cache, assigns group and role membership in
//! batches, and provisions a soft phone bound as each user's default station.
//!
//! Failures are isolated per record, per membership target and per user; a
//! run always completes with a [`ProvisioningManifest`].

pub mod cache;
pub mod creator;
pub mod enrich;
pub mod error;
pub mod manifest;
pub mod membership;
pub mod orchestrator;
pub mod record;
pub mod retry;
pub mod telephony;

pub use cache::{Catalog, ReferenceCache};
pub use error::{ErrorKind, ProvisionError, ProvisionResult};
pub use manifest::{OutcomeStatus, ProvisioningManifest};
pub use orchestrator::{ProvisionSettings, Provisioner};
pub use record::{EnrichedUser, IdentityRecord, RawRecord};
pub use retry::RetryPolicy;
