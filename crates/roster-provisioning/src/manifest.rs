//! Batch outcome reporting.
//!
//! A run always completes and produces a [`ProvisioningManifest`] listing what
//! succeeded and what failed, per record, per membership target and per
//! telephony user. Nothing is rolled back.

use crate::error::{ErrorKind, ProvisionError};
use chrono::{DateTime, Utc};
use roster_client::ReferenceKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeStatus {
    Succeeded,
    Failed,
}

/// Error details attached to a failed outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureDetail {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&ProvisionError> for FailureDetail {
    fn from(error: &ProvisionError) -> Self {
        Self {
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// Outcome of account creation and enrichment for one input record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordOutcome {
    /// Position in the input (0-based).
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Set whenever the account was created, even if enrichment later failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FailureDetail>,
}

/// Outcome of one batched membership write.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetOutcome {
    pub kind: ReferenceKind,
    pub target_id: String,
    pub target_name: String,
    pub member_ids: Vec<String>,
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FailureDetail>,
}

/// Outcome of device creation and station binding for one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhoneOutcome {
    pub user_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub station_id: Option<String>,
    pub status: OutcomeStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<FailureDetail>,
}

/// Everything a provisioning run did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisioningManifest {
    pub started_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub records: Vec<RecordOutcome>,
    pub groups: Vec<TargetOutcome>,
    pub roles: Vec<TargetOutcome>,
    pub phones: Vec<PhoneOutcome>,
}

impl ProvisioningManifest {
    #[must_use]
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            duration_ms: 0,
            records: Vec::new(),
            groups: Vec::new(),
            roles: Vec::new(),
            phones: Vec::new(),
        }
    }

    pub fn set_duration(&mut self, duration_ms: u64) {
        self.duration_ms = duration_ms;
    }

    /// Record outcomes in input order.
    pub fn sort_records(&mut self) {
        self.records.sort_by_key(|r| r.index);
    }

    #[must_use]
    pub fn record(&self, index: usize) -> Option<&RecordOutcome> {
        self.records.iter().find(|r| r.index == index)
    }

    #[must_use]
    pub fn accounts_created(&self) -> usize {
        self.records.iter().filter(|r| r.account_id.is_some()).count()
    }

    #[must_use]
    pub fn records_succeeded(&self) -> usize {
        count(self.records.iter().map(|r| r.status))
    }

    #[must_use]
    pub fn records_failed(&self) -> usize {
        self.records.len() - self.records_succeeded()
    }

    /// Whether any record, target or phone failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        let failed = |s: OutcomeStatus| s == OutcomeStatus::Failed;
        self.records.iter().any(|r| failed(r.status))
            || self.groups.iter().any(|t| failed(t.status))
            || self.roles.iter().any(|t| failed(t.status))
            || self.phones.iter().any(|p| failed(p.status))
    }

    /// Failed outcomes of every stage, as `(stage, subject, detail)`.
    pub fn failures(&self) -> impl Iterator<Item = (&'static str, String, &FailureDetail)> {
        let records = self.records.iter().filter_map(|r| {
            r.error.as_ref().map(|e| {
                let subject = r
                    .name
                    .clone()
                    .unwrap_or_else(|| format!("record #{}", r.index + 1));
                ("record", subject, e)
            })
        });
        let groups = self
            .groups
            .iter()
            .filter_map(|t| t.error.as_ref().map(|e| ("group", t.target_name.clone(), e)));
        let roles = self
            .roles
            .iter()
            .filter_map(|t| t.error.as_ref().map(|e| ("role", t.target_name.clone(), e)));
        let phones = self
            .phones
            .iter()
            .filter_map(|p| p.error.as_ref().map(|e| ("phone", p.name.clone(), e)));
        records.chain(groups).chain(roles).chain(phones)
    }

    /// One-line summary for logs and terminal output.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "records {}/{} ok, groups {}/{} ok, roles {}/{} ok, phones {}/{} ok in {}ms",
            self.records_succeeded(),
            self.records.len(),
            count(self.groups.iter().map(|t| t.status)),
            self.groups.len(),
            count(self.roles.iter().map(|t| t.status)),
            self.roles.len(),
            count(self.phones.iter().map(|p| p.status)),
            self.phones.len(),
            self.duration_ms,
        )
    }
}

fn count(statuses: impl Iterator<Item = OutcomeStatus>) -> usize {
    statuses.filter(|s| *s == OutcomeStatus::Succeeded).count()
}
