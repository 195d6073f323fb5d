//! Batched group and role membership assignment.
//!
//! Users are partitioned by resolved target id and each target receives one
//! membership write carrying all of its members. Group writes are tagged
//! with the group's version, which is re-read before every attempt because
//! any successful write (ours or another process's) invalidates it.

use crate::error::ProvisionResult;
use crate::manifest::{FailureDetail, OutcomeStatus, TargetOutcome};
use crate::record::EnrichedUser;
use crate::retry::RetryPolicy;
use futures::future::join_all;
use roster_client::models::AddGroupMembersRequest;
use roster_client::{AdminApi, ReferenceKind};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The users sharing one resolved group or role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentTarget {
    pub kind: ReferenceKind,
    pub id: String,
    pub name: String,
    pub member_ids: Vec<String>,
}

/// Group users by the target `key` picks out, keeping only known targets.
///
/// Members keep input order; targets are ordered by id.
pub fn partition<'a, F>(
    kind: ReferenceKind,
    users: &'a [EnrichedUser],
    known_ids: &BTreeSet<String>,
    key: F,
) -> Vec<AssignmentTarget>
where
    F: Fn(&'a EnrichedUser) -> (&'a str, &'a str),
{
    let mut targets: BTreeMap<&str, AssignmentTarget> = BTreeMap::new();
    for user in users {
        let (id, name) = key(user);
        if !known_ids.contains(id) {
            warn!(%kind, target_id = id, user_id = %user.id, "Target not in catalog cache, user skipped");
            continue;
        }
        targets
            .entry(id)
            .or_insert_with(|| AssignmentTarget {
                kind,
                id: id.to_string(),
                name: name.to_string(),
                member_ids: Vec::new(),
            })
            .member_ids
            .push(user.id.clone());
    }
    targets.into_values().collect()
}

/// Issues membership writes for groups and roles.
#[derive(Clone)]
pub struct MembershipAssigner {
    api: Arc<dyn AdminApi>,
    group_policy: RetryPolicy,
    role_policy: RetryPolicy,
}

impl MembershipAssigner {
    #[must_use]
    pub fn new(api: Arc<dyn AdminApi>, group_policy: RetryPolicy, role_policy: RetryPolicy) -> Self {
        Self {
            api,
            group_policy,
            role_policy,
        }
    }

    /// Add every user to their resolved group; one write per group.
    pub async fn assign_groups(
        &self,
        users: &[EnrichedUser],
        known_group_ids: &BTreeSet<String>,
    ) -> Vec<TargetOutcome> {
        let targets = partition(ReferenceKind::Group, users, known_group_ids, |u| {
            (u.group.id.as_str(), u.group.name.as_str())
        });
        info!(targets = targets.len(), users = users.len(), "Assigning users to groups");

        join_all(targets.into_iter().map(|target| async move {
            let result = self.add_group_members(&target).await;
            outcome(target, result)
        }))
        .await
    }

    /// Grant every user their resolved role; one write per role.
    pub async fn assign_roles(
        &self,
        users: &[EnrichedUser],
        known_role_ids: &BTreeSet<String>,
    ) -> Vec<TargetOutcome> {
        let targets = partition(ReferenceKind::Role, users, known_role_ids, |u| {
            (u.role.id.as_str(), u.role.name.as_str())
        });
        info!(targets = targets.len(), users = users.len(), "Assigning users to roles");

        join_all(targets.into_iter().map(|target| async move {
            let result = self.add_role_members(&target).await;
            outcome(target, result)
        }))
        .await
    }

    /// Version-tagged group write with re-read-and-retry on conflict.
    pub async fn add_group_members(&self, target: &AssignmentTarget) -> ProvisionResult<()> {
        let api = &self.api;
        self.group_policy
            .execute("add_group_members", || async move {
                let group = api.get_group(&target.id).await?;
                debug!(group_id = %target.id, version = group.version, "Writing group members");
                api.add_group_members(
                    &target.id,
                    &AddGroupMembersRequest {
                        member_ids: target.member_ids.clone(),
                        version: group.version,
                    },
                )
                .await?;
                Ok(())
            })
            .await
    }

    /// Role grant, retried on transient failures.
    pub async fn add_role_members(&self, target: &AssignmentTarget) -> ProvisionResult<()> {
        let api = &self.api;
        self.role_policy
            .execute("add_role_members", || async move {
                api.add_role_members(&target.id, &target.member_ids).await?;
                Ok(())
            })
            .await
    }
}

fn outcome(target: AssignmentTarget, result: ProvisionResult<()>) -> TargetOutcome {
    let (status, error) = match &result {
        Ok(()) => {
            info!(
                kind = %target.kind,
                target_id = %target.id,
                members = target.member_ids.len(),
                "Membership assigned"
            );
            (OutcomeStatus::Succeeded, None)
        }
        Err(error) => {
            warn!(
                kind = %target.kind,
                target_id = %target.id,
                members = ?target.member_ids,
                error = %error,
                "Membership assignment failed"
            );
            (OutcomeStatus::Failed, Some(FailureDetail::from(error)))
        }
    };

    TargetOutcome {
        kind: target.kind,
        target_id: target.id,
        target_name: target.name,
        member_ids: target.member_ids,
        status,
        error,
    }
}
