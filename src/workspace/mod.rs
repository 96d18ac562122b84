//! Workspaces and membership admission.
//!
//! A workspace is an internal administration surface bound to one Roblox
//! group. Joining is gated behind group membership and, when the owner
//! configured one, a discrete allow-list of role ids.

mod repository;

pub use repository::*;

use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};

use crate::roblox::GroupMembership;

const WORKSPACE_ID_LENGTH: usize = 12;
const INVITE_CODE_LENGTH: usize = 8;

/// Workspace as saved on database.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    pub id: String,
    pub name: String,
    pub group_id: i64,
    pub owner_id: String,
    /// Role ids allowed to join; empty means any group member may.
    pub allowed_ranks: Vec<i64>,
    pub invite_code: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

pub fn generate_workspace_id() -> String {
    random_lowercase(WORKSPACE_ID_LENGTH)
}

pub fn generate_invite_code() -> String {
    random_lowercase(INVITE_CODE_LENGTH)
}

fn random_lowercase(length: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(|byte| (byte as char).to_ascii_lowercase())
        .collect()
}

/// Outcome of the admission gate for a non-owner joiner.
#[derive(Clone, Debug, PartialEq)]
pub enum AdmissionDecision {
    Admit,
    NotGroupMember,
    InsufficientRank,
}

impl AdmissionDecision {
    pub fn message(&self) -> &'static str {
        match self {
            AdmissionDecision::Admit => "Welcome to the workspace.",
            AdmissionDecision::NotGroupMember => {
                "You must be a member of the group to join this workspace"
            },
            AdmissionDecision::InsufficientRank => {
                "You don't have the required rank"
            },
        }
    }
}

/// Gate a joiner's fetched memberships against the workspace's group and
/// allow-list.
///
/// The allow-list is a discrete set of role ids, not a rank cutoff: a
/// joiner whose role id is absent is rejected even when their numeric
/// rank is higher than every listed role.
pub fn admission_decision(
    memberships: &[GroupMembership],
    group_id: i64,
    allowed_ranks: &[i64],
) -> AdmissionDecision {
    let Some(membership) = memberships
        .iter()
        .find(|membership| membership.group_id == group_id)
    else {
        return AdmissionDecision::NotGroupMember;
    };

    if !allowed_ranks.is_empty() && !allowed_ranks.contains(&membership.role_id) {
        return AdmissionDecision::InsufficientRank;
    }

    AdmissionDecision::Admit
}

#[cfg(test)]
mod tests {
    use super::*;

    fn membership(group_id: i64, role_id: i64, rank: i64) -> GroupMembership {
        GroupMembership {
            group_id,
            group_name: "Pirates".to_owned(),
            role_id,
            role: "Crew".to_owned(),
            rank,
            icon: None,
        }
    }

    #[test]
    fn test_non_member_is_rejected() {
        let decision = admission_decision(&[membership(777, 10, 50)], 555, &[]);
        assert_eq!(decision, AdmissionDecision::NotGroupMember);
    }

    #[test]
    fn test_empty_allow_list_admits_any_member() {
        let decision = admission_decision(&[membership(555, 10, 1)], 555, &[]);
        assert_eq!(decision, AdmissionDecision::Admit);
    }

    #[test]
    fn test_allow_list_is_role_id_set_membership() {
        // group member with role id 15, allow-list [10, 20]: rejected
        // even though they are a member.
        let decision =
            admission_decision(&[membership(555, 15, 250)], 555, &[10, 20]);
        assert_eq!(decision, AdmissionDecision::InsufficientRank);
        assert_eq!(decision.message(), "You don't have the required rank");

        let decision =
            admission_decision(&[membership(555, 20, 5)], 555, &[10, 20]);
        assert_eq!(decision, AdmissionDecision::Admit);
    }

    #[test]
    fn test_invite_and_id_generation_shape() {
        let id = generate_workspace_id();
        let invite = generate_invite_code();
        assert_eq!(id.len(), 12);
        assert_eq!(invite.len(), 8);
        assert!(invite.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }
}
