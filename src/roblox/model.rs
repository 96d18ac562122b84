//! Normalized shapes for the upstream platform API.
//!
//! Upstream payloads are inconsistent between endpoints; everything is
//! flattened here at the gateway boundary so no other module ever sees a
//! raw upstream document.

use serde::{Deserialize, Serialize};

/// A resolved external account. Immutable once resolved.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalIdentity {
    pub user_id: i64,
    pub username: String,
}

/// Public profile of an external account.
///
/// `description` is the free-text bio used as the verification channel.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub name: String,
    pub display_name: String,
    pub description: String,
}

/// One entry of a user's groups-with-roles listing.
///
/// `icon` is `None` both when the group has no icon and when the
/// best-effort thumbnail fetch failed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupMembership {
    pub group_id: i64,
    pub group_name: String,
    pub role_id: i64,
    pub role: String,
    pub rank: i64,
    pub icon: Option<String>,
}

/// One rung of a group's role ladder. Rank is 0-255, 255 highest.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupRole {
    pub id: i64,
    pub name: String,
    pub rank: i64,
}

/// A group looked up by id.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupInfo {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub member_count: i64,
    pub owner: Option<ExternalIdentity>,
}
