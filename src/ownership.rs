//! Group-ownership and rank resolution.
//!
//! Decides whether a verified identity holds management authority over a
//! group, and hands back the full role ladder for the permission
//! checklist that follows.

use serde::Serialize;

use crate::roblox::{GatewayError, GroupMembership, GroupRole, RobloxClient};

/// Policy constant, not user-configurable. Ranks at or above it are
/// management tier.
pub const MANAGEMENT_RANK_THRESHOLD: i64 = 100;

const NOT_A_MEMBER: &str = "User is not a member of this group";
const INSUFFICIENT_RANK: &str =
    "User does not hold a management rank in this group";
const MANAGEMENT_CONFIRMED: &str = "Group ownership verified";

/// Derived resolution result; recomputed on demand, never persisted.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnershipVerification {
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<i64>,
    /// Full role ladder, only populated when ownership is verified.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ranks: Vec<GroupRole>,
    pub message: String,
}

/// Pure resolution over an already-fetched membership list.
///
/// "Not a member" and "member but insufficient rank" are distinct
/// results; the ladder is attached later by the caller.
pub fn resolve_ownership(
    memberships: &[GroupMembership],
    group_id: i64,
) -> OwnershipVerification {
    let Some(membership) = memberships
        .iter()
        .find(|membership| membership.group_id == group_id)
    else {
        return OwnershipVerification {
            verified: false,
            message: NOT_A_MEMBER.to_owned(),
            ..OwnershipVerification::default()
        };
    };

    let verified = membership.rank >= MANAGEMENT_RANK_THRESHOLD;

    OwnershipVerification {
        verified,
        role: Some(membership.role.clone()),
        rank: Some(membership.rank),
        ranks: Vec::new(),
        message: if verified {
            MANAGEMENT_CONFIRMED.to_owned()
        } else {
            INSUFFICIENT_RANK.to_owned()
        },
    }
}

/// Resolve ownership of `group_id` for a verified external identity.
///
/// An upstream failure on the membership fetch aborts the whole
/// resolution. The ladder fetch is best-effort: once ownership already
/// succeeded, a ladder failure degrades to an empty ladder instead of
/// revoking the result.
pub async fn verify_group_ownership(
    gateway: &RobloxClient,
    user_id: i64,
    group_id: i64,
) -> Result<OwnershipVerification, GatewayError> {
    let memberships = gateway.fetch_user_groups(user_id).await?;
    let mut resolution = resolve_ownership(&memberships, group_id);

    if resolution.verified {
        match gateway.fetch_group_roles(group_id).await {
            Ok(ladder) => resolution.ranks = ladder,
            Err(err) => {
                tracing::warn!(
                    group_id,
                    error = %err,
                    "role ladder fetch failed after ownership success"
                );
            },
        }
    }

    Ok(resolution)
}

#[cfg(test)]
mod tests {
    use axum::Json;
    use axum::http::StatusCode;
    use axum::routing::get;
    use serde_json::json;

    use super::*;
    use crate::config;

    /// Serve a stand-in upstream on a random local port and hand back an
    /// endpoint block pointing every API at it.
    async fn serve(app: axum::Router) -> config::Roblox {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        config::Roblox {
            users_api: base.clone(),
            groups_api: base.clone(),
            thumbnails_api: base.clone(),
            friends_api: base.clone(),
            auth_api: base,
        }
    }

    /// Upstream where user 333 is Admin (rank 200) of group 555; the
    /// ladder endpoint either answers or breaks.
    fn upstream(ladder_ok: bool) -> axum::Router {
        axum::Router::new()
            .route(
                "/v2/users/{user_id}/groups/roles",
                get(|| async {
                    Json(json!({
                        "data": [{
                            "group": { "id": 555, "name": "Pirates" },
                            "role": { "id": 42, "name": "Admin", "rank": 200 },
                        }]
                    }))
                }),
            )
            .route(
                "/v1/groups/icons",
                get(|| async {
                    Json(json!({
                        "data": [{
                            "targetId": 555,
                            "state": "Completed",
                            "imageUrl": "https://cdn/icon.png",
                        }]
                    }))
                }),
            )
            .route(
                "/v1/groups/{group_id}/roles",
                get(move || async move {
                    if ladder_ok {
                        (
                            StatusCode::OK,
                            Json(json!({
                                "groupId": 555,
                                "roles": [
                                    { "id": 1, "name": "Guest", "rank": 0 },
                                    { "id": 21, "name": "Member", "rank": 50 },
                                    { "id": 42, "name": "Admin", "rank": 200 },
                                ]
                            })),
                        )
                    } else {
                        (
                            StatusCode::INTERNAL_SERVER_ERROR,
                            Json(json!({
                                "errors": [{ "message": "InternalServerError" }]
                            })),
                        )
                    }
                }),
            )
    }

    #[tokio::test]
    async fn test_full_ladder_attached_on_management_success() {
        let gateway = RobloxClient::new(serve(upstream(true)).await).unwrap();

        let resolution = verify_group_ownership(&gateway, 333, 555).await.unwrap();
        assert!(resolution.verified);
        assert_eq!(resolution.role.as_deref(), Some("Admin"));
        assert_eq!(resolution.rank, Some(200));
        assert_eq!(resolution.ranks.len(), 3);
        assert_eq!(resolution.ranks[2].rank, 200);
    }

    #[tokio::test]
    async fn test_ladder_failure_keeps_granted_ownership() {
        let gateway = RobloxClient::new(serve(upstream(false)).await).unwrap();

        let resolution = verify_group_ownership(&gateway, 333, 555).await.unwrap();
        assert!(resolution.verified);
        assert_eq!(resolution.rank, Some(200));
        assert!(resolution.ranks.is_empty());
    }

    fn membership(group_id: i64, role: &str, rank: i64) -> GroupMembership {
        GroupMembership {
            group_id,
            group_name: format!("group {group_id}"),
            role_id: rank * 10,
            role: role.to_owned(),
            rank,
            icon: None,
        }
    }

    #[test]
    fn test_absent_group_is_not_a_member() {
        let memberships = [membership(777, "Captain", 255)];

        let resolution = resolve_ownership(&memberships, 555);
        assert!(!resolution.verified);
        assert_eq!(resolution.role, None);
        assert_eq!(resolution.message, NOT_A_MEMBER);
    }

    #[test]
    fn test_rank_threshold_boundary() {
        let below = resolve_ownership(&[membership(555, "Officer", 99)], 555);
        assert!(!below.verified);
        assert_eq!(below.rank, Some(99));
        assert_eq!(below.message, INSUFFICIENT_RANK);

        let at = resolve_ownership(&[membership(555, "Officer", 100)], 555);
        assert!(at.verified);
        assert_eq!(at.rank, Some(100));
    }

    #[test]
    fn test_low_rank_member_keeps_role_details() {
        let resolution = resolve_ownership(&[membership(555, "Member", 50)], 555);
        assert!(!resolution.verified);
        assert_eq!(resolution.role.as_deref(), Some("Member"));
        assert_eq!(resolution.rank, Some(50));
    }

    #[test]
    fn test_management_rank_verifies() {
        let memberships = [
            membership(111, "Guest", 1),
            membership(555, "Admin", 200),
        ];

        let resolution = resolve_ownership(&memberships, 555);
        assert!(resolution.verified);
        assert_eq!(resolution.role.as_deref(), Some("Admin"));
        assert_eq!(resolution.rank, Some(200));
        // ladder comes from a separate fetch afterwards.
        assert!(resolution.ranks.is_empty());
    }
}
