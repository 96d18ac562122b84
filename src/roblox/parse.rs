//! Pure normalizers from upstream JSON to [`crate::roblox::model`] shapes.
//!
//! Split from the HTTP client so shape handling stays testable without a
//! network. Every function tolerates missing or oddly-typed fields and
//! returns `None`/empty instead of panicking; the client decides whether
//! an empty result is worth a warning.

use std::collections::HashMap;

use serde_json::Value;

use super::model::{
    ExternalIdentity, GroupInfo, GroupMembership, GroupRole, UserProfile,
};

fn as_i64(value: &Value) -> Option<i64> {
    value.as_i64().or_else(|| value.as_str()?.parse().ok())
}

fn as_string(value: &Value) -> String {
    value.as_str().unwrap_or_default().to_owned()
}

/// First candidate of a `POST /v1/usernames/users` exact-match response.
pub fn exact_username_match(body: &Value) -> Option<ExternalIdentity> {
    let entry = body.get("data")?.as_array()?.first()?;

    Some(ExternalIdentity {
        user_id: as_i64(entry.get("id")?)?,
        username: as_string(entry.get("name").unwrap_or(&Value::Null)),
    })
}

/// Candidates of a `GET /v1/users/search` keyword response.
///
/// A case-insensitive exact match wins over the first hit, so searching
/// "builderman" never silently resolves "builderman2".
pub fn search_match(body: &Value, wanted: &str) -> Option<ExternalIdentity> {
    let candidates = body.get("data")?.as_array()?;

    let to_identity = |entry: &Value| {
        Some(ExternalIdentity {
            user_id: as_i64(entry.get("id")?)?,
            username: as_string(entry.get("name")?),
        })
    };

    candidates
        .iter()
        .find(|entry| {
            entry
                .get("name")
                .and_then(Value::as_str)
                .is_some_and(|name| name.eq_ignore_ascii_case(wanted))
        })
        .and_then(to_identity)
        .or_else(|| candidates.first().and_then(to_identity))
}

/// Profile of a `GET /v1/users/{id}` response.
pub fn user_profile(body: &Value) -> Option<UserProfile> {
    Some(UserProfile {
        id: as_i64(body.get("id")?)?,
        name: as_string(body.get("name").unwrap_or(&Value::Null)),
        display_name: as_string(body.get("displayName").unwrap_or(&Value::Null)),
        description: as_string(body.get("description").unwrap_or(&Value::Null)),
    })
}

/// Entries of a `GET /v2/users/{id}/groups/roles` response.
///
/// Entries with an unusable group or role block are dropped rather than
/// failing the whole listing.
pub fn group_memberships(body: &Value) -> Vec<GroupMembership> {
    let Some(data) = body.get("data").and_then(Value::as_array) else {
        return Vec::new();
    };

    data.iter()
        .filter_map(|entry| {
            let group = entry.get("group")?;
            let role = entry.get("role")?;

            Some(GroupMembership {
                group_id: as_i64(group.get("id")?)?,
                group_name: as_string(group.get("name").unwrap_or(&Value::Null)),
                role_id: as_i64(role.get("id")?)?,
                role: as_string(role.get("name").unwrap_or(&Value::Null)),
                rank: as_i64(role.get("rank")?)?,
                icon: None,
            })
        })
        .collect()
}

/// Role ladder of a `GET /v1/groups/{id}/roles` response.
///
/// `None` marks a shape the upstream is not supposed to send at all, so
/// the caller can log the anomaly before degrading to an empty ladder.
pub fn group_roles(body: &Value) -> Option<Vec<GroupRole>> {
    let roles = body.get("roles")?.as_array()?;

    Some(
        roles
            .iter()
            .filter_map(|entry| {
                Some(GroupRole {
                    id: as_i64(entry.get("id")?)?,
                    name: as_string(entry.get("name").unwrap_or(&Value::Null)),
                    rank: as_i64(entry.get("rank")?)?,
                })
            })
            .collect(),
    )
}

/// Group of a `GET /v1/groups/{id}` response.
pub fn group_info(body: &Value) -> Option<GroupInfo> {
    Some(GroupInfo {
        id: as_i64(body.get("id")?)?,
        name: as_string(body.get("name").unwrap_or(&Value::Null)),
        description: as_string(body.get("description").unwrap_or(&Value::Null)),
        member_count: body
            .get("memberCount")
            .and_then(as_i64)
            .unwrap_or_default(),
        owner: body.get("owner").and_then(|owner| {
            Some(ExternalIdentity {
                user_id: as_i64(owner.get("userId").or(owner.get("id"))?)?,
                username: as_string(owner.get("username").or(owner.get("name"))?),
            })
        }),
    })
}

/// Thumbnail batch responses (`/v1/groups/icons`, `/v1/users/avatar-headshot`).
///
/// Only entries in `Completed` state carry a usable URL; everything else
/// maps to `None` so callers can tell "no icon" apart from a URL.
pub fn thumbnail_batch(body: &Value) -> HashMap<i64, Option<String>> {
    let Some(data) = body.get("data").and_then(Value::as_array) else {
        return HashMap::new();
    };

    data.iter()
        .filter_map(|entry| {
            let target = as_i64(entry.get("targetId")?)?;
            let url = match entry.get("state").and_then(Value::as_str) {
                Some("Completed") => entry
                    .get("imageUrl")
                    .and_then(Value::as_str)
                    .map(str::to_owned),
                _ => None,
            };
            Some((target, url))
        })
        .collect()
}

/// Count of a `GET /v1/users/{id}/friends/count` response.
pub fn friends_count(body: &Value) -> Option<i64> {
    body.get("count").and_then(as_i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_exact_match_takes_first_entry() {
        let body = json!({
            "data": [
                { "requestedUsername": "Builderman", "id": 156, "name": "builderman" },
            ]
        });

        let identity = exact_username_match(&body).unwrap();
        assert_eq!(identity.user_id, 156);
        assert_eq!(identity.username, "builderman");
    }

    #[test]
    fn test_exact_match_empty_data_is_none() {
        assert_eq!(exact_username_match(&json!({ "data": [] })), None);
        assert_eq!(exact_username_match(&json!({})), None);
    }

    #[test]
    fn test_search_prefers_case_insensitive_exact_match() {
        let body = json!({
            "data": [
                { "id": 1, "name": "builderman2" },
                { "id": 2, "name": "BuilderMan" },
            ]
        });

        let identity = search_match(&body, "builderman").unwrap();
        assert_eq!(identity.user_id, 2);
    }

    #[test]
    fn test_search_falls_back_to_first_candidate() {
        let body = json!({
            "data": [
                { "id": 7, "name": "close_enough" },
            ]
        });

        let identity = search_match(&body, "builderman").unwrap();
        assert_eq!(identity.user_id, 7);
    }

    #[test]
    fn test_search_no_candidates_is_none() {
        assert_eq!(search_match(&json!({ "data": [] }), "anyone"), None);
    }

    #[test]
    fn test_memberships_drop_unusable_entries() {
        let body = json!({
            "data": [
                {
                    "group": { "id": 555, "name": "Pirates" },
                    "role": { "id": 42, "name": "Captain", "rank": 200 },
                },
                { "group": { "name": "missing id" }, "role": {} },
            ]
        });

        let memberships = group_memberships(&body);
        assert_eq!(memberships.len(), 1);
        assert_eq!(memberships[0].group_id, 555);
        assert_eq!(memberships[0].rank, 200);
        assert_eq!(memberships[0].icon, None);
    }

    #[test]
    fn test_roles_parse_is_idempotent() {
        let body = json!({
            "groupId": 555,
            "roles": [
                { "id": 1, "name": "Guest", "rank": 0 },
                { "id": 2, "name": "Member", "rank": 50 },
                { "id": 3, "name": "Admin", "rank": 200 },
            ]
        });

        let first = group_roles(&body).unwrap();
        let second = group_roles(&body).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 3);
        assert_eq!(first[2].rank, 200);
    }

    #[test]
    fn test_roles_malformed_shape_is_none() {
        assert_eq!(group_roles(&json!({ "roles": "oops" })), None);
        assert_eq!(group_roles(&json!({ "unexpected": true })), None);
    }

    #[test]
    fn test_thumbnails_only_completed_entries_carry_url() {
        let body = json!({
            "data": [
                { "targetId": 555, "state": "Completed", "imageUrl": "https://cdn/icon.png" },
                { "targetId": 556, "state": "Blocked", "imageUrl": "https://cdn/never.png" },
                { "targetId": 557, "state": "Pending" },
            ]
        });

        let batch = thumbnail_batch(&body);
        assert_eq!(batch[&555], Some("https://cdn/icon.png".to_owned()));
        assert_eq!(batch[&556], None);
        assert_eq!(batch[&557], None);
    }

    #[test]
    fn test_friends_count() {
        assert_eq!(friends_count(&json!({ "count": 12 })), Some(12));
        assert_eq!(friends_count(&json!({})), None);
    }
}
