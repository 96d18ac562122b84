//! Read-only proxies over the upstream platform API.
//!
//! List endpoints degrade to empty result sets when the upstream is
//! down, so the dashboard stays usable during outages; single-entity
//! lookups surface the tagged upstream failure instead.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::account::Account;
use crate::error::Result;
use crate::roblox::{ExternalIdentity, GroupInfo, GroupMembership, GroupRole, UserProfile};
use crate::router::Valid;
use crate::{AppState, ServerError};

const DEFAULT_PAGE_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct UsernameQuery {
    username: String,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    page: Option<usize>,
    limit: Option<usize>,
}

/// `GET /roblox/users?username=` resolves a username to an identity.
pub async fn resolve_user(
    State(state): State<AppState>,
    Query(query): Query<UsernameQuery>,
) -> Result<Json<ExternalIdentity>> {
    match state.roblox.resolve_user_id(&query.username).await? {
        Some(identity) => Ok(Json(identity)),
        None => Err(ServerError::NotFound(
            "No Roblox account matches this username.".to_owned(),
        )),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetails {
    #[serde(flatten)]
    profile: UserProfile,
    avatar: Option<String>,
    friends: Option<i64>,
}

/// `GET /roblox/users/{id}` returns the profile with a best-effort
/// avatar and friends count.
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<UserDetails>> {
    let profile = state
        .roblox
        .fetch_user(user_id)
        .await?
        .ok_or_else(|| ServerError::NotFound("User not found.".to_owned()))?;

    let avatar = match state.roblox.fetch_avatar_headshots(&[user_id]).await {
        Ok(mut batch) => batch.remove(&user_id).flatten(),
        Err(err) => {
            tracing::warn!(user_id, error = %err, "avatar fetch failed");
            None
        },
    };

    let friends = match state.roblox.fetch_friends_count(user_id).await {
        Ok(count) => count,
        Err(err) => {
            tracing::warn!(user_id, error = %err, "friends count fetch failed");
            None
        },
    };

    Ok(Json(UserDetails {
        profile,
        avatar,
        friends,
    }))
}

/// `GET /roblox/users/{id}/groups` lists groups-with-roles, paginated.
pub async fn get_user_groups(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(pagination): Query<Pagination>,
) -> Json<Vec<GroupMembership>> {
    let memberships = match state.roblox.fetch_user_groups(user_id).await {
        Ok(memberships) => memberships,
        Err(err) => {
            tracing::warn!(user_id, error = %err, "groups listing degraded to empty");
            Vec::new()
        },
    };

    Json(paginate(memberships, pagination))
}

/// `GET /roblox/groups/{id}` looks a group up.
pub async fn get_group(
    State(state): State<AppState>,
    Path(group_id): Path<i64>,
) -> Result<Json<GroupInfo>> {
    match state.roblox.fetch_group(group_id).await? {
        Some(group) => Ok(Json(group)),
        None => Err(ServerError::NotFound("Group not found.".to_owned())),
    }
}

/// `GET /roblox/groups/{id}/roles` returns the role ladder.
pub async fn get_group_roles(
    State(state): State<AppState>,
    Path(group_id): Path<i64>,
) -> Json<Vec<GroupRole>> {
    let ladder = match state.roblox.fetch_group_roles(group_id).await {
        Ok(ladder) => ladder,
        Err(err) => {
            tracing::warn!(group_id, error = %err, "role ladder degraded to empty");
            Vec::new()
        },
    };

    Json(ladder)
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ShoutBody {
    #[validate(length(
        max = 255,
        message = "Shout must be at most 255 characters long."
    ))]
    pub message: String,
    /// Upstream session credential, supplied by the caller and never
    /// stored.
    #[validate(length(min = 1, message = "Session credential is required."))]
    pub roblosecurity: String,
}

/// `POST /roblox/groups/{id}/shout` updates the group shout.
pub async fn update_shout(
    State(state): State<AppState>,
    Path(group_id): Path<i64>,
    Extension(account): Extension<Account>,
    Valid(body): Valid<ShoutBody>,
) -> Result<StatusCode> {
    state
        .roblox
        .update_group_shout(group_id, &body.message, &body.roblosecurity)
        .await?;

    tracing::info!(account_id = account.id, group_id, "group shout updated");

    Ok(StatusCode::NO_CONTENT)
}

fn paginate<T>(items: Vec<T>, pagination: Pagination) -> Vec<T> {
    let limit = pagination.limit.unwrap_or(DEFAULT_PAGE_LIMIT).max(1);
    let page = pagination.page.unwrap_or(1).max(1);

    // page and limit come straight from the query string; an offset past
    // usize::MAX is an empty page, not a panic.
    let Some(skip) = page.checked_sub(1).and_then(|page| page.checked_mul(limit))
    else {
        return Vec::new();
    };

    items.into_iter().skip(skip).take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate_defaults_to_first_page() {
        let items: Vec<i64> = (0..120).collect();
        let page = paginate(
            items,
            Pagination {
                page: None,
                limit: None,
            },
        );
        assert_eq!(page.len(), DEFAULT_PAGE_LIMIT);
        assert_eq!(page[0], 0);
    }

    #[test]
    fn test_paginate_overflowing_page_is_empty() {
        let items: Vec<i64> = (0..25).collect();
        let page = paginate(
            items,
            Pagination {
                page: Some(usize::MAX),
                limit: Some(50),
            },
        );
        assert!(page.is_empty());
    }

    #[test]
    fn test_paginate_second_page() {
        let items: Vec<i64> = (0..25).collect();
        let page = paginate(
            items,
            Pagination {
                page: Some(2),
                limit: Some(10),
            },
        );
        assert_eq!(page, (10..20).collect::<Vec<i64>>());
    }
}
