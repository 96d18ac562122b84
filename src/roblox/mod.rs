//! External platform gateway.
//!
//! Stateless request/response adapters over the Roblox REST APIs. All
//! operations are read-only proxies except [`RobloxClient::update_group_shout`],
//! which performs the upstream authenticate-then-mutate sequence. Failures
//! are never retried here; callers decide.

mod model;
mod parse;

pub use model::*;

use std::collections::HashMap;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use serde_json::{Value, json};
use thiserror::Error;

use crate::config;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const CSRF_HEADER: &str = "x-csrf-token";
const GROUP_ICON_SIZE: &str = "150x150";
const HEADSHOT_SIZE: &str = "48x48";

/// Errors crossing the gateway boundary.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Upstream answered with a non-2xx status; code and body are carried
    /// verbatim.
    #[error("upstream returned status {status}: {body}")]
    Upstream { status: u16, body: String },
}

pub type GatewayResult<T> = std::result::Result<T, GatewayError>;

/// HTTP client over the upstream platform APIs.
#[derive(Clone)]
pub struct RobloxClient {
    http: reqwest::Client,
    endpoints: config::Roblox,
}

impl RobloxClient {
    pub fn new(endpoints: config::Roblox) -> GatewayResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self { http, endpoints })
    }

    /// Send a request and decode the JSON body, converting any non-2xx
    /// answer into [`GatewayError::Upstream`].
    async fn json(&self, request: reqwest::RequestBuilder) -> GatewayResult<Value> {
        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            return Err(GatewayError::Upstream {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        Ok(response.json().await?)
    }

    /// Resolve a username to an external identity.
    ///
    /// Tries the exact-match endpoint first, then falls back to keyword
    /// search. `Ok(None)` means no candidate exists anywhere.
    pub async fn resolve_user_id(
        &self,
        username: &str,
    ) -> GatewayResult<Option<ExternalIdentity>> {
        let body = self
            .json(
                self.http
                    .post(format!("{}/v1/usernames/users", self.endpoints.users_api))
                    .json(&json!({
                        "usernames": [username],
                        "excludeBannedUsers": true,
                    })),
            )
            .await?;

        if let Some(identity) = parse::exact_username_match(&body) {
            return Ok(Some(identity));
        }

        let body = self
            .json(
                self.http
                    .get(format!("{}/v1/users/search", self.endpoints.users_api))
                    .query(&[("keyword", username), ("limit", "10")]),
            )
            .await?;

        Ok(parse::search_match(&body, username))
    }

    /// Fetch the public profile, including the bio used as the
    /// verification channel. `Ok(None)` when the user does not exist.
    pub async fn fetch_user(&self, user_id: i64) -> GatewayResult<Option<UserProfile>> {
        let body = match self
            .json(
                self.http
                    .get(format!("{}/v1/users/{user_id}", self.endpoints.users_api)),
            )
            .await
        {
            Ok(body) => body,
            Err(GatewayError::Upstream { status, .. })
                if status == StatusCode::NOT_FOUND.as_u16() =>
            {
                return Ok(None);
            },
            Err(err) => return Err(err),
        };

        Ok(parse::user_profile(&body))
    }

    /// All groups-with-roles for a user, with a best-effort icon for each.
    ///
    /// Icon failure never fails the listing; affected entries keep
    /// `icon: None`.
    pub async fn fetch_user_groups(
        &self,
        user_id: i64,
    ) -> GatewayResult<Vec<GroupMembership>> {
        let body = self
            .json(self.http.get(format!(
                "{}/v2/users/{user_id}/groups/roles",
                self.endpoints.groups_api,
            )))
            .await?;

        let mut memberships = parse::group_memberships(&body);
        if memberships.is_empty() {
            if body.get("data").is_none() {
                tracing::warn!(user_id, "unexpected shape on groups-with-roles listing");
            }
            return Ok(memberships);
        }

        let group_ids: Vec<String> = memberships
            .iter()
            .map(|membership| membership.group_id.to_string())
            .collect();

        match self
            .json(self.http.get(format!(
                "{}/v1/groups/icons?groupIds={}&size={}&format=Png",
                self.endpoints.thumbnails_api,
                group_ids.join(","),
                GROUP_ICON_SIZE,
            )))
            .await
        {
            Ok(body) => {
                let icons = parse::thumbnail_batch(&body);
                for membership in &mut memberships {
                    membership.icon =
                        icons.get(&membership.group_id).cloned().flatten();
                }
            },
            Err(err) => {
                tracing::warn!(user_id, error = %err, "group icon fetch failed");
            },
        }

        Ok(memberships)
    }

    /// Group lookup by id. `Ok(None)` when the group does not exist.
    pub async fn fetch_group(&self, group_id: i64) -> GatewayResult<Option<GroupInfo>> {
        let body = match self
            .json(
                self.http
                    .get(format!("{}/v1/groups/{group_id}", self.endpoints.groups_api)),
            )
            .await
        {
            Ok(body) => body,
            Err(GatewayError::Upstream { status, .. })
                if status == StatusCode::NOT_FOUND.as_u16()
                    || status == StatusCode::BAD_REQUEST.as_u16() =>
            {
                return Ok(None);
            },
            Err(err) => return Err(err),
        };

        Ok(parse::group_info(&body))
    }

    /// Full role ladder of a group.
    ///
    /// An unexpected upstream shape degrades to an empty ladder after a
    /// logged warning, it is not an error.
    pub async fn fetch_group_roles(&self, group_id: i64) -> GatewayResult<Vec<GroupRole>> {
        let body = self
            .json(self.http.get(format!(
                "{}/v1/groups/{group_id}/roles",
                self.endpoints.groups_api,
            )))
            .await?;

        match parse::group_roles(&body) {
            Some(roles) => Ok(roles),
            None => {
                tracing::warn!(group_id, "unexpected shape on role ladder, degrading to empty");
                Ok(Vec::new())
            },
        }
    }

    /// Batch avatar headshots. Missing or failed thumbnails map to `None`.
    pub async fn fetch_avatar_headshots(
        &self,
        user_ids: &[i64],
    ) -> GatewayResult<HashMap<i64, Option<String>>> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let ids: Vec<String> = user_ids.iter().map(i64::to_string).collect();
        let body = self
            .json(self.http.get(format!(
                "{}/v1/users/avatar-headshot?userIds={}&size={}&format=Png",
                self.endpoints.thumbnails_api,
                ids.join(","),
                HEADSHOT_SIZE,
            )))
            .await?;

        Ok(parse::thumbnail_batch(&body))
    }

    /// Friends count of a user. `Ok(None)` when the user does not exist.
    pub async fn fetch_friends_count(&self, user_id: i64) -> GatewayResult<Option<i64>> {
        let body = match self
            .json(self.http.get(format!(
                "{}/v1/users/{user_id}/friends/count",
                self.endpoints.friends_api,
            )))
            .await
        {
            Ok(body) => body,
            Err(GatewayError::Upstream { status, .. })
                if status == StatusCode::NOT_FOUND.as_u16() =>
            {
                return Ok(None);
            },
            Err(err) => return Err(err),
        };

        Ok(parse::friends_count(&body))
    }

    /// Update a group's shout on behalf of the caller.
    ///
    /// Two-step upstream sequence: harvest a short-lived CSRF token with
    /// the caller-supplied session cookie, then submit the mutation with
    /// the token attached. Failure at either step surfaces the upstream
    /// status and body verbatim.
    pub async fn update_group_shout(
        &self,
        group_id: i64,
        message: &str,
        roblosecurity: &str,
    ) -> GatewayResult<()> {
        let cookie = session_cookie(roblosecurity)?;

        // The logout endpoint rejects a token-less request with 403 and
        // hands the token back in a response header.
        let challenge = self
            .http
            .post(format!("{}/v2/logout", self.endpoints.auth_api))
            .headers(cookie.clone())
            .send()
            .await?;

        let Some(token) = challenge
            .headers()
            .get(CSRF_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned)
        else {
            return Err(GatewayError::Upstream {
                status: challenge.status().as_u16(),
                body: challenge.text().await.unwrap_or_default(),
            });
        };

        let response = self
            .http
            .patch(format!(
                "{}/v1/groups/{group_id}/status",
                self.endpoints.groups_api,
            ))
            .headers(cookie)
            .header(CSRF_HEADER, token)
            .json(&json!({ "message": message }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Upstream {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        Ok(())
    }
}

fn session_cookie(roblosecurity: &str) -> GatewayResult<HeaderMap> {
    let mut headers = HeaderMap::new();
    let value = HeaderValue::from_str(&format!(".ROBLOSECURITY={roblosecurity}"))
        .map_err(|_| GatewayError::Upstream {
            status: 400,
            body: "session credential is not a valid header value".to_owned(),
        })?;
    headers.insert(COOKIE, value);
    Ok(headers)
}
