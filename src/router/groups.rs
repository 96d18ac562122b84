//! Group-ownership resolution endpoint.

use axum::extract::{Path, State};
use axum::{Extension, Json};

use crate::account::Account;
use crate::error::Result;
use crate::ownership::{self, OwnershipVerification};
use crate::{AppState, ServerError};

pub const VERIFICATION_REQUIRED: &str =
    "You must verify your Roblox account before managing a group.";

/// `POST /groups/{id}/ownership` resolves whether the calling account's
/// bound identity holds management authority over the group, and returns
/// the role ladder when it does.
pub async fn verify_ownership(
    State(state): State<AppState>,
    Path(group_id): Path<i64>,
    Extension(account): Extension<Account>,
) -> Result<Json<OwnershipVerification>> {
    let identity = account
        .bound_identity()
        .ok_or_else(|| ServerError::Denied(VERIFICATION_REQUIRED.to_owned()))?;

    let resolution =
        ownership::verify_group_ownership(&state.roblox, identity.user_id, group_id)
            .await?;

    Ok(Json(resolution))
}
