//! Bio-verification HTTP endpoints.

use axum::extract::State;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::account::{Account, AccountRepository};
use crate::error::Result;
use crate::roblox::ExternalIdentity;
use crate::router::Valid;
use crate::verification::{self, VerificationOutcome};
use crate::AppState;

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ChallengeBody {
    #[validate(length(
        min = 3,
        max = 20,
        message = "Roblox usernames are 3 to 20 characters long."
    ))]
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Challenge {
    pub code: String,
    pub username: String,
    pub instructions: String,
}

/// `POST /verify` issues a challenge code for a claimed username.
///
/// Nothing is persisted; the client keeps the code and sends it back on
/// confirmation.
pub async fn challenge(
    Extension(account): Extension<Account>,
    Valid(body): Valid<ChallengeBody>,
) -> Json<Challenge> {
    let code = verification::generate_code();

    tracing::debug!(account_id = account.id, username = body.username, "challenge issued");

    Json(Challenge {
        instructions: format!(
            "Paste {code} into the bio of the Roblox account \"{}\", then confirm.",
            body.username,
        ),
        code,
        username: body.username,
    })
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct ConfirmBody {
    #[validate(length(
        min = 3,
        max = 20,
        message = "Roblox usernames are 3 to 20 characters long."
    ))]
    pub username: String,
    #[validate(length(min = 1, message = "Verification code is required."))]
    pub code: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmResponse {
    pub verified: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<ExternalIdentity>,
}

/// `POST /verify/confirm` re-reads the bio and settles the attempt.
///
/// Policy denials answer 200 with `verified: false` and a cause-specific
/// message; only upstream or storage failures become error statuses.
pub async fn confirm(
    State(state): State<AppState>,
    Extension(account): Extension<Account>,
    Valid(body): Valid<ConfirmBody>,
) -> Result<Json<ConfirmResponse>> {
    let accounts = AccountRepository::new(state.db.postgres.clone());

    let outcome = verification::confirm(
        &state.roblox,
        &accounts,
        &account.id,
        &body.username,
        &body.code,
    )
    .await?;

    Ok(Json(ConfirmResponse {
        verified: outcome.verified(),
        message: outcome.message().to_owned(),
        identity: match outcome {
            VerificationOutcome::Verified { identity } => Some(identity),
            _ => None,
        },
    }))
}
