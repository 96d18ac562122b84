//! Account creation and self lookup.

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::account::{Account, AccountRepository, generate_session_token};
use crate::error::Result;
use crate::router::Valid;
use crate::AppState;

pub const TOKEN_TYPE: &str = "Bearer";

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct Body {
    #[validate(
        length(min = 2, max = 15),
        custom(
            function = "crate::router::validate_id",
            message = "Id must be alphanumeric."
        )
    )]
    pub id: String,
    #[validate(length(
        min = 2,
        max = 50,
        message = "Name must be 2 to 50 characters long."
    ))]
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    pub token_type: String,
    pub token: String,
    pub account: Account,
}

/// Handler to create an account and its first session.
pub async fn create(
    State(state): State<AppState>,
    Valid(body): Valid<Body>,
) -> Result<(StatusCode, Json<Response>)> {
    let token = generate_session_token();
    let account = AccountRepository::new(state.db.postgres.clone())
        .insert(&body.id, &body.username, &token)
        .await?;

    tracing::info!(account_id = account.id, "account created");

    Ok((
        StatusCode::CREATED,
        Json(Response {
            token_type: TOKEN_TYPE.to_owned(),
            token,
            account,
        }),
    ))
}

/// Handler returning the calling account, binding state included.
pub async fn me(Extension(account): Extension<Account>) -> Json<Account> {
    Json(account)
}
