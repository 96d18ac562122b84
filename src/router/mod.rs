//! HTTP surface consumed by the dashboard front end.

pub mod accounts;
pub mod groups;
pub mod roblox;
pub mod status;
pub mod verify;
pub mod workspaces;

use axum::extract::{FromRequest, Request, State};
use axum::http::header;
use axum::response::Response;
use axum::{Json, middleware};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError};

use crate::account::AccountRepository;
use crate::error::Result;
use crate::{AppState, ServerError};

const BEARER: &str = "Bearer ";

/// JSON body extractor running `validator` rules before the handler.
pub struct Valid<T>(pub T);

impl<S, T> FromRequest<S> for Valid<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate + Send,
{
    type Rejection = ServerError;

    async fn from_request(req: Request, state: &S) -> Result<Self> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Valid(value))
    }
}

/// Alphanumeric (plus underscore) identifier check.
pub(crate) fn validate_id(value: &str) -> std::result::Result<(), ValidationError> {
    if value
        .chars()
        .all(|symbol| symbol.is_ascii_alphanumeric() || symbol == '_')
    {
        Ok(())
    } else {
        Err(ValidationError::new("id"))
    }
}

/// Custom middleware for authentification.
///
/// Resolves the bearer session token against the sessions table and
/// injects the [`crate::account::Account`] as a request extension, so
/// every workflow receives an explicit caller instead of reading
/// ambient state.
pub async fn auth(
    State(state): State<AppState>,
    mut req: Request,
    next: middleware::Next,
) -> Result<Response> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.replace(BEARER, ""))
        .filter(|token| !token.is_empty())
        .ok_or(ServerError::Unauthorized)?;

    let account = AccountRepository::new(state.db.postgres.clone())
        .find_by_session(&token)
        .await?
        .ok_or(ServerError::Unauthorized)?;

    req.extensions_mut().insert(account);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_id() {
        assert!(validate_id("captain_hook42").is_ok());
        assert!(validate_id("no spaces").is_err());
        assert!(validate_id("no-dash").is_err());
    }
}
