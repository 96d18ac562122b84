//! Internal accounts and their external identity binding.

mod repository;

pub use repository::*;

use rand::Rng;
use rand::distributions::Alphanumeric;
use serde::{Deserialize, Serialize};

use crate::roblox::ExternalIdentity;

const SESSION_TOKEN_LENGTH: usize = 48;

/// Account as saved on database.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub username: String,
    pub roblox_username: Option<String>,
    pub roblox_user_id: Option<i64>,
    pub roblox_verified: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Account {
    /// Bound external identity, if verification already succeeded.
    pub fn bound_identity(&self) -> Option<ExternalIdentity> {
        if !self.roblox_verified {
            return None;
        }

        Some(ExternalIdentity {
            user_id: self.roblox_user_id?,
            username: self.roblox_username.clone()?,
        })
    }
}

/// Opaque bearer token for the sessions table.
pub fn generate_session_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SESSION_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bound_identity_requires_verified_flag() {
        let mut account = Account {
            roblox_username: Some("builderman".to_owned()),
            roblox_user_id: Some(156),
            roblox_verified: false,
            ..Account::default()
        };
        assert_eq!(account.bound_identity(), None);

        account.roblox_verified = true;
        let identity = account.bound_identity().unwrap();
        assert_eq!(identity.user_id, 156);
        assert_eq!(identity.username, "builderman");
    }

    #[test]
    fn test_session_tokens_are_long_and_distinct() {
        let first = generate_session_token();
        let second = generate_session_token();
        assert_eq!(first.len(), 48);
        assert_ne!(first, second);
    }
}
