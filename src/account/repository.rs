//! Handle database requests for accounts and sessions.

use sqlx::{Pool, Postgres};

use crate::account::Account;
use crate::error::Result;
use crate::roblox::ExternalIdentity;

const ACCOUNT_COLUMNS: &str =
    "id, username, roblox_username, roblox_user_id, roblox_verified, created_at";

#[derive(Clone)]
pub struct AccountRepository {
    pool: Pool<Postgres>,
}

impl AccountRepository {
    /// Create a new [`AccountRepository`].
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Insert a fresh account and its first session in one transaction.
    pub async fn insert(
        &self,
        id: &str,
        username: &str,
        session_token: &str,
    ) -> Result<Account> {
        let mut tx = self.pool.begin().await?;
        let id = id.to_lowercase();

        let account = sqlx::query_as::<_, Account>(&format!(
            "INSERT INTO accounts (id, username) VALUES ($1, $2)
                RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(&id)
        .bind(username)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO sessions (token, account_id) VALUES ($1, $2)")
            .bind(session_token)
            .bind(&id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(account)
    }

    /// Find an account using `id` field.
    pub async fn find_by_id(&self, account_id: &str) -> Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1"
        ))
        .bind(account_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    /// Resolve a bearer session token to its account.
    pub async fn find_by_session(&self, token: &str) -> Result<Option<Account>> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT a.{} FROM accounts a
                JOIN sessions s ON s.account_id = a.id
                WHERE s.token = $1",
            ACCOUNT_COLUMNS.replace(", ", ", a."),
        ))
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(account)
    }

    /// Id of another account already bound to this external identity.
    ///
    /// The lookup-before-bind uniqueness check of the verification
    /// workflow; the requesting account re-verifying itself is not a
    /// conflict.
    pub async fn find_conflicting_binding(
        &self,
        identity: &ExternalIdentity,
        requesting_account: &str,
    ) -> Result<Option<String>> {
        let existing = sqlx::query_scalar::<_, String>(
            "SELECT id FROM accounts
                WHERE (roblox_user_id = $1 OR LOWER(roblox_username) = LOWER($2))
                AND roblox_verified AND id <> $3",
        )
        .bind(identity.user_id)
        .bind(&identity.username)
        .bind(requesting_account)
        .fetch_optional(&self.pool)
        .await?;

        Ok(existing)
    }

    /// Persist a successful verification binding on the account.
    pub async fn bind_identity(
        &self,
        account_id: &str,
        identity: &ExternalIdentity,
    ) -> Result<()> {
        sqlx::query(
            "UPDATE accounts
                SET roblox_username = $1, roblox_user_id = $2, roblox_verified = TRUE
                WHERE id = $3",
        )
        .bind(&identity.username)
        .bind(identity.user_id)
        .bind(account_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
