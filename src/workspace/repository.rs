//! Handle database requests for workspaces.

use sqlx::{Pool, Postgres};

use crate::error::Result;
use crate::workspace::Workspace;

const WORKSPACE_COLUMNS: &str =
    "id, name, group_id, owner_id, allowed_ranks, invite_code, created_at";

#[derive(Clone)]
pub struct WorkspaceRepository {
    pool: Pool<Postgres>,
}

impl WorkspaceRepository {
    /// Create a new [`WorkspaceRepository`].
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Insert a workspace and its owner's membership in one transaction.
    pub async fn insert(&self, workspace: &Workspace) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(&format!(
            "INSERT INTO workspaces ({WORKSPACE_COLUMNS})
                VALUES ($1, $2, $3, $4, $5, $6, $7)"
        ))
        .bind(&workspace.id)
        .bind(&workspace.name)
        .bind(workspace.group_id)
        .bind(&workspace.owner_id)
        .bind(&workspace.allowed_ranks)
        .bind(&workspace.invite_code)
        .bind(workspace.created_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "INSERT INTO workspace_members (workspace_id, account_id)
                VALUES ($1, $2)",
        )
        .bind(&workspace.id)
        .bind(&workspace.owner_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Find a workspace using `id` field.
    pub async fn find_by_id(&self, workspace_id: &str) -> Result<Option<Workspace>> {
        let workspace = sqlx::query_as::<_, Workspace>(&format!(
            "SELECT {WORKSPACE_COLUMNS} FROM workspaces WHERE id = $1"
        ))
        .bind(workspace_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(workspace)
    }

    /// Find a workspace using its invite code.
    pub async fn find_by_invite(&self, invite_code: &str) -> Result<Option<Workspace>> {
        let workspace = sqlx::query_as::<_, Workspace>(&format!(
            "SELECT {WORKSPACE_COLUMNS} FROM workspaces WHERE invite_code = $1"
        ))
        .bind(invite_code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(workspace)
    }

    /// All workspaces an account belongs to.
    pub async fn list_for_account(&self, account_id: &str) -> Result<Vec<Workspace>> {
        let workspaces = sqlx::query_as::<_, Workspace>(&format!(
            "SELECT w.{} FROM workspaces w
                JOIN workspace_members m ON m.workspace_id = w.id
                WHERE m.account_id = $1
                ORDER BY w.created_at",
            WORKSPACE_COLUMNS.replace(", ", ", w."),
        ))
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(workspaces)
    }

    /// Account ids of everyone who joined the workspace, oldest first.
    pub async fn list_members(&self, workspace_id: &str) -> Result<Vec<String>> {
        let members = sqlx::query_scalar::<_, String>(
            "SELECT account_id FROM workspace_members
                WHERE workspace_id = $1
                ORDER BY joined_at",
        )
        .bind(workspace_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    /// Whether the account already joined the workspace.
    pub async fn is_member(&self, workspace_id: &str, account_id: &str) -> Result<bool> {
        let member = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM workspace_members
                WHERE workspace_id = $1 AND account_id = $2",
        )
        .bind(workspace_id)
        .bind(account_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(member > 0)
    }

    /// Record an admitted joiner.
    ///
    /// The membership row is the only state both sides share, so one
    /// insert is the whole join; there is no partially-joined state to
    /// compensate for.
    pub async fn add_member(&self, workspace_id: &str, account_id: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO workspace_members (workspace_id, account_id)
                VALUES ($1, $2)
                ON CONFLICT DO NOTHING",
        )
        .bind(workspace_id)
        .bind(account_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Replace the allow-list; owner-only, checked by the caller.
    pub async fn update_allowed_ranks(
        &self,
        workspace_id: &str,
        allowed_ranks: &[i64],
    ) -> Result<()> {
        sqlx::query("UPDATE workspaces SET allowed_ranks = $1 WHERE id = $2")
            .bind(allowed_ranks)
            .bind(workspace_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
