//! Workspace creation, configuration and invite-based admission.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::account::Account;
use crate::error::Result;
use crate::ownership;
use crate::router::Valid;
use crate::workspace::{
    AdmissionDecision, Workspace, WorkspaceRepository, admission_decision,
    generate_invite_code, generate_workspace_id,
};
use crate::{AppState, ServerError};

pub const VERIFICATION_REQUIRED: &str =
    "You must verify your Roblox account before joining a workspace.";
const UNKNOWN_INVITE: &str = "Unknown invite code.";
const OWNER_ONLY: &str = "Only the workspace owner can change its allow-list.";

/// `GET /workspaces` lists workspaces the calling account belongs to.
pub async fn list(
    State(state): State<AppState>,
    Extension(account): Extension<Account>,
) -> Result<Json<Vec<Workspace>>> {
    let workspaces = WorkspaceRepository::new(state.db.postgres.clone())
        .list_for_account(&account.id)
        .await?;

    Ok(Json(workspaces))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceDetails {
    #[serde(flatten)]
    pub workspace: Workspace,
    pub members: Vec<String>,
}

/// `GET /workspaces/{id}` returns a workspace with its member list.
/// Members only.
pub async fn get(
    State(state): State<AppState>,
    Path(workspace_id): Path<String>,
    Extension(account): Extension<Account>,
) -> Result<Json<WorkspaceDetails>> {
    let repository = WorkspaceRepository::new(state.db.postgres.clone());

    let workspace = repository
        .find_by_id(&workspace_id)
        .await?
        .ok_or_else(|| ServerError::NotFound("Workspace not found.".to_owned()))?;

    if !repository.is_member(&workspace.id, &account.id).await? {
        return Err(ServerError::Denied(
            "You are not a member of this workspace.".to_owned(),
        ));
    }

    let members = repository.list_members(&workspace.id).await?;

    Ok(Json(WorkspaceDetails { workspace, members }))
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBody {
    #[validate(length(
        min = 2,
        max = 50,
        message = "Name must be 2 to 50 characters long."
    ))]
    pub name: String,
    pub group_id: i64,
    /// Role ids allowed to join; empty admits any group member.
    #[serde(default)]
    pub allowed_ranks: Vec<i64>,
}

/// `POST /workspaces` creates a workspace for a group the caller manages.
///
/// Ownership is re-resolved against the upstream on every creation; a
/// stale dashboard cannot create a workspace for a group the caller no
/// longer manages.
pub async fn create(
    State(state): State<AppState>,
    Extension(account): Extension<Account>,
    Valid(body): Valid<CreateBody>,
) -> Result<(StatusCode, Json<Workspace>)> {
    let identity = account
        .bound_identity()
        .ok_or_else(|| ServerError::Denied(VERIFICATION_REQUIRED.to_owned()))?;

    let resolution = ownership::verify_group_ownership(
        &state.roblox,
        identity.user_id,
        body.group_id,
    )
    .await?;

    if !resolution.verified {
        return Err(ServerError::Denied(resolution.message));
    }

    let workspace = Workspace {
        id: generate_workspace_id(),
        name: body.name,
        group_id: body.group_id,
        owner_id: account.id.clone(),
        allowed_ranks: body.allowed_ranks,
        invite_code: generate_invite_code(),
        created_at: chrono::Utc::now(),
    };

    WorkspaceRepository::new(state.db.postgres.clone())
        .insert(&workspace)
        .await?;

    tracing::info!(
        workspace_id = workspace.id,
        group_id = workspace.group_id,
        owner_id = account.id,
        "workspace created"
    );

    Ok((StatusCode::CREATED, Json(workspace)))
}

#[derive(Debug, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RanksBody {
    pub allowed_ranks: Vec<i64>,
}

/// `PATCH /workspaces/{id}/ranks` replaces the allow-list. Owner only.
pub async fn update_ranks(
    State(state): State<AppState>,
    Path(workspace_id): Path<String>,
    Extension(account): Extension<Account>,
    Valid(body): Valid<RanksBody>,
) -> Result<StatusCode> {
    let repository = WorkspaceRepository::new(state.db.postgres.clone());

    let workspace = repository
        .find_by_id(&workspace_id)
        .await?
        .ok_or_else(|| ServerError::NotFound("Workspace not found.".to_owned()))?;

    if workspace.owner_id != account.id {
        return Err(ServerError::Denied(OWNER_ONLY.to_owned()));
    }

    repository
        .update_allowed_ranks(&workspace.id, &body.allowed_ranks)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct JoinBody {
    #[validate(length(min = 1, message = "Invite code is required."))]
    pub invite: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinResponse {
    pub message: String,
    pub workspace: Workspace,
}

/// `POST /workspaces/join` admits the caller through an invite code.
///
/// Unverified accounts are pushed into the verification workflow first;
/// owners bypass the group checks; everyone else passes the membership
/// and allow-list gate. The decision fails closed on any ambiguity.
pub async fn join(
    State(state): State<AppState>,
    Extension(account): Extension<Account>,
    Valid(body): Valid<JoinBody>,
) -> Result<Json<JoinResponse>> {
    let repository = WorkspaceRepository::new(state.db.postgres.clone());

    let workspace = repository
        .find_by_invite(&body.invite)
        .await?
        .ok_or_else(|| ServerError::NotFound(UNKNOWN_INVITE.to_owned()))?;

    let identity = account
        .bound_identity()
        .ok_or_else(|| ServerError::Denied(VERIFICATION_REQUIRED.to_owned()))?;

    if repository.is_member(&workspace.id, &account.id).await? {
        return Ok(Json(JoinResponse {
            message: "You already joined this workspace.".to_owned(),
            workspace,
        }));
    }

    // Owners bypass all group checks.
    if workspace.owner_id != account.id {
        let memberships = state.roblox.fetch_user_groups(identity.user_id).await?;
        let decision = admission_decision(
            &memberships,
            workspace.group_id,
            &workspace.allowed_ranks,
        );

        if decision != AdmissionDecision::Admit {
            return Err(ServerError::Denied(decision.message().to_owned()));
        }
    }

    repository.add_member(&workspace.id, &account.id).await?;

    tracing::info!(
        workspace_id = workspace.id,
        account_id = account.id,
        "workspace joined"
    );

    Ok(Json(JoinResponse {
        message: AdmissionDecision::Admit.message().to_owned(),
        workspace,
    }))
}
