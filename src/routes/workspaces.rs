use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::catalog::WorkspaceCapability;
use crate::authz::gate::WorkspaceGate;
use crate::errors::{AppError, AppResult};
use crate::events::log_activity;
use crate::jwt::AuthUser;
use crate::models::workspace::{Workspace, WorkspaceAddMemberRequest, WorkspaceCreateRequest, WorkspaceMember};
use crate::utils::utc_now;

#[utoipa::path(
    post,
    path = "/workspaces",
    tag = "Workspaces",
    request_body = WorkspaceCreateRequest,
    responses((status = 201, description = "Workspace created", body = Workspace)),
    security(("bearerAuth" = []))
)]
pub async fn create_workspace(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<WorkspaceCreateRequest>,
) -> AppResult<(StatusCode, Json<Workspace>)> {
    let now = utc_now();
    let workspace = Workspace {
        id: Uuid::new_v4(),
        name: payload.name,
        owner_id: auth.user_id,
        members: Vec::new(),
        custom_roles: Vec::new(),
        default_role_id: None,
        created_at: now,
        updated_at: now,
    };

    state.store.insert_workspace(&workspace).await?;
    log_activity(&state.event_bus, "created", Some(auth.user_id), &workspace);

    Ok((StatusCode::CREATED, Json(workspace)))
}

#[utoipa::path(
    get,
    path = "/workspaces/{id}",
    tag = "Workspaces",
    params(("id" = Uuid, Path, description = "Workspace id")),
    responses(
        (status = 200, description = "Workspace detail", body = Workspace),
        (status = 403, description = "Not a workspace member"),
        (status = 404, description = "Workspace not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_workspace(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Workspace>> {
    let gate = WorkspaceGate::load(state.store.as_ref(), id, auth.user_id).await?;
    if gate.role().is_none() {
        return Err(AppError::forbidden("not a workspace member"));
    }
    Ok(Json(gate.workspace().clone()))
}

#[utoipa::path(
    post,
    path = "/workspaces/{id}/members",
    tag = "Workspaces",
    params(("id" = Uuid, Path, description = "Workspace id")),
    request_body = WorkspaceAddMemberRequest,
    responses(
        (status = 201, description = "Member added"),
        (status = 403, description = "Caller cannot manage members"),
        (status = 409, description = "Already a member")
    ),
    security(("bearerAuth" = []))
)]
pub async fn add_workspace_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<WorkspaceAddMemberRequest>,
) -> AppResult<StatusCode> {
    let gate = WorkspaceGate::load(state.store.as_ref(), id, auth.user_id).await?;
    if !gate.can(WorkspaceCapability::ManageMembers) {
        return Err(AppError::forbidden("cannot manage workspace members"));
    }

    let workspace = gate.workspace();
    if payload.user_id == workspace.owner_id {
        return Err(AppError::conflict("owner is already a member"));
    }
    if workspace.members.iter().any(|m| m.user_id == payload.user_id) {
        return Err(AppError::conflict("already a workspace member"));
    }

    let member = WorkspaceMember {
        user_id: payload.user_id,
        role: payload.role,
    };
    let mut members = workspace.members.clone();
    members.push(member.clone());
    state.store.write_workspace_members(id, &members).await?;

    log_activity(&state.event_bus, "added", Some(auth.user_id), &member);

    Ok(StatusCode::CREATED)
}
