use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::catalog::{LegacyRole, WorkspaceCapability};
use crate::authz::gate::{ProjectGate, WorkspaceGate};
use crate::authz::membership::{migrate_members_to_roles, MemberList, ProjectMember};
use crate::authz::permissions;
use crate::authz::role_value::RoleValue;
use crate::errors::{AppError, AppResult};
use crate::events::log_activity;
use crate::jwt::AuthUser;
use crate::models::project::{
    PermissionSummary, Project, ProjectAddMemberRequest, ProjectCreateRequest, ProjectMemberChange,
};
use crate::store::AuthzStore;
use crate::utils::utc_now;

#[utoipa::path(
    post,
    path = "/projects",
    tag = "Projects",
    request_body = ProjectCreateRequest,
    responses(
        (status = 201, description = "Project created", body = Project),
        (status = 403, description = "Caller cannot create projects in this workspace")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<ProjectCreateRequest>,
) -> AppResult<(StatusCode, Json<Project>)> {
    let gate = WorkspaceGate::load(state.store.as_ref(), payload.workspace_id, auth.user_id).await?;
    if !gate.can(WorkspaceCapability::CreateProjects) {
        return Err(AppError::forbidden("cannot create projects in this workspace"));
    }

    let now = utc_now();
    let project = Project {
        id: Uuid::new_v4(),
        workspace_id: payload.workspace_id,
        owner_id: auth.user_id,
        name: payload.name,
        description: payload.description,
        members: MemberList::default(),
        created_at: now,
        updated_at: now,
    };

    state.store.insert_project(&project).await?;
    log_activity(&state.event_bus, "created", Some(auth.user_id), &project);

    Ok((StatusCode::CREATED, Json(project)))
}

#[utoipa::path(
    get,
    path = "/projects/{id}",
    tag = "Projects",
    params(("id" = Uuid, Path, description = "Project id")),
    responses(
        (status = 200, description = "Project detail", body = Project),
        (status = 403, description = "No read access"),
        (status = 404, description = "Project not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn get_project(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Project>> {
    let gate = ProjectGate::load(state.store.as_ref(), id, auth.user_id).await?;

    // Project-scope read, or the workspace-wide view-all capability. The two
    // scopes stay independent; this is plain call-site composition.
    if !gate.has_permission(permissions::PROJECT_READ) {
        let workspace_gate = WorkspaceGate::load(
            state.store.as_ref(),
            gate.project().workspace_id,
            auth.user_id,
        )
        .await?;
        if !workspace_gate.can(WorkspaceCapability::ViewAllProjects) {
            return Err(AppError::forbidden("no read access to this project"));
        }
    }

    Ok(Json(gate.project().clone()))
}

#[utoipa::path(
    post,
    path = "/projects/{id}/members",
    tag = "Projects",
    params(("id" = Uuid, Path, description = "Project id")),
    request_body = ProjectAddMemberRequest,
    responses(
        (status = 201, description = "Member added"),
        (status = 403, description = "Caller cannot invite"),
        (status = 409, description = "Already a member")
    ),
    security(("bearerAuth" = []))
)]
pub async fn add_project_member(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProjectAddMemberRequest>,
) -> AppResult<StatusCode> {
    let gate = ProjectGate::load(state.store.as_ref(), id, auth.user_id).await?;
    if !gate.has_permission(permissions::MEMBER_INVITE) {
        return Err(AppError::forbidden("cannot invite members to this project"));
    }

    let project = gate.project();
    if payload.user_id == project.owner_id {
        return Err(AppError::conflict("the project owner is always a member"));
    }

    // Adding a member is the write-back point for the flat-list migration:
    // the stored list is normalized to structured records here.
    let mut members = migrate_members_to_roles(&project.members, project.owner_id);
    if members.iter().any(|m| m.user_id == payload.user_id) {
        return Err(AppError::conflict("already a project member"));
    }

    let role = resolve_invite_role(state.store.as_ref(), project.workspace_id, payload.role).await?;
    let member = ProjectMember {
        user_id: payload.user_id,
        role: role.clone(),
        joined_at: utc_now(),
        invited_by: auth.user_id,
    };
    members.push(member);

    state
        .store
        .write_project_members(id, &MemberList::Structured(members))
        .await?;

    let change = ProjectMemberChange {
        project_id: id,
        user_id: payload.user_id,
        role,
    };
    log_activity(&state.event_bus, "added", Some(auth.user_id), &change);

    Ok(StatusCode::CREATED)
}

#[utoipa::path(
    get,
    path = "/projects/{id}/permissions",
    tag = "Projects",
    params(("id" = Uuid, Path, description = "Project id")),
    responses(
        (status = 200, description = "The caller's resolved permissions", body = PermissionSummary),
        (status = 404, description = "Project not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn my_permissions(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<PermissionSummary>> {
    let gate = ProjectGate::load(state.store.as_ref(), id, auth.user_id).await?;
    Ok(Json(gate.summary()))
}

/// Pick the role for a new member: the explicit request value wins, else the
/// workspace's default role if it still resolves, else legacy Editor.
async fn resolve_invite_role(
    store: &dyn AuthzStore,
    workspace_id: Uuid,
    requested: Option<RoleValue>,
) -> AppResult<RoleValue> {
    if let Some(role) = requested {
        return Ok(role);
    }

    if let Some(default_id) = store.default_role_id(workspace_id).await? {
        let roles = store.list_custom_roles(workspace_id).await?;
        if roles.iter().any(|r| r.id == default_id) {
            return Ok(RoleValue::Custom(default_id));
        }
        tracing::debug!(%workspace_id, %default_id, "default role no longer exists, using editor");
    }

    Ok(RoleValue::Legacy(LegacyRole::Editor))
}
