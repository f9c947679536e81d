//! Custom-role management endpoints, nested under a workspace. Mutations
//! require the workspace `manage-workspace` capability and are logged with
//! Critical severity; reads are open to any workspace member.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::app::AppState;
use crate::authz::catalog::WorkspaceCapability;
use crate::authz::gate::WorkspaceGate;
use crate::authz::roles::RoleCatalog;
use crate::errors::{AppError, AppResult};
use crate::events::log_activity;
use crate::jwt::AuthUser;
use crate::models::role::{
    CustomRole, DefaultRoleBody, RoleCreateRequest, RoleReorderRequest, RoleUpdateRequest,
};

async fn member_gate(state: &AppState, workspace_id: Uuid, user_id: Uuid) -> AppResult<WorkspaceGate> {
    let gate = WorkspaceGate::load(state.store.as_ref(), workspace_id, user_id).await?;
    if gate.role().is_none() {
        return Err(AppError::forbidden("not a workspace member"));
    }
    Ok(gate)
}

async fn manager_gate(state: &AppState, workspace_id: Uuid, user_id: Uuid) -> AppResult<WorkspaceGate> {
    let gate = WorkspaceGate::load(state.store.as_ref(), workspace_id, user_id).await?;
    if !gate.can(WorkspaceCapability::ManageWorkspace) {
        return Err(AppError::forbidden("cannot manage workspace roles"));
    }
    Ok(gate)
}

#[utoipa::path(
    get,
    path = "/workspaces/{workspace_id}/roles",
    tag = "Roles",
    params(("workspace_id" = Uuid, Path, description = "Workspace id")),
    responses((status = 200, description = "Custom roles in display order", body = Vec<CustomRole>)),
    security(("bearerAuth" = []))
)]
pub async fn list_roles(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(workspace_id): Path<Uuid>,
) -> AppResult<Json<Vec<CustomRole>>> {
    member_gate(&state, workspace_id, auth.user_id).await?;

    let mut roles = RoleCatalog::new(state.store.as_ref()).list(workspace_id).await?;
    roles.sort_by_key(|r| r.position);
    Ok(Json(roles))
}

#[utoipa::path(
    post,
    path = "/workspaces/{workspace_id}/roles",
    tag = "Roles",
    params(("workspace_id" = Uuid, Path, description = "Workspace id")),
    request_body = RoleCreateRequest,
    responses(
        (status = 201, description = "Role created", body = CustomRole),
        (status = 400, description = "Unknown permission key"),
        (status = 403, description = "Caller cannot manage roles")
    ),
    security(("bearerAuth" = []))
)]
pub async fn create_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(workspace_id): Path<Uuid>,
    Json(payload): Json<RoleCreateRequest>,
) -> AppResult<(StatusCode, Json<CustomRole>)> {
    manager_gate(&state, workspace_id, auth.user_id).await?;

    let role = RoleCatalog::new(state.store.as_ref())
        .create(workspace_id, payload)
        .await?;

    log_activity(&state.event_bus, "created", Some(auth.user_id), &role);

    Ok((StatusCode::CREATED, Json(role)))
}

#[utoipa::path(
    patch,
    path = "/workspaces/{workspace_id}/roles/{role_id}",
    tag = "Roles",
    params(
        ("workspace_id" = Uuid, Path, description = "Workspace id"),
        ("role_id" = String, Path, description = "Custom role id"),
    ),
    request_body = RoleUpdateRequest,
    responses(
        (status = 200, description = "Role updated", body = CustomRole),
        (status = 404, description = "Role not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn update_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((workspace_id, role_id)): Path<(Uuid, String)>,
    Json(payload): Json<RoleUpdateRequest>,
) -> AppResult<Json<CustomRole>> {
    manager_gate(&state, workspace_id, auth.user_id).await?;

    let role = RoleCatalog::new(state.store.as_ref())
        .update(workspace_id, &role_id, payload)
        .await?;

    log_activity(&state.event_bus, "updated", Some(auth.user_id), &role);

    Ok(Json(role))
}

#[utoipa::path(
    delete,
    path = "/workspaces/{workspace_id}/roles/{role_id}",
    tag = "Roles",
    params(
        ("workspace_id" = Uuid, Path, description = "Workspace id"),
        ("role_id" = String, Path, description = "Custom role id"),
    ),
    responses(
        (status = 204, description = "Role deleted"),
        (status = 404, description = "Role not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn delete_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path((workspace_id, role_id)): Path<(Uuid, String)>,
) -> AppResult<StatusCode> {
    manager_gate(&state, workspace_id, auth.user_id).await?;

    let removed = RoleCatalog::new(state.store.as_ref())
        .delete(workspace_id, &role_id)
        .await?;

    log_activity(&state.event_bus, "deleted", Some(auth.user_id), &removed);

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/workspaces/{workspace_id}/roles/reorder",
    tag = "Roles",
    params(("workspace_id" = Uuid, Path, description = "Workspace id")),
    request_body = RoleReorderRequest,
    responses((status = 200, description = "Roles with rewritten positions", body = Vec<CustomRole>)),
    security(("bearerAuth" = []))
)]
pub async fn reorder_roles(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(workspace_id): Path<Uuid>,
    Json(payload): Json<RoleReorderRequest>,
) -> AppResult<Json<Vec<CustomRole>>> {
    manager_gate(&state, workspace_id, auth.user_id).await?;

    let mut roles = RoleCatalog::new(state.store.as_ref())
        .reorder(workspace_id, &payload.ordered_ids)
        .await?;
    roles.sort_by_key(|r| r.position);
    Ok(Json(roles))
}

#[utoipa::path(
    get,
    path = "/workspaces/{workspace_id}/default-role",
    tag = "Roles",
    params(("workspace_id" = Uuid, Path, description = "Workspace id")),
    responses((status = 200, description = "Default role id, if configured", body = DefaultRoleBody)),
    security(("bearerAuth" = []))
)]
pub async fn get_default_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(workspace_id): Path<Uuid>,
) -> AppResult<Json<DefaultRoleBody>> {
    member_gate(&state, workspace_id, auth.user_id).await?;

    let role_id = RoleCatalog::new(state.store.as_ref())
        .default_role_id(workspace_id)
        .await?;
    Ok(Json(DefaultRoleBody { role_id }))
}

#[utoipa::path(
    put,
    path = "/workspaces/{workspace_id}/default-role",
    tag = "Roles",
    params(("workspace_id" = Uuid, Path, description = "Workspace id")),
    request_body = DefaultRoleBody,
    responses(
        (status = 200, description = "Default role updated", body = DefaultRoleBody),
        (status = 404, description = "Role not found")
    ),
    security(("bearerAuth" = []))
)]
pub async fn set_default_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(workspace_id): Path<Uuid>,
    Json(payload): Json<DefaultRoleBody>,
) -> AppResult<Json<DefaultRoleBody>> {
    manager_gate(&state, workspace_id, auth.user_id).await?;

    RoleCatalog::new(state.store.as_ref())
        .set_default_role_id(workspace_id, payload.role_id.as_deref())
        .await?;

    Ok(Json(payload))
}
