//! Scope gates: the façade feature code consults.
//!
//! A gate holds the fetched snapshot (project or workspace, plus the tenant's
//! custom-role list where needed) and the caller's resolved role. Fetching is
//! the only await; every check afterwards is a synchronous pure function, so
//! a gate can sit behind a render loop without touching storage again. The
//! gate is rebuilt whenever the underlying project, user, or role list
//! changes.

use uuid::Uuid;

use super::catalog::{Capability, CapabilitySet, WorkspaceCapability, WorkspaceRole};
use super::resolver;
use super::role_value::RoleValue;
use crate::errors::AppResult;
use crate::models::project::{PermissionSummary, Project};
use crate::models::role::CustomRole;
use crate::models::workspace::Workspace;
use crate::store::AuthzStore;

pub struct ProjectGate {
    project: Project,
    custom_roles: Vec<CustomRole>,
    user_id: Uuid,
    role: Option<RoleValue>,
}

impl ProjectGate {
    /// Fetch the project and its tenant's custom-role list, then resolve the
    /// caller's role once.
    pub async fn load(
        store: &dyn AuthzStore,
        project_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<Self> {
        let project = store.get_project(project_id).await?;
        let custom_roles = store.list_custom_roles(project.workspace_id).await?;
        Ok(Self::from_snapshot(project, custom_roles, user_id))
    }

    /// Build a gate over an already-fetched snapshot (headless checks, tests).
    pub fn from_snapshot(
        project: Project,
        custom_roles: Vec<CustomRole>,
        user_id: Uuid,
    ) -> Self {
        let role = resolver::get_user_role(&project, user_id);
        Self { project, custom_roles, user_id, role }
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    /// The caller's resolved role value, or `None` for a non-member.
    pub fn role(&self) -> Option<&RoleValue> {
        self.role.as_ref()
    }

    pub fn is_owner(&self) -> bool {
        self.project.owner_id == self.user_id
    }

    /// Coarse boolean gating via the legacy capability matrix.
    pub fn can(&self, capability: Capability) -> bool {
        resolver::check_capability(&self.project, self.user_id, capability)
    }

    /// Fine-grained gating via the permission path (consults custom roles).
    pub fn has_permission(&self, permission: &str) -> bool {
        resolver::check_permission(&self.project, self.user_id, permission, &self.custom_roles)
    }

    pub fn capabilities(&self) -> CapabilitySet {
        resolver::resolve_capabilities(&self.project, self.user_id)
    }

    pub fn permissions(&self) -> Vec<String> {
        match &self.role {
            Some(role) => resolver::resolve_permissions(&self.custom_roles, role),
            None => Vec::new(),
        }
    }

    /// Everything the UI needs to gate rendering, resolved in one place.
    pub fn summary(&self) -> PermissionSummary {
        PermissionSummary {
            role: self.role.clone(),
            is_owner: self.is_owner(),
            capabilities: self.capabilities(),
            permissions: self.permissions(),
        }
    }
}

pub struct WorkspaceGate {
    workspace: Workspace,
    user_id: Uuid,
    role: Option<WorkspaceRole>,
}

impl WorkspaceGate {
    pub async fn load(
        store: &dyn AuthzStore,
        workspace_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<Self> {
        let workspace = store.get_workspace(workspace_id).await?;
        Ok(Self::from_snapshot(workspace, user_id))
    }

    pub fn from_snapshot(workspace: Workspace, user_id: Uuid) -> Self {
        let role = if workspace.owner_id == user_id {
            Some(WorkspaceRole::Owner)
        } else {
            workspace
                .members
                .iter()
                .find(|member| member.user_id == user_id)
                .map(|member| member.role)
        };
        Self { workspace, user_id, role }
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn role(&self) -> Option<WorkspaceRole> {
        self.role
    }

    pub fn is_owner(&self) -> bool {
        self.workspace.owner_id == self.user_id
    }

    pub fn can(&self, capability: WorkspaceCapability) -> bool {
        match self.role {
            Some(role) => role.capabilities().allows(capability),
            None => false,
        }
    }

    /// True when the caller holds at least a full membership (not a guest).
    /// Composite checks like "owner and not demoted" build on this in the
    /// handlers, not here.
    pub fn is_full_member(&self) -> bool {
        matches!(
            self.role,
            Some(WorkspaceRole::Owner | WorkspaceRole::Admin | WorkspaceRole::Member)
        )
    }
}
