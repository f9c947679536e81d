use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::authz::catalog::WorkspaceRole;
use crate::events::{Loggable, Severity};
use crate::models::role::CustomRole;

/// A tenant. Owns its custom-role list and the default-role pointer applied
/// to new project invitees.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Workspace {
    pub id: Uuid,
    #[schema(example = "Acme Marketing")]
    pub name: String,
    pub owner_id: Uuid,
    pub members: Vec<WorkspaceMember>,
    pub custom_roles: Vec<CustomRole>,
    pub default_role_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Loggable for Workspace {
    fn entity_type() -> &'static str {
        "workspace"
    }
    fn subject_id(&self) -> String {
        self.id.to_string()
    }
}

/// One workspace membership record. Historical rows may carry the legacy
/// `editor`/`viewer` role names; they decode as Member/Guest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WorkspaceMember {
    pub user_id: Uuid,
    pub role: WorkspaceRole,
}

impl Loggable for WorkspaceMember {
    fn entity_type() -> &'static str {
        "workspace_member"
    }
    fn subject_id(&self) -> String {
        self.user_id.to_string()
    }
    fn severity(&self) -> Severity {
        Severity::Critical
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct WorkspaceCreateRequest {
    #[schema(example = "Acme Marketing")]
    pub name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct WorkspaceAddMemberRequest {
    pub user_id: Uuid,
    pub role: WorkspaceRole,
}
