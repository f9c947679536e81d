use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::authz::catalog::CapabilitySet;
use crate::authz::membership::MemberList;
use crate::authz::role_value::RoleValue;
use crate::events::{Loggable, Severity};

/// A project, belonging to exactly one workspace. The owner is tracked by
/// `owner_id` and never appears in `members`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Project {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub owner_id: Uuid,
    #[schema(example = "Spring Launch")]
    pub name: String,
    #[schema(example = "Campaign assets and rollout schedule.")]
    pub description: Option<String>,
    #[serde(default)]
    pub members: MemberList,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Loggable for Project {
    fn entity_type() -> &'static str {
        "project"
    }
    fn subject_id(&self) -> String {
        self.id.to_string()
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProjectCreateRequest {
    pub workspace_id: Uuid,
    #[schema(example = "Spring Launch")]
    pub name: String,
    #[schema(example = "Campaign assets and rollout schedule.")]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ProjectAddMemberRequest {
    pub user_id: Uuid,
    /// A legacy literal or custom-role id. Omitted: the workspace's default
    /// role if one is set, else `editor`.
    #[schema(value_type = Option<String>, example = "editor")]
    pub role: Option<RoleValue>,
}

/// The gate snapshot consumed by UI rendering: everything a client needs to
/// decide what to draw, resolved once.
#[derive(Debug, Serialize, ToSchema)]
pub struct PermissionSummary {
    #[schema(value_type = Option<String>, example = "editor")]
    pub role: Option<RoleValue>,
    pub is_owner: bool,
    pub capabilities: CapabilitySet,
    pub permissions: Vec<String>,
}

/// Mirror of a membership mutation for the audit trail.
#[derive(Debug, Serialize)]
pub struct ProjectMemberChange {
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub role: RoleValue,
}

impl Loggable for ProjectMemberChange {
    fn entity_type() -> &'static str {
        "project_member"
    }
    fn subject_id(&self) -> String {
        self.user_id.to_string()
    }
    fn severity(&self) -> Severity {
        Severity::Critical
    }
}
