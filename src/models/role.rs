use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::events::{Loggable, Severity};

/// A workspace-scoped custom role. Referenced from project membership records
/// by id; deleting a role does not cascade into memberships, stale references
/// resolve to the Viewer fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CustomRole {
    /// Unique within the owning workspace, generated at creation.
    #[schema(example = "role_1712131415000_ab12cd34")]
    pub id: String,
    #[schema(example = "Campaign Writer")]
    pub name: String,
    #[schema(example = "#e67e22")]
    pub color: String,
    /// Permission keys from the fixed vocabulary; authoritative and
    /// exhaustive on their own, never merged with a legacy template.
    #[schema(example = json!(["project.read", "task.create"]))]
    pub permissions: Vec<String>,
    /// At most one role per workspace carries this flag.
    #[serde(default)]
    pub is_default: bool,
    /// Stable display ordering only; carries no precedence.
    #[serde(default)]
    pub position: i64,
}

impl Loggable for CustomRole {
    fn entity_type() -> &'static str {
        "role"
    }
    fn subject_id(&self) -> String {
        self.id.clone()
    }
    fn severity(&self) -> Severity {
        Severity::Critical
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RoleCreateRequest {
    #[schema(example = "Campaign Writer")]
    pub name: String,
    #[schema(example = "#e67e22")]
    pub color: String,
    #[schema(example = json!(["project.read", "task.create", "idea.create"]))]
    pub permissions: Vec<String>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RoleUpdateRequest {
    pub name: Option<String>,
    pub color: Option<String>,
    pub permissions: Option<Vec<String>>,
    pub is_default: Option<bool>,
    pub position: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RoleReorderRequest {
    /// Roles absent from this list keep their prior position.
    pub ordered_ids: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DefaultRoleBody {
    /// `null` clears the workspace's default role.
    pub role_id: Option<String>,
}
