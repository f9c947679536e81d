//! Static role catalog: the legacy capability matrix and the workspace role
//! table. Everything here is a compile-time constant; the per-tenant custom
//! role list lives in storage and is served by [`super::roles::RoleCatalog`].

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::permissions as perm;

// =============================================================================
// PROJECT SCOPE: LEGACY ROLES
// =============================================================================

/// The closed legacy role set. Stored as plain lowercase strings in
/// membership records; anything else in a role field is a custom-role id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LegacyRole {
    Owner,
    Editor,
    Viewer,
}

impl LegacyRole {
    pub const fn as_str(self) -> &'static str {
        match self {
            LegacyRole::Owner => "owner",
            LegacyRole::Editor => "editor",
            LegacyRole::Viewer => "viewer",
        }
    }

    /// Classify a stored role string. Returns `None` for anything outside the
    /// closed set, which callers treat as a custom-role id.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "owner" => Some(LegacyRole::Owner),
            "editor" => Some(LegacyRole::Editor),
            "viewer" => Some(LegacyRole::Viewer),
            _ => None,
        }
    }

    /// The immutable capability set for this role.
    pub const fn capabilities(self) -> CapabilitySet {
        match self {
            LegacyRole::Owner => OWNER_CAPABILITIES,
            LegacyRole::Editor => EDITOR_CAPABILITIES,
            LegacyRole::Viewer => VIEWER_CAPABILITIES,
        }
    }

    /// The fixed permission list for this role. Owner's list is a strict
    /// superset of Editor's, Editor's of Viewer's, by construction.
    pub const fn permission_list(self) -> &'static [&'static str] {
        match self {
            LegacyRole::Owner => OWNER_PERMISSIONS,
            LegacyRole::Editor => EDITOR_PERMISSIONS,
            LegacyRole::Viewer => VIEWER_PERMISSIONS,
        }
    }
}

/// Coarse boolean capability flags tied to a legacy role. Predates the
/// custom-role permission system and is kept for cheap UI gating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub struct CapabilitySet {
    pub edit: bool,
    pub delete: bool,
    pub invite: bool,
    pub manage_tasks: bool,
    pub manage_ideas: bool,
    pub manage_issues: bool,
    pub comment: bool,
    pub view: bool,
    pub manage_groups: bool,
}

impl CapabilitySet {
    /// The deny-everything set, used when no role resolves.
    pub const NONE: CapabilitySet = CapabilitySet {
        edit: false,
        delete: false,
        invite: false,
        manage_tasks: false,
        manage_ideas: false,
        manage_issues: false,
        comment: false,
        view: false,
        manage_groups: false,
    };

    pub const fn allows(&self, capability: Capability) -> bool {
        match capability {
            Capability::Edit => self.edit,
            Capability::Delete => self.delete,
            Capability::Invite => self.invite,
            Capability::ManageTasks => self.manage_tasks,
            Capability::ManageIdeas => self.manage_ideas,
            Capability::ManageIssues => self.manage_issues,
            Capability::Comment => self.comment,
            Capability::View => self.view,
            Capability::ManageGroups => self.manage_groups,
        }
    }
}

/// A single capability key, the unit of the coarse check path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    Edit,
    Delete,
    Invite,
    ManageTasks,
    ManageIdeas,
    ManageIssues,
    Comment,
    View,
    ManageGroups,
}

const OWNER_CAPABILITIES: CapabilitySet = CapabilitySet {
    edit: true,
    delete: true,
    invite: true,
    manage_tasks: true,
    manage_ideas: true,
    manage_issues: true,
    comment: true,
    view: true,
    manage_groups: true,
};

const EDITOR_CAPABILITIES: CapabilitySet = CapabilitySet {
    edit: true,
    delete: false,
    invite: true,
    manage_tasks: true,
    manage_ideas: true,
    manage_issues: true,
    comment: true,
    view: true,
    manage_groups: false,
};

const VIEWER_CAPABILITIES: CapabilitySet = CapabilitySet {
    edit: false,
    delete: false,
    invite: false,
    manage_tasks: false,
    manage_ideas: false,
    manage_issues: false,
    comment: true,
    view: true,
    manage_groups: false,
};

const VIEWER_PERMISSIONS: &[&str] = &[perm::PROJECT_READ, perm::COMMENT_CREATE];

// Viewer's entries repeated verbatim at the head so the superset relation
// holds by construction, not by incidental overlap.
const EDITOR_PERMISSIONS: &[&str] = &[
    perm::PROJECT_READ,
    perm::COMMENT_CREATE,
    perm::PROJECT_UPDATE,
    perm::TASK_CREATE,
    perm::TASK_UPDATE,
    perm::TASK_DELETE,
    perm::IDEA_CREATE,
    perm::IDEA_UPDATE,
    perm::IDEA_DELETE,
    perm::ISSUE_CREATE,
    perm::ISSUE_UPDATE,
    perm::ISSUE_DELETE,
    perm::GROUP_CREATE,
    perm::GROUP_UPDATE,
    perm::MEMBER_INVITE,
];

const OWNER_PERMISSIONS: &[&str] = &[
    perm::PROJECT_READ,
    perm::COMMENT_CREATE,
    perm::PROJECT_UPDATE,
    perm::TASK_CREATE,
    perm::TASK_UPDATE,
    perm::TASK_DELETE,
    perm::IDEA_CREATE,
    perm::IDEA_UPDATE,
    perm::IDEA_DELETE,
    perm::ISSUE_CREATE,
    perm::ISSUE_UPDATE,
    perm::ISSUE_DELETE,
    perm::GROUP_CREATE,
    perm::GROUP_UPDATE,
    perm::MEMBER_INVITE,
    perm::PROJECT_DELETE,
    perm::GROUP_DELETE,
    perm::MEMBER_REMOVE,
    perm::ROLE_MANAGE,
];

// =============================================================================
// WORKSPACE SCOPE
// =============================================================================

/// Workspace-level role. Historical records may store `editor`/`viewer`;
/// those are read as synonyms of Member/Guest and never rewritten on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum WorkspaceRole {
    Owner,
    Admin,
    #[serde(alias = "editor", alias = "Editor")]
    Member,
    #[serde(alias = "viewer", alias = "Viewer")]
    Guest,
}

impl WorkspaceRole {
    pub const fn as_str(self) -> &'static str {
        match self {
            WorkspaceRole::Owner => "owner",
            WorkspaceRole::Admin => "admin",
            WorkspaceRole::Member => "member",
            WorkspaceRole::Guest => "guest",
        }
    }

    pub const fn capabilities(self) -> WorkspaceCapabilitySet {
        match self {
            WorkspaceRole::Owner => WS_OWNER_CAPABILITIES,
            WorkspaceRole::Admin => WS_ADMIN_CAPABILITIES,
            WorkspaceRole::Member => WS_MEMBER_CAPABILITIES,
            WorkspaceRole::Guest => WorkspaceCapabilitySet::NONE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub struct WorkspaceCapabilitySet {
    pub manage_workspace: bool,
    pub manage_members: bool,
    pub manage_groups: bool,
    pub create_projects: bool,
    pub delete_projects: bool,
    pub view_all_projects: bool,
}

impl WorkspaceCapabilitySet {
    pub const NONE: WorkspaceCapabilitySet = WorkspaceCapabilitySet {
        manage_workspace: false,
        manage_members: false,
        manage_groups: false,
        create_projects: false,
        delete_projects: false,
        view_all_projects: false,
    };

    pub const fn allows(&self, capability: WorkspaceCapability) -> bool {
        match capability {
            WorkspaceCapability::ManageWorkspace => self.manage_workspace,
            WorkspaceCapability::ManageMembers => self.manage_members,
            WorkspaceCapability::ManageGroups => self.manage_groups,
            WorkspaceCapability::CreateProjects => self.create_projects,
            WorkspaceCapability::DeleteProjects => self.delete_projects,
            WorkspaceCapability::ViewAllProjects => self.view_all_projects,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum WorkspaceCapability {
    ManageWorkspace,
    ManageMembers,
    ManageGroups,
    CreateProjects,
    DeleteProjects,
    ViewAllProjects,
}

const WS_OWNER_CAPABILITIES: WorkspaceCapabilitySet = WorkspaceCapabilitySet {
    manage_workspace: true,
    manage_members: true,
    manage_groups: true,
    create_projects: true,
    delete_projects: true,
    view_all_projects: true,
};

const WS_ADMIN_CAPABILITIES: WorkspaceCapabilitySet = WorkspaceCapabilitySet {
    manage_workspace: false,
    manage_members: true,
    manage_groups: true,
    create_projects: true,
    delete_projects: true,
    view_all_projects: true,
};

const WS_MEMBER_CAPABILITIES: WorkspaceCapabilitySet = WorkspaceCapabilitySet {
    manage_workspace: false,
    manage_members: false,
    manage_groups: false,
    create_projects: true,
    delete_projects: false,
    view_all_projects: false,
};
