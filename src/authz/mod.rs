//! Authorization resolution engine.
//!
//! Decides, for any (user, workspace, project, capability) tuple, whether an
//! action is permitted. Three permission models coexist in stored data:
//! - the legacy Owner/Editor/Viewer matrix with hard-coded capability grants,
//! - workspace-scoped custom roles carrying fine-grained permission keys,
//! - the pre-migration flat member-id array alongside structured membership
//!   records.
//!
//! Resolution is a pure computation over a fetched snapshot: the catalog
//! tables are constants, the tenant's custom-role list is loaded once per
//! scope, and every check (`can`, `has_permission`) is synchronous. Read-path
//! ambiguity (deleted role id, missing list, unknown member) degrades to the
//! least-privileged outcome instead of erroring; only mutations fail loud.

pub mod catalog;
pub mod gate;
pub mod membership;
pub mod resolver;
pub mod role_value;
pub mod roles;

pub use catalog::{
    Capability, CapabilitySet, LegacyRole, WorkspaceCapability, WorkspaceCapabilitySet,
    WorkspaceRole,
};
pub use gate::{ProjectGate, WorkspaceGate};
pub use membership::{migrate_members_to_roles, MemberList, ProjectMember};
pub use role_value::RoleValue;
pub use roles::RoleCatalog;

/// The fixed permission vocabulary grantable through custom roles.
pub mod permissions {
    // Project
    pub const PROJECT_READ: &str = "project.read";
    pub const PROJECT_UPDATE: &str = "project.update";
    pub const PROJECT_DELETE: &str = "project.delete";

    // Task
    pub const TASK_CREATE: &str = "task.create";
    pub const TASK_UPDATE: &str = "task.update";
    pub const TASK_DELETE: &str = "task.delete";

    // Idea
    pub const IDEA_CREATE: &str = "idea.create";
    pub const IDEA_UPDATE: &str = "idea.update";
    pub const IDEA_DELETE: &str = "idea.delete";

    // Issue
    pub const ISSUE_CREATE: &str = "issue.create";
    pub const ISSUE_UPDATE: &str = "issue.update";
    pub const ISSUE_DELETE: &str = "issue.delete";

    // Group
    pub const GROUP_CREATE: &str = "group.create";
    pub const GROUP_UPDATE: &str = "group.update";
    pub const GROUP_DELETE: &str = "group.delete";

    // Comment
    pub const COMMENT_CREATE: &str = "comment.create";

    // Membership
    pub const MEMBER_INVITE: &str = "member.invite";
    pub const MEMBER_REMOVE: &str = "member.remove";

    // Role administration
    pub const ROLE_MANAGE: &str = "role.manage";

    /// Every grantable permission key. Custom-role writes are validated
    /// against this list.
    pub const ALL: &[&str] = &[
        PROJECT_READ,
        PROJECT_UPDATE,
        PROJECT_DELETE,
        TASK_CREATE,
        TASK_UPDATE,
        TASK_DELETE,
        IDEA_CREATE,
        IDEA_UPDATE,
        IDEA_DELETE,
        ISSUE_CREATE,
        ISSUE_UPDATE,
        ISSUE_DELETE,
        GROUP_CREATE,
        GROUP_UPDATE,
        GROUP_DELETE,
        COMMENT_CREATE,
        MEMBER_INVITE,
        MEMBER_REMOVE,
        ROLE_MANAGE,
    ];

    pub fn is_known(key: &str) -> bool {
        ALL.contains(&key)
    }
}
