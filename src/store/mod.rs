//! Storage collaborator consumed by the authorization engine.
//!
//! The engine never reaches into the database directly; it reads snapshots
//! through this trait and writes the custom-role list back as a whole
//! (read-modify-write, list replacement). Two concurrent writers race as
//! last-write-wins; callers needing stronger guarantees serialize writes
//! externally.

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppResult;
use crate::models::project::Project;
use crate::models::role::CustomRole;
use crate::models::workspace::Workspace;

mod sqlite;

pub use sqlite::SqliteStore;

#[async_trait]
pub trait AuthzStore: Send + Sync {
    /// Fetch a workspace document. `NotFound` if it does not exist.
    async fn get_workspace(&self, id: Uuid) -> AppResult<Workspace>;

    /// Fetch a project document, including `owner_id` and the member list.
    /// `NotFound` if it does not exist.
    async fn get_project(&self, id: Uuid) -> AppResult<Project>;

    /// The workspace's custom roles, in storage order. A missing workspace or
    /// missing list yields an empty vec, never an error: an empty workspace
    /// has no custom roles by definition.
    async fn list_custom_roles(&self, workspace_id: Uuid) -> AppResult<Vec<CustomRole>>;

    /// Replace the workspace's custom-role list wholesale.
    async fn write_custom_roles(&self, workspace_id: Uuid, roles: &[CustomRole]) -> AppResult<()>;

    /// The role id assigned to new project invitees, if configured.
    async fn default_role_id(&self, workspace_id: Uuid) -> AppResult<Option<String>>;

    /// Set or clear the default-role pointer.
    async fn set_default_role_id(&self, workspace_id: Uuid, role_id: Option<&str>) -> AppResult<()>;
}
