//! SQLite implementation of [`AuthzStore`]. Workspace and project documents
//! keep their list-valued fields (members, custom roles) as JSON columns,
//! matching the document-store shape the engine expects: reads decode a
//! snapshot, writes replace a whole list.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::AuthzStore;
use crate::authz::membership::MemberList;
use crate::errors::{AppError, AppResult};
use crate::models::project::Project;
use crate::models::role::CustomRole;
use crate::models::workspace::{Workspace, WorkspaceMember};

#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn insert_workspace(&self, workspace: &Workspace) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO workspaces (id, name, owner_id, members, custom_roles, default_role_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(workspace.id)
        .bind(&workspace.name)
        .bind(workspace.owner_id)
        .bind(to_json(&workspace.members)?)
        .bind(to_json(&workspace.custom_roles)?)
        .bind(&workspace.default_role_id)
        .bind(workspace.created_at)
        .bind(workspace.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Replace the workspace's member list. Full-list write, same model as
    /// the custom-role list.
    pub async fn write_workspace_members(
        &self,
        workspace_id: Uuid,
        members: &[WorkspaceMember],
    ) -> AppResult<()> {
        let affected = sqlx::query("UPDATE workspaces SET members = ?, updated_at = ? WHERE id = ?")
            .bind(to_json(&members)?)
            .bind(Utc::now())
            .bind(workspace_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if affected == 0 {
            return Err(AppError::not_found("workspace not found"));
        }
        Ok(())
    }

    pub async fn insert_project(&self, project: &Project) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO projects (id, workspace_id, owner_id, name, description, members, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(project.id)
        .bind(project.workspace_id)
        .bind(project.owner_id)
        .bind(&project.name)
        .bind(&project.description)
        .bind(to_json(&project.members)?)
        .bind(project.created_at)
        .bind(project.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Replace the project's member list.
    pub async fn write_project_members(
        &self,
        project_id: Uuid,
        members: &MemberList,
    ) -> AppResult<()> {
        let affected = sqlx::query("UPDATE projects SET members = ?, updated_at = ? WHERE id = ?")
            .bind(to_json(members)?)
            .bind(Utc::now())
            .bind(project_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if affected == 0 {
            return Err(AppError::not_found("project not found"));
        }
        Ok(())
    }
}

#[async_trait]
impl AuthzStore for SqliteStore {
    async fn get_workspace(&self, id: Uuid) -> AppResult<Workspace> {
        let row = sqlx::query(
            "SELECT id, name, owner_id, members, custom_roles, default_role_id, created_at, updated_at FROM workspaces WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::not_found("workspace not found"))?;

        workspace_from_row(&row)
    }

    async fn get_project(&self, id: Uuid) -> AppResult<Project> {
        let row = sqlx::query(
            "SELECT id, workspace_id, owner_id, name, description, members, created_at, updated_at FROM projects WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::not_found("project not found"))?;

        project_from_row(&row)
    }

    async fn list_custom_roles(&self, workspace_id: Uuid) -> AppResult<Vec<CustomRole>> {
        let raw: Option<String> =
            sqlx::query_scalar("SELECT custom_roles FROM workspaces WHERE id = ?")
                .bind(workspace_id)
                .fetch_optional(&self.pool)
                .await?;

        // Missing workspace, missing column value, or undecodable JSON all
        // read as "no custom roles"; the read path never errors here.
        Ok(raw
            .map(|json| decode_roles(workspace_id, &json))
            .unwrap_or_default())
    }

    async fn write_custom_roles(&self, workspace_id: Uuid, roles: &[CustomRole]) -> AppResult<()> {
        let affected =
            sqlx::query("UPDATE workspaces SET custom_roles = ?, updated_at = ? WHERE id = ?")
                .bind(to_json(&roles)?)
                .bind(Utc::now())
                .bind(workspace_id)
                .execute(&self.pool)
                .await?
                .rows_affected();

        if affected == 0 {
            return Err(AppError::not_found("workspace not found"));
        }
        Ok(())
    }

    async fn default_role_id(&self, workspace_id: Uuid) -> AppResult<Option<String>> {
        let value: Option<Option<String>> =
            sqlx::query_scalar("SELECT default_role_id FROM workspaces WHERE id = ?")
                .bind(workspace_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(value.flatten())
    }

    async fn set_default_role_id(
        &self,
        workspace_id: Uuid,
        role_id: Option<&str>,
    ) -> AppResult<()> {
        let affected =
            sqlx::query("UPDATE workspaces SET default_role_id = ?, updated_at = ? WHERE id = ?")
                .bind(role_id)
                .bind(Utc::now())
                .bind(workspace_id)
                .execute(&self.pool)
                .await?
                .rows_affected();

        if affected == 0 {
            return Err(AppError::not_found("workspace not found"));
        }
        Ok(())
    }
}

fn workspace_from_row(row: &SqliteRow) -> AppResult<Workspace> {
    let id: Uuid = row.get("id");
    let members_json: String = row.get("members");
    let roles_json: String = row.get("custom_roles");

    Ok(Workspace {
        id,
        name: row.get("name"),
        owner_id: row.get("owner_id"),
        members: serde_json::from_str(&members_json).unwrap_or_default(),
        custom_roles: decode_roles(id, &roles_json),
        default_role_id: row.get("default_role_id"),
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
        updated_at: row.get::<DateTime<Utc>, _>("updated_at"),
    })
}

fn project_from_row(row: &SqliteRow) -> AppResult<Project> {
    let members_json: String = row.get("members");

    Ok(Project {
        id: row.get("id"),
        workspace_id: row.get("workspace_id"),
        owner_id: row.get("owner_id"),
        name: row.get("name"),
        description: row.get("description"),
        members: serde_json::from_str::<MemberList>(&members_json).unwrap_or_default(),
        created_at: row.get::<DateTime<Utc>, _>("created_at"),
        updated_at: row.get::<DateTime<Utc>, _>("updated_at"),
    })
}

fn decode_roles(workspace_id: Uuid, json: &str) -> Vec<CustomRole> {
    match serde_json::from_str(json) {
        Ok(roles) => roles,
        Err(err) => {
            tracing::warn!(%workspace_id, %err, "undecodable custom_roles column, treating as empty");
            Vec::new()
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> AppResult<String> {
    serde_json::to_string(value).map_err(|err| AppError::internal(format!("encode document: {err}")))
}
