//! Custom-role catalog operations: the mutating half of the role system.
//!
//! Every mutation is a read-modify-write over the tenant's whole role list
//! (snapshot in, full list out), so a lost update under concurrent writers is
//! one operation's effect being overwritten, never a malformed list. Mutation
//! failures are loud (`NotFound`, `BadRequest`); reads stay silent.

use chrono::Utc;
use uuid::Uuid;

use super::permissions;
use crate::errors::{AppError, AppResult};
use crate::models::role::{CustomRole, RoleCreateRequest, RoleUpdateRequest};
use crate::store::AuthzStore;

pub struct RoleCatalog<'a> {
    store: &'a dyn AuthzStore,
}

impl<'a> RoleCatalog<'a> {
    pub fn new(store: &'a dyn AuthzStore) -> Self {
        Self { store }
    }

    /// The tenant's custom roles. Empty for a workspace with none (or a
    /// missing workspace record); storage order, callers sort for display.
    pub async fn list(&self, workspace_id: Uuid) -> AppResult<Vec<CustomRole>> {
        self.store.list_custom_roles(workspace_id).await
    }

    /// Create a role with a fresh id, positioned after all existing roles.
    /// The default flag is never set at creation.
    pub async fn create(
        &self,
        workspace_id: Uuid,
        req: RoleCreateRequest,
    ) -> AppResult<CustomRole> {
        validate_permission_keys(&req.permissions)?;

        let mut roles = self.store.list_custom_roles(workspace_id).await?;
        let role = CustomRole {
            id: new_role_id(&roles),
            name: req.name,
            color: req.color,
            permissions: req.permissions,
            is_default: false,
            position: roles.iter().map(|r| r.position + 1).max().unwrap_or(0),
        };
        roles.push(role.clone());
        self.store.write_custom_roles(workspace_id, &roles).await?;

        tracing::info!(%workspace_id, role_id = %role.id, "custom role created");
        Ok(role)
    }

    /// Merge partial fields into the role with the given id.
    ///
    /// Setting `is_default = true` clears the flag on every sibling within
    /// the same list write; there is no observable state with two defaults.
    /// The tenant default-role pointer is kept in step with the flag.
    pub async fn update(
        &self,
        workspace_id: Uuid,
        role_id: &str,
        req: RoleUpdateRequest,
    ) -> AppResult<CustomRole> {
        if let Some(keys) = &req.permissions {
            validate_permission_keys(keys)?;
        }

        let mut roles = self.store.list_custom_roles(workspace_id).await?;
        let index = roles
            .iter()
            .position(|r| r.id == role_id)
            .ok_or_else(|| AppError::not_found("role not found"))?;

        if req.is_default == Some(true) {
            for role in roles.iter_mut() {
                role.is_default = false;
            }
        }

        let role = &mut roles[index];
        if let Some(name) = req.name {
            role.name = name;
        }
        if let Some(color) = req.color {
            role.color = color;
        }
        if let Some(permissions) = req.permissions {
            role.permissions = permissions;
        }
        if let Some(is_default) = req.is_default {
            role.is_default = is_default;
        }
        if let Some(position) = req.position {
            role.position = position;
        }
        let updated = role.clone();

        self.store.write_custom_roles(workspace_id, &roles).await?;

        match req.is_default {
            Some(true) => {
                self.store
                    .set_default_role_id(workspace_id, Some(&updated.id))
                    .await?;
            }
            Some(false) => {
                if self.store.default_role_id(workspace_id).await? == Some(updated.id.clone()) {
                    self.store.set_default_role_id(workspace_id, None).await?;
                }
            }
            None => {}
        }

        tracing::info!(%workspace_id, %role_id, "custom role updated");
        Ok(updated)
    }

    /// Remove the role from the tenant's list. Memberships still referencing
    /// the id are left alone; they resolve to the Viewer fallback from then
    /// on. Returns the removed role for audit logging.
    pub async fn delete(&self, workspace_id: Uuid, role_id: &str) -> AppResult<CustomRole> {
        let mut roles = self.store.list_custom_roles(workspace_id).await?;
        let index = roles
            .iter()
            .position(|r| r.id == role_id)
            .ok_or_else(|| AppError::not_found("role not found"))?;

        let removed = roles.remove(index);
        self.store.write_custom_roles(workspace_id, &roles).await?;

        tracing::info!(%workspace_id, %role_id, "custom role deleted");
        Ok(removed)
    }

    /// Rewrite each listed role's position to its index in `ordered_ids`.
    /// Roles absent from the list keep their prior position; unknown ids are
    /// ignored. Idempotent.
    pub async fn reorder(
        &self,
        workspace_id: Uuid,
        ordered_ids: &[String],
    ) -> AppResult<Vec<CustomRole>> {
        let mut roles = self.store.list_custom_roles(workspace_id).await?;
        for role in roles.iter_mut() {
            if let Some(index) = ordered_ids.iter().position(|id| *id == role.id) {
                role.position = index as i64;
            }
        }
        self.store.write_custom_roles(workspace_id, &roles).await?;
        Ok(roles)
    }

    pub async fn default_role_id(&self, workspace_id: Uuid) -> AppResult<Option<String>> {
        self.store.default_role_id(workspace_id).await
    }

    /// Point the tenant's default role at `role_id`, or clear it. The
    /// `is_default` flags on the role list are kept in step.
    pub async fn set_default_role_id(
        &self,
        workspace_id: Uuid,
        role_id: Option<&str>,
    ) -> AppResult<()> {
        let mut roles = self.store.list_custom_roles(workspace_id).await?;
        if let Some(id) = role_id {
            if !roles.iter().any(|r| r.id == id) {
                return Err(AppError::not_found("role not found"));
            }
        }
        for role in roles.iter_mut() {
            role.is_default = role_id == Some(role.id.as_str());
        }
        self.store.write_custom_roles(workspace_id, &roles).await?;
        self.store.set_default_role_id(workspace_id, role_id).await
    }
}

/// Generate a role id unique within the supplied snapshot: millisecond
/// timestamp plus a random suffix, re-drawn on collision.
fn new_role_id(existing: &[CustomRole]) -> String {
    loop {
        let suffix = &Uuid::new_v4().simple().to_string()[..8];
        let candidate = format!("role_{}_{}", Utc::now().timestamp_millis(), suffix);
        if !existing.iter().any(|r| r.id == candidate) {
            return candidate;
        }
    }
}

fn validate_permission_keys(keys: &[String]) -> AppResult<()> {
    for key in keys {
        if !permissions::is_known(key) {
            return Err(AppError::bad_request(format!("unknown permission key: {key}")));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::project::Project;
    use crate::models::workspace::Workspace;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Minimal in-memory store: just enough state for catalog operations.
    #[derive(Default)]
    struct MemStore {
        roles: Mutex<HashMap<Uuid, Vec<CustomRole>>>,
        defaults: Mutex<HashMap<Uuid, String>>,
    }

    #[async_trait]
    impl AuthzStore for MemStore {
        async fn get_workspace(&self, _id: Uuid) -> AppResult<Workspace> {
            Err(AppError::not_found("workspace not found"))
        }

        async fn get_project(&self, _id: Uuid) -> AppResult<Project> {
            Err(AppError::not_found("project not found"))
        }

        async fn list_custom_roles(&self, workspace_id: Uuid) -> AppResult<Vec<CustomRole>> {
            Ok(self
                .roles
                .lock()
                .unwrap()
                .get(&workspace_id)
                .cloned()
                .unwrap_or_default())
        }

        async fn write_custom_roles(
            &self,
            workspace_id: Uuid,
            roles: &[CustomRole],
        ) -> AppResult<()> {
            self.roles
                .lock()
                .unwrap()
                .insert(workspace_id, roles.to_vec());
            Ok(())
        }

        async fn default_role_id(&self, workspace_id: Uuid) -> AppResult<Option<String>> {
            Ok(self.defaults.lock().unwrap().get(&workspace_id).cloned())
        }

        async fn set_default_role_id(
            &self,
            workspace_id: Uuid,
            role_id: Option<&str>,
        ) -> AppResult<()> {
            let mut defaults = self.defaults.lock().unwrap();
            match role_id {
                Some(id) => defaults.insert(workspace_id, id.to_string()),
                None => defaults.remove(&workspace_id),
            };
            Ok(())
        }
    }

    fn create_req(name: &str) -> RoleCreateRequest {
        RoleCreateRequest {
            name: name.into(),
            color: "#3498db".into(),
            permissions: vec!["project.read".into(), "task.create".into()],
        }
    }

    #[tokio::test]
    async fn list_is_empty_for_unknown_workspace() {
        let store = MemStore::default();
        let catalog = RoleCatalog::new(&store);
        assert!(catalog.list(Uuid::new_v4()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_then_list_round_trips() {
        let store = MemStore::default();
        let catalog = RoleCatalog::new(&store);
        let ws = Uuid::new_v4();

        let created = catalog.create(ws, create_req("Campaign Writer")).await.unwrap();
        assert!(!created.is_default);
        assert_eq!(created.position, 0);

        let listed = catalog.list(ws).await.unwrap();
        assert_eq!(listed, vec![created.clone()]);
        assert_eq!(listed[0].name, "Campaign Writer");
        assert_eq!(listed[0].color, "#3498db");
        assert_eq!(listed[0].permissions, vec!["project.read", "task.create"]);
    }

    #[tokio::test]
    async fn created_ids_are_unique_and_positions_increase() {
        let store = MemStore::default();
        let catalog = RoleCatalog::new(&store);
        let ws = Uuid::new_v4();

        let a = catalog.create(ws, create_req("A")).await.unwrap();
        let b = catalog.create(ws, create_req("B")).await.unwrap();
        assert_ne!(a.id, b.id);
        assert!(b.position > a.position);
    }

    #[tokio::test]
    async fn create_rejects_unknown_permission_keys() {
        let store = MemStore::default();
        let catalog = RoleCatalog::new(&store);
        let req = RoleCreateRequest {
            name: "Broken".into(),
            color: "#000".into(),
            permissions: vec!["task.explode".into()],
        };

        let err = catalog.create(Uuid::new_v4(), req).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[tokio::test]
    async fn setting_default_clears_sibling_flags() {
        let store = MemStore::default();
        let catalog = RoleCatalog::new(&store);
        let ws = Uuid::new_v4();

        let a = catalog.create(ws, create_req("A")).await.unwrap();
        let b = catalog.create(ws, create_req("B")).await.unwrap();

        let update = RoleUpdateRequest { is_default: Some(true), ..Default::default() };
        catalog.update(ws, &a.id, update).await.unwrap();

        let update = RoleUpdateRequest { is_default: Some(true), ..Default::default() };
        catalog.update(ws, &b.id, update).await.unwrap();

        let roles = catalog.list(ws).await.unwrap();
        let defaults: Vec<_> = roles.iter().filter(|r| r.is_default).collect();
        assert_eq!(defaults.len(), 1);
        assert_eq!(defaults[0].id, b.id);
        assert_eq!(catalog.default_role_id(ws).await.unwrap(), Some(b.id));
    }

    #[tokio::test]
    async fn update_missing_role_is_not_found() {
        let store = MemStore::default();
        let catalog = RoleCatalog::new(&store);
        let err = catalog
            .update(Uuid::new_v4(), "role_gone", RoleUpdateRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_removes_role_and_missing_delete_is_not_found() {
        let store = MemStore::default();
        let catalog = RoleCatalog::new(&store);
        let ws = Uuid::new_v4();

        let role = catalog.create(ws, create_req("A")).await.unwrap();
        catalog.delete(ws, &role.id).await.unwrap();
        assert!(catalog.list(ws).await.unwrap().is_empty());

        let err = catalog.delete(ws, &role.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn reorder_is_idempotent_and_tolerates_partial_lists() {
        let store = MemStore::default();
        let catalog = RoleCatalog::new(&store);
        let ws = Uuid::new_v4();

        let a = catalog.create(ws, create_req("A")).await.unwrap();
        let b = catalog.create(ws, create_req("B")).await.unwrap();
        let c = catalog.create(ws, create_req("C")).await.unwrap();

        // Reorder mentioning only two roles: c keeps its prior position.
        let order = vec![b.id.clone(), a.id.clone()];
        let first = catalog.reorder(ws, &order).await.unwrap();
        let second = catalog.reorder(ws, &order).await.unwrap();
        assert_eq!(first, second);

        let positions: HashMap<_, _> =
            second.iter().map(|r| (r.id.clone(), r.position)).collect();
        assert_eq!(positions[&b.id], 0);
        assert_eq!(positions[&a.id], 1);
        assert_eq!(positions[&c.id], c.position);
    }

    #[tokio::test]
    async fn set_default_pointer_validates_and_syncs_flags() {
        let store = MemStore::default();
        let catalog = RoleCatalog::new(&store);
        let ws = Uuid::new_v4();

        let role = catalog.create(ws, create_req("A")).await.unwrap();

        let err = catalog.set_default_role_id(ws, Some("role_gone")).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        catalog.set_default_role_id(ws, Some(&role.id)).await.unwrap();
        assert!(catalog.list(ws).await.unwrap()[0].is_default);

        catalog.set_default_role_id(ws, None).await.unwrap();
        assert!(!catalog.list(ws).await.unwrap()[0].is_default);
        assert_eq!(catalog.default_role_id(ws).await.unwrap(), None);
    }
}
