//! Permission resolver: the single authority translating a role value into a
//! capability set (coarse) or permission set (fine), and answering checks.
//!
//! Evaluation order for both paths:
//! 1. project owner -> allow, before any membership lookup
//! 2. membership record -> role value -> capability/permission lookup
//! 3. deny
//!
//! The coarse capability path needs no custom-role list and is sufficient for
//! most UI gating; the fine permission path is required wherever a tenant has
//! defined custom roles. An unresolvable role is never an error: checks run
//! continuously during rendering and must deny, not throw.

use uuid::Uuid;

use super::catalog::{Capability, CapabilitySet, LegacyRole};
use super::membership::MemberList;
use super::role_value::RoleValue;
use crate::models::project::Project;
use crate::models::role::CustomRole;

/// Resolve the caller's role within a project.
///
/// The owner is always `owner`, short-circuiting before the member list is
/// consulted (stray owner entries in the list are ignored). A flat-list entry
/// resolves to the historical pre-migration default of `editor`. A structured
/// entry resolves to its stored role value as-is, which may be a custom-role
/// id left for [`resolve_permissions`].
pub fn get_user_role(project: &Project, user_id: Uuid) -> Option<RoleValue> {
    if project.owner_id == user_id {
        return Some(RoleValue::Legacy(LegacyRole::Owner));
    }

    match &project.members {
        MemberList::Flat(ids) => ids
            .contains(&user_id)
            .then_some(RoleValue::Legacy(LegacyRole::Editor)),
        MemberList::Structured(records) => records
            .iter()
            .find(|member| member.user_id == user_id)
            .map(|member| member.role.clone()),
    }
}

/// Expand a role value into its permission set.
///
/// Legacy literals map to their fixed lists. A custom role's permissions are
/// authoritative and exhaustive on their own; they are never merged with a
/// legacy template. A role id with no matching entry (deleted role, stale
/// reference) falls back to the Viewer list: fail closed, not an error.
pub fn resolve_permissions(custom_roles: &[CustomRole], role: &RoleValue) -> Vec<String> {
    match role {
        RoleValue::Legacy(legacy) => to_owned_list(legacy.permission_list()),
        RoleValue::Custom(id) => match custom_roles.iter().find(|r| r.id == *id) {
            Some(custom) => custom.permissions.clone(),
            None => {
                tracing::debug!(role_id = %id, "unresolvable custom role, using viewer fallback");
                to_owned_list(LegacyRole::Viewer.permission_list())
            }
        },
    }
}

/// Resolve the caller's coarse capability set.
///
/// Only legacy roles carry capability sets; a custom role value yields the
/// all-false set on this path (custom roles are consulted exclusively by the
/// permission path). No resolvable role likewise yields all-false.
pub fn resolve_capabilities(project: &Project, user_id: Uuid) -> CapabilitySet {
    match get_user_role(project, user_id) {
        Some(RoleValue::Legacy(role)) => role.capabilities(),
        Some(RoleValue::Custom(_)) | None => CapabilitySet::NONE,
    }
}

/// Fine-grained check: owner, or the resolved permission set contains `permission`.
pub fn check_permission(
    project: &Project,
    user_id: Uuid,
    permission: &str,
    custom_roles: &[CustomRole],
) -> bool {
    if project.owner_id == user_id {
        return true;
    }

    let Some(role) = get_user_role(project, user_id) else {
        tracing::debug!(%user_id, project_id = %project.id, %permission, "permission denied: no role");
        return false;
    };

    let allowed = resolve_permissions(custom_roles, &role)
        .iter()
        .any(|granted| granted == permission);
    if !allowed {
        tracing::debug!(%user_id, project_id = %project.id, %permission, role = %role, "permission denied");
    }
    allowed
}

/// Coarse check: owner, or the resolved capability set allows `capability`.
pub fn check_capability(project: &Project, user_id: Uuid, capability: Capability) -> bool {
    if project.owner_id == user_id {
        return true;
    }
    resolve_capabilities(project, user_id).allows(capability)
}

fn to_owned_list(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| (*s).to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::membership::ProjectMember;
    use crate::authz::permissions;
    use chrono::Utc;

    fn project(owner_id: Uuid, members: MemberList) -> Project {
        Project {
            id: Uuid::new_v4(),
            workspace_id: Uuid::new_v4(),
            owner_id,
            name: "Launch Planning".into(),
            description: None,
            members,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn member(user_id: Uuid, role: RoleValue) -> ProjectMember {
        ProjectMember {
            user_id,
            role,
            joined_at: Utc::now(),
            invited_by: Uuid::new_v4(),
        }
    }

    fn custom_role(id: &str, permissions: &[&str]) -> CustomRole {
        CustomRole {
            id: id.into(),
            name: "Campaign Writer".into(),
            color: "#e67e22".into(),
            permissions: permissions.iter().map(|s| s.to_string()).collect(),
            is_default: false,
            position: 0,
        }
    }

    #[test]
    fn owner_resolves_to_owner_before_membership_lookup() {
        let owner = Uuid::new_v4();
        // Conflicting entry for the owner in the member list is ignored.
        let members = MemberList::Structured(vec![member(
            owner,
            RoleValue::Legacy(LegacyRole::Viewer),
        )]);
        let project = project(owner, members);

        assert_eq!(
            get_user_role(&project, owner),
            Some(RoleValue::Legacy(LegacyRole::Owner))
        );
    }

    #[test]
    fn flat_entry_resolves_to_editor() {
        let owner = Uuid::new_v4();
        let user = Uuid::new_v4();
        let project = project(owner, MemberList::Flat(vec![user]));

        assert_eq!(
            get_user_role(&project, user),
            Some(RoleValue::Legacy(LegacyRole::Editor))
        );
    }

    #[test]
    fn structured_entry_resolves_to_stored_value() {
        let owner = Uuid::new_v4();
        let user = Uuid::new_v4();
        let members = MemberList::Structured(vec![member(
            user,
            RoleValue::Custom("role_7_aa".into()),
        )]);
        let project = project(owner, members);

        assert_eq!(
            get_user_role(&project, user),
            Some(RoleValue::Custom("role_7_aa".into()))
        );
    }

    #[test]
    fn no_match_resolves_to_none() {
        let project = project(Uuid::new_v4(), MemberList::default());
        assert_eq!(get_user_role(&project, Uuid::new_v4()), None);
    }

    #[test]
    fn custom_role_permissions_are_verbatim_not_merged() {
        let roles = vec![custom_role("role_1_aa", &[permissions::TASK_CREATE])];
        let resolved = resolve_permissions(&roles, &RoleValue::Custom("role_1_aa".into()));
        assert_eq!(resolved, vec![permissions::TASK_CREATE.to_string()]);
    }

    #[test]
    fn stale_role_reference_falls_back_to_viewer_list() {
        let resolved = resolve_permissions(&[], &RoleValue::Custom("role_deleted_123".into()));
        let viewer: Vec<String> = LegacyRole::Viewer
            .permission_list()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(resolved, viewer);
    }

    #[test]
    fn capability_path_ignores_custom_roles() {
        let owner = Uuid::new_v4();
        let user = Uuid::new_v4();
        let members = MemberList::Structured(vec![member(
            user,
            RoleValue::Custom("role_1_aa".into()),
        )]);
        let project = project(owner, members);

        assert_eq!(resolve_capabilities(&project, user), CapabilitySet::NONE);
        assert!(!check_capability(&project, user, Capability::View));
    }

    #[test]
    fn owner_passes_both_paths_regardless_of_member_list() {
        let owner = Uuid::new_v4();
        for members in [
            MemberList::default(),
            MemberList::Flat(vec![owner]),
            MemberList::Structured(vec![member(owner, RoleValue::Legacy(LegacyRole::Viewer))]),
        ] {
            let project = project(owner, members);
            assert!(check_capability(&project, owner, Capability::Delete));
            assert!(check_permission(&project, owner, permissions::ROLE_MANAGE, &[]));
        }
    }

    #[test]
    fn non_member_is_denied_on_both_paths() {
        let project = project(Uuid::new_v4(), MemberList::default());
        let stranger = Uuid::new_v4();
        assert!(!check_capability(&project, stranger, Capability::View));
        assert!(!check_permission(&project, stranger, permissions::PROJECT_READ, &[]));
    }

    #[test]
    fn editor_member_checks_match_the_legacy_matrix() {
        let owner = Uuid::new_v4();
        let user = Uuid::new_v4();
        let project = project(owner, MemberList::Flat(vec![user]));

        assert!(check_capability(&project, user, Capability::Edit));
        assert!(!check_capability(&project, user, Capability::Delete));
        assert!(check_permission(&project, user, permissions::TASK_CREATE, &[]));
        assert!(!check_permission(&project, user, permissions::PROJECT_DELETE, &[]));
    }
}
