//! Membership normalizer: bridges the legacy flat member-id array and the
//! structured per-member record without mutating stored data. Decoding picks
//! the right shape once, at the storage boundary; nothing downstream branches
//! on "string or object".

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::catalog::LegacyRole;
use super::role_value::RoleValue;

/// One project membership record. The owner is never present here; ownership
/// is tracked by the project's `owner_id` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ProjectMember {
    pub user_id: Uuid,
    #[schema(value_type = String, example = "editor")]
    pub role: RoleValue,
    pub joined_at: DateTime<Utc>,
    pub invited_by: Uuid,
}

/// A project's member list as persisted: structured records, or the
/// pre-migration flat id array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum MemberList {
    Structured(Vec<ProjectMember>),
    Flat(Vec<Uuid>),
}

impl Default for MemberList {
    fn default() -> Self {
        MemberList::Structured(Vec::new())
    }
}

impl MemberList {
    pub fn is_empty(&self) -> bool {
        match self {
            MemberList::Structured(members) => members.is_empty(),
            MemberList::Flat(ids) => ids.is_empty(),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            MemberList::Structured(members) => members.len(),
            MemberList::Flat(ids) => ids.len(),
        }
    }
}

/// Normalize a member list to structured records.
///
/// Structured input comes back unchanged. A flat id list is mapped to
/// structured records with role Editor (the historical default for
/// pre-migration membership), a join timestamp of now (the original join
/// time is unrecoverable), and the owner as inviter. Entries equal to
/// `owner_id` are stripped. Read-time only; callers decide whether to write
/// the result back.
pub fn migrate_members_to_roles(members: &MemberList, owner_id: Uuid) -> Vec<ProjectMember> {
    match members {
        MemberList::Structured(records) => records.clone(),
        MemberList::Flat(ids) => {
            let now = Utc::now();
            ids.iter()
                .filter(|id| **id != owner_id)
                .map(|id| ProjectMember {
                    user_id: *id,
                    role: RoleValue::Legacy(LegacyRole::Editor),
                    joined_at: now,
                    invited_by: owner_id,
                })
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flat_list_migrates_to_editor_records_without_owner() {
        let owner = Uuid::new_v4();
        let member = Uuid::new_v4();
        let flat = MemberList::Flat(vec![member, owner]);

        let migrated = migrate_members_to_roles(&flat, owner);
        assert_eq!(migrated.len(), 1);
        assert_eq!(migrated[0].user_id, member);
        assert_eq!(migrated[0].role, RoleValue::Legacy(LegacyRole::Editor));
        assert_eq!(migrated[0].invited_by, owner);
    }

    #[test]
    fn structured_list_passes_through_unchanged() {
        let owner = Uuid::new_v4();
        let record = ProjectMember {
            user_id: Uuid::new_v4(),
            role: RoleValue::Custom("role_1_ab".into()),
            joined_at: Utc::now(),
            invited_by: owner,
        };
        let structured = MemberList::Structured(vec![record.clone()]);

        assert_eq!(migrate_members_to_roles(&structured, owner), vec![record]);
    }

    #[test]
    fn decodes_flat_and_structured_shapes() {
        let id = Uuid::new_v4();
        let flat: MemberList = serde_json::from_value(serde_json::json!([id])).unwrap();
        assert_eq!(flat, MemberList::Flat(vec![id]));

        let structured: MemberList = serde_json::from_value(serde_json::json!([{
            "user_id": id,
            "role": "viewer",
            "joined_at": Utc::now(),
            "invited_by": id,
        }]))
        .unwrap();
        assert!(matches!(structured, MemberList::Structured(ref m) if m.len() == 1));
    }

    #[test]
    fn empty_list_decodes_and_reports_empty() {
        let empty: MemberList = serde_json::from_str("[]").unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.len(), 0);
    }
}
