//! Membership mutation values.
//!
//! # Responsibility
//! - Describe one add/remove operation on a project or team member set.
//! - Apply a batch of such operations to a scoped member set.
//!
//! # Invariants
//! - `Add` and `Remove` are idempotent.
//! - Changes apply in batch order; the last change for an id wins.
//! - `apply_member_changes` only touches the set it is given.

use crate::model::entity::EntityId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Direction of one membership mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Add,
    Remove,
}

/// One membership mutation, consumed by a mutation handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberChange {
    /// Serialized as `type` to match the request input naming.
    #[serde(rename = "type")]
    pub change: ChangeType,
    pub member: EntityId,
}

impl MemberChange {
    pub fn add(member: EntityId) -> Self {
        Self {
            change: ChangeType::Add,
            member,
        }
    }

    pub fn remove(member: EntityId) -> Self {
        Self {
            change: ChangeType::Remove,
            member,
        }
    }
}

/// Minimal response envelope for mutation endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationResult {
    pub success: bool,
}

impl MutationResult {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Applies `changes` in order to `members` and returns the resulting set.
pub fn apply_member_changes(
    mut members: BTreeSet<EntityId>,
    changes: &[MemberChange],
) -> BTreeSet<EntityId> {
    for change in changes {
        match change.change {
            ChangeType::Add => {
                members.insert(change.member);
            }
            ChangeType::Remove => {
                members.remove(&change.member);
            }
        }
    }
    members
}

#[cfg(test)]
mod tests {
    use super::{apply_member_changes, MemberChange, MutationResult};
    use std::collections::BTreeSet;
    use uuid::Uuid;

    #[test]
    fn add_twice_matches_add_once() {
        let member = Uuid::new_v4();
        let once = apply_member_changes(BTreeSet::new(), &[MemberChange::add(member)]);
        let twice = apply_member_changes(
            BTreeSet::new(),
            &[MemberChange::add(member), MemberChange::add(member)],
        );
        assert_eq!(once, twice);
        assert_eq!(once.len(), 1);
    }

    #[test]
    fn remove_absent_member_is_noop() {
        let present = Uuid::new_v4();
        let start = BTreeSet::from([present]);
        let result = apply_member_changes(start.clone(), &[MemberChange::remove(Uuid::new_v4())]);
        assert_eq!(result, start);
    }

    #[test]
    fn last_change_for_same_member_wins() {
        let member = Uuid::new_v4();
        let removed = apply_member_changes(
            BTreeSet::new(),
            &[MemberChange::add(member), MemberChange::remove(member)],
        );
        assert!(!removed.contains(&member));

        let added = apply_member_changes(
            BTreeSet::from([member]),
            &[MemberChange::remove(member), MemberChange::add(member)],
        );
        assert!(added.contains(&member));
    }

    #[test]
    fn member_change_serializes_with_type_key() {
        let member = Uuid::nil();
        let value = serde_json::to_value(MemberChange::remove(member)).expect("serialize");
        assert_eq!(value["type"], "remove");
        assert_eq!(value["member"], member.to_string());
    }

    #[test]
    fn mutation_result_serializes_success_flag() {
        let value = serde_json::to_value(MutationResult::ok()).expect("serialize");
        assert_eq!(value, serde_json::json!({ "success": true }));
    }
}
