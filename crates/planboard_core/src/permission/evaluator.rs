//! Permission evaluation against the entity graph.
//!
//! # Responsibility
//! - Resolve the entity named by a permission's argument.
//! - Apply the permission's rule to the caller.
//!
//! # Invariants
//! - Every case that cannot be decided (no caller, missing argument, unknown
//!   entity) evaluates to `Ok(false)`.
//! - Storage failures propagate as `Err` and are never folded into denial.
//! - Membership through links is one hop: only the checked entity's own
//!   links are consulted, never the links of linked entities.

use crate::auth::request::{Identity, RequestArguments};
use crate::model::entity::EntityId;
use crate::permission::variant::{Permission, PermissionKind};
use crate::repo::entity_repo::{EntityStore, RepoResult};
use log::{debug, error};

/// Evaluates permissions through an entity store.
pub struct PermissionEvaluator<S: EntityStore> {
    store: S,
}

impl<S: EntityStore> PermissionEvaluator<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Decides `permission` for `caller` against `arguments`.
    ///
    /// # Errors
    /// - Returns the store's error when a lookup fails.
    pub fn evaluate(
        &self,
        caller: Option<&Identity>,
        arguments: &RequestArguments,
        permission: &Permission,
    ) -> RepoResult<bool> {
        let Some(caller) = caller else {
            debug!(
                "event=permission_check module=permission status=deny kind={} reason=unauthenticated",
                permission.kind.as_str()
            );
            return Ok(false);
        };
        let Some(target) = arguments.entity_id(&permission.identifier) else {
            debug!(
                "event=permission_check module=permission status=deny kind={} reason=unresolved_argument",
                permission.kind.as_str()
            );
            return Ok(false);
        };

        let result = self.apply_rule(permission.kind, caller.user_id, target);
        match &result {
            Ok(allowed) => debug!(
                "event=permission_check module=permission status={} kind={}",
                if *allowed { "ok" } else { "deny" },
                permission.kind.as_str()
            ),
            Err(err) => error!(
                "event=permission_check module=permission status=error kind={} error={}",
                permission.kind.as_str(),
                err
            ),
        }
        result
    }

    fn apply_rule(
        &self,
        kind: PermissionKind,
        user: EntityId,
        target: EntityId,
    ) -> RepoResult<bool> {
        match kind {
            PermissionKind::IsProjectDirectMember => Ok(self
                .store
                .get_project(target)?
                .is_some_and(|project| project.is_direct_member(user))),
            PermissionKind::IsProjectMember => self.is_project_member(target, user),
            PermissionKind::IsProjectOwner => self.is_project_owner(target, user),
            PermissionKind::IsCategoryProjectOwner => match self.store.get_category(target)? {
                Some(category) => self.is_project_owner(category.project_id, user),
                None => Ok(false),
            },
            PermissionKind::IsTagProjectMember => match self.store.get_tag(target)? {
                Some(tag) => self.is_project_member(tag.project_id, user),
                None => Ok(false),
            },
            PermissionKind::IsTaskOwner => Ok(self
                .store
                .get_task(target)?
                .is_some_and(|task| task.owner_id == user)),
            PermissionKind::IsTaskProjectMember => match self.store.get_task(target)? {
                Some(task) => self.is_project_member(task.project_id, user),
                None => Ok(false),
            },
            PermissionKind::IsCommentOwner => Ok(self
                .store
                .get_comment(target)?
                .is_some_and(|comment| comment.owner_id == user)),
            PermissionKind::IsTeamOwner => Ok(self
                .store
                .get_team(target)?
                .is_some_and(|team| team.owner_id == user)),
            PermissionKind::IsTeamMember => self.is_team_member(target, user),
            PermissionKind::IsUser => {
                if target != user {
                    return Ok(false);
                }
                Ok(self.store.get_user(target)?.is_some())
            }
        }
    }

    fn is_project_owner(&self, project_id: EntityId, user: EntityId) -> RepoResult<bool> {
        Ok(self
            .store
            .get_project(project_id)?
            .is_some_and(|project| project.owner_id == user))
    }

    fn is_project_member(&self, project_id: EntityId, user: EntityId) -> RepoResult<bool> {
        let Some(project) = self.store.get_project(project_id)? else {
            return Ok(false);
        };
        if project.is_direct_member(user) {
            return Ok(true);
        }
        for linked_id in &project.links {
            if let Some(linked) = self.store.get_project(*linked_id)? {
                if linked.is_direct_member(user) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    fn is_team_member(&self, team_id: EntityId, user: EntityId) -> RepoResult<bool> {
        let Some(team) = self.store.get_team(team_id)? else {
            return Ok(false);
        };
        if team.is_direct_member(user) {
            return Ok(true);
        }
        for linked_id in &team.links {
            if let Some(linked) = self.store.get_team(*linked_id)? {
                if linked.is_direct_member(user) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}
