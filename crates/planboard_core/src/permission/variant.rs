//! Declarative permission predicates.
//!
//! # Responsibility
//! - Enumerate the closed set of checks a graph field can require.
//! - Carry, per check, the request argument naming the checked entity.
//!
//! # Invariants
//! - A permission performs no I/O; it only names what must hold.
//! - A missing `identifier` in declarations takes the kind's default.

use crate::model::entity::EntityKind;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Discriminant of a permission predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionKind {
    /// Caller is in the project's direct member set.
    IsProjectDirectMember,
    /// Caller is a member of the project or of a project it links to.
    IsProjectMember,
    IsProjectOwner,
    /// Caller owns the project the category belongs to.
    IsCategoryProjectOwner,
    /// Caller is a member of the project the tag belongs to.
    IsTagProjectMember,
    IsTaskOwner,
    /// Caller is a member of the project the task belongs to.
    IsTaskProjectMember,
    IsCommentOwner,
    IsTeamOwner,
    /// Caller is a member of the team or of a team it links to.
    IsTeamMember,
    /// Caller is the user named by the argument.
    IsUser,
}

impl PermissionKind {
    pub const ALL: [PermissionKind; 11] = [
        Self::IsProjectDirectMember,
        Self::IsProjectMember,
        Self::IsProjectOwner,
        Self::IsCategoryProjectOwner,
        Self::IsTagProjectMember,
        Self::IsTaskOwner,
        Self::IsTaskProjectMember,
        Self::IsCommentOwner,
        Self::IsTeamOwner,
        Self::IsTeamMember,
        Self::IsUser,
    ];

    /// Entity kind the argument must resolve to.
    pub fn target(self) -> EntityKind {
        match self {
            Self::IsProjectDirectMember | Self::IsProjectMember | Self::IsProjectOwner => {
                EntityKind::Project
            }
            Self::IsCategoryProjectOwner => EntityKind::Category,
            Self::IsTagProjectMember => EntityKind::Tag,
            Self::IsTaskOwner | Self::IsTaskProjectMember => EntityKind::Task,
            Self::IsCommentOwner => EntityKind::Comment,
            Self::IsTeamOwner | Self::IsTeamMember => EntityKind::Team,
            Self::IsUser => EntityKind::User,
        }
    }

    /// Conventional argument name for the kind's target entity.
    pub fn default_identifier(self) -> &'static str {
        self.target().as_str()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::IsProjectDirectMember => "is_project_direct_member",
            Self::IsProjectMember => "is_project_member",
            Self::IsProjectOwner => "is_project_owner",
            Self::IsCategoryProjectOwner => "is_category_project_owner",
            Self::IsTagProjectMember => "is_tag_project_member",
            Self::IsTaskOwner => "is_task_owner",
            Self::IsTaskProjectMember => "is_task_project_member",
            Self::IsCommentOwner => "is_comment_owner",
            Self::IsTeamOwner => "is_team_owner",
            Self::IsTeamMember => "is_team_member",
            Self::IsUser => "is_user",
        }
    }
}

/// One permission predicate bound to a request argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "PermissionDecl", into = "PermissionDecl")]
pub struct Permission {
    pub kind: PermissionKind,
    /// Argument key whose value is the checked entity's id.
    pub identifier: String,
}

impl Permission {
    /// Builds a permission using the kind's default argument name.
    pub fn new(kind: PermissionKind) -> Self {
        Self {
            kind,
            identifier: kind.default_identifier().to_string(),
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = identifier.into();
        self
    }

    pub fn is_project_direct_member() -> Self {
        Self::new(PermissionKind::IsProjectDirectMember)
    }

    pub fn is_project_member() -> Self {
        Self::new(PermissionKind::IsProjectMember)
    }

    pub fn is_project_owner() -> Self {
        Self::new(PermissionKind::IsProjectOwner)
    }

    pub fn is_category_project_owner() -> Self {
        Self::new(PermissionKind::IsCategoryProjectOwner)
    }

    pub fn is_tag_project_member() -> Self {
        Self::new(PermissionKind::IsTagProjectMember)
    }

    pub fn is_task_owner() -> Self {
        Self::new(PermissionKind::IsTaskOwner)
    }

    pub fn is_task_project_member() -> Self {
        Self::new(PermissionKind::IsTaskProjectMember)
    }

    pub fn is_comment_owner() -> Self {
        Self::new(PermissionKind::IsCommentOwner)
    }

    pub fn is_team_owner() -> Self {
        Self::new(PermissionKind::IsTeamOwner)
    }

    pub fn is_team_member() -> Self {
        Self::new(PermissionKind::IsTeamMember)
    }

    pub fn is_user() -> Self {
        Self::new(PermissionKind::IsUser)
    }
}

impl Display for Permission {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.kind.as_str(), self.identifier)
    }
}

/// Declaration shape with an optional identifier.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct PermissionDecl {
    kind: PermissionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    identifier: Option<String>,
}

impl From<PermissionDecl> for Permission {
    fn from(value: PermissionDecl) -> Self {
        let permission = Permission::new(value.kind);
        match value.identifier {
            Some(identifier) => permission.with_identifier(identifier),
            None => permission,
        }
    }
}

impl From<Permission> for PermissionDecl {
    fn from(value: Permission) -> Self {
        let identifier = (value.identifier != value.kind.default_identifier())
            .then_some(value.identifier);
        Self {
            kind: value.kind,
            identifier,
        }
    }
}
