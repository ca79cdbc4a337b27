//! Entities owned by the persistence layer.
//!
//! # Responsibility
//! - Describe the object graph that ownership and membership checks walk:
//!   users, teams, projects, tasks, comments, categories and tags.
//!
//! # Invariants
//! - `members` is the direct member set only; links are kept separately.
//! - `links` never contains the entity's own id.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Stable identifier shared by every entity kind.
pub type EntityId = Uuid;

/// Entity kinds addressable through a graph request argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Project,
    Team,
    Task,
    Comment,
    Category,
    Tag,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Project => "project",
            Self::Team => "team",
            Self::Task => "task",
            Self::Comment => "comment",
            Self::Category => "category",
            Self::Tag => "tag",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: EntityId,
    pub name: String,
}

/// Project with its owner, direct members and one-hop links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: EntityId,
    pub name: String,
    pub owner_id: EntityId,
    pub members: BTreeSet<EntityId>,
    /// Projects whose members are also treated as members of this one.
    pub links: BTreeSet<EntityId>,
}

impl Project {
    pub fn new(owner_id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            owner_id,
            members: BTreeSet::new(),
            links: BTreeSet::new(),
        }
    }

    pub fn is_direct_member(&self, user_id: EntityId) -> bool {
        self.members.contains(&user_id)
    }
}

/// Team with its owner, direct members and one-hop links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: EntityId,
    pub name: String,
    pub owner_id: EntityId,
    pub members: BTreeSet<EntityId>,
    pub links: BTreeSet<EntityId>,
}

impl Team {
    pub fn new(owner_id: EntityId, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            owner_id,
            members: BTreeSet::new(),
            links: BTreeSet::new(),
        }
    }

    pub fn is_direct_member(&self, user_id: EntityId) -> bool {
        self.members.contains(&user_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: EntityId,
    pub project_id: EntityId,
    pub owner_id: EntityId,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: EntityId,
    pub task_id: EntityId,
    pub owner_id: EntityId,
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: EntityId,
    pub project_id: EntityId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: EntityId,
    pub project_id: EntityId,
    pub name: String,
}
