//! Core authorization and domain logic for Planboard.
//! This crate decides whether a caller may resolve a graph field.

pub mod auth;
pub mod db;
pub mod logging;
pub mod model;
pub mod permission;
pub mod repo;
pub mod service;

pub use auth::request::{GraphRequest, Identity, RequestArguments};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::entity::{
    Category, Comment, EntityId, EntityKind, Project, Tag, Task, Team, User,
};
pub use model::member::{apply_member_changes, ChangeType, MemberChange, MutationResult};
pub use permission::error::{AccessError, PolicyConfigError};
pub use permission::evaluator::PermissionEvaluator;
pub use permission::policy::{AllGroup, AnyGroup, Policy};
pub use permission::registry::PolicyRegistry;
pub use permission::variant::{Permission, PermissionKind};
pub use repo::entity_repo::{EntityStore, RepoError, RepoResult, SqliteEntityStore};
pub use repo::membership_repo::{MembershipRepository, SqliteMembershipRepository};
pub use service::membership_service::{MembershipService, MembershipServiceError};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
