//! Member-list mutation service.
//!
//! # Responsibility
//! - Handle `updateProjectMembers` and `updateTeamMembers` mutations.
//! - Decode `MemberChange` batches from the request argument bag.
//!
//! # Invariants
//! - Callers authorize the field before calling in; this service never
//!   re-checks permissions.
//! - A batch is applied atomically or not at all.

use crate::auth::request::GraphRequest;
use crate::model::entity::{EntityId, EntityKind};
use crate::model::member::{MemberChange, MutationResult};
use crate::repo::entity_repo::RepoError;
use crate::repo::membership_repo::MembershipRepository;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Argument key carrying the change batch.
pub const CHANGES_ARGUMENT: &str = "changes";

/// Service error for membership mutations.
#[derive(Debug)]
pub enum MembershipServiceError {
    /// Request arguments do not describe a valid mutation.
    InvalidInput(String),
    /// Target entity or added user does not exist.
    NotFound { kind: EntityKind, id: EntityId },
    /// Field is not a membership mutation.
    UnsupportedField(String),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for MembershipServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(message) => write!(f, "invalid membership input: {message}"),
            Self::NotFound { kind, id } => write!(f, "{} not found: {id}", kind.as_str()),
            Self::UnsupportedField(field) => {
                write!(f, "field `{field}` is not a membership mutation")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for MembershipServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for MembershipServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { kind, id } => Self::NotFound { kind, id },
            other => Self::Repo(other),
        }
    }
}

/// Membership mutation facade over a repository implementation.
pub struct MembershipService<R: MembershipRepository> {
    repo: R,
}

impl<R: MembershipRepository> MembershipService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    pub fn update_project_members(
        &mut self,
        project_id: EntityId,
        changes: &[MemberChange],
    ) -> Result<MutationResult, MembershipServiceError> {
        self.repo.apply_project_member_changes(project_id, changes)?;
        Ok(MutationResult::ok())
    }

    pub fn update_team_members(
        &mut self,
        team_id: EntityId,
        changes: &[MemberChange],
    ) -> Result<MutationResult, MembershipServiceError> {
        self.repo.apply_team_member_changes(team_id, changes)?;
        Ok(MutationResult::ok())
    }

    /// Resolves an already-authorized membership mutation request.
    ///
    /// # Contract
    /// - `updateProjectMembers` reads `project` and `changes`.
    /// - `updateTeamMembers` reads `team` and `changes`.
    pub fn handle(
        &mut self,
        request: &GraphRequest,
    ) -> Result<MutationResult, MembershipServiceError> {
        let target = match request.field.as_str() {
            "updateProjectMembers" => EntityKind::Project,
            "updateTeamMembers" => EntityKind::Team,
            other => return Err(MembershipServiceError::UnsupportedField(other.to_string())),
        };
        let id = request
            .arguments
            .entity_id(target.as_str())
            .ok_or_else(|| {
                MembershipServiceError::InvalidInput(format!(
                    "argument `{}` must carry an id",
                    target.as_str()
                ))
            })?;
        let changes = parse_member_changes(request)?;

        match target {
            EntityKind::Project => self.update_project_members(id, &changes),
            _ => self.update_team_members(id, &changes),
        }
    }
}

/// Decodes the `changes` argument into an ordered batch.
pub fn parse_member_changes(
    request: &GraphRequest,
) -> Result<Vec<MemberChange>, MembershipServiceError> {
    let value = request.arguments.get(CHANGES_ARGUMENT).ok_or_else(|| {
        MembershipServiceError::InvalidInput(format!("missing `{CHANGES_ARGUMENT}` argument"))
    })?;
    Vec::<MemberChange>::deserialize(value)
        .map_err(|err| MembershipServiceError::InvalidInput(err.to_string()))
}
