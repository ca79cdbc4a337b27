//! Errors surfaced at the authorization boundary.

use crate::repo::entity_repo::RepoError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Outcome of a guarded field that may not run.
///
/// `Forbidden` deliberately carries nothing: callers must not learn which
/// permission failed or whether the entity exists.
#[derive(Debug)]
pub enum AccessError {
    /// Authorization denied; maps to a forbidden response.
    Forbidden,
    /// Entity lookup failed; maps to a retryable server error.
    Storage(RepoError),
}

impl Display for AccessError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Forbidden => write!(f, "forbidden"),
            Self::Storage(err) => write!(f, "authorization lookup failed: {err}"),
        }
    }
}

impl Error for AccessError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Forbidden => None,
            Self::Storage(err) => Some(err),
        }
    }
}

impl From<RepoError> for AccessError {
    fn from(value: RepoError) -> Self {
        Self::Storage(value)
    }
}

/// Policy table load errors.
#[derive(Debug)]
pub enum PolicyConfigError {
    Parse(serde_json::Error),
    EmptyFieldName,
    EmptyGroup(String),
    DuplicateField(String),
}

impl Display for PolicyConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "invalid policy config: {err}"),
            Self::EmptyFieldName => write!(f, "policy field name must not be empty"),
            Self::EmptyGroup(field) => {
                write!(f, "policy for field `{field}` contains an empty group")
            }
            Self::DuplicateField(field) => {
                write!(f, "policy for field `{field}` is declared more than once")
            }
        }
    }
}

impl Error for PolicyConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::EmptyFieldName | Self::EmptyGroup(_) | Self::DuplicateField(_) => None,
        }
    }
}

impl From<serde_json::Error> for PolicyConfigError {
    fn from(value: serde_json::Error) -> Self {
        Self::Parse(value)
    }
}
