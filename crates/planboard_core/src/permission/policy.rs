//! Boolean combination of permissions attached to one graph field.
//!
//! # Invariants
//! - `All` stops at the first term that denies; `Any` stops at the first
//!   term that allows. Later terms perform no lookups.
//! - An empty group denies.
//! - Combination only yields `true`/`false`; storage errors pass through.

use crate::auth::request::{Identity, RequestArguments};
use crate::permission::evaluator::PermissionEvaluator;
use crate::permission::variant::Permission;
use crate::repo::entity_repo::{EntityStore, RepoResult};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Authorization rule for one graph field.
///
/// Declared as `{"all": [..]}`, `{"any": [..]}` or a permission object. An
/// object mixing group and permission keys matches no shape and is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Policy {
    /// Every term must hold.
    All(AllGroup),
    /// At least one term must hold.
    Any(AnyGroup),
    Permission(Permission),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AllGroup {
    pub all: Vec<Policy>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnyGroup {
    pub any: Vec<Policy>,
}

impl Policy {
    pub fn all(terms: impl IntoIterator<Item = Policy>) -> Self {
        Self::All(AllGroup {
            all: terms.into_iter().collect(),
        })
    }

    pub fn any(terms: impl IntoIterator<Item = Policy>) -> Self {
        Self::Any(AnyGroup {
            any: terms.into_iter().collect(),
        })
    }

    /// Returns the first group (in declaration order) that has no terms.
    pub fn find_empty_group(&self) -> Option<&Policy> {
        match self {
            Self::All(AllGroup { all: terms }) | Self::Any(AnyGroup { any: terms }) => {
                if terms.is_empty() {
                    return Some(self);
                }
                terms.iter().find_map(Policy::find_empty_group)
            }
            Self::Permission(_) => None,
        }
    }

    /// Evaluates the policy with short-circuiting.
    pub fn evaluate<S: EntityStore>(
        &self,
        evaluator: &PermissionEvaluator<S>,
        caller: Option<&Identity>,
        arguments: &RequestArguments,
    ) -> RepoResult<bool> {
        match self {
            Self::Permission(permission) => evaluator.evaluate(caller, arguments, permission),
            Self::All(AllGroup { all }) => {
                if all.is_empty() {
                    return Ok(false);
                }
                for term in all {
                    if !term.evaluate(evaluator, caller, arguments)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Self::Any(AnyGroup { any }) => {
                for term in any {
                    if term.evaluate(evaluator, caller, arguments)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
        }
    }
}

impl From<Permission> for Policy {
    fn from(value: Permission) -> Self {
        Self::Permission(value)
    }
}

impl Display for Policy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let (terms, separator) = match self {
            Self::Permission(permission) => return write!(f, "{permission}"),
            Self::All(AllGroup { all }) => (all, " AND "),
            Self::Any(AnyGroup { any }) => (any, " OR "),
        };
        write!(f, "(")?;
        for (index, term) in terms.iter().enumerate() {
            if index > 0 {
                write!(f, "{separator}")?;
            }
            write!(f, "{term}")?;
        }
        write!(f, ")")
    }
}
