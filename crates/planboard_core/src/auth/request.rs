//! Caller identity and resolved graph request arguments.
//!
//! # Invariants
//! - An argument resolves to an id only when it is a UUID string or an
//!   object whose `id` member is a UUID string. Anything else resolves to
//!   `None`, which permission checks treat as denial.

use crate::model::entity::EntityId;
use serde_json::{Map, Value};
use uuid::Uuid;

/// Authenticated caller produced by the auth layer for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Identity {
    pub user_id: EntityId,
}

impl Identity {
    pub fn new(user_id: EntityId) -> Self {
        Self { user_id }
    }
}

/// Argument bag of one resolved field invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestArguments {
    values: Map<String, Value>,
}

impl RequestArguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds arguments from a JSON value. Non-object values yield an empty bag.
    pub fn from_value(value: Value) -> Self {
        match value {
            Value::Object(values) => Self { values },
            _ => Self::default(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Resolves the entity id carried by argument `key`.
    pub fn entity_id(&self, key: &str) -> Option<EntityId> {
        match self.values.get(key)? {
            Value::String(text) => Uuid::parse_str(text).ok(),
            Value::Object(nested) => match nested.get("id")? {
                Value::String(text) => Uuid::parse_str(text).ok(),
                _ => None,
            },
            _ => None,
        }
    }
}

/// One graph field invocation awaiting authorization.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphRequest {
    pub field: String,
    pub arguments: RequestArguments,
}

impl GraphRequest {
    pub fn new(field: impl Into<String>, arguments: RequestArguments) -> Self {
        Self {
            field: field.into(),
            arguments,
        }
    }
}
