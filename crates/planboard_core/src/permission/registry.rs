//! Field-to-policy table and the authorization entry point.
//!
//! # Responsibility
//! - Hold the policy attached to each guarded graph field.
//! - Load policy tables from JSON declarations.
//! - Answer `authorize`/`guard` for the query engine before a resolver runs.
//!
//! # Invariants
//! - Unknown fields are denied.
//! - Loaded tables never contain empty groups, empty or repeated field names.

use crate::auth::request::{GraphRequest, Identity};
use crate::permission::error::{AccessError, PolicyConfigError};
use crate::permission::evaluator::PermissionEvaluator;
use crate::permission::policy::Policy;
use crate::permission::variant::Permission;
use crate::repo::entity_repo::{EntityStore, RepoResult};
use log::{debug, info, warn};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::fmt::Formatter;

/// JSON declaration shape: `{ "fields": { "<field>": <policy> } }`.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PolicyTableDecl {
    fields: FieldDecls,
}

/// Field entries in declaration order, repeats included.
#[derive(Debug)]
struct FieldDecls(Vec<(String, Policy)>);

impl<'de> Deserialize<'de> for FieldDecls {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldDeclsVisitor;

        impl<'de> Visitor<'de> for FieldDeclsVisitor {
            type Value = FieldDecls;

            fn expecting(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str("a map of field names to policies")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<FieldDecls, A::Error> {
                let mut entries = Vec::new();
                while let Some(entry) = map.next_entry::<String, Policy>()? {
                    entries.push(entry);
                }
                Ok(FieldDecls(entries))
            }
        }

        deserializer.deserialize_map(FieldDeclsVisitor)
    }
}

/// Policies keyed by graph field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyRegistry {
    fields: BTreeMap<String, Policy>,
}

impl PolicyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Default table for the application's guarded query and mutation fields.
    pub fn builtin() -> Self {
        let task_access = || {
            Policy::any([
                Permission::is_task_owner().into(),
                Permission::is_task_project_member().into(),
            ])
        };
        let project_access = || {
            Policy::any([
                Permission::is_project_owner().into(),
                Permission::is_project_member().into(),
            ])
        };
        let team_access = || {
            Policy::any([
                Permission::is_team_owner().into(),
                Permission::is_team_member().into(),
            ])
        };

        let entries: [(&str, Policy); 24] = [
            ("project", project_access()),
            ("createTask", Permission::is_project_member().into()),
            ("createCategory", Permission::is_project_owner().into()),
            ("createTag", Permission::is_project_member().into()),
            ("updateProject", Permission::is_project_owner().into()),
            ("deleteProject", Permission::is_project_owner().into()),
            ("updateProjectMembers", Permission::is_project_owner().into()),
            (
                "linkProjects",
                Policy::all([
                    Permission::is_project_owner().into(),
                    Permission::is_project_owner()
                        .with_identifier("linkedProject")
                        .into(),
                ]),
            ),
            ("team", team_access()),
            ("updateTeam", Permission::is_team_owner().into()),
            ("updateTeamMembers", Permission::is_team_owner().into()),
            ("task", task_access()),
            ("updateTask", task_access()),
            ("deleteTask", Permission::is_task_owner().into()),
            ("createComment", Permission::is_task_project_member().into()),
            ("comment", Permission::is_comment_owner().into()),
            ("updateComment", Permission::is_comment_owner().into()),
            ("deleteComment", Permission::is_comment_owner().into()),
            ("updateCategory", Permission::is_category_project_owner().into()),
            ("deleteCategory", Permission::is_category_project_owner().into()),
            ("tag", Permission::is_tag_project_member().into()),
            ("updateTag", Permission::is_tag_project_member().into()),
            ("user", Permission::is_user().into()),
            ("updateUser", Permission::is_user().into()),
        ];

        Self {
            fields: entries
                .into_iter()
                .map(|(field, policy)| (field.to_string(), policy))
                .collect(),
        }
    }

    /// Parses a policy table from its JSON declaration.
    ///
    /// # Errors
    /// - `Parse` for malformed JSON, unknown permission kinds or unknown keys.
    /// - `EmptyFieldName`/`EmptyGroup` for declarations that cannot be evaluated.
    /// - `DuplicateField` when a field is declared more than once.
    pub fn from_json_str(json: &str) -> Result<Self, PolicyConfigError> {
        let decl: PolicyTableDecl = serde_json::from_str(json)?;
        let mut registry = Self::new();
        for (field, policy) in decl.fields.0 {
            if registry.fields.contains_key(&field) {
                return Err(PolicyConfigError::DuplicateField(field));
            }
            registry.attach(field, policy)?;
        }
        info!(
            "event=policy_load module=permission status=ok fields={}",
            registry.len()
        );
        Ok(registry)
    }

    /// Attaches `policy` to `field`, replacing any previous policy.
    pub fn attach(
        &mut self,
        field: impl Into<String>,
        policy: impl Into<Policy>,
    ) -> Result<(), PolicyConfigError> {
        let field = field.into();
        let policy = policy.into();
        if field.trim().is_empty() {
            return Err(PolicyConfigError::EmptyFieldName);
        }
        if policy.find_empty_group().is_some() {
            return Err(PolicyConfigError::EmptyGroup(field));
        }
        self.fields.insert(field, policy);
        Ok(())
    }

    pub fn policy(&self, field: &str) -> Option<&Policy> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Policy)> {
        self.fields
            .iter()
            .map(|(field, policy)| (field.as_str(), policy))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Decides whether `caller` may resolve `request`.
    ///
    /// # Errors
    /// - Returns storage errors unchanged; denial is always `Ok(false)`.
    pub fn authorize<S: EntityStore>(
        &self,
        evaluator: &PermissionEvaluator<S>,
        caller: Option<&Identity>,
        request: &GraphRequest,
    ) -> RepoResult<bool> {
        let Some(policy) = self.fields.get(request.field.as_str()) else {
            warn!(
                "event=field_authorize module=permission status=deny field={} reason=no_policy",
                request.field
            );
            return Ok(false);
        };

        let allowed = policy.evaluate(evaluator, caller, &request.arguments)?;
        if allowed {
            debug!(
                "event=field_authorize module=permission status=ok field={}",
                request.field
            );
        } else {
            info!(
                "event=field_authorize module=permission status=deny field={}",
                request.field
            );
        }
        Ok(allowed)
    }

    /// Boundary form of [`authorize`](Self::authorize) for the query engine.
    ///
    /// # Errors
    /// - `AccessError::Forbidden` when the caller may not resolve the field.
    /// - `AccessError::Storage` when a lookup failed.
    pub fn guard<S: EntityStore>(
        &self,
        evaluator: &PermissionEvaluator<S>,
        caller: Option<&Identity>,
        request: &GraphRequest,
    ) -> Result<(), AccessError> {
        if self.authorize(evaluator, caller, request)? {
            Ok(())
        } else {
            Err(AccessError::Forbidden)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PolicyRegistry;
    use crate::auth::request::{GraphRequest, Identity, RequestArguments};
    use crate::permission::error::{AccessError, PolicyConfigError};
    use crate::permission::evaluator::tests::UnavailableStore;
    use crate::permission::evaluator::PermissionEvaluator;
    use crate::permission::policy::Policy;
    use crate::permission::variant::Permission;
    use uuid::Uuid;

    #[test]
    fn builtin_table_has_no_empty_groups() {
        let registry = PolicyRegistry::builtin();
        assert!(!registry.is_empty());
        for (field, policy) in registry.fields() {
            assert!(policy.find_empty_group().is_none(), "field `{field}`");
        }
    }

    #[test]
    fn builtin_update_task_is_owner_or_project_member() {
        let registry = PolicyRegistry::builtin();
        assert_eq!(
            registry.policy("updateTask"),
            Some(&Policy::any([
                Permission::is_task_owner().into(),
                Permission::is_task_project_member().into(),
            ]))
        );
    }

    #[test]
    fn unattached_field_is_forbidden_without_lookup() {
        let registry = PolicyRegistry::new();
        let evaluator = PermissionEvaluator::new(UnavailableStore::default());
        let caller = Identity::new(Uuid::new_v4());
        let request = GraphRequest::new("project", RequestArguments::new());

        let err = registry
            .guard(&evaluator, Some(&caller), &request)
            .expect_err("unattached field must be denied");
        assert!(matches!(err, AccessError::Forbidden));
        assert_eq!(evaluator.store().lookups.get(), 0);
    }

    #[test]
    fn guard_separates_storage_failure_from_denial() {
        let registry = PolicyRegistry::builtin();
        let evaluator = PermissionEvaluator::new(UnavailableStore::default());
        let caller = Identity::new(Uuid::new_v4());
        let request = GraphRequest::new(
            "deleteTask",
            RequestArguments::new().with("task", Uuid::new_v4().to_string()),
        );

        let err = registry
            .guard(&evaluator, Some(&caller), &request)
            .expect_err("lookup failure must surface");
        assert!(matches!(err, AccessError::Storage(_)));
    }

    #[test]
    fn loads_table_from_json() {
        let registry = PolicyRegistry::from_json_str(
            r#"{
                "fields": {
                    "updateTask": { "any": [
                        { "kind": "is_task_owner" },
                        { "kind": "is_task_project_member" }
                    ] },
                    "renameTag": { "kind": "is_tag_project_member", "identifier": "target" }
                }
            }"#,
        )
        .expect("valid table");

        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.policy("renameTag"),
            Some(&Policy::from(
                Permission::is_tag_project_member().with_identifier("target")
            ))
        );
    }

    #[test]
    fn rejects_empty_group_in_json() {
        let err = PolicyRegistry::from_json_str(r#"{ "fields": { "task": { "any": [] } } }"#)
            .expect_err("empty group must be rejected");
        assert!(matches!(err, PolicyConfigError::EmptyGroup(field) if field == "task"));
    }

    #[test]
    fn rejects_unknown_kind_in_json() {
        let err = PolicyRegistry::from_json_str(
            r#"{ "fields": { "task": { "kind": "is_superuser" } } }"#,
        )
        .expect_err("unknown kind must be rejected");
        assert!(matches!(err, PolicyConfigError::Parse(_)));
    }

    #[test]
    fn rejects_mixed_permission_and_group_keys() {
        let err = PolicyRegistry::from_json_str(
            r#"{ "fields": { "deleteTask": {
                "kind": "is_task_owner",
                "any": [{ "kind": "is_user" }]
            } } }"#,
        )
        .expect_err("permission with a group key must be rejected");
        assert!(matches!(err, PolicyConfigError::Parse(_)));

        let err = PolicyRegistry::from_json_str(
            r#"{ "fields": { "deleteTask": {
                "all": [{ "kind": "is_task_owner" }],
                "any": [{ "kind": "is_user" }]
            } } }"#,
        )
        .expect_err("object with both groups must be rejected");
        assert!(matches!(err, PolicyConfigError::Parse(_)));
    }

    #[test]
    fn rejects_repeated_field_name() {
        let err = PolicyRegistry::from_json_str(
            r#"{ "fields": {
                "deleteTask": { "kind": "is_task_owner" },
                "deleteTask": { "kind": "is_user" }
            } }"#,
        )
        .expect_err("repeated field must be rejected");
        assert!(matches!(err, PolicyConfigError::DuplicateField(field) if field == "deleteTask"));
    }

    #[test]
    fn rejects_blank_field_name() {
        let mut registry = PolicyRegistry::new();
        let err = registry
            .attach("  ", Permission::is_user())
            .expect_err("blank field must be rejected");
        assert!(matches!(err, PolicyConfigError::EmptyFieldName));
    }
}
