//! Transactional member-set mutations for projects and teams.
//!
//! # Responsibility
//! - Apply a `MemberChange` batch to one project or team member set.
//!
//! # Invariants
//! - Read, apply and write happen in one `IMMEDIATE` transaction, so two
//!   batches racing on the same entity cannot lose each other's updates.
//! - Only the difference between the old and new set is written.
//! - Users that end up newly added must exist; ids a batch adds and then
//!   removes again are never checked.

use crate::model::entity::{EntityId, EntityKind};
use crate::model::member::{apply_member_changes, MemberChange};
use crate::repo::entity_repo::{load_id_set, RepoError, RepoResult};
use log::info;
use rusqlite::{params, Connection, Transaction, TransactionBehavior};
use std::collections::BTreeSet;

/// Mutation contract for member collections.
pub trait MembershipRepository {
    /// Applies `changes` to the direct members of `project_id`.
    fn apply_project_member_changes(
        &mut self,
        project_id: EntityId,
        changes: &[MemberChange],
    ) -> RepoResult<BTreeSet<EntityId>>;

    /// Applies `changes` to the direct members of `team_id`.
    fn apply_team_member_changes(
        &mut self,
        team_id: EntityId,
        changes: &[MemberChange],
    ) -> RepoResult<BTreeSet<EntityId>>;
}

/// Table layout for one member collection.
struct MemberTable {
    kind: EntityKind,
    owner_table: &'static str,
    member_table: &'static str,
    key_column: &'static str,
}

const PROJECT_MEMBERS: MemberTable = MemberTable {
    kind: EntityKind::Project,
    owner_table: "projects",
    member_table: "project_members",
    key_column: "project_id",
};

const TEAM_MEMBERS: MemberTable = MemberTable {
    kind: EntityKind::Team,
    owner_table: "teams",
    member_table: "team_members",
    key_column: "team_id",
};

/// SQLite-backed membership repository.
pub struct SqliteMembershipRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteMembershipRepository<'conn> {
    pub fn new(conn: &'conn mut Connection) -> Self {
        Self { conn }
    }

    fn apply(
        &mut self,
        table: &MemberTable,
        id: EntityId,
        changes: &[MemberChange],
    ) -> RepoResult<BTreeSet<EntityId>> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        if !row_exists(&tx, table.owner_table, id)? {
            return Err(RepoError::NotFound {
                kind: table.kind,
                id,
            });
        }
        let current = load_id_set(
            &tx,
            &format!(
                "SELECT user_id FROM {} WHERE {} = ?1;",
                table.member_table, table.key_column
            ),
            id,
            table.member_table,
        )?;
        let next = apply_member_changes(current.clone(), changes);
        for added in next.difference(&current) {
            if !row_exists(&tx, "users", *added)? {
                return Err(RepoError::NotFound {
                    kind: EntityKind::User,
                    id: *added,
                });
            }
        }

        let key = id.to_string();
        for removed in current.difference(&next) {
            tx.execute(
                &format!(
                    "DELETE FROM {} WHERE {} = ?1 AND user_id = ?2;",
                    table.member_table, table.key_column
                ),
                params![key.as_str(), removed.to_string()],
            )?;
        }
        for added in next.difference(&current) {
            tx.execute(
                &format!(
                    "INSERT INTO {} ({}, user_id) VALUES (?1, ?2);",
                    table.member_table, table.key_column
                ),
                params![key.as_str(), added.to_string()],
            )?;
        }
        tx.commit()?;

        info!(
            "event=members_update module=repo status=ok kind={} changes={} members={}",
            table.kind.as_str(),
            changes.len(),
            next.len()
        );
        Ok(next)
    }
}

impl MembershipRepository for SqliteMembershipRepository<'_> {
    fn apply_project_member_changes(
        &mut self,
        project_id: EntityId,
        changes: &[MemberChange],
    ) -> RepoResult<BTreeSet<EntityId>> {
        self.apply(&PROJECT_MEMBERS, project_id, changes)
    }

    fn apply_team_member_changes(
        &mut self,
        team_id: EntityId,
        changes: &[MemberChange],
    ) -> RepoResult<BTreeSet<EntityId>> {
        self.apply(&TEAM_MEMBERS, team_id, changes)
    }
}

fn row_exists(tx: &Transaction<'_>, table: &str, id: EntityId) -> RepoResult<bool> {
    let exists: i64 = tx.query_row(
        &format!("SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ?1);"),
        [id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}
