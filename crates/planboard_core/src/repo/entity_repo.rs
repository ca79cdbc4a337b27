//! Entity lookup contract and SQLite implementation.
//!
//! # Responsibility
//! - Serve the single id-keyed lookups permission checks need.
//! - Load projects and teams together with their member and link sets.
//! - Provide seed writes used by mutation paths and fixtures.
//!
//! # Invariants
//! - Unknown ids resolve to `Ok(None)`, never to an error.
//! - Malformed persisted ids surface as `InvalidData`, never as `None`.
//! - An entity cannot link to itself.

use crate::db::DbError;
use crate::model::entity::{Category, Comment, EntityId, EntityKind, Project, Tag, Task, Team, User};
use rusqlite::{params, Connection, Row};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error for entity persistence and lookups.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    NotFound { kind: EntityKind, id: EntityId },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { kind, id } => write!(f, "{} not found: {id}", kind.as_str()),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::NotFound { .. } | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Read-only, id-keyed access to the entity graph.
///
/// Implementations must not treat a missing row as an error: permission
/// checks fail closed on `None` and only propagate `Err`.
pub trait EntityStore {
    fn get_user(&self, id: EntityId) -> RepoResult<Option<User>>;
    fn get_project(&self, id: EntityId) -> RepoResult<Option<Project>>;
    fn get_team(&self, id: EntityId) -> RepoResult<Option<Team>>;
    fn get_task(&self, id: EntityId) -> RepoResult<Option<Task>>;
    fn get_comment(&self, id: EntityId) -> RepoResult<Option<Comment>>;
    fn get_category(&self, id: EntityId) -> RepoResult<Option<Category>>;
    fn get_tag(&self, id: EntityId) -> RepoResult<Option<Tag>>;
}

impl<S: EntityStore + ?Sized> EntityStore for &S {
    fn get_user(&self, id: EntityId) -> RepoResult<Option<User>> {
        (**self).get_user(id)
    }

    fn get_project(&self, id: EntityId) -> RepoResult<Option<Project>> {
        (**self).get_project(id)
    }

    fn get_team(&self, id: EntityId) -> RepoResult<Option<Team>> {
        (**self).get_team(id)
    }

    fn get_task(&self, id: EntityId) -> RepoResult<Option<Task>> {
        (**self).get_task(id)
    }

    fn get_comment(&self, id: EntityId) -> RepoResult<Option<Comment>> {
        (**self).get_comment(id)
    }

    fn get_category(&self, id: EntityId) -> RepoResult<Option<Category>> {
        (**self).get_category(id)
    }

    fn get_tag(&self, id: EntityId) -> RepoResult<Option<Tag>> {
        (**self).get_tag(id)
    }
}

/// SQLite-backed entity store over a migrated connection.
pub struct SqliteEntityStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEntityStore<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn insert_user(&self, user: &User) -> RepoResult<EntityId> {
        self.conn.execute(
            "INSERT INTO users (id, name) VALUES (?1, ?2);",
            params![user.id.to_string(), user.name.as_str()],
        )?;
        Ok(user.id)
    }

    /// Inserts a project row together with its member and link sets.
    pub fn insert_project(&self, project: &Project) -> RepoResult<EntityId> {
        if project.links.contains(&project.id) {
            return Err(self_link_error(EntityKind::Project, project.id));
        }

        let tx = self.conn.unchecked_transaction()?;
        let project_id = project.id.to_string();
        tx.execute(
            "INSERT INTO projects (id, name, owner_id) VALUES (?1, ?2, ?3);",
            params![
                project_id.as_str(),
                project.name.as_str(),
                project.owner_id.to_string()
            ],
        )?;
        for member in &project.members {
            tx.execute(
                "INSERT INTO project_members (project_id, user_id) VALUES (?1, ?2);",
                params![project_id.as_str(), member.to_string()],
            )?;
        }
        for linked in &project.links {
            tx.execute(
                "INSERT INTO project_links (project_id, linked_project_id) VALUES (?1, ?2);",
                params![project_id.as_str(), linked.to_string()],
            )?;
        }
        tx.commit()?;

        Ok(project.id)
    }

    /// Inserts a team row together with its member and link sets.
    pub fn insert_team(&self, team: &Team) -> RepoResult<EntityId> {
        if team.links.contains(&team.id) {
            return Err(self_link_error(EntityKind::Team, team.id));
        }

        let tx = self.conn.unchecked_transaction()?;
        let team_id = team.id.to_string();
        tx.execute(
            "INSERT INTO teams (id, name, owner_id) VALUES (?1, ?2, ?3);",
            params![team_id.as_str(), team.name.as_str(), team.owner_id.to_string()],
        )?;
        for member in &team.members {
            tx.execute(
                "INSERT INTO team_members (team_id, user_id) VALUES (?1, ?2);",
                params![team_id.as_str(), member.to_string()],
            )?;
        }
        for linked in &team.links {
            tx.execute(
                "INSERT INTO team_links (team_id, linked_team_id) VALUES (?1, ?2);",
                params![team_id.as_str(), linked.to_string()],
            )?;
        }
        tx.commit()?;

        Ok(team.id)
    }

    pub fn insert_task(&self, task: &Task) -> RepoResult<EntityId> {
        self.conn.execute(
            "INSERT INTO tasks (id, project_id, owner_id, title) VALUES (?1, ?2, ?3, ?4);",
            params![
                task.id.to_string(),
                task.project_id.to_string(),
                task.owner_id.to_string(),
                task.title.as_str()
            ],
        )?;
        Ok(task.id)
    }

    pub fn insert_comment(&self, comment: &Comment) -> RepoResult<EntityId> {
        self.conn.execute(
            "INSERT INTO comments (id, task_id, owner_id, body) VALUES (?1, ?2, ?3, ?4);",
            params![
                comment.id.to_string(),
                comment.task_id.to_string(),
                comment.owner_id.to_string(),
                comment.body.as_str()
            ],
        )?;
        Ok(comment.id)
    }

    pub fn insert_category(&self, category: &Category) -> RepoResult<EntityId> {
        self.conn.execute(
            "INSERT INTO categories (id, project_id, name) VALUES (?1, ?2, ?3);",
            params![
                category.id.to_string(),
                category.project_id.to_string(),
                category.name.as_str()
            ],
        )?;
        Ok(category.id)
    }

    pub fn insert_tag(&self, tag: &Tag) -> RepoResult<EntityId> {
        self.conn.execute(
            "INSERT INTO tags (id, project_id, name) VALUES (?1, ?2, ?3);",
            params![
                tag.id.to_string(),
                tag.project_id.to_string(),
                tag.name.as_str()
            ],
        )?;
        Ok(tag.id)
    }

    /// Adds `linked` to the link set of `project`. Re-linking is a no-op.
    pub fn link_projects(&self, project: EntityId, linked: EntityId) -> RepoResult<()> {
        if project == linked {
            return Err(self_link_error(EntityKind::Project, project));
        }
        self.conn.execute(
            "INSERT OR IGNORE INTO project_links (project_id, linked_project_id)
             VALUES (?1, ?2);",
            params![project.to_string(), linked.to_string()],
        )?;
        Ok(())
    }

    /// Adds `linked` to the link set of `team`. Re-linking is a no-op.
    pub fn link_teams(&self, team: EntityId, linked: EntityId) -> RepoResult<()> {
        if team == linked {
            return Err(self_link_error(EntityKind::Team, team));
        }
        self.conn.execute(
            "INSERT OR IGNORE INTO team_links (team_id, linked_team_id) VALUES (?1, ?2);",
            params![team.to_string(), linked.to_string()],
        )?;
        Ok(())
    }
}

impl EntityStore for SqliteEntityStore<'_> {
    fn get_user(&self, id: EntityId) -> RepoResult<Option<User>> {
        query_one(
            self.conn,
            "SELECT id, name FROM users WHERE id = ?1;",
            id,
            |row| {
                Ok(User {
                    id: parse_id(row, "id", "users")?,
                    name: row.get("name")?,
                })
            },
        )
    }

    fn get_project(&self, id: EntityId) -> RepoResult<Option<Project>> {
        let row = query_one(
            self.conn,
            "SELECT id, name, owner_id FROM projects WHERE id = ?1;",
            id,
            |row| {
                Ok((
                    parse_id(row, "id", "projects")?,
                    row.get::<_, String>("name")?,
                    parse_id(row, "owner_id", "projects")?,
                ))
            },
        )?;
        let Some((id, name, owner_id)) = row else {
            return Ok(None);
        };

        Ok(Some(Project {
            id,
            name,
            owner_id,
            members: load_id_set(
                self.conn,
                "SELECT user_id FROM project_members WHERE project_id = ?1;",
                id,
                "project_members",
            )?,
            links: load_id_set(
                self.conn,
                "SELECT linked_project_id FROM project_links WHERE project_id = ?1;",
                id,
                "project_links",
            )?,
        }))
    }

    fn get_team(&self, id: EntityId) -> RepoResult<Option<Team>> {
        let row = query_one(
            self.conn,
            "SELECT id, name, owner_id FROM teams WHERE id = ?1;",
            id,
            |row| {
                Ok((
                    parse_id(row, "id", "teams")?,
                    row.get::<_, String>("name")?,
                    parse_id(row, "owner_id", "teams")?,
                ))
            },
        )?;
        let Some((id, name, owner_id)) = row else {
            return Ok(None);
        };

        Ok(Some(Team {
            id,
            name,
            owner_id,
            members: load_id_set(
                self.conn,
                "SELECT user_id FROM team_members WHERE team_id = ?1;",
                id,
                "team_members",
            )?,
            links: load_id_set(
                self.conn,
                "SELECT linked_team_id FROM team_links WHERE team_id = ?1;",
                id,
                "team_links",
            )?,
        }))
    }

    fn get_task(&self, id: EntityId) -> RepoResult<Option<Task>> {
        query_one(
            self.conn,
            "SELECT id, project_id, owner_id, title FROM tasks WHERE id = ?1;",
            id,
            |row| {
                Ok(Task {
                    id: parse_id(row, "id", "tasks")?,
                    project_id: parse_id(row, "project_id", "tasks")?,
                    owner_id: parse_id(row, "owner_id", "tasks")?,
                    title: row.get("title")?,
                })
            },
        )
    }

    fn get_comment(&self, id: EntityId) -> RepoResult<Option<Comment>> {
        query_one(
            self.conn,
            "SELECT id, task_id, owner_id, body FROM comments WHERE id = ?1;",
            id,
            |row| {
                Ok(Comment {
                    id: parse_id(row, "id", "comments")?,
                    task_id: parse_id(row, "task_id", "comments")?,
                    owner_id: parse_id(row, "owner_id", "comments")?,
                    body: row.get("body")?,
                })
            },
        )
    }

    fn get_category(&self, id: EntityId) -> RepoResult<Option<Category>> {
        query_one(
            self.conn,
            "SELECT id, project_id, name FROM categories WHERE id = ?1;",
            id,
            |row| {
                Ok(Category {
                    id: parse_id(row, "id", "categories")?,
                    project_id: parse_id(row, "project_id", "categories")?,
                    name: row.get("name")?,
                })
            },
        )
    }

    fn get_tag(&self, id: EntityId) -> RepoResult<Option<Tag>> {
        query_one(
            self.conn,
            "SELECT id, project_id, name FROM tags WHERE id = ?1;",
            id,
            |row| {
                Ok(Tag {
                    id: parse_id(row, "id", "tags")?,
                    project_id: parse_id(row, "project_id", "tags")?,
                    name: row.get("name")?,
                })
            },
        )
    }
}

fn query_one<T>(
    conn: &Connection,
    sql: &str,
    id: EntityId,
    parse: impl FnOnce(&Row<'_>) -> RepoResult<T>,
) -> RepoResult<Option<T>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([id.to_string()])?;
    match rows.next()? {
        Some(row) => Ok(Some(parse(row)?)),
        None => Ok(None),
    }
}

pub(crate) fn load_id_set(
    conn: &Connection,
    sql: &str,
    id: EntityId,
    table: &str,
) -> RepoResult<BTreeSet<EntityId>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([id.to_string()])?;
    let mut ids = BTreeSet::new();
    while let Some(row) = rows.next()? {
        let text: String = row.get(0)?;
        ids.insert(parse_id_text(&text, table)?);
    }
    Ok(ids)
}

fn parse_id(row: &Row<'_>, column: &str, table: &str) -> RepoResult<EntityId> {
    let text: String = row.get(column)?;
    parse_id_text(&text, table)
}

fn parse_id_text(text: &str, table: &str) -> RepoResult<EntityId> {
    Uuid::parse_str(text)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid value `{text}` in {table}")))
}

fn self_link_error(kind: EntityKind, id: EntityId) -> RepoError {
    RepoError::InvalidData(format!("{} {id} cannot link to itself", kind.as_str()))
}
