use planboard_core::db::open_db_in_memory;
use planboard_core::{
    Category, Comment, EntityId, Identity, Permission, PermissionEvaluator, PermissionKind,
    Project, RequestArguments, SqliteEntityStore, Tag, Task, Team, User,
};
use rusqlite::Connection;
use uuid::Uuid;

/// Small graph:
/// - `owner` owns `project` and `team`
/// - `member` is a direct member of `project` and `team`
/// - `project` links to `linked_project`, where `linked_member` is a member
/// - `team` links to `linked_team`, where `linked_member` is a member
/// - `outsider` has no relation to anything
struct Graph {
    owner: EntityId,
    member: EntityId,
    linked_member: EntityId,
    outsider: EntityId,
    project: EntityId,
    linked_project: EntityId,
    team: EntityId,
    linked_team: EntityId,
    task: EntityId,
    comment: EntityId,
    category: EntityId,
    tag: EntityId,
}

fn seed(conn: &Connection) -> Graph {
    let store = SqliteEntityStore::new(conn);
    let new_user = |name: &str| {
        store
            .insert_user(&User {
                id: Uuid::new_v4(),
                name: name.to_string(),
            })
            .unwrap()
    };
    let owner = new_user("owner");
    let member = new_user("member");
    let linked_member = new_user("linked");
    let outsider = new_user("outsider");

    let mut linked_project = Project::new(owner, "design system");
    linked_project.members.insert(linked_member);
    store.insert_project(&linked_project).unwrap();

    let mut project = Project::new(owner, "web app");
    project.members.insert(member);
    project.links.insert(linked_project.id);
    store.insert_project(&project).unwrap();

    let mut linked_team = Team::new(owner, "contractors");
    linked_team.members.insert(linked_member);
    store.insert_team(&linked_team).unwrap();

    let mut team = Team::new(owner, "core");
    team.members.insert(member);
    team.links.insert(linked_team.id);
    store.insert_team(&team).unwrap();

    let task = Task {
        id: Uuid::new_v4(),
        project_id: project.id,
        owner_id: member,
        title: "ship login".to_string(),
    };
    store.insert_task(&task).unwrap();
    let comment = Comment {
        id: Uuid::new_v4(),
        task_id: task.id,
        owner_id: member,
        body: "on it".to_string(),
    };
    store.insert_comment(&comment).unwrap();
    let category = Category {
        id: Uuid::new_v4(),
        project_id: project.id,
        name: "frontend".to_string(),
    };
    store.insert_category(&category).unwrap();
    let tag = Tag {
        id: Uuid::new_v4(),
        project_id: project.id,
        name: "bug".to_string(),
    };
    store.insert_tag(&tag).unwrap();

    Graph {
        owner,
        member,
        linked_member,
        outsider,
        project: project.id,
        linked_project: linked_project.id,
        team: team.id,
        linked_team: linked_team.id,
        task: task.id,
        comment: comment.id,
        category: category.id,
        tag: tag.id,
    }
}

fn check(
    evaluator: &PermissionEvaluator<SqliteEntityStore<'_>>,
    caller: EntityId,
    permission: Permission,
    target: EntityId,
) -> bool {
    let args = RequestArguments::new().with(permission.identifier.clone(), target.to_string());
    evaluator
        .evaluate(Some(&Identity::new(caller)), &args, &permission)
        .unwrap()
}

#[test]
fn project_owner_is_only_the_owner() {
    let conn = open_db_in_memory().unwrap();
    let g = seed(&conn);
    let evaluator = PermissionEvaluator::new(SqliteEntityStore::new(&conn));

    assert!(check(&evaluator, g.owner, Permission::is_project_owner(), g.project));
    for caller in [g.member, g.linked_member, g.outsider] {
        assert!(!check(&evaluator, caller, Permission::is_project_owner(), g.project));
    }
}

#[test]
fn project_member_includes_one_hop_links() {
    let conn = open_db_in_memory().unwrap();
    let g = seed(&conn);
    let evaluator = PermissionEvaluator::new(SqliteEntityStore::new(&conn));

    assert!(check(&evaluator, g.member, Permission::is_project_member(), g.project));
    assert!(check(&evaluator, g.linked_member, Permission::is_project_member(), g.project));
    assert!(!check(&evaluator, g.outsider, Permission::is_project_member(), g.project));
    // Links point outward: members of `project` gain nothing on `linked_project`.
    assert!(!check(&evaluator, g.member, Permission::is_project_member(), g.linked_project));
}

#[test]
fn project_direct_member_excludes_linked_members() {
    let conn = open_db_in_memory().unwrap();
    let g = seed(&conn);
    let evaluator = PermissionEvaluator::new(SqliteEntityStore::new(&conn));

    assert!(check(&evaluator, g.member, Permission::is_project_direct_member(), g.project));
    assert!(!check(&evaluator, g.linked_member, Permission::is_project_direct_member(), g.project));
    assert!(!check(&evaluator, g.owner, Permission::is_project_direct_member(), g.project));
}

#[test]
fn links_are_not_followed_past_one_hop() {
    let conn = open_db_in_memory().unwrap();
    let g = seed(&conn);
    let store = SqliteEntityStore::new(&conn);
    let far_member = store
        .insert_user(&User {
            id: Uuid::new_v4(),
            name: "far".to_string(),
        })
        .unwrap();
    let mut far_project = Project::new(g.owner, "far away");
    far_project.members.insert(far_member);
    store.insert_project(&far_project).unwrap();
    store.link_projects(g.linked_project, far_project.id).unwrap();

    let evaluator = PermissionEvaluator::new(store);
    assert!(check(&evaluator, far_member, Permission::is_project_member(), g.linked_project));
    assert!(!check(&evaluator, far_member, Permission::is_project_member(), g.project));
}

#[test]
fn task_and_comment_ownership() {
    let conn = open_db_in_memory().unwrap();
    let g = seed(&conn);
    let evaluator = PermissionEvaluator::new(SqliteEntityStore::new(&conn));

    assert!(check(&evaluator, g.member, Permission::is_task_owner(), g.task));
    assert!(!check(&evaluator, g.owner, Permission::is_task_owner(), g.task));
    assert!(check(&evaluator, g.member, Permission::is_comment_owner(), g.comment));
    assert!(!check(&evaluator, g.outsider, Permission::is_comment_owner(), g.comment));
}

#[test]
fn task_and_tag_project_membership_follow_owning_project() {
    let conn = open_db_in_memory().unwrap();
    let g = seed(&conn);
    let evaluator = PermissionEvaluator::new(SqliteEntityStore::new(&conn));

    for permission in [Permission::is_task_project_member(), Permission::is_tag_project_member()] {
        let target = if permission.kind == PermissionKind::IsTaskProjectMember {
            g.task
        } else {
            g.tag
        };
        assert!(check(&evaluator, g.member, permission.clone(), target));
        assert!(check(&evaluator, g.linked_member, permission.clone(), target));
        assert!(!check(&evaluator, g.outsider, permission, target));
    }
}

#[test]
fn category_project_owner_follows_owning_project() {
    let conn = open_db_in_memory().unwrap();
    let g = seed(&conn);
    let evaluator = PermissionEvaluator::new(SqliteEntityStore::new(&conn));

    assert!(check(&evaluator, g.owner, Permission::is_category_project_owner(), g.category));
    assert!(!check(&evaluator, g.member, Permission::is_category_project_owner(), g.category));
}

#[test]
fn team_owner_and_member() {
    let conn = open_db_in_memory().unwrap();
    let g = seed(&conn);
    let evaluator = PermissionEvaluator::new(SqliteEntityStore::new(&conn));

    assert!(check(&evaluator, g.owner, Permission::is_team_owner(), g.team));
    assert!(!check(&evaluator, g.member, Permission::is_team_owner(), g.team));
    assert!(check(&evaluator, g.member, Permission::is_team_member(), g.team));
    assert!(check(&evaluator, g.linked_member, Permission::is_team_member(), g.team));
    assert!(!check(&evaluator, g.outsider, Permission::is_team_member(), g.team));
    assert!(!check(&evaluator, g.member, Permission::is_team_member(), g.linked_team));
}

#[test]
fn is_user_is_reflexive_and_exact() {
    let conn = open_db_in_memory().unwrap();
    let g = seed(&conn);
    let evaluator = PermissionEvaluator::new(SqliteEntityStore::new(&conn));

    for caller in [g.owner, g.member, g.linked_member, g.outsider] {
        assert!(check(&evaluator, caller, Permission::is_user(), caller));
    }
    assert!(!check(&evaluator, g.member, Permission::is_user(), g.owner));
    // Unknown user id cannot be resolved, even by "itself".
    let ghost = Uuid::new_v4();
    assert!(!check(&evaluator, ghost, Permission::is_user(), ghost));
}

#[test]
fn unknown_entity_ids_deny_for_every_kind() {
    let conn = open_db_in_memory().unwrap();
    let g = seed(&conn);
    let evaluator = PermissionEvaluator::new(SqliteEntityStore::new(&conn));

    for kind in PermissionKind::ALL {
        assert!(
            !check(&evaluator, g.owner, Permission::new(kind), Uuid::new_v4()),
            "{} must fail closed",
            kind.as_str()
        );
    }
}

#[test]
fn custom_identifier_reads_named_argument() {
    let conn = open_db_in_memory().unwrap();
    let g = seed(&conn);
    let evaluator = PermissionEvaluator::new(SqliteEntityStore::new(&conn));
    let permission = Permission::is_project_owner().with_identifier("target");
    let caller = Identity::new(g.owner);

    let wrong_key = RequestArguments::new().with("project", g.project.to_string());
    assert!(!evaluator.evaluate(Some(&caller), &wrong_key, &permission).unwrap());

    let nested = RequestArguments::from_value(serde_json::json!({
        "target": { "id": g.project.to_string(), "name": "renamed" }
    }));
    assert!(evaluator.evaluate(Some(&caller), &nested, &permission).unwrap());
}
