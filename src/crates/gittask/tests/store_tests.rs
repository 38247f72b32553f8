//! Integration tests for the link store and the session slot
//!
//! These run against a database file so that durability across reopen is
//! covered, not just in-memory behavior.

mod common;

use common::{session_service, setup_test_db};
use gittask::db::Database;
use gittask::models::UNKNOWN_TASK_NAME;
use gittask::repositories::{BranchLinkRepository, SessionRepository};
use std::sync::Arc;

#[tokio::test]
async fn test_relinking_keeps_one_row_with_latest_task() {
    let (_dir, _path, db) = setup_test_db().await;
    let links = BranchLinkRepository::new(db.clone());

    links.link("feat", "/repo", "1", "First", None, None).await.unwrap();
    links.link("feat", "/repo", "2", "Second", None, None).await.unwrap();

    assert_eq!(links.count().await.unwrap(), 1);
    let link = links.lookup("feat", Some("/repo")).await.unwrap().unwrap();
    assert_eq!(link.task_gid, "2");
    assert_eq!(link.task_name, "Second");
}

#[tokio::test]
async fn test_same_branch_in_two_repositories() {
    let (_dir, _path, db) = setup_test_db().await;
    let links = BranchLinkRepository::new(db.clone());

    links.link("main", "/a", "1", "A", None, None).await.unwrap();
    links.link("main", "/b", "2", "B", None, None).await.unwrap();

    assert_eq!(links.count().await.unwrap(), 2);
    assert_eq!(links.lookup("main", Some("/a")).await.unwrap().unwrap().task_gid, "1");
    // branch-only lookup returns the most recent write
    assert_eq!(links.lookup("main", None).await.unwrap().unwrap().task_gid, "2");

    links.link("main", "/a", "3", "A again", None, None).await.unwrap();
    assert_eq!(links.lookup("main", None).await.unwrap().unwrap().task_gid, "3");
}

#[tokio::test]
async fn test_links_and_session_survive_reopen() {
    let (_dir, path, db) = setup_test_db().await;
    {
        let service = session_service(&db);
        service
            .links()
            .link("feat", "/repo", "42", "Persisted", Some("abc123"), Some("main"))
            .await
            .unwrap();
        service.start("feat", Some("/repo"), "42").await.unwrap();
        db.close().await;
    }

    let reopened = Arc::new(Database::initialize(&path).await.unwrap());
    let service = session_service(&reopened);

    let link = service.links().lookup("feat", Some("/repo")).await.unwrap().unwrap();
    assert_eq!(link.created_hash.as_deref(), Some("abc123"));
    assert_eq!(link.created_ref.as_deref(), Some("main"));

    let view = service.active_view().await.unwrap().unwrap();
    assert_eq!(view.session.branch, "feat");
    assert_eq!(view.task_name, "Persisted");
}

#[tokio::test]
async fn test_only_one_session_at_a_time() {
    let (_dir, _path, db) = setup_test_db().await;
    let sessions = SessionRepository::new(db.clone());

    sessions.start("a", Some("/r"), "1").await.unwrap();
    sessions.start("b", Some("/r"), "2").await.unwrap();

    let active = sessions.active().await.unwrap().unwrap();
    assert_eq!(active.branch, "b");
    assert_eq!(active.task_gid, "2");

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM active_session")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(rows, 1);
}

#[tokio::test]
async fn test_second_session_row_is_rejected() {
    let (_dir, _path, db) = setup_test_db().await;
    SessionRepository::new(db.clone())
        .start("a", None, "1")
        .await
        .unwrap();

    let result = sqlx::query(
        "INSERT INTO active_session (id, branch, task_gid, started_at) VALUES (2, 'x', '9', 0)",
    )
    .execute(db.pool())
    .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_unlinked_session_shows_placeholder() {
    let (_dir, _path, db) = setup_test_db().await;
    let service = session_service(&db);

    service.start("orphan", Some("/r"), "7").await.unwrap();
    let view = service.active_view().await.unwrap().unwrap();
    assert_eq!(view.task_name, UNKNOWN_TASK_NAME);
    assert_eq!(view.session.task_gid, "7");
}

#[tokio::test]
async fn test_concurrent_writers_on_one_file() {
    let (_dir, path, db) = setup_test_db().await;
    let other = Arc::new(Database::new(&path).await.unwrap());

    let first = BranchLinkRepository::new(db.clone());
    let second = BranchLinkRepository::new(other.clone());

    let a = tokio::spawn(async move {
        for i in 0..20 {
            first.link(&format!("a{}", i), "/r", "1", "A", None, None).await.unwrap();
        }
    });
    let b = tokio::spawn(async move {
        for i in 0..20 {
            second.link(&format!("b{}", i), "/r", "2", "B", None, None).await.unwrap();
        }
    });
    a.await.unwrap();
    b.await.unwrap();

    assert_eq!(BranchLinkRepository::new(db).count().await.unwrap(), 40);
}
