use std::time::Duration;

use recruitment_gateway::services::session_manager::{MessageRole, SessionManager};

#[tokio::test]
async fn create_and_append() {
    let mgr = SessionManager::new(Duration::from_secs(60));
    assert!(mgr.is_empty().await);

    let sid = mgr.create_session().await;
    mgr.append_message(&sid, MessageRole::User, "hello").await;
    let len = mgr.append_message(&sid, MessageRole::Agent, "hi there").await;
    assert_eq!(len, 2);

    let history = mgr.get_history(&sid).await.unwrap();
    assert_eq!(history[0].content, "hello");
    assert_eq!(history[0].role, MessageRole::User);
    assert_eq!(history[1].role, MessageRole::Agent);
}

#[tokio::test]
async fn ensure_session_is_idempotent() {
    let mgr = SessionManager::new(Duration::from_secs(60));
    mgr.ensure_session("abc").await;
    mgr.append_message("abc", MessageRole::User, "first").await;
    // A second ensure must not wipe the history.
    mgr.ensure_session("abc").await;
    assert_eq!(mgr.get_history("abc").await.unwrap().len(), 1);
    assert_eq!(mgr.len().await, 1);
}

#[tokio::test]
async fn unknown_session_has_no_history() {
    let mgr = SessionManager::new(Duration::from_secs(60));
    assert!(mgr.get_history("missing").await.is_none());
    assert!(!mgr.remove_session("missing").await);
}

#[tokio::test]
async fn purge_removes_idle_sessions() {
    let mgr = SessionManager::new(Duration::from_millis(10));
    let sid = mgr.create_session().await;
    mgr.append_message(&sid, MessageRole::User, "hello").await;

    tokio::time::sleep(Duration::from_millis(30)).await;
    let removed = mgr.purge_expired().await;
    assert_eq!(removed, 1);
    assert!(mgr.is_empty().await);
}

#[tokio::test]
async fn purge_keeps_active_sessions() {
    let mgr = SessionManager::new(Duration::from_secs(60));
    mgr.create_session().await;
    assert_eq!(mgr.purge_expired().await, 0);
    assert_eq!(mgr.len().await, 1);
}
