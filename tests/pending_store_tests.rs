mod support;

use std::time::Duration;

use ncrp_intake_lib::{
    db::{repositories::session, Database},
    workflow::pending_store::{PendingRowStore, SessionHandle, PENDING_ROWS_KEY},
};
use support::{store_for, two_row_batch};

#[tokio::test]
async fn saved_batch_reads_back_unchanged() {
    let store = store_for("tab-1").await;
    let batch = two_row_batch();
    store.save(&batch).await.expect("save batch");

    let loaded = store.load().await.expect("load batch").expect("batch present");
    assert_eq!(loaded, batch);
    assert_eq!(loaded.files, vec!["a.csv".to_string()]);
}

#[tokio::test]
async fn empty_store_has_no_batch() {
    let store = store_for("tab-1").await;
    assert!(store.load().await.expect("load").is_none());
    assert!(!store.clear().await.expect("clear"));
}

#[tokio::test]
async fn clear_removes_batch() {
    let store = store_for("tab-1").await;
    store.save(&two_row_batch()).await.expect("save batch");
    assert!(store.clear().await.expect("clear"));
    assert!(store.load().await.expect("load").is_none());
}

#[tokio::test]
async fn unparsable_value_reads_as_no_batch() {
    let db = Database::in_memory().await.expect("db should initialize");
    session::put_entry(db.pool(), "tab-1", PENDING_ROWS_KEY, "{not json")
        .await
        .expect("write garbage");
    let store = PendingRowStore::new(db, SessionHandle::from("tab-1"), Duration::from_secs(3600));
    assert!(store.load().await.expect("load").is_none());
}

#[tokio::test]
async fn sessions_do_not_see_each_other() {
    let db = Database::in_memory().await.expect("db should initialize");
    let ttl = Duration::from_secs(3600);
    let first = PendingRowStore::new(db.clone(), SessionHandle::from("tab-1"), ttl);
    let second = PendingRowStore::new(db, SessionHandle::from("tab-2"), ttl);

    first.save(&two_row_batch()).await.expect("save batch");
    assert!(second.load().await.expect("load").is_none());
    assert!(!second.clear().await.expect("clear"));
    assert!(first.load().await.expect("load").is_some());
}

#[tokio::test]
async fn expired_batch_is_dropped() {
    let db = Database::in_memory().await.expect("db should initialize");
    let store = PendingRowStore::new(db.clone(), SessionHandle::from("tab-1"), Duration::from_secs(3600));
    store.save(&two_row_batch()).await.expect("save batch");

    sqlx::query("UPDATE session_entries SET updated_at = '2000-01-01T00:00:00.000Z'")
        .execute(db.pool())
        .await
        .expect("age entry");

    assert!(store.load().await.expect("load").is_none());
    assert!(session::get_entry(db.pool(), "tab-1", PENDING_ROWS_KEY)
        .await
        .expect("query entry")
        .is_none());
}

#[tokio::test]
async fn purge_drops_only_stale_sessions() {
    let db = Database::in_memory().await.expect("db should initialize");
    let ttl = Duration::from_secs(3600);
    let stale = PendingRowStore::new(db.clone(), SessionHandle::from("stale"), ttl);
    let fresh = PendingRowStore::new(db.clone(), SessionHandle::from("fresh"), ttl);
    stale.save(&two_row_batch()).await.expect("save stale");
    fresh.save(&two_row_batch()).await.expect("save fresh");

    sqlx::query("UPDATE session_entries SET updated_at = '2000-01-01T00:00:00.000Z' WHERE session_id = 'stale'")
        .execute(db.pool())
        .await
        .expect("age entry");

    assert_eq!(fresh.purge_expired().await.expect("purge"), 1);
    assert!(stale.load().await.expect("load").is_none());
    assert!(fresh.load().await.expect("load").is_some());
}

#[test]
fn generated_handles_are_unique() {
    assert_ne!(SessionHandle::generate(), SessionHandle::generate());
}

#[test]
fn new_session_name_generates_a_handle() {
    let first = SessionHandle::resolve("new");
    let second = SessionHandle::resolve("NEW");
    assert_ne!(first, second);
    assert_ne!(first.as_str(), "new");
    assert_eq!(SessionHandle::resolve("tab-7").as_str(), "tab-7");
}
