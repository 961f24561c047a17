//! Behaviour every storage adapter must share.
//!
//! Each backend's test file builds an adapter and calls these checks; they
//! only go through the `StorageAdapter` trait so ids stay opaque.

#![allow(dead_code)]

use chrono::Duration;
use docstore_core::{time, ErrorKind, NewDocument, StorageAdapter};

/// Runs every check against a freshly cleared adapter.
pub async fn run_all(adapter: &dyn StorageAdapter) {
    create_then_get(adapter).await;
    create_honours_supplied_timestamp(adapter).await;
    delete_then_get_is_not_found(adapter).await;
    delete_missing_is_ok(adapter).await;
    malformed_ids_are_rejected(adapter).await;
    empty_ids_are_invalid(adapter).await;
    list_since_is_strictly_after(adapter).await;
    list_since_empty(adapter).await;
    clear_all_removes_everything(adapter).await;
}

pub async fn create_then_get(adapter: &dyn StorageAdapter) {
    adapter.clear_all().await.unwrap();
    let before = time::now() - Duration::seconds(1);

    let id = adapter.create(NewDocument::new("test-data")).await.unwrap();
    assert!(!id.is_empty());

    let doc = adapter.get_by_id(&id).await.unwrap();
    assert_eq!(doc.id, id);
    assert_eq!(doc.data, "test-data");
    assert!(doc.created_at >= before);
    assert!(doc.deleted_at.is_none());
}

pub async fn create_honours_supplied_timestamp(adapter: &dyn StorageAdapter) {
    adapter.clear_all().await.unwrap();
    let at = time::from_epoch_millis(1_700_000_000_000).unwrap();

    let id = adapter
        .create(NewDocument::new("old").with_created_at(at))
        .await
        .unwrap();
    assert_eq!(adapter.get_by_id(&id).await.unwrap().created_at, at);
}

pub async fn delete_then_get_is_not_found(adapter: &dyn StorageAdapter) {
    adapter.clear_all().await.unwrap();

    let id = adapter.create(NewDocument::new("doomed")).await.unwrap();
    adapter.delete(&id).await.unwrap();

    let err = adapter.get_by_id(&id).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(err.is_not_found());
}

pub async fn delete_missing_is_ok(adapter: &dyn StorageAdapter) {
    adapter.clear_all().await.unwrap();

    let id = adapter.create(NewDocument::new("once")).await.unwrap();
    adapter.delete(&id).await.unwrap();
    adapter.delete(&id).await.unwrap();
}

pub async fn malformed_ids_are_rejected(adapter: &dyn StorageAdapter) {
    for bad in ["not-a-valid-id", "123", "zzzzzzzzzzzzzzzzzzzzzzzz"] {
        let err = adapter.get_by_id(bad).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedId, "get {bad}");

        let err = adapter.delete(bad).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedId, "delete {bad}");
    }
}

pub async fn empty_ids_are_invalid(adapter: &dyn StorageAdapter) {
    let err = adapter.get_by_id("").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    let err = adapter.delete("").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}

/// Ten documents ten minutes apart; a cut-off 65 minutes back keeps the
/// seven created in the last hour.
pub async fn list_since_is_strictly_after(adapter: &dyn StorageAdapter) {
    adapter.clear_all().await.unwrap();
    let anchor = time::from_epoch_millis(time::to_epoch_millis(time::now())).unwrap();

    for i in 0..10 {
        let at = anchor - Duration::minutes(10 * i);
        adapter
            .create(NewDocument::new(format!("test-data-{i}")).with_created_at(at))
            .await
            .unwrap();
    }

    let since = anchor - Duration::minutes(65);
    let docs = adapter.list_since(since).await.unwrap();
    assert_eq!(docs.len(), 7);
    assert!(docs.iter().all(|doc| doc.created_at > since));

    // A document exactly at the cut-off is excluded.
    let boundary = anchor - Duration::minutes(60);
    let docs = adapter.list_since(boundary).await.unwrap();
    assert!(docs.iter().all(|doc| doc.created_at > boundary));
    assert_eq!(docs.len(), 6);
}

pub async fn list_since_empty(adapter: &dyn StorageAdapter) {
    adapter.clear_all().await.unwrap();
    adapter.create(NewDocument::new("past")).await.unwrap();

    let docs = adapter
        .list_since(time::now() + Duration::hours(1))
        .await
        .unwrap();
    assert!(docs.is_empty());
}

pub async fn clear_all_removes_everything(adapter: &dyn StorageAdapter) {
    let first = adapter.create(NewDocument::new("a")).await.unwrap();
    adapter.create(NewDocument::new("b")).await.unwrap();

    adapter.clear_all().await.unwrap();

    let err = adapter.get_by_id(&first).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    let docs = adapter
        .list_since(time::from_epoch_millis(0).unwrap())
        .await
        .unwrap();
    assert!(docs.is_empty());
}
