//! Contract tests for the `LetterStore` port, run against the in-memory
//! harness that mirrors the production store's conditional-update semantics,
//! and against the unconfigured stand-in.

mod support;

use api_lib::adapters::NullStore;
use support::MemoryStore;
use uuid::Uuid;
use valentine_core::domain::{Answer, LetterContent};
use valentine_core::ports::{LetterStore, StoreError};

#[tokio::test]
async fn create_then_fetch_returns_the_same_content() {
    let store = MemoryStore::new();
    let mut content = LetterContent::default();
    content.recipient = "Sam".to_string();

    let ticket = store.create(&content).await.unwrap();
    let fetched = store.fetch_by_id(ticket.id).await.unwrap();
    assert_eq!(fetched, content);
}

#[tokio::test]
async fn fetch_by_token_returns_the_full_record() {
    let store = MemoryStore::new();
    let ticket = store.create(&LetterContent::default()).await.unwrap();

    let record = store.fetch_by_token(ticket.sender_token).await.unwrap();
    assert_eq!(record.id, ticket.id);
    assert!(record.response.is_none());
    assert!(record.opened_at.is_none());
}

#[tokio::test]
async fn mark_opened_is_idempotent() {
    let store = MemoryStore::new();
    let ticket = store.create(&LetterContent::default()).await.unwrap();

    store.mark_opened(ticket.id).await.unwrap();
    let first = store.opened_at(ticket.id).expect("opened_at should be set");

    // The second open must succeed without touching the timestamp.
    store.mark_opened(ticket.id).await.unwrap();
    assert_eq!(store.opened_at(ticket.id), Some(first));
}

#[tokio::test]
async fn mark_opened_on_a_missing_letter_is_not_found() {
    let store = MemoryStore::new();
    let err = store.mark_opened(Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, StoreError::NotFound(_)));
}

#[tokio::test]
async fn record_response_is_set_once() {
    let store = MemoryStore::new();
    let ticket = store.create(&LetterContent::default()).await.unwrap();

    store.record_response(ticket.id, Answer::Yes).await.unwrap();
    store.record_response(ticket.id, Answer::No).await.unwrap();

    assert_eq!(store.response(ticket.id), Some(Answer::Yes));
}

#[tokio::test]
async fn null_store_reports_unavailable_everywhere() {
    let store = NullStore;
    let id = Uuid::new_v4();

    assert!(matches!(
        store.create(&LetterContent::default()).await,
        Err(StoreError::Unavailable)
    ));
    assert!(matches!(
        store.fetch_by_id(id).await,
        Err(StoreError::Unavailable)
    ));
    assert!(matches!(
        store.fetch_by_token(id).await,
        Err(StoreError::Unavailable)
    ));
    assert!(matches!(
        store.mark_opened(id).await,
        Err(StoreError::Unavailable)
    ));
    assert!(matches!(
        store.record_response(id, Answer::Yes).await,
        Err(StoreError::Unavailable)
    ));
}
