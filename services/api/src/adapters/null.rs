//! services/api/src/adapters/null.rs
//!
//! The stand-in store used when no database is configured. Every operation
//! reports "not available" without contacting anything, so the flows degrade
//! gracefully: saves surface a recoverable error, viewer and status sessions
//! show not-found.

use async_trait::async_trait;
use uuid::Uuid;
use valentine_core::domain::{Answer, LetterContent, LetterRecord};
use valentine_core::ports::{LetterStore, SealTicket, StoreError, StoreResult};

pub struct NullStore;

#[async_trait]
impl LetterStore for NullStore {
    async fn create(&self, _content: &LetterContent) -> StoreResult<SealTicket> {
        Err(StoreError::Unavailable)
    }

    async fn fetch_by_id(&self, _id: Uuid) -> StoreResult<LetterContent> {
        Err(StoreError::Unavailable)
    }

    async fn fetch_by_token(&self, _token: Uuid) -> StoreResult<LetterRecord> {
        Err(StoreError::Unavailable)
    }

    async fn mark_opened(&self, _id: Uuid) -> StoreResult<()> {
        Err(StoreError::Unavailable)
    }

    async fn record_response(&self, _id: Uuid, _answer: Answer) -> StoreResult<()> {
        Err(StoreError::Unavailable)
    }
}
