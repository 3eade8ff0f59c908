//! Shared test harness: an in-memory `LetterStore` with the production
//! store's set-if-null semantics, so the flows can be exercised without a
//! database.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;
use valentine_core::domain::{Answer, LetterContent, LetterRecord};
use valentine_core::ports::{LetterStore, SealTicket, StoreError, StoreResult};

#[derive(Default)]
pub struct MemoryStore {
    letters: Mutex<HashMap<Uuid, LetterRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn opened_at(&self, id: Uuid) -> Option<DateTime<Utc>> {
        self.letters.lock().unwrap().get(&id).and_then(|r| r.opened_at)
    }

    pub fn response(&self, id: Uuid) -> Option<Answer> {
        self.letters.lock().unwrap().get(&id).and_then(|r| r.response)
    }
}

#[async_trait]
impl LetterStore for MemoryStore {
    async fn create(&self, content: &LetterContent) -> StoreResult<SealTicket> {
        let ticket = SealTicket {
            id: Uuid::new_v4(),
            sender_token: Uuid::new_v4(),
        };
        let record = LetterRecord {
            id: ticket.id,
            sender_token: ticket.sender_token,
            content: content.clone(),
            response: None,
            responded_at: None,
            opened_at: None,
            created_at: Utc::now(),
        };
        self.letters.lock().unwrap().insert(ticket.id, record);
        Ok(ticket)
    }

    async fn fetch_by_id(&self, id: Uuid) -> StoreResult<LetterContent> {
        self.letters
            .lock()
            .unwrap()
            .get(&id)
            .map(|r| r.content.clone())
            .ok_or_else(|| StoreError::NotFound(format!("Letter {} not found", id)))
    }

    async fn fetch_by_token(&self, token: Uuid) -> StoreResult<LetterRecord> {
        self.letters
            .lock()
            .unwrap()
            .values()
            .find(|r| r.sender_token == token)
            .cloned()
            .ok_or_else(|| StoreError::NotFound("No letter for this status link".to_string()))
    }

    async fn mark_opened(&self, id: Uuid) -> StoreResult<()> {
        let mut letters = self.letters.lock().unwrap();
        let record = letters
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("Letter {} not found", id)))?;
        // Set-if-null, like the conditional update in the real store.
        if record.opened_at.is_none() {
            record.opened_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn record_response(&self, id: Uuid, answer: Answer) -> StoreResult<()> {
        let mut letters = self.letters.lock().unwrap();
        let record = letters
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("Letter {} not found", id)))?;
        if record.response.is_none() {
            record.response = Some(answer);
            record.responded_at = Some(Utc::now());
        }
        Ok(())
    }
}
