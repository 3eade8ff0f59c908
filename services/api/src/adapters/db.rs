//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `LetterStore` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::warn;
use uuid::Uuid;
use valentine_core::domain::{Answer, LetterContent, LetterRecord};
use valentine_core::ports::{LetterStore, SealTicket, StoreError, StoreResult};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `LetterStore` port.
#[derive(Clone)]
pub struct DbStore {
    pool: PgPool,
}

impl DbStore {
    /// Creates a new `DbStore`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct TicketRecord {
    id: Uuid,
    sender_token: Uuid,
}

impl TicketRecord {
    fn to_domain(self) -> SealTicket {
        SealTicket {
            id: self.id,
            sender_token: self.sender_token,
        }
    }
}

#[derive(FromRow)]
struct ContentRecord {
    recipient: String,
    opening: String,
    body: String,
    signature: String,
    postscript: String,
    sticker: String,
    tone: i16,
}

impl ContentRecord {
    fn to_domain(self) -> LetterContent {
        LetterContent {
            recipient: self.recipient,
            opening: self.opening,
            body: self.body,
            signature: self.signature,
            postscript: self.postscript,
            sticker: self.sticker,
            tone: self.tone.clamp(0, 100) as u8,
        }
    }
}

#[derive(FromRow)]
struct LetterRow {
    id: Uuid,
    sender_token: Uuid,
    recipient: String,
    opening: String,
    body: String,
    signature: String,
    postscript: String,
    sticker: String,
    tone: i16,
    response: Option<String>,
    responded_at: Option<DateTime<Utc>>,
    opened_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl LetterRow {
    fn to_domain(self) -> LetterRecord {
        let response = match self.response.as_deref() {
            Some("yes") => Some(Answer::Yes),
            Some("no") => Some(Answer::No),
            Some(other) => {
                warn!("Ignoring unknown response value in row {}: {other}", self.id);
                None
            }
            None => None,
        };
        LetterRecord {
            id: self.id,
            sender_token: self.sender_token,
            content: LetterContent {
                recipient: self.recipient,
                opening: self.opening,
                body: self.body,
                signature: self.signature,
                postscript: self.postscript,
                sticker: self.sticker,
                tone: self.tone.clamp(0, 100) as u8,
            },
            response,
            responded_at: self.responded_at,
            opened_at: self.opened_at,
            created_at: self.created_at,
        }
    }
}

//=========================================================================================
// `LetterStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl LetterStore for DbStore {
    async fn create(&self, content: &LetterContent) -> StoreResult<SealTicket> {
        let record = sqlx::query_as::<_, TicketRecord>(
            "INSERT INTO valentines (recipient, opening, body, signature, postscript, sticker, tone) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id, sender_token",
        )
        .bind(&content.recipient)
        .bind(&content.opening)
        .bind(&content.body)
        .bind(&content.signature)
        .bind(&content.postscript)
        .bind(&content.sticker)
        .bind(content.tone as i16)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::Unexpected(e.to_string()))?;

        Ok(record.to_domain())
    }

    async fn fetch_by_id(&self, id: Uuid) -> StoreResult<LetterContent> {
        // The sender token is deliberately not selected on this path.
        let record = sqlx::query_as::<_, ContentRecord>(
            "SELECT recipient, opening, body, signature, postscript, sticker, tone \
             FROM valentines WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Unexpected(e.to_string()))?
        .ok_or_else(|| StoreError::NotFound(format!("Letter {} not found", id)))?;

        Ok(record.to_domain())
    }

    async fn fetch_by_token(&self, token: Uuid) -> StoreResult<LetterRecord> {
        let record = sqlx::query_as::<_, LetterRow>(
            "SELECT id, sender_token, recipient, opening, body, signature, postscript, \
             sticker, tone, response, responded_at, opened_at, created_at \
             FROM valentines WHERE sender_token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Unexpected(e.to_string()))?
        .ok_or_else(|| StoreError::NotFound("No letter for this status link".to_string()))?;

        Ok(record.to_domain())
    }

    async fn mark_opened(&self, id: Uuid) -> StoreResult<()> {
        // Conditional set-if-null: concurrent openers race harmlessly, the
        // loser's update matches zero rows and the original timestamp stays.
        let result = sqlx::query(
            "UPDATE valentines SET opened_at = now() WHERE id = $1 AND opened_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Unexpected(e.to_string()))?;

        if result.rows_affected() == 0 {
            self.ensure_exists(id).await?;
        }
        Ok(())
    }

    async fn record_response(&self, id: Uuid, answer: Answer) -> StoreResult<()> {
        // Set-once: a second answer never overwrites the first.
        let result = sqlx::query(
            "UPDATE valentines SET response = $2, responded_at = now() \
             WHERE id = $1 AND response IS NULL",
        )
        .bind(id)
        .bind(answer.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Unexpected(e.to_string()))?;

        if result.rows_affected() == 0 {
            self.ensure_exists(id).await?;
        }
        Ok(())
    }
}

impl DbStore {
    /// Distinguishes "already set" (fine, idempotent success) from a
    /// missing record after a conditional update matched no rows.
    async fn ensure_exists(&self, id: Uuid) -> StoreResult<()> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM valentines WHERE id = $1)",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreError::Unexpected(e.to_string()))?;

        if exists {
            Ok(())
        } else {
            Err(StoreError::NotFound(format!("Letter {} not found", id)))
        }
    }
}
