//! crates/valentine_core/src/ports.rs
//!
//! Defines the service contract (trait) for the letter store.
//! This trait forms the boundary of the hexagonal architecture, allowing the core
//! to be independent of the concrete storage backing the letters.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Answer, LetterContent, LetterRecord};

//=========================================================================================
// Store Error and Result Types
//=========================================================================================

/// Errors a store operation can surface. Flow controllers translate these
/// into user-visible consequence; they never escape as panics.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The store is unconfigured; no network was contacted.
    #[error("Letter store is not available")]
    Unavailable,
    #[error("Letter not found: {0}")]
    NotFound(String),
    #[error("An unexpected store error occurred: {0}")]
    Unexpected(String),
}

/// A convenience type alias for `Result<T, StoreError>`.
pub type StoreResult<T> = Result<T, StoreError>;

/// The identifiers handed back after a successful seal. The public `id` is
/// shareable; the `sender_token` stays with the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SealTicket {
    pub id: Uuid,
    pub sender_token: Uuid,
}

//=========================================================================================
// Store Port (Trait)
//=========================================================================================

#[async_trait]
pub trait LetterStore: Send + Sync {
    /// Inserts a new letter. Both identifiers are generated store-side;
    /// the returned id is usable for fetches as soon as this completes.
    async fn create(&self, content: &LetterContent) -> StoreResult<SealTicket>;

    /// Fetches the content fields of a letter by its public id. The sender
    /// token must never be returned through this path.
    async fn fetch_by_id(&self, id: Uuid) -> StoreResult<LetterContent>;

    /// Fetches the full record by the private sender token, for the status
    /// view.
    async fn fetch_by_token(&self, token: Uuid) -> StoreResult<LetterRecord>;

    /// Marks a letter opened. Idempotent: `opened_at` only ever transitions
    /// null -> timestamp, and re-marking succeeds without touching the
    /// original value.
    async fn mark_opened(&self, id: Uuid) -> StoreResult<()>;

    /// Records the recipient's answer and its timestamp. Set-once: a second
    /// answer does not overwrite the first.
    async fn record_response(&self, id: Uuid, answer: Answer) -> StoreResult<()>;
}
