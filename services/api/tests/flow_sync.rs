//! End-to-end flow scenarios: the composer, viewer, and status state
//! machines driving a shared store, with the session layer's side effects
//! executed by hand.

mod support;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use api_lib::adapters::NullStore;
use api_lib::web::ws_handler::record_response_with_retry;
use async_trait::async_trait;
use support::MemoryStore;
use uuid::Uuid;
use valentine_core::domain::{Answer, LetterContent, LetterRecord};
use valentine_core::flow::{
    ComposerEffect, ComposerEvent, ComposerFlow, ComposerStep, ViewerEffect, ViewerEvent,
    ViewerFlow, ViewerStep,
};
use valentine_core::ports::{LetterStore, SealTicket, StoreError, StoreResult};

/// Runs a composer flow's seal against the given store and feeds the result
/// back in, the way the session's save task does.
async fn seal(flow: &mut ComposerFlow, store: &dyn LetterStore) -> Option<SealTicket> {
    let effects = flow.apply(ComposerEvent::Seal);
    let [ComposerEffect::SaveLetter(content)] = effects.as_slice() else {
        panic!("seal should emit exactly one save effect");
    };
    let ticket = store.create(content).await.ok();
    flow.apply(ComposerEvent::SealFinished(ticket));
    ticket
}

#[tokio::test]
async fn sealed_letter_reaches_the_viewer_with_its_greeting() {
    let store = MemoryStore::new();
    let mut letter = LetterContent::default();
    letter.recipient = "Sam".to_string();

    let mut composer = ComposerFlow::new(letter);
    let ticket = seal(&mut composer, &store).await.expect("save should succeed");

    // The recipient follows the shared link.
    let mut viewer = ViewerFlow::new();
    let fetched = store.fetch_by_id(ticket.id).await.ok();
    viewer.apply(ViewerEvent::Loaded(fetched));
    assert_eq!(viewer.step, ViewerStep::Envelope);

    let effects = viewer.apply(ViewerEvent::OpenEnvelope);
    let reveal_text = effects
        .iter()
        .find_map(|e| match e {
            ViewerEffect::StartReveal(text) => Some(text.clone()),
            _ => None,
        })
        .expect("opening the envelope should start the reveal");
    assert!(reveal_text.starts_with("Hey Sam!"));
}

#[tokio::test]
async fn opening_an_already_opened_letter_keeps_the_first_timestamp() {
    let store = MemoryStore::new();
    let ticket = store.create(&LetterContent::default()).await.unwrap();

    // First tab opens the envelope.
    store.mark_opened(ticket.id).await.unwrap();
    let first = store.opened_at(ticket.id).unwrap();

    // A second tab opens the same letter; the mark still succeeds and the
    // original timestamp stays.
    let mut viewer = ViewerFlow::new();
    viewer.apply(ViewerEvent::Loaded(store.fetch_by_id(ticket.id).await.ok()));
    let effects = viewer.apply(ViewerEvent::OpenEnvelope);
    assert!(effects.contains(&ViewerEffect::MarkOpened));

    store.mark_opened(ticket.id).await.unwrap();
    assert_eq!(store.opened_at(ticket.id), Some(first));
}

#[tokio::test]
async fn unconfigured_store_degrades_to_a_recoverable_save_error() {
    let mut composer = ComposerFlow::new(LetterContent::default());
    let ticket = seal(&mut composer, &NullStore).await;
    assert!(ticket.is_none());

    // The envelope and reveal carry on regardless of the failed save.
    composer.apply(ComposerEvent::EnvelopeOpened);
    composer.apply(ComposerEvent::Continue);

    assert_eq!(composer.step, ComposerStep::Share);
    assert!(composer.save_error);
    assert!(composer.ticket.is_none());
}

#[tokio::test]
async fn viewer_for_a_missing_letter_is_terminal() {
    let store = MemoryStore::new();
    let mut viewer = ViewerFlow::new();
    viewer.apply(ViewerEvent::Loaded(
        store.fetch_by_id(Uuid::new_v4()).await.ok(),
    ));
    assert_eq!(viewer.step, ViewerStep::NotFound);
}

//=========================================================================================
// Fire-and-forget response recording
//=========================================================================================

/// Fails the first `failures` record calls, then delegates.
struct FlakyStore {
    inner: MemoryStore,
    failures: AtomicU32,
}

#[async_trait]
impl LetterStore for FlakyStore {
    async fn create(&self, content: &LetterContent) -> StoreResult<SealTicket> {
        self.inner.create(content).await
    }
    async fn fetch_by_id(&self, id: Uuid) -> StoreResult<LetterContent> {
        self.inner.fetch_by_id(id).await
    }
    async fn fetch_by_token(&self, token: Uuid) -> StoreResult<LetterRecord> {
        self.inner.fetch_by_token(token).await
    }
    async fn mark_opened(&self, id: Uuid) -> StoreResult<()> {
        self.inner.mark_opened(id).await
    }
    async fn record_response(&self, id: Uuid, answer: Answer) -> StoreResult<()> {
        let remaining = self.failures.load(Ordering::SeqCst);
        if remaining > 0 {
            self.failures.store(remaining - 1, Ordering::SeqCst);
            return Err(StoreError::Unexpected("connection reset".to_string()));
        }
        self.inner.record_response(id, answer).await
    }
}

#[tokio::test(start_paused = true)]
async fn yes_response_is_recorded_on_the_single_retry() {
    let store = Arc::new(FlakyStore {
        inner: MemoryStore::new(),
        failures: AtomicU32::new(1),
    });
    let ticket = store.create(&LetterContent::default()).await.unwrap();

    record_response_with_retry(store.clone(), ticket.id, Answer::Yes).await;
    assert_eq!(store.inner.response(ticket.id), Some(Answer::Yes));
}

#[tokio::test(start_paused = true)]
async fn response_recording_gives_up_after_one_retry() {
    let store = Arc::new(FlakyStore {
        inner: MemoryStore::new(),
        failures: AtomicU32::new(2),
    });
    let ticket = store.create(&LetterContent::default()).await.unwrap();

    // Both attempts fail; the helper gives up silently.
    record_response_with_retry(store.clone(), ticket.id, Answer::Yes).await;
    assert_eq!(store.inner.response(ticket.id), None);
}
