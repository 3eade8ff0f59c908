//! services/api/src/web/ws_handler.rs
//!
//! This is the main entry point and control loop for a WebSocket connection.
//! The first client message selects a flow (composer, viewer, or status);
//! the matching session loop then drives that flow's state machine and
//! delegates timed work to spawned tasks.

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::stream::{SplitStream, StreamExt};
use rand::Rng;
use tokio::{sync::Mutex, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::Uuid;
use valentine_core::domain::{Answer, LetterContent};
use valentine_core::flow::{
    ComposerEffect, ComposerEvent, ComposerFlow, StatusEffect, StatusEvent, StatusFlow,
    ViewerEffect, ViewerEvent, ViewerFlow, ViewerStep, BOUNCE_RANGE, NO_TAUNT_LINE,
    RESPONSE_RETRY_DELAY,
};
use valentine_core::links;
use valentine_core::ports::{LetterStore, StoreError};

use crate::web::{
    protocol::{ClientMessage, ServerMessage},
    reveal_task::reveal_process,
    state::{send_message, AppState, WsSender},
    status_task::{fetch_and_report, status_poll_process},
};

/// The handler for upgrading HTTP requests to WebSocket connections.
pub async fn ws_handler(ws: WebSocketUpgrade, State(app_state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app_state))
}

async fn handle_socket(socket: WebSocket, app_state: Arc<AppState>) {
    info!("New WebSocket connection established.");

    // The sender is wrapped in an Arc<Mutex<>> to allow for shared mutable
    // access across the session loop and its tasks.
    let (sender, mut receiver) = socket.split();
    let ws_sender: WsSender = Arc::new(Mutex::new(sender));

    // --- 1. Flow Selection Phase ---
    if let Some(Ok(Message::Text(init_json))) = receiver.next().await {
        match serde_json::from_str::<ClientMessage>(&init_json) {
            Ok(ClientMessage::Compose) => {
                composer_session(app_state, ws_sender, receiver).await;
            }
            Ok(ClientMessage::View { letter_id }) => {
                viewer_session(app_state, ws_sender, receiver, letter_id).await;
            }
            Ok(ClientMessage::Status { sender_token }) => {
                status_session(app_state, ws_sender, receiver, sender_token).await;
            }
            Ok(_) => {
                error!("First message did not select a flow.");
                let err_msg = ServerMessage::Error {
                    message: "The first message must select a flow.".to_string(),
                };
                let _ = send_message(&ws_sender, &err_msg).await;
            }
            Err(e) => {
                warn!("Failed to deserialize init message: {e}");
            }
        }
    } else {
        info!("Client disconnected before selecting a flow.");
    }

    info!("WebSocket connection closed.");
}

//=========================================================================================
// Composer Session
//=========================================================================================

async fn composer_session(
    app_state: Arc<AppState>,
    ws_sender: WsSender,
    mut receiver: SplitStream<WebSocket>,
) {
    // The flow state is shared with the save task, which reports the seal
    // outcome back into it.
    let flow_lock = Arc::new(Mutex::new(ComposerFlow::new(app_state.drafts.load())));
    {
        let flow = flow_lock.lock().await;
        let ready = ServerMessage::ComposerReady {
            letter: flow.letter.clone(),
        };
        if !send_message(&ws_sender, &ready).await {
            return;
        }
    }

    let mut reveal_token = CancellationToken::new();
    let mut reveal_handle: Option<JoinHandle<()>> = None;

    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(text) => {
                let client_msg = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(client_msg) => client_msg,
                    Err(e) => {
                        warn!("Failed to deserialize client message: {e}");
                        continue;
                    }
                };
                let event = match client_msg {
                    ClientMessage::Edit { letter } => ComposerEvent::Edited(letter.sanitized()),
                    ClientMessage::Seal => ComposerEvent::Seal,
                    ClientMessage::RetrySave => ComposerEvent::RetrySave,
                    ClientMessage::OpenEnvelope => ComposerEvent::EnvelopeOpened,
                    ClientMessage::Continue => ComposerEvent::Continue,
                    ClientMessage::EditAgain => ComposerEvent::Edit,
                    other => {
                        warn!("Ignoring message not meant for a composer session: {other:?}");
                        continue;
                    }
                };

                let effects = { flow_lock.lock().await.apply(event) };
                for effect in effects {
                    match effect {
                        ComposerEffect::PersistDraft(letter) => {
                            app_state.drafts.save(&letter);
                        }
                        ComposerEffect::SaveLetter(content) => {
                            spawn_seal_save(
                                app_state.clone(),
                                flow_lock.clone(),
                                ws_sender.clone(),
                                content,
                            );
                        }
                        ComposerEffect::StartReveal(text) => {
                            reveal_token.cancel();
                            reveal_token = CancellationToken::new();
                            reveal_handle = Some(tokio::spawn(reveal_process(
                                text,
                                ws_sender.clone(),
                                reveal_token.clone(),
                            )));
                        }
                    }
                }
            }
            Message::Close(_) => {
                info!("Client sent close message.");
                break;
            }
            _ => {}
        }
    }

    // --- Cleanup ---
    reveal_token.cancel();
    if let Some(handle) = reveal_handle {
        handle.abort();
    }
    info!("Composer session ended.");
}

/// Runs the seal save concurrently with the envelope animation. An in-flight
/// save outlives the session loop harmlessly: its result lands in a flow
/// nobody reads and a socket nobody listens on.
fn spawn_seal_save(
    app_state: Arc<AppState>,
    flow_lock: Arc<Mutex<ComposerFlow>>,
    ws_sender: WsSender,
    content: LetterContent,
) {
    tokio::spawn(async move {
        match app_state.store.create(&content).await {
            Ok(ticket) => {
                flow_lock
                    .lock()
                    .await
                    .apply(ComposerEvent::SealFinished(Some(ticket)));
                let origin = &app_state.config.public_origin;
                let msg = ServerMessage::SealSaved {
                    letter_id: ticket.id,
                    sender_token: ticket.sender_token,
                    recipient_url: links::recipient_url(origin, ticket.id),
                    status_url: links::status_url(origin, ticket.sender_token),
                };
                let _ = send_message(&ws_sender, &msg).await;
            }
            Err(e) => {
                warn!("Failed to save letter: {e}");
                flow_lock
                    .lock()
                    .await
                    .apply(ComposerEvent::SealFinished(None));
                let _ = send_message(&ws_sender, &ServerMessage::SealFailed).await;
            }
        }
    });
}

//=========================================================================================
// Viewer Session
//=========================================================================================

async fn viewer_session(
    app_state: Arc<AppState>,
    ws_sender: WsSender,
    mut receiver: SplitStream<WebSocket>,
    letter_id: Uuid,
) {
    let mut flow = ViewerFlow::new();

    let fetched = match app_state.store.fetch_by_id(letter_id).await {
        Ok(content) => Some(content),
        Err(StoreError::NotFound(_)) | Err(StoreError::Unavailable) => None,
        Err(e) => {
            error!("Failed to fetch letter {letter_id}: {e}");
            None
        }
    };
    flow.apply(ViewerEvent::Loaded(fetched));

    if flow.step == ViewerStep::NotFound {
        // Terminal: the only escape is navigating away.
        let _ = send_message(&ws_sender, &ServerMessage::NotFound).await;
        return;
    }
    if !send_message(&ws_sender, &ServerMessage::ViewerReady).await {
        return;
    }

    let mut reveal_token = CancellationToken::new();
    let mut reveal_handle: Option<JoinHandle<()>> = None;

    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(text) => {
                let client_msg = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(client_msg) => client_msg,
                    Err(e) => {
                        warn!("Failed to deserialize client message: {e}");
                        continue;
                    }
                };
                match client_msg {
                    ClientMessage::OpenEnvelope => {
                        for effect in flow.apply(ViewerEvent::OpenEnvelope) {
                            match effect {
                                ViewerEffect::MarkOpened => {
                                    spawn_mark_opened(app_state.store.clone(), letter_id);
                                }
                                ViewerEffect::StartReveal(text) => {
                                    reveal_token.cancel();
                                    reveal_token = CancellationToken::new();
                                    reveal_handle = Some(tokio::spawn(reveal_process(
                                        text,
                                        ws_sender.clone(),
                                        reveal_token.clone(),
                                    )));
                                }
                                _ => {}
                            }
                        }
                    }
                    ClientMessage::Continue => {
                        flow.apply(ViewerEvent::Continue);
                    }
                    ClientMessage::AnswerNo => {
                        let before = flow.no_presses;
                        let offset = bounce_offset();
                        flow.apply(ViewerEvent::No { offset });
                        if flow.no_presses > before {
                            let msg = ServerMessage::Bounce {
                                caption: flow.no_caption().to_string(),
                                x: flow.no_offset.0,
                                y: flow.no_offset.1,
                                taunt: flow.taunting().then(|| NO_TAUNT_LINE.to_string()),
                            };
                            if !send_message(&ws_sender, &msg).await {
                                break;
                            }
                        }
                    }
                    ClientMessage::AnswerYes => {
                        for effect in flow.apply(ViewerEvent::Yes) {
                            match effect {
                                ViewerEffect::Celebrate => {
                                    let _ =
                                        send_message(&ws_sender, &ServerMessage::Celebrate).await;
                                }
                                ViewerEffect::RecordResponse(answer) => {
                                    spawn_record_response(
                                        app_state.store.clone(),
                                        letter_id,
                                        answer,
                                    );
                                }
                                _ => {}
                            }
                        }
                    }
                    other => {
                        warn!("Ignoring message not meant for a viewer session: {other:?}");
                    }
                }
            }
            Message::Close(_) => {
                info!("Client sent close message.");
                break;
            }
            _ => {}
        }
    }

    // --- Cleanup ---
    reveal_token.cancel();
    if let Some(handle) = reveal_handle {
        handle.abort();
    }
    info!("Viewer session ended.");
}

/// A fresh offset for the fleeing "No" button, uniform and independent per
/// axis.
fn bounce_offset() -> (f64, f64) {
    let mut rng = rand::thread_rng();
    (
        rng.gen_range(-BOUNCE_RANGE..=BOUNCE_RANGE),
        rng.gen_range(-BOUNCE_RANGE..=BOUNCE_RANGE),
    )
}

/// Fire-and-forget: the envelope animation never waits on this update, and
/// a failure is only logged.
fn spawn_mark_opened(store: Arc<dyn LetterStore>, letter_id: Uuid) {
    tokio::spawn(async move {
        if let Err(e) = store.mark_opened(letter_id).await {
            warn!("mark_opened failed for letter {letter_id}: {e}");
        }
    });
}

fn spawn_record_response(store: Arc<dyn LetterStore>, letter_id: Uuid, answer: Answer) {
    tokio::spawn(record_response_with_retry(store, letter_id, answer));
}

/// Best-effort recording of the answer: one retry after a fixed delay, then
/// give up with a log line. The celebration already happened; the flow never
/// waits on this.
pub async fn record_response_with_retry(
    store: Arc<dyn LetterStore>,
    letter_id: Uuid,
    answer: Answer,
) {
    if store.record_response(letter_id, answer).await.is_ok() {
        return;
    }
    warn!("record_response failed for letter {letter_id}; retrying once");
    tokio::time::sleep(RESPONSE_RETRY_DELAY).await;
    if let Err(e) = store.record_response(letter_id, answer).await {
        warn!("record_response retry failed for letter {letter_id}: {e}");
    }
}

//=========================================================================================
// Status Session
//=========================================================================================

async fn status_session(
    app_state: Arc<AppState>,
    ws_sender: WsSender,
    mut receiver: SplitStream<WebSocket>,
    sender_token: Uuid,
) {
    // The flow state is shared with the poll task so the one-shot
    // celebration guard covers both paths.
    let flow_lock = Arc::new(Mutex::new(StatusFlow::new()));

    // Initial fetch, then poll on the interval while visible.
    fetch_and_report(&app_state, sender_token, &flow_lock, &ws_sender).await;

    let mut poll_token = CancellationToken::new();
    let mut poll_handle = Some(tokio::spawn(status_poll_process(
        app_state.clone(),
        sender_token,
        flow_lock.clone(),
        ws_sender.clone(),
        poll_token.clone(),
    )));

    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(text) => {
                let client_msg = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(client_msg) => client_msg,
                    Err(e) => {
                        warn!("Failed to deserialize client message: {e}");
                        continue;
                    }
                };
                let event = match client_msg {
                    ClientMessage::Visibility { visible } => {
                        StatusEvent::VisibilityChanged(visible)
                    }
                    ClientMessage::Refresh => StatusEvent::Refresh,
                    other => {
                        warn!("Ignoring message not meant for a status session: {other:?}");
                        continue;
                    }
                };

                let effects = { flow_lock.lock().await.apply(event) };
                for effect in effects {
                    match effect {
                        StatusEffect::Fetch => {
                            fetch_and_report(&app_state, sender_token, &flow_lock, &ws_sender)
                                .await;
                        }
                        StatusEffect::StartPolling => {
                            poll_token = CancellationToken::new();
                            poll_handle = Some(tokio::spawn(status_poll_process(
                                app_state.clone(),
                                sender_token,
                                flow_lock.clone(),
                                ws_sender.clone(),
                                poll_token.clone(),
                            )));
                        }
                        StatusEffect::StopPolling => {
                            poll_token.cancel();
                            if let Some(handle) = poll_handle.take() {
                                handle.abort();
                            }
                        }
                        StatusEffect::Celebrate => {
                            let _ = send_message(&ws_sender, &ServerMessage::Celebrate).await;
                        }
                    }
                }
            }
            Message::Close(_) => {
                info!("Client sent close message.");
                break;
            }
            _ => {}
        }
    }

    // --- Cleanup ---
    poll_token.cancel();
    if let Some(handle) = poll_handle {
        handle.abort();
    }
    info!("Status session ended.");
}
