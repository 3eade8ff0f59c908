//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the WebSocket sender handle
//! passed between a session loop and its spawned tasks.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures::stream::SplitSink;
use futures::SinkExt;
use tokio::sync::Mutex;
use valentine_core::ports::LetterStore;

use crate::config::Config;
use crate::draft::DraftStore;
use crate::web::protocol::ServerMessage;

//=========================================================================================
// AppState (Shared Across All Connections)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn LetterStore>,
    pub drafts: DraftStore,
    pub config: Arc<Config>,
}

//=========================================================================================
// WebSocket Sender Handle
//=========================================================================================

/// The write half of a socket, shared between the session loop and its
/// reveal/poll tasks.
pub type WsSender = Arc<Mutex<SplitSink<WebSocket, Message>>>;

/// Serializes and sends one server message. Returns false when the client
/// is gone, so callers can stop their work.
pub async fn send_message(sender: &WsSender, msg: &ServerMessage) -> bool {
    let json = serde_json::to_string(msg).unwrap();
    sender
        .lock()
        .await
        .send(Message::Text(json.into()))
        .await
        .is_ok()
}
