//! services/api/src/web/reveal_task.rs
//!
//! This module contains the asynchronous "worker" function responsible for
//! the typewriter reveal of a formatted letter.

use tokio_util::sync::CancellationToken;
use tracing::info;
use valentine_core::flow::ENVELOPE_OPEN_DELAY;
use valentine_core::reveal::{RevealAnimator, REVEAL_TICK};

use crate::web::protocol::ServerMessage;
use crate::web::state::{send_message, WsSender};

/// Streams the letter to the client one character per tick.
///
/// Waits out the envelope-open animation first, then emits a growing prefix
/// every tick until the full text is visible. Designed to be gracefully
/// cancelled via a `CancellationToken` when the session retargets or ends;
/// the client keeps whatever was already rendered.
pub async fn reveal_process(text: String, ws_sender: WsSender, cancellation_token: CancellationToken) {
    tokio::select! {
        _ = cancellation_token.cancelled() => return,
        _ = tokio::time::sleep(ENVELOPE_OPEN_DELAY) => {}
    }

    if !send_message(&ws_sender, &ServerMessage::RevealStarted).await {
        return;
    }

    let mut animator = RevealAnimator::new(text);
    let mut ticker = tokio::time::interval(REVEAL_TICK);
    // The interval fires immediately the first time; consume that so the
    // first character lands one tick after the start signal.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = cancellation_token.cancelled() => {
                info!("Reveal cancelled.");
                return;
            }
            _ = ticker.tick() => {}
        }

        if !animator.tick() {
            break;
        }
        let chunk = ServerMessage::RevealChunk {
            text: animator.visible().to_string(),
        };
        if !send_message(&ws_sender, &chunk).await {
            info!("Client went away mid-reveal.");
            return;
        }
    }

    let _ = send_message(&ws_sender, &ServerMessage::RevealEnded).await;
}
