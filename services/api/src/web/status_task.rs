//! services/api/src/web/status_task.rs
//!
//! This module contains the asynchronous "worker" function that re-fetches a
//! letter's record on an interval for the sender status view, plus the shared
//! fetch-apply-report step it and the session loop both use.

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use uuid::Uuid;
use valentine_core::domain::LetterRecord;
use valentine_core::flow::{StatusEffect, StatusEvent, StatusFlow, StatusStep, STATUS_POLL_INTERVAL};
use valentine_core::links;
use valentine_core::ports::StoreError;

use crate::web::protocol::ServerMessage;
use crate::web::state::{send_message, AppState, WsSender};

/// Re-fetches the record every poll interval until cancelled.
///
/// The session loop cancels this task while the view is backgrounded and
/// spawns a fresh one when it is foregrounded again, so no polls are wasted
/// on a hidden view.
pub async fn status_poll_process(
    app_state: Arc<AppState>,
    sender_token: Uuid,
    flow_lock: Arc<Mutex<StatusFlow>>,
    ws_sender: WsSender,
    cancellation_token: CancellationToken,
) {
    let mut ticker = tokio::time::interval(STATUS_POLL_INTERVAL);
    // The immediate first fire is skipped: the session loop already fetched.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = cancellation_token.cancelled() => {
                info!("Status polling suspended.");
                return;
            }
            _ = ticker.tick() => {}
        }
        fetch_and_report(&app_state, sender_token, &flow_lock, &ws_sender).await;
    }
}

/// One poll step: fetch the record, run it through the status flow, and
/// report the outcome to the client. The one-shot celebration guard lives in
/// the flow state, so it holds across the session's entire poll history.
pub async fn fetch_and_report(
    app_state: &Arc<AppState>,
    sender_token: Uuid,
    flow_lock: &Arc<Mutex<StatusFlow>>,
    ws_sender: &WsSender,
) {
    let fetched: Option<LetterRecord> = match app_state.store.fetch_by_token(sender_token).await {
        Ok(record) => Some(record),
        Err(StoreError::NotFound(_)) | Err(StoreError::Unavailable) => None,
        Err(e) => {
            error!("Status fetch failed: {e}");
            None
        }
    };

    let (effects, step, snapshot) = {
        let mut flow = flow_lock.lock().await;
        let effects = flow.apply(StatusEvent::Fetched(fetched));
        (effects, flow.step, flow.record.clone())
    };

    match snapshot.filter(|_| step == StatusStep::Display) {
        Some(record) => {
            let status = record.status();
            let msg = ServerMessage::Status {
                status,
                caption: status.caption().to_string(),
                emoji: status.emoji().to_string(),
                letter: record.content.clone(),
                recipient_url: links::recipient_url(&app_state.config.public_origin, record.id),
                opened_at: record.opened_at,
                responded_at: record.responded_at,
            };
            if !send_message(ws_sender, &msg).await {
                return;
            }
        }
        None => {
            let _ = send_message(ws_sender, &ServerMessage::NotFound).await;
        }
    }

    for effect in effects {
        if effect == StatusEffect::Celebrate {
            let _ = send_message(ws_sender, &ServerMessage::Celebrate).await;
        }
    }
}
