//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the browser client and the API
//! server for the interactive letter experience. Client messages are user
//! actions; server messages are step signals and reveal text.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use valentine_core::domain::{DeliveryStatus, LetterContent};

//=========================================================================================
// Messages Sent FROM the Client (Browser) TO the Server
//=========================================================================================

/// Represents the structured text messages a client can send to the server.
/// The first message on a connection must be one of `Compose`, `View`, or
/// `Status`; it selects which flow the session runs.
#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Start a sender session: compose, seal, share.
    Compose,

    /// Start a recipient session for the letter with this public id.
    View { letter_id: Uuid },

    /// Start a sender status session for this private token.
    Status { sender_token: Uuid },

    /// The composition changed. The whole letter is replaced on every edit.
    Edit { letter: LetterContent },

    /// The sender sealed the letter.
    Seal,

    /// Manual retry of a failed save, from the share step.
    RetrySave,

    /// The user opened the envelope.
    OpenEnvelope,

    /// The user pressed continue after the reveal finished.
    Continue,

    /// The recipient answered yes.
    AnswerYes,

    /// The recipient pressed (or hovered) the fleeing "No" button.
    AnswerNo,

    /// Back to composing from the share step.
    EditAgain,

    /// The status view was foregrounded or backgrounded. Polling is
    /// suspended while hidden.
    Visibility { visible: bool },

    /// Manual status refresh.
    Refresh,
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================

/// Represents the structured text messages the server can send to the client.
#[derive(Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Confirms a composer session; carries the saved draft (or defaults).
    ComposerReady { letter: LetterContent },

    /// Confirms a viewer session; the envelope is waiting to be opened.
    ViewerReady,

    /// The requested letter or status token matched nothing. Terminal for
    /// viewer sessions.
    NotFound,

    /// Reports a fatal error to the client, which should display an error message.
    Error { message: String },

    /// The sealed letter was saved; carries everything the share step needs.
    SealSaved {
        letter_id: Uuid,
        sender_token: Uuid,
        recipient_url: String,
        status_url: String,
    },

    /// The save failed. Recoverable: the share step offers a retry.
    SealFailed,

    /// The envelope has opened and the typewriter is about to start.
    RevealStarted,

    /// One more character of the letter is visible.
    RevealChunk { text: String },

    /// The full letter is visible.
    RevealEnded,

    /// The "No" button fled. Carries its new offset and caption, plus the
    /// persistent taunt line once the button has been chased enough.
    Bounce {
        caption: String,
        x: f64,
        y: f64,
        taunt: Option<String>,
    },

    /// Fire the celebration effect. Sent at most once per session.
    Celebrate,

    /// A status snapshot for the sender.
    Status {
        status: DeliveryStatus,
        caption: String,
        emoji: String,
        letter: LetterContent,
        recipient_url: String,
        opened_at: Option<DateTime<Utc>>,
        responded_at: Option<DateTime<Utc>>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_messages_use_snake_case_tags() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type":"visibility","visible":false}"#).unwrap();
        assert!(matches!(msg, ClientMessage::Visibility { visible: false }));

        let msg: ClientMessage = serde_json::from_str(r#"{"type":"answer_no"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::AnswerNo));
    }

    #[test]
    fn status_snapshot_serializes_the_kebab_case_label() {
        let msg = ServerMessage::Status {
            status: DeliveryStatus::OpenedPending,
            caption: DeliveryStatus::OpenedPending.caption().to_string(),
            emoji: DeliveryStatus::OpenedPending.emoji().to_string(),
            letter: LetterContent::default(),
            recipient_url: "http://localhost:3000/v/x".to_string(),
            opened_at: None,
            responded_at: None,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains(r#""type":"status""#));
        assert!(json.contains(r#""status":"opened-pending""#));
    }
}
