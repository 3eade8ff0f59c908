//! crates/valentine_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or wire format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

//=========================================================================================
// Field Limits and Fixed Sets
//=========================================================================================

pub const RECIPIENT_MAX_CHARS: usize = 40;
pub const OPENING_MAX_CHARS: usize = 200;
pub const BODY_MAX_CHARS: usize = 600;
pub const SIGNATURE_MAX_CHARS: usize = 40;
pub const POSTSCRIPT_MAX_CHARS: usize = 120;

/// The fixed set of seal glyphs a sender can pick from.
pub const STICKERS: [&str; 8] = ["💌", "🌹", "🐻", "🍓", "🧸", "🎈", "💫", "🎀"];

//=========================================================================================
// LetterContent
//=========================================================================================

/// The composed letter fields. Replaced wholesale on every edit; the
/// defaults below stand in for any field left empty when the letter is
/// formatted for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LetterContent {
    pub recipient: String,
    pub opening: String,
    pub body: String,
    pub signature: String,
    pub postscript: String,
    pub sticker: String,
    pub tone: u8,
}

impl Default for LetterContent {
    fn default() -> Self {
        Self {
            recipient: String::new(),
            opening: "I've been wanting to ask you something special for a while now. \
                      You make every day brighter and I love spending time with you."
                .to_string(),
            body: "Being with you feels like sunshine and cotton candy all at once. \
                   I can't help but smile every time I think of you, and I hope this \
                   little note makes you smile too."
                .to_string(),
            signature: "Your secret admirer".to_string(),
            postscript: "Also, I saved you the last piece of chocolate.".to_string(),
            sticker: "💌".to_string(),
            tone: 70,
        }
    }
}

/// A letter with every field optional, as found in a saved draft or a seal
/// request. Missing fields take the canonical default.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PartialLetter {
    pub recipient: Option<String>,
    pub opening: Option<String>,
    pub body: Option<String>,
    pub signature: Option<String>,
    pub postscript: Option<String>,
    pub sticker: Option<String>,
    pub tone: Option<u8>,
}

impl LetterContent {
    /// Merges a partial letter over the canonical defaults, field by field.
    pub fn with_defaults(partial: PartialLetter) -> Self {
        let defaults = Self::default();
        Self {
            recipient: partial.recipient.unwrap_or(defaults.recipient),
            opening: partial.opening.unwrap_or(defaults.opening),
            body: partial.body.unwrap_or(defaults.body),
            signature: partial.signature.unwrap_or(defaults.signature),
            postscript: partial.postscript.unwrap_or(defaults.postscript),
            sticker: partial.sticker.unwrap_or(defaults.sticker),
            tone: partial.tone.unwrap_or(defaults.tone),
        }
    }

    /// Clamps every field to its character limit and restricts the sticker
    /// to the fixed glyph set. The compose form enforces the same limits,
    /// but content arriving over the wire cannot be trusted to.
    pub fn sanitized(mut self) -> Self {
        self.recipient = truncate_chars(self.recipient, RECIPIENT_MAX_CHARS);
        self.opening = truncate_chars(self.opening, OPENING_MAX_CHARS);
        self.body = truncate_chars(self.body, BODY_MAX_CHARS);
        self.signature = truncate_chars(self.signature, SIGNATURE_MAX_CHARS);
        self.postscript = truncate_chars(self.postscript, POSTSCRIPT_MAX_CHARS);
        if !self.sticker.is_empty() && !STICKERS.contains(&self.sticker.as_str()) {
            self.sticker = "💌".to_string();
        }
        self.tone = self.tone.min(100);
        self
    }

    /// Builds the human-readable letter text.
    ///
    /// Sections in order: greeting, opening, body, signature line with a
    /// heart glyph, then an optional "P.S." line and an optional trailing
    /// sticker glyph. Empty fields fall back to the defaults so the result
    /// is never blank. Pure and deterministic for identical input.
    pub fn format_for_display(&self) -> String {
        let defaults = Self::default();

        let greeting = if self.recipient.is_empty() {
            "Hey there!".to_string()
        } else {
            format!("Hey {}!", self.recipient.trim())
        };

        let opening = if self.opening.is_empty() {
            &defaults.opening
        } else {
            &self.opening
        };
        let body = if self.body.is_empty() {
            &defaults.body
        } else {
            &self.body
        };
        let signature = if self.signature.is_empty() {
            defaults.signature.clone()
        } else {
            format!("❤️ {}", self.signature.trim())
        };

        let mut parts = vec![greeting, opening.clone(), body.clone(), signature];

        if !self.postscript.is_empty() {
            parts.push(format!("P.S. {}", self.postscript));
        }
        if !self.sticker.is_empty() {
            parts.push(self.sticker.clone());
        }

        parts.join("\n\n")
    }

    /// Label for the tone slider. UI-only; nothing downstream consumes it.
    pub fn tone_label(&self) -> &'static str {
        match self.tone {
            0..=24 => "Playful",
            25..=49 => "Sweet",
            50..=74 => "Melted",
            _ => "Hopeless romantic",
        }
    }
}

fn truncate_chars(value: String, max: usize) -> String {
    if value.chars().count() <= max {
        value
    } else {
        value.chars().take(max).collect()
    }
}

//=========================================================================================
// LetterRecord
//=========================================================================================

/// The recipient's answer to the question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Answer {
    Yes,
    No,
}

impl Answer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Answer::Yes => "yes",
            Answer::No => "no",
        }
    }
}

/// A letter as owned by the store. `id` is public and shareable;
/// `sender_token` is private to the sender and must never travel on the
/// fetch-by-id path.
#[derive(Debug, Clone)]
pub struct LetterRecord {
    pub id: Uuid,
    pub sender_token: Uuid,
    pub content: LetterContent,
    pub response: Option<Answer>,
    pub responded_at: Option<DateTime<Utc>>,
    pub opened_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

//=========================================================================================
// DeliveryStatus
//=========================================================================================

/// The sender-facing state of a sent letter, derived purely from
/// `(response, opened_at)` so every poll re-derives it identically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryStatus {
    Unopened,
    OpenedPending,
    Matched,
    Declined,
}

impl DeliveryStatus {
    pub fn derive(response: Option<Answer>, opened_at: Option<DateTime<Utc>>) -> Self {
        match (response, opened_at) {
            (Some(Answer::Yes), _) => DeliveryStatus::Matched,
            (Some(Answer::No), _) => DeliveryStatus::Declined,
            (None, Some(_)) => DeliveryStatus::OpenedPending,
            (None, None) => DeliveryStatus::Unopened,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DeliveryStatus::Unopened => "unopened",
            DeliveryStatus::OpenedPending => "opened-pending",
            DeliveryStatus::Matched => "matched",
            DeliveryStatus::Declined => "declined",
        }
    }

    /// Human-readable caption shown on the status view.
    pub fn caption(&self) -> &'static str {
        match self {
            DeliveryStatus::Unopened => "Not yet opened",
            DeliveryStatus::OpenedPending => "Opened, awaiting response...",
            DeliveryStatus::Matched => "It's a match! They said yes",
            DeliveryStatus::Declined => "They said no...",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            DeliveryStatus::Unopened => "✉️",
            DeliveryStatus::OpenedPending => "👀",
            DeliveryStatus::Matched => "💖",
            DeliveryStatus::Declined => "💔",
        }
    }
}

impl LetterRecord {
    pub fn status(&self) -> DeliveryStatus {
        DeliveryStatus::derive(self.response, self.opened_at)
    }
}

//=========================================================================================
// Tests
//=========================================================================================
