//! crates/valentine_core/src/flow.rs
//!
//! The step flow controllers: one small state machine per flow (composer,
//! viewer, status). Each is an owned state struct with a pure
//! `apply(event) -> effects` reducer, so the machines can be unit-tested
//! without a socket or a store. Side effects (saves, fetches, reveal
//! streaming) are returned as values for the session layer to execute.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::{Answer, LetterContent, LetterRecord};
use crate::ports::SealTicket;

//=========================================================================================
// Timing and Question Constants
//=========================================================================================

/// How long the envelope-open animation runs before the letter is revealed.
pub const ENVELOPE_OPEN_DELAY: Duration = Duration::from_millis(1500);

/// Delay before the single retry of a failed `record_response`.
pub const RESPONSE_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// Interval between status re-fetches while the view is visible.
pub const STATUS_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// The "No" button relocates within this range on each axis, per press.
pub const BOUNCE_RANGE: f64 = 100.0;

/// After this many "No" presses a persistent taunt line is shown.
pub const NO_TAUNT_AFTER: usize = 3;

pub const NO_TAUNT_LINE: &str = "The \"No\" button seems to be running away...";

/// Captions the "No" button cycles through, clamped at the last one.
pub const NO_BUTTON_PHRASES: [&str; 16] = [
    "No",
    "Are you sure?",
    "Really sure?",
    "Think again!",
    "Last chance!",
    "Surely not?",
    "You might regret this!",
    "Give it another thought!",
    "Are you absolutely certain?",
    "This could be a mistake!",
    "Have a heart!",
    "Don't be so cold!",
    "Change of heart?",
    "Wouldn't you reconsider?",
    "Is that your final answer?",
    "You're breaking my heart ;(",
];

/// Caption for the "No" button after `presses` presses.
pub fn no_button_caption(presses: usize) -> &'static str {
    NO_BUTTON_PHRASES[presses.min(NO_BUTTON_PHRASES.len() - 1)]
}

//=========================================================================================
// Composer Flow
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComposerStep {
    Compose,
    Sealing,
    Reveal,
    Share,
}

/// Sender-side session state: compose, seal into the envelope, watch the
/// reveal, then share.
#[derive(Debug, Clone)]
pub struct ComposerFlow {
    pub step: ComposerStep,
    pub letter: LetterContent,
    pub ticket: Option<SealTicket>,
    pub saving: bool,
    pub save_error: bool,
}

#[derive(Debug, Clone)]
pub enum ComposerEvent {
    /// The letter was edited; content is replaced wholesale.
    Edited(LetterContent),
    /// The sender sealed the letter.
    Seal,
    /// The save side effect finished, successfully or not.
    SealFinished(Option<SealTicket>),
    /// The envelope-open animation completed.
    EnvelopeOpened,
    /// The reveal finished and the sender pressed continue.
    Continue,
    /// Manual retry of a failed save, offered on the share step.
    RetrySave,
    /// Back to composing; seal state is reset, content is kept.
    Edit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ComposerEffect {
    PersistDraft(LetterContent),
    SaveLetter(LetterContent),
    StartReveal(String),
}

impl ComposerFlow {
    pub fn new(letter: LetterContent) -> Self {
        Self {
            step: ComposerStep::Compose,
            letter,
            ticket: None,
            saving: false,
            save_error: false,
        }
    }

    /// Applies one event and returns the side effects to run. Events that
    /// do not apply to the current step are ignored.
    pub fn apply(&mut self, event: ComposerEvent) -> Vec<ComposerEffect> {
        match event {
            ComposerEvent::Edited(letter) => {
                if self.step != ComposerStep::Compose {
                    return Vec::new();
                }
                self.letter = letter;
                vec![ComposerEffect::PersistDraft(self.letter.clone())]
            }
            ComposerEvent::Seal => {
                if self.step != ComposerStep::Compose {
                    return Vec::new();
                }
                // The envelope-close animation and the save run concurrently;
                // neither waits on the other.
                self.step = ComposerStep::Sealing;
                self.ticket = None;
                self.saving = true;
                self.save_error = false;
                vec![ComposerEffect::SaveLetter(self.letter.clone())]
            }
            ComposerEvent::SealFinished(ticket) => {
                self.saving = false;
                match ticket {
                    Some(ticket) => {
                        self.ticket = Some(ticket);
                        self.save_error = false;
                    }
                    None => self.save_error = true,
                }
                Vec::new()
            }
            ComposerEvent::EnvelopeOpened => {
                if self.step != ComposerStep::Sealing {
                    return Vec::new();
                }
                self.step = ComposerStep::Reveal;
                vec![ComposerEffect::StartReveal(self.letter.format_for_display())]
            }
            ComposerEvent::Continue => {
                if self.step != ComposerStep::Reveal {
                    return Vec::new();
                }
                self.step = ComposerStep::Share;
                Vec::new()
            }
            ComposerEvent::RetrySave => {
                if self.step != ComposerStep::Share || self.saving {
                    return Vec::new();
                }
                self.saving = true;
                self.save_error = false;
                vec![ComposerEffect::SaveLetter(self.letter.clone())]
            }
            ComposerEvent::Edit => {
                if self.step != ComposerStep::Share {
                    return Vec::new();
                }
                self.step = ComposerStep::Compose;
                self.ticket = None;
                self.saving = false;
                self.save_error = false;
                Vec::new()
            }
        }
    }
}

//=========================================================================================
// Viewer Flow
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewerStep {
    Loading,
    NotFound,
    Envelope,
    Reveal,
    Question,
    Celebration,
}

/// Recipient-side session state: open the envelope, read the reveal, answer
/// the question.
#[derive(Debug, Clone)]
pub struct ViewerFlow {
    pub step: ViewerStep,
    pub letter: Option<LetterContent>,
    pub no_presses: usize,
    pub no_offset: (f64, f64),
}

#[derive(Debug, Clone)]
pub enum ViewerEvent {
    /// The initial fetch completed; `None` means the letter does not exist.
    Loaded(Option<LetterContent>),
    OpenEnvelope,
    /// The reveal finished and the recipient pressed continue.
    Continue,
    /// A "No" press or hover. The new button offset is drawn by the caller
    /// so the reducer stays deterministic.
    No { offset: (f64, f64) },
    Yes,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewerEffect {
    MarkOpened,
    StartReveal(String),
    RecordResponse(Answer),
    Celebrate,
}

impl ViewerFlow {
    pub fn new() -> Self {
        Self {
            step: ViewerStep::Loading,
            letter: None,
            no_presses: 0,
            no_offset: (0.0, 0.0),
        }
    }

    pub fn no_caption(&self) -> &'static str {
        no_button_caption(self.no_presses)
    }

    pub fn taunting(&self) -> bool {
        self.no_presses > NO_TAUNT_AFTER
    }

    pub fn apply(&mut self, event: ViewerEvent) -> Vec<ViewerEffect> {
        match event {
            ViewerEvent::Loaded(letter) => {
                if self.step != ViewerStep::Loading {
                    return Vec::new();
                }
                match letter {
                    Some(letter) => {
                        self.letter = Some(letter);
                        self.step = ViewerStep::Envelope;
                    }
                    // Terminal for this session; the only escape is
                    // navigating away.
                    None => self.step = ViewerStep::NotFound,
                }
                Vec::new()
            }
            ViewerEvent::OpenEnvelope => {
                if self.step != ViewerStep::Envelope {
                    return Vec::new();
                }
                let Some(letter) = &self.letter else {
                    return Vec::new();
                };
                self.step = ViewerStep::Reveal;
                // mark-opened fires alongside the open animation; neither
                // waits on the other.
                vec![
                    ViewerEffect::MarkOpened,
                    ViewerEffect::StartReveal(letter.format_for_display()),
                ]
            }
            ViewerEvent::Continue => {
                if self.step != ViewerStep::Reveal {
                    return Vec::new();
                }
                self.step = ViewerStep::Question;
                Vec::new()
            }
            ViewerEvent::No { offset } => {
                if self.step != ViewerStep::Question {
                    return Vec::new();
                }
                self.no_presses += 1;
                self.no_offset = offset;
                Vec::new()
            }
            ViewerEvent::Yes => {
                if self.step != ViewerStep::Question {
                    return Vec::new();
                }
                // Optimistic: celebrate now, record in the background.
                self.step = ViewerStep::Celebration;
                vec![
                    ViewerEffect::Celebrate,
                    ViewerEffect::RecordResponse(Answer::Yes),
                ]
            }
        }
    }
}

impl Default for ViewerFlow {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================================
// Status Flow
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusStep {
    Loading,
    NotFound,
    Display,
}

/// Sender-side polling view over a sealed letter's record.
#[derive(Debug, Clone)]
pub struct StatusFlow {
    pub step: StatusStep,
    pub record: Option<LetterRecord>,
    pub visible: bool,
    celebrated: bool,
}

#[derive(Debug, Clone)]
pub enum StatusEvent {
    /// A poll or refresh completed; `None` means the token matched nothing.
    Fetched(Option<LetterRecord>),
    /// The view was foregrounded or backgrounded.
    VisibilityChanged(bool),
    /// A manual refresh request.
    Refresh,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatusEffect {
    Fetch,
    StartPolling,
    StopPolling,
    Celebrate,
}

impl StatusFlow {
    pub fn new() -> Self {
        Self {
            step: StatusStep::Loading,
            record: None,
            visible: true,
            celebrated: false,
        }
    }

    pub fn apply(&mut self, event: StatusEvent) -> Vec<StatusEffect> {
        match event {
            StatusEvent::Fetched(record) => match record {
                Some(record) => {
                    self.step = StatusStep::Display;
                    let mut effects = Vec::new();
                    // Fire the celebration exactly once per session, however
                    // many later polls keep observing "yes".
                    if record.response == Some(Answer::Yes) && !self.celebrated {
                        self.celebrated = true;
                        effects.push(StatusEffect::Celebrate);
                    }
                    self.record = Some(record);
                    effects
                }
                None => {
                    self.step = StatusStep::NotFound;
                    Vec::new()
                }
            },
            StatusEvent::VisibilityChanged(visible) => {
                if visible == self.visible {
                    return Vec::new();
                }
                self.visible = visible;
                if visible {
                    // Refetch immediately on regaining the foreground, then
                    // resume the interval.
                    vec![StatusEffect::Fetch, StatusEffect::StartPolling]
                } else {
                    vec![StatusEffect::StopPolling]
                }
            }
            StatusEvent::Refresh => vec![StatusEffect::Fetch],
        }
    }
}

impl Default for StatusFlow {
    fn default() -> Self {
        Self::new()
    }
}

//=========================================================================================
// Tests
//=========================================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn record_with(response: Option<Answer>) -> LetterRecord {
        LetterRecord {
            id: Uuid::new_v4(),
            sender_token: Uuid::new_v4(),
            content: LetterContent::default(),
            response,
            responded_at: response.map(|_| Utc::now()),
            opened_at: response.map(|_| Utc::now()),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn no_caption_clamps_at_the_last_phrase() {
        assert_eq!(no_button_caption(0), "No");
        assert_eq!(no_button_caption(1), "Are you sure?");
        assert_eq!(no_button_caption(15), "You're breaking my heart ;(");
        assert_eq!(no_button_caption(40), "You're breaking my heart ;(");
    }

    #[test]
    fn composer_seal_saves_while_the_envelope_animates() {
        let mut flow = ComposerFlow::new(LetterContent::default());
        let effects = flow.apply(ComposerEvent::Seal);
        assert_eq!(flow.step, ComposerStep::Sealing);
        assert!(flow.saving);
        assert!(matches!(effects.as_slice(), [ComposerEffect::SaveLetter(_)]));

        // Envelope opens before the network answers.
        let effects = flow.apply(ComposerEvent::EnvelopeOpened);
        assert_eq!(flow.step, ComposerStep::Reveal);
        assert!(matches!(effects.as_slice(), [ComposerEffect::StartReveal(_)]));

        let ticket = SealTicket {
            id: Uuid::new_v4(),
            sender_token: Uuid::new_v4(),
        };
        flow.apply(ComposerEvent::SealFinished(Some(ticket)));
        assert_eq!(flow.ticket, Some(ticket));
        assert!(!flow.saving);
        assert!(!flow.save_error);
    }

    #[test]
    fn composer_save_failure_still_reaches_share_with_error_flag() {
        let mut flow = ComposerFlow::new(LetterContent::default());
        flow.apply(ComposerEvent::Seal);
        flow.apply(ComposerEvent::SealFinished(None));
        flow.apply(ComposerEvent::EnvelopeOpened);
        flow.apply(ComposerEvent::Continue);

        assert_eq!(flow.step, ComposerStep::Share);
        assert!(flow.save_error);
        assert!(flow.ticket.is_none());

        let effects = flow.apply(ComposerEvent::RetrySave);
        assert!(matches!(effects.as_slice(), [ComposerEffect::SaveLetter(_)]));
        assert!(!flow.save_error);
    }

    #[test]
    fn composer_edit_resets_seal_state_but_keeps_content() {
        let mut letter = LetterContent::default();
        letter.recipient = "Sam".to_string();
        let mut flow = ComposerFlow::new(letter);
        flow.apply(ComposerEvent::Seal);
        flow.apply(ComposerEvent::SealFinished(Some(SealTicket {
            id: Uuid::new_v4(),
            sender_token: Uuid::new_v4(),
        })));
        flow.apply(ComposerEvent::EnvelopeOpened);
        flow.apply(ComposerEvent::Continue);
        flow.apply(ComposerEvent::Edit);

        assert_eq!(flow.step, ComposerStep::Compose);
        assert!(flow.ticket.is_none());
        assert_eq!(flow.letter.recipient, "Sam");
    }

    #[test]
    fn composer_ignores_out_of_step_events() {
        let mut flow = ComposerFlow::new(LetterContent::default());
        assert!(flow.apply(ComposerEvent::Continue).is_empty());
        assert!(flow.apply(ComposerEvent::EnvelopeOpened).is_empty());
        assert_eq!(flow.step, ComposerStep::Compose);
    }

    #[test]
    fn viewer_missing_letter_is_terminal() {
        let mut flow = ViewerFlow::new();
        flow.apply(ViewerEvent::Loaded(None));
        assert_eq!(flow.step, ViewerStep::NotFound);
        assert!(flow.apply(ViewerEvent::OpenEnvelope).is_empty());
        assert_eq!(flow.step, ViewerStep::NotFound);
    }

    #[test]
    fn viewer_open_marks_opened_and_starts_reveal() {
        let mut flow = ViewerFlow::new();
        flow.apply(ViewerEvent::Loaded(Some(LetterContent::default())));
        let effects = flow.apply(ViewerEvent::OpenEnvelope);
        assert_eq!(flow.step, ViewerStep::Reveal);
        assert_eq!(effects[0], ViewerEffect::MarkOpened);
        assert!(matches!(&effects[1], ViewerEffect::StartReveal(text)
            if text == &LetterContent::default().format_for_display()));
    }

    #[test]
    fn viewer_no_presses_advance_caption_and_taunt() {
        let mut flow = ViewerFlow::new();
        flow.apply(ViewerEvent::Loaded(Some(LetterContent::default())));
        flow.apply(ViewerEvent::OpenEnvelope);
        flow.apply(ViewerEvent::Continue);

        assert_eq!(flow.no_caption(), "No");
        for k in 1..=5 {
            flow.apply(ViewerEvent::No {
                offset: (1.0, -2.0),
            });
            assert_eq!(flow.no_caption(), no_button_caption(k));
        }
        assert!(flow.taunting());
        assert_eq!(flow.no_offset, (1.0, -2.0));
    }

    #[test]
    fn viewer_yes_celebrates_optimistically_and_records() {
        let mut flow = ViewerFlow::new();
        flow.apply(ViewerEvent::Loaded(Some(LetterContent::default())));
        flow.apply(ViewerEvent::OpenEnvelope);
        flow.apply(ViewerEvent::Continue);

        let effects = flow.apply(ViewerEvent::Yes);
        assert_eq!(flow.step, ViewerStep::Celebration);
        assert_eq!(
            effects,
            vec![
                ViewerEffect::Celebrate,
                ViewerEffect::RecordResponse(Answer::Yes)
            ]
        );
    }

    #[test]
    fn status_celebrates_a_yes_exactly_once() {
        let mut flow = StatusFlow::new();
        let effects = flow.apply(StatusEvent::Fetched(Some(record_with(Some(Answer::Yes)))));
        assert_eq!(effects, vec![StatusEffect::Celebrate]);

        // Later polls keep observing "yes" without re-celebrating.
        let effects = flow.apply(StatusEvent::Fetched(Some(record_with(Some(Answer::Yes)))));
        assert!(effects.is_empty());
        assert_eq!(flow.step, StatusStep::Display);
    }

    #[test]
    fn status_visibility_suspends_and_resumes_polling() {
        let mut flow = StatusFlow::new();
        flow.apply(StatusEvent::Fetched(Some(record_with(None))));

        let effects = flow.apply(StatusEvent::VisibilityChanged(false));
        assert_eq!(effects, vec![StatusEffect::StopPolling]);

        // Duplicate signal is a no-op.
        assert!(flow.apply(StatusEvent::VisibilityChanged(false)).is_empty());

        let effects = flow.apply(StatusEvent::VisibilityChanged(true));
        assert_eq!(effects, vec![StatusEffect::Fetch, StatusEffect::StartPolling]);
    }

    #[test]
    fn status_unknown_token_shows_not_found() {
        let mut flow = StatusFlow::new();
        flow.apply(StatusEvent::Fetched(None));
        assert_eq!(flow.step, StatusStep::NotFound);
    }
}
